use actix_web::{HttpResponse, Responder};
use serde::Serialize;

use super::error::Res;

pub struct Success;
impl Success {
    pub fn created<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Created().json(body))
    }
    pub fn ok<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Ok().json(body))
    }
    /// 201 when something was created by the request, 200 otherwise.
    pub fn created_if<T: Serialize>(created: bool, body: T) -> Res<HttpResponse> {
        if created {
            Ok(HttpResponse::Created().json(body))
        } else {
            Ok(HttpResponse::Ok().json(body))
        }
    }
}
