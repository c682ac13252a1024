use chrono::Utc;
use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{dtos::admin::AdminCreateRequest, models::admin::Admin};

pub async fn get_admin_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    admin_id: Uuid,
) -> Res<Option<Admin>> {
    sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
        .bind(admin_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_admin_by_name<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    name: &str,
) -> Res<Option<Admin>> {
    sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE name = $1")
        .bind(name)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn insert_admin<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: AdminCreateRequest,
) -> Res<Admin> {
    sqlx::query_as::<_, Admin>(
        r#"
        INSERT INTO admins (name, key_hash, active, created_at)
        VALUES ($1, $2, TRUE, $3)
        RETURNING *
        "#,
    )
    .bind(&data.name)
    .bind(&data.key_hash)
    .bind(Utc::now().naive_utc())
    .fetch_one(executor)
    .await
    .map_err(|e| AppError::from_write(e, "Admin"))
}
