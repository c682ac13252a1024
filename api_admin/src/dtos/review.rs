use db::models::verification::Verification;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReviewBody {
    pub comments: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub user_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewResponse {
    #[serde(flatten)]
    pub verification: Verification,
    /// `false` when the same decision was already recorded.
    pub changed: bool,
}
