use chrono::Utc;
use common::error::{AppError, Res};
use sqlx::{Executor, Postgres, QueryBuilder};
use uuid::Uuid;
use workflow::transition::ReviewDecision;

use crate::{
    dtos::verification::{VerificationFilter, VerificationSnapshot},
    models::verification::Verification,
};

pub async fn get_verification<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    verification_id: Uuid,
) -> Res<Option<Verification>> {
    sqlx::query_as::<_, Verification>("SELECT * FROM verifications WHERE id = $1")
        .bind(verification_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn lock_verification<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    verification_id: Uuid,
) -> Res<Option<Verification>> {
    sqlx::query_as::<_, Verification>("SELECT * FROM verifications WHERE id = $1 FOR UPDATE")
        .bind(verification_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn lock_pending_for_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<Verification>> {
    sqlx::query_as::<_, Verification>(
        "SELECT * FROM verifications WHERE user_id = $1 AND status = 'pending' FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

/// Most recent submission of a user; it is the authoritative one.
pub async fn get_latest_for_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<Verification>> {
    sqlx::query_as::<_, Verification>(
        "SELECT * FROM verifications WHERE user_id = $1 ORDER BY submitted_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn list_verifications<'e, E>(
    executor: E,
    filter: &VerificationFilter,
) -> Res<Vec<Verification>>
where
    E: Executor<'e, Database = Postgres>,
{
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM verifications");
    let mut conditions_added = false;

    let mut add_condition_separator = |qb: &mut QueryBuilder<Postgres>| {
        if !conditions_added {
            qb.push(" WHERE ");
            conditions_added = true;
        } else {
            qb.push(" AND ");
        }
    };

    if let Some(status) = filter.status {
        add_condition_separator(&mut qb);
        qb.push("status = ").push_bind(status);
    }

    if let Some(user_id) = filter.user_id {
        add_condition_separator(&mut qb);
        qb.push("user_id = ").push_bind(user_id);
    }

    // oldest first so the review queue is worked in arrival order
    qb.push(" ORDER BY submitted_at ASC");
    qb.push(" LIMIT ").push_bind(filter.limit);
    qb.push(" OFFSET ").push_bind(filter.offset);

    qb.build_query_as::<Verification>()
        .fetch_all(executor)
        .await
        .map_err(AppError::from)
}

pub async fn insert_verification<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    snapshot: &VerificationSnapshot,
) -> Res<Verification> {
    let now = Utc::now().naive_utc();
    sqlx::query_as::<_, Verification>(
        r#"
        INSERT INTO verifications (
            user_id, first_name, last_name, phone, role, date_of_birth, gender, address, pincode,
            aadhaar_front, aadhaar_back, pan_front, delivery_work, license_front, license_back,
            profile_photo, status, submitted_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, 'pending', $17, $17)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&snapshot.first_name)
    .bind(&snapshot.last_name)
    .bind(&snapshot.phone)
    .bind(snapshot.role)
    .bind(snapshot.date_of_birth)
    .bind(&snapshot.gender)
    .bind(&snapshot.address)
    .bind(&snapshot.pincode)
    .bind(&snapshot.aadhaar_front)
    .bind(&snapshot.aadhaar_back)
    .bind(&snapshot.pan_front)
    .bind(snapshot.delivery_work)
    .bind(&snapshot.license_front)
    .bind(&snapshot.license_back)
    .bind(&snapshot.profile_photo)
    .bind(now)
    .fetch_one(executor)
    .await
    .map_err(|e| AppError::from_write(e, "Pending verification"))
}

/// Overwrites the snapshot of a submission that is still pending.
pub async fn replace_snapshot<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    verification_id: Uuid,
    snapshot: &VerificationSnapshot,
) -> Res<Verification> {
    let now = Utc::now().naive_utc();
    sqlx::query_as::<_, Verification>(
        r#"
        UPDATE verifications SET
            first_name = $2, last_name = $3, phone = $4, role = $5, date_of_birth = $6,
            gender = $7, address = $8, pincode = $9, aadhaar_front = $10, aadhaar_back = $11,
            pan_front = $12, delivery_work = $13, license_front = $14, license_back = $15,
            profile_photo = $16, submitted_at = $17, updated_at = $17
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(verification_id)
    .bind(&snapshot.first_name)
    .bind(&snapshot.last_name)
    .bind(&snapshot.phone)
    .bind(snapshot.role)
    .bind(snapshot.date_of_birth)
    .bind(&snapshot.gender)
    .bind(&snapshot.address)
    .bind(&snapshot.pincode)
    .bind(&snapshot.aadhaar_front)
    .bind(&snapshot.aadhaar_back)
    .bind(&snapshot.pan_front)
    .bind(snapshot.delivery_work)
    .bind(&snapshot.license_front)
    .bind(&snapshot.license_back)
    .bind(&snapshot.profile_photo)
    .bind(now)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn record_review<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    verification_id: Uuid,
    admin_id: Uuid,
    decision: &ReviewDecision,
) -> Res<Verification> {
    let now = Utc::now().naive_utc();
    sqlx::query_as::<_, Verification>(
        r#"
        UPDATE verifications SET
            status = $2, reviewed_by = $3, reviewed_at = $4, comments = $5, updated_at = $4
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(verification_id)
    .bind(decision.status())
    .bind(admin_id)
    .bind(now)
    .bind(decision.comments())
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}
