use chrono::{NaiveDateTime, Utc};
use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;
use workflow::transition::StatusEffects;

use crate::{
    dtos::{
        user::{BankDetailsUpdate, IdentitySync, ProfileUpdate, UserCreateRequest},
        verification::VerificationSnapshot,
    },
    models::user::User,
};

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub async fn get_user_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_user_by_phone<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    phone: &str,
) -> Res<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone = $1")
        .bind(phone)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_user_by_subject<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    subject_id: &str,
) -> Res<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE subject_id = $1")
        .bind(subject_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

/// Same as `get_user_by_id` but holds a row lock until the transaction ends.
pub async fn lock_user_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
) -> Res<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn lock_user_by_phone<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    phone: &str,
) -> Res<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE phone = $1 FOR UPDATE")
        .bind(phone)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn insert_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: UserCreateRequest,
) -> Res<User> {
    let now = now();
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (phone, role, subject_id, verification_status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $5)
        RETURNING *
        "#,
    )
    .bind(&data.phone)
    .bind(data.role)
    .bind(&data.subject_id)
    .bind(data.verification_status)
    .bind(now)
    .fetch_one(executor)
    .await
    .map_err(|e| AppError::from_write(e, "User"))
}

pub async fn sync_identity<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    sync: &IdentitySync,
) -> Res<User> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            phone = COALESCE($2, phone),
            role = COALESCE($3, role),
            subject_id = COALESCE($4, subject_id),
            verification_status = CASE
                WHEN $5 AND verification_status = 'unset' THEN 'pending'::verification_status
                ELSE verification_status
            END,
            updated_at = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&sync.phone)
    .bind(sync.role)
    .bind(&sync.subject_id)
    .bind(sync.heal_to_pending)
    .bind(now())
    .fetch_one(executor)
    .await
    .map_err(|e| AppError::from_write(e, "User with this phone or identity"))
}

/// Writes a status transition together with the submitted profile fields.
pub async fn apply_submission<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    snapshot: &VerificationSnapshot,
    effects: &StatusEffects,
) -> Res<User> {
    let now = now();
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            verification_status = $2,
            is_verified = $3,
            is_rejected = $4,
            verification_method = $5,
            verified_at = $6,
            resubmission_count = resubmission_count + $7,
            role = $8,
            first_name = $9,
            last_name = $10,
            address = $11,
            gender = $12,
            profile_photo = $13,
            updated_at = $14
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(effects.status)
    .bind(effects.is_verified)
    .bind(effects.is_rejected)
    .bind(effects.method)
    .bind(effects.stamp_verified_at.then_some(now))
    .bind(effects.resubmission_increment)
    .bind(snapshot.role)
    .bind(&snapshot.first_name)
    .bind(&snapshot.last_name)
    .bind(&snapshot.address)
    .bind(&snapshot.gender)
    .bind(&snapshot.profile_photo)
    .bind(now)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn apply_status<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    effects: &StatusEffects,
) -> Res<User> {
    let now = now();
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            verification_status = $2,
            is_verified = $3,
            is_rejected = $4,
            verification_method = $5,
            verified_at = $6,
            resubmission_count = resubmission_count + $7,
            updated_at = $8
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(effects.status)
    .bind(effects.is_verified)
    .bind(effects.is_rejected)
    .bind(effects.method)
    .bind(effects.stamp_verified_at.then_some(now))
    .bind(effects.resubmission_increment)
    .bind(now)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_profile<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    update: &ProfileUpdate,
) -> Res<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            email = COALESCE($2, email),
            address = COALESCE($3, address),
            gender = COALESCE($4, gender),
            profile_photo = COALESCE($5, profile_photo),
            updated_at = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&update.email)
    .bind(&update.address)
    .bind(&update.gender)
    .bind(&update.profile_photo)
    .bind(now())
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

pub async fn update_bank_details<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: Uuid,
    update: &BankDetailsUpdate,
) -> Res<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET bank_account_number = $2, bank_ifsc_code = $3, updated_at = $4
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(&update.account_number)
    .bind(&update.ifsc_code)
    .bind(now())
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}
