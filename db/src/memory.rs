//! In-memory `Repository` for tests and local experiments.
//!
//! A single mutex guards all collections, so the multi-record writes are atomic here too.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use common::{
    error::{AppError, Res},
    misc::{ReviewStatus, VerificationMethod, VerificationStatus},
};
use uuid::Uuid;
use workflow::transition::{self, ReviewOutcome, StatusEffects};

use crate::{
    dtos::{
        admin::AdminCreateRequest,
        user::{BankDetailsUpdate, IdentitySync, ProfileUpdate, UserCreateRequest},
        verification::{
            ReviewRequest, ReviewResult, SubmissionOwner, SubmissionResult, VerificationFilter,
            VerificationSnapshot, VerificationSubmitRequest,
        },
    },
    models::{admin::Admin, user::User, verification::Verification},
    repo::{Repository, check_phone_owner, user_not_found, verification_not_found},
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    verifications: Vec<Verification>,
    admins: HashMap<Uuid, Admin>,
}

#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Res<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("Memory repository lock poisoned".to_string()))
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn user_conflict() -> AppError {
    AppError::Conflict("User already exists".to_string())
}

impl MemoryState {
    fn phone_taken(&self, phone: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.phone == phone && Some(u.id) != except)
    }

    fn subject_taken(&self, subject_id: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.subject_id.as_deref() == Some(subject_id) && Some(u.id) != except)
    }

    fn insert_user(&mut self, data: UserCreateRequest) -> Res<User> {
        if self.phone_taken(&data.phone, None) {
            return Err(user_conflict());
        }
        if let Some(subject_id) = &data.subject_id {
            if self.subject_taken(subject_id, None) {
                return Err(user_conflict());
            }
        }

        let now = now();
        let user = User {
            id: Uuid::new_v4(),
            subject_id: data.subject_id,
            phone: data.phone,
            role: data.role,
            is_verified: false,
            verification_status: data.verification_status,
            verification_method: VerificationMethod::Pending,
            verified_at: None,
            resubmission_count: 0,
            is_rejected: false,
            first_name: None,
            last_name: None,
            email: None,
            address: None,
            gender: None,
            profile_photo: None,
            bank_account_number: None,
            bank_ifsc_code: None,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn user_mut(&mut self, user_id: Uuid) -> Res<&mut User> {
        self.users.get_mut(&user_id).ok_or_else(user_not_found)
    }
}

fn apply_effects(user: &mut User, effects: &StatusEffects, now: NaiveDateTime) {
    user.verification_status = effects.status;
    user.is_verified = effects.is_verified;
    user.is_rejected = effects.is_rejected;
    user.verification_method = effects.method;
    user.verified_at = effects.stamp_verified_at.then_some(now);
    user.resubmission_count += effects.resubmission_increment;
    user.updated_at = now;
}

fn write_snapshot(verification: &mut Verification, snapshot: &VerificationSnapshot) {
    verification.first_name = snapshot.first_name.clone();
    verification.last_name = snapshot.last_name.clone();
    verification.phone = snapshot.phone.clone();
    verification.role = snapshot.role;
    verification.date_of_birth = snapshot.date_of_birth;
    verification.gender = snapshot.gender.clone();
    verification.address = snapshot.address.clone();
    verification.pincode = snapshot.pincode.clone();
    verification.aadhaar_front = snapshot.aadhaar_front.clone();
    verification.aadhaar_back = snapshot.aadhaar_back.clone();
    verification.pan_front = snapshot.pan_front.clone();
    verification.delivery_work = snapshot.delivery_work;
    verification.license_front = snapshot.license_front.clone();
    verification.license_back = snapshot.license_back.clone();
    verification.profile_photo = snapshot.profile_photo.clone();
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user_by_id(&self, user_id: Uuid) -> Res<Option<User>> {
        Ok(self.lock()?.users.get(&user_id).cloned())
    }

    async fn get_user_by_phone(&self, phone: &str) -> Res<Option<User>> {
        Ok(self.lock()?.users.values().find(|u| u.phone == phone).cloned())
    }

    async fn get_user_by_subject(&self, subject_id: &str) -> Res<Option<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.subject_id.as_deref() == Some(subject_id))
            .cloned())
    }

    async fn insert_user(&self, data: UserCreateRequest) -> Res<User> {
        self.lock()?.insert_user(data)
    }

    async fn sync_identity(&self, user_id: Uuid, sync: IdentitySync) -> Res<User> {
        let mut state = self.lock()?;
        if let Some(phone) = &sync.phone {
            if state.phone_taken(phone, Some(user_id)) {
                return Err(user_conflict());
            }
        }
        if let Some(subject_id) = &sync.subject_id {
            if state.subject_taken(subject_id, Some(user_id)) {
                return Err(user_conflict());
            }
        }

        let user = state.user_mut(user_id)?;
        if let Some(phone) = sync.phone {
            user.phone = phone;
        }
        if let Some(role) = sync.role {
            user.role = role;
        }
        if let Some(subject_id) = sync.subject_id {
            user.subject_id = Some(subject_id);
        }
        if sync.heal_to_pending && user.verification_status == VerificationStatus::Unset {
            user.verification_status = VerificationStatus::Pending;
        }
        user.updated_at = now();
        Ok(user.clone())
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Res<User> {
        let mut state = self.lock()?;
        let user = state.user_mut(user_id)?;
        if update.email.is_some() {
            user.email = update.email;
        }
        if update.address.is_some() {
            user.address = update.address;
        }
        if update.gender.is_some() {
            user.gender = update.gender;
        }
        if update.profile_photo.is_some() {
            user.profile_photo = update.profile_photo;
        }
        user.updated_at = now();
        Ok(user.clone())
    }

    async fn update_bank_details(&self, user_id: Uuid, update: BankDetailsUpdate) -> Res<User> {
        let mut state = self.lock()?;
        let user = state.user_mut(user_id)?;
        user.bank_account_number = Some(update.account_number);
        user.bank_ifsc_code = Some(update.ifsc_code);
        user.updated_at = now();
        Ok(user.clone())
    }

    async fn submit_verification(&self, req: VerificationSubmitRequest) -> Res<SubmissionResult> {
        let snapshot = req.snapshot;
        let mut state = self.lock()?;

        let existing = match req.owner {
            SubmissionOwner::User(user_id) => {
                Some(state.users.get(&user_id).cloned().ok_or_else(user_not_found)?)
            }
            SubmissionOwner::Phone => {
                let owner = state
                    .users
                    .values()
                    .find(|u| u.phone == snapshot.phone)
                    .cloned();
                if let Some(owner) = &owner {
                    check_phone_owner(owner)?;
                }
                owner
            }
        };
        // decide before touching anything so a refused submission leaves no trace
        let current_status = existing
            .as_ref()
            .map(|u| u.verification_status)
            .unwrap_or(VerificationStatus::Unset);
        let event = transition::submission_event(current_status)?;
        let transition = transition::apply(current_status, event)?;

        let (owner_id, created_user) = match existing {
            Some(owner) => (owner.id, false),
            None => {
                let owner = state.insert_user(UserCreateRequest {
                    phone: snapshot.phone.clone(),
                    role: snapshot.role,
                    subject_id: None,
                    verification_status: VerificationStatus::Unset,
                })?;
                (owner.id, true)
            }
        };

        let now = now();
        let pending_index = state
            .verifications
            .iter()
            .position(|v| v.user_id == owner_id && v.status == ReviewStatus::Pending);
        let verification = match pending_index {
            Some(index) => {
                let pending = &mut state.verifications[index];
                write_snapshot(pending, &snapshot);
                pending.submitted_at = now;
                pending.updated_at = now;
                pending.clone()
            }
            None => {
                let verification = Verification {
                    id: Uuid::new_v4(),
                    user_id: owner_id,
                    first_name: snapshot.first_name.clone(),
                    last_name: snapshot.last_name.clone(),
                    phone: snapshot.phone.clone(),
                    role: snapshot.role,
                    date_of_birth: snapshot.date_of_birth,
                    gender: snapshot.gender.clone(),
                    address: snapshot.address.clone(),
                    pincode: snapshot.pincode.clone(),
                    aadhaar_front: snapshot.aadhaar_front.clone(),
                    aadhaar_back: snapshot.aadhaar_back.clone(),
                    pan_front: snapshot.pan_front.clone(),
                    delivery_work: snapshot.delivery_work,
                    license_front: snapshot.license_front.clone(),
                    license_back: snapshot.license_back.clone(),
                    profile_photo: snapshot.profile_photo.clone(),
                    status: ReviewStatus::Pending,
                    reviewed_by: None,
                    reviewed_at: None,
                    comments: None,
                    submitted_at: now,
                    updated_at: now,
                };
                state.verifications.push(verification.clone());
                verification
            }
        };

        let user = state.user_mut(owner_id)?;
        apply_effects(user, &transition.effects(), now);
        user.role = snapshot.role;
        user.first_name = Some(snapshot.first_name);
        user.last_name = Some(snapshot.last_name);
        user.address = Some(snapshot.address);
        user.gender = Some(snapshot.gender);
        user.profile_photo = Some(snapshot.profile_photo);

        Ok(SubmissionResult {
            user: user.clone(),
            verification,
            created_user,
            event,
        })
    }

    async fn review_verification(&self, req: ReviewRequest) -> Res<ReviewResult> {
        let mut state = self.lock()?;
        let index = state
            .verifications
            .iter()
            .position(|v| v.id == req.verification_id)
            .ok_or_else(verification_not_found)?;
        let current = state.verifications[index].clone();
        let owner = state
            .users
            .get(&current.user_id)
            .cloned()
            .ok_or_else(user_not_found)?;

        if transition::review(current.status, &req.decision)? == ReviewOutcome::AlreadyApplied {
            return Ok(ReviewResult {
                verification: current,
                user: owner,
                changed: false,
            });
        }
        let transition = transition::apply(owner.verification_status, req.decision.event())?;

        let now = now();
        let verification = &mut state.verifications[index];
        verification.status = req.decision.status();
        verification.reviewed_by = Some(req.admin_id);
        verification.reviewed_at = Some(now);
        verification.comments = req.decision.comments().map(str::to_string);
        verification.updated_at = now;
        let verification = verification.clone();

        let user = state.user_mut(owner.id)?;
        apply_effects(user, &transition.effects(), now);

        Ok(ReviewResult {
            verification,
            user: user.clone(),
            changed: true,
        })
    }

    async fn get_verification(&self, verification_id: Uuid) -> Res<Option<Verification>> {
        Ok(self
            .lock()?
            .verifications
            .iter()
            .find(|v| v.id == verification_id)
            .cloned())
    }

    async fn get_latest_verification(&self, user_id: Uuid) -> Res<Option<Verification>> {
        Ok(self
            .lock()?
            .verifications
            .iter()
            .filter(|v| v.user_id == user_id)
            .max_by_key(|v| v.submitted_at)
            .cloned())
    }

    async fn list_verifications(&self, filter: VerificationFilter) -> Res<Vec<Verification>> {
        let offset = usize::try_from(filter.offset).unwrap_or(0);
        let limit = usize::try_from(filter.limit).unwrap_or(0);
        let state = self.lock()?;
        let mut matching: Vec<&Verification> = state
            .verifications
            .iter()
            .filter(|v| filter.status.is_none_or(|status| v.status == status))
            .filter(|v| filter.user_id.is_none_or(|user_id| v.user_id == user_id))
            .collect();
        // oldest first, a replaced snapshot moves to the back of the queue
        matching.sort_by_key(|v| v.submitted_at);
        Ok(matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_admin_by_id(&self, admin_id: Uuid) -> Res<Option<Admin>> {
        Ok(self.lock()?.admins.get(&admin_id).cloned())
    }

    async fn get_admin_by_name(&self, name: &str) -> Res<Option<Admin>> {
        Ok(self.lock()?.admins.values().find(|a| a.name == name).cloned())
    }

    async fn insert_admin(&self, data: AdminCreateRequest) -> Res<Admin> {
        let mut state = self.lock()?;
        if state.admins.values().any(|a| a.name == data.name) {
            return Err(AppError::Conflict("Admin already exists".to_string()));
        }
        let admin = Admin {
            id: Uuid::new_v4(),
            name: data.name,
            key_hash: data.key_hash,
            active: true,
            created_at: now(),
        };
        state.admins.insert(admin.id, admin.clone());
        Ok(admin)
    }
}
