// src/db/memory.rs
//
// Implementação em memória dos repositórios, usada pelos testes.
// Reproduz as garantias do Postgres que os serviços assumem: e-mail único,
// um dono por empresa, código de empresa único e escrita condicionada à versão.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{business_repo::BusinessStore, user_repo::UserStore},
    models::{
        auth::{BusinessSnapshot, User},
        business::Business,
    },
};

#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
    businesses: Mutex<HashMap<Uuid, Business>>,
    // Simula queda do banco nas escritas de usuário
    fail_user_writes: AtomicBool,
    // Todo código de empresa/cargo consultado aparece como já usado
    codes_taken: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_user_writes(&self, fail: bool) {
        self.fail_user_writes.store(fail, Ordering::SeqCst);
    }

    pub fn take_all_codes(&self, taken: bool) {
        self.codes_taken.store(taken, Ordering::SeqCst);
    }

    pub fn business_count(&self) -> usize {
        self.businesses.lock().unwrap().len()
    }

    fn check_user_writes(&self) -> Result<(), AppError> {
        if self.fail_user_writes.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "simulated user write failure"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User, AppError> {
        self.check_user_writes()?;
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(AppError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_lowercase(),
            name: name.to_string(),
            password_hash: password_hash.to_string(),
            business: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_business_snapshot(
        &self,
        user_id: Uuid,
        snapshot: Option<&BusinessSnapshot>,
    ) -> Result<User, AppError> {
        self.check_user_writes()?;
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or(AppError::UserNotFound)?;
        user.business = snapshot.cloned();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn clear_snapshot_for_business(&self, email: &str, business_id: Uuid) -> Result<bool, AppError> {
        self.check_user_writes()?;
        let mut users = self.users.lock().unwrap();
        let target = users.values_mut().find(|u| {
            u.email.eq_ignore_ascii_case(email)
                && u.business.as_ref().is_some_and(|b| b.business_id == business_id)
        });

        match target {
            Some(user) => {
                user.business = None;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl BusinessStore for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Business>, AppError> {
        Ok(self.businesses.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Business>, AppError> {
        let businesses = self.businesses.lock().unwrap();
        Ok(businesses.values().find(|b| b.owner_id == owner_id).cloned())
    }

    async fn find_by_role_code(&self, role_code: &str) -> Result<Option<Business>, AppError> {
        let businesses = self.businesses.lock().unwrap();
        Ok(businesses.values().find(|b| b.has_role_code(role_code)).cloned())
    }

    async fn business_code_exists(&self, business_code: &str) -> Result<bool, AppError> {
        if self.codes_taken.load(Ordering::SeqCst) {
            return Ok(true);
        }
        let businesses = self.businesses.lock().unwrap();
        Ok(businesses.values().any(|b| b.business_code == business_code))
    }

    async fn role_code_exists(&self, role_code: &str) -> Result<bool, AppError> {
        if self.codes_taken.load(Ordering::SeqCst) {
            return Ok(true);
        }
        let businesses = self.businesses.lock().unwrap();
        Ok(businesses.values().any(|b| b.has_role_code(role_code)))
    }

    async fn insert(&self, business: &Business) -> Result<Business, AppError> {
        business.check_invariants().map_err(|e| anyhow::anyhow!(e))?;
        let mut businesses = self.businesses.lock().unwrap();
        if businesses.values().any(|b| b.owner_id == business.owner_id) {
            return Err(AppError::Conflict("This user already owns a business.".to_string()));
        }
        if businesses.values().any(|b| b.business_code == business.business_code) {
            return Err(AppError::Conflict(format!(
                "Business code '{}' is already taken.",
                business.business_code
            )));
        }

        let mut stored = business.clone();
        stored.version = 1;
        businesses.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn save(&self, business: &Business) -> Result<Business, AppError> {
        business.check_invariants().map_err(|e| anyhow::anyhow!(e))?;
        let mut businesses = self.businesses.lock().unwrap();
        let current = businesses.get_mut(&business.id).ok_or(AppError::BusinessNotFound)?;
        if current.version != business.version {
            return Err(AppError::VersionConflict);
        }

        let mut stored = business.clone();
        stored.version += 1;
        stored.updated_at = Utc::now();
        *current = stored.clone();
        Ok(stored)
    }
}
