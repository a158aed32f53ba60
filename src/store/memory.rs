use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{Principal, PrincipalStore};
use crate::error::{AppError, DatabaseError};

/// Process-local principal store
#[derive(Default)]
pub struct InMemoryPrincipalStore {
    principals: Mutex<HashMap<Uuid, Principal>>,
}

impl InMemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrincipalStore for InMemoryPrincipalStore {
    async fn find_principal_by_email(&self, email: &str) -> Result<Option<Principal>, AppError> {
        Ok(self
            .principals
            .lock()
            .values()
            .find(|p| p.email == email)
            .cloned())
    }

    async fn find_principal_by_id(&self, id: Uuid) -> Result<Option<Principal>, AppError> {
        Ok(self.principals.lock().get(&id).cloned())
    }

    async fn save(&self, principal: &Principal) -> Result<(), AppError> {
        let mut principals = self.principals.lock();
        let email_taken = principals
            .values()
            .any(|p| p.email == principal.email && p.id != principal.id);
        if email_taken {
            return Err(DatabaseError::UniqueConstraintViolation(format!(
                "email {} already registered",
                principal.email
            ))
            .into());
        }
        principals.insert(principal.id, principal.clone());
        Ok(())
    }

    async fn save_profile(&self, principal: &Principal) -> Result<(), AppError> {
        let mut principals = self.principals.lock();
        let stored = principals
            .get_mut(&principal.id)
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;
        stored.confirmed = principal.confirmed;
        stored.avatar_url = principal.avatar_url.clone();
        Ok(())
    }

    async fn set_refresh_token(&self, id: Uuid, fingerprint: Option<&str>) -> Result<(), AppError> {
        let mut principals = self.principals.lock();
        let stored = principals
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound("User not found".to_string()))?;
        stored.refresh_token_hash = fingerprint.map(str::to_string);
        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        new: Option<&str>,
    ) -> Result<bool, AppError> {
        let mut principals = self.principals.lock();
        match principals.get_mut(&id) {
            Some(principal) if principal.refresh_token_hash.as_deref() == Some(expected) => {
                principal.refresh_token_hash = new.map(str::to_string);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
