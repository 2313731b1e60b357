//! Resolution of the authenticated user behind a request.

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::application::repos::{RepoError, SessionsRepo};

/// The user on whose behalf a mutation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
}

impl Actor {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

#[derive(Debug, Error)]
pub enum ActorError {
    #[error("missing session token")]
    Missing,
    #[error("invalid session token")]
    Invalid,
    #[error("expired session token")]
    Expired,
    #[error("session store unavailable")]
    Unavailable(#[source] RepoError),
}

#[async_trait]
pub trait ActorResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Actor, ActorError>;
}

/// Looks bearer tokens up in the session table by their SHA-256 digest.
#[derive(Clone)]
pub struct SessionActorResolver {
    sessions: Arc<dyn SessionsRepo>,
}

impl SessionActorResolver {
    pub fn new(sessions: Arc<dyn SessionsRepo>) -> Self {
        Self { sessions }
    }

    pub fn hash_token(token: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hasher.finalize().to_vec()
    }
}

#[async_trait]
impl ActorResolver for SessionActorResolver {
    async fn resolve(&self, token: &str) -> Result<Actor, ActorError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ActorError::Missing);
        }

        let hashed = Self::hash_token(token);
        let session = self
            .sessions
            .find_by_token_hash(&hashed)
            .await
            .map_err(|err| {
                warn!(
                    target = "pasar::application::actor",
                    error = %err,
                    "session lookup failed"
                );
                ActorError::Unavailable(err)
            })?
            .ok_or(ActorError::Invalid)?;

        if session.token_hash.ct_eq(&hashed).unwrap_u8() == 0 {
            return Err(ActorError::Invalid);
        }
        if session.expires_at <= OffsetDateTime::now_utc() {
            return Err(ActorError::Expired);
        }

        Ok(Actor::new(session.user_id))
    }
}
