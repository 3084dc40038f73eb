use std::sync::Arc;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::user::{self, model::User as UserRecord};

pub mod middleware;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Service = Arc<dyn service::AuthService + Send + Sync>;

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub user_id: user::Id,
    pub exp: u64,
}

/// The caller of the current request.
#[derive(Clone, Debug)]
pub struct User {
    id: user::Id,
    name: String,
}

impl User {
    pub fn new(id: user::Id, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub const fn id(&self) -> &user::Id {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl From<UserRecord> for User {
    fn from(u: UserRecord) -> Self {
        Self::new(u.id(), u.name())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unauthorized: no token provided")]
    MissingToken,
    #[error("unauthorized: invalid token")]
    InvalidToken,
    #[error("unauthorized: user not found")]
    UnknownUser,

    #[error(transparent)]
    _User(#[from] user::Error),
}

impl From<&Error> for StatusCode {
    fn from(e: &Error) -> Self {
        match e {
            Error::MissingToken | Error::InvalidToken | Error::UnknownUser => {
                StatusCode::UNAUTHORIZED
            }
            Error::_User(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
