use std::fmt::Display;
use std::sync::Arc;

use axum::{Router, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::user::{self, model::User};
use provider::ChatProvider;

mod handler;
pub mod provider;
pub mod stream;

type Result<T> = std::result::Result<T, Error>;
pub type Provider = Arc<dyn ChatProvider + Send + Sync>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/chats/token", get(handler::api::token))
        .with_state(s)
}

/// Identifier of a channel on the chat provider side.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelRef(String);

impl ChannelRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ChannelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user as registered with the chat provider.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RemoteUser {
    id: user::Id,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
}

impl RemoteUser {
    pub fn new(id: user::Id, name: impl Into<String>, image: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            image,
        }
    }

    pub const fn id(&self) -> &user::Id {
        &self.id
    }
}

impl From<&User> for RemoteUser {
    fn from(u: &User) -> Self {
        Self::new(u.id(), u.name(), Some(u.image()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ChannelUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("chat provider unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),
    #[error("chat provider rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("could not sign chat token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Rejected { status: 404, .. })
    }
}

impl From<&Error> for StatusCode {
    fn from(e: &Error) -> Self {
        match e {
            Error::Unavailable(_) | Error::Rejected { .. } => StatusCode::BAD_GATEWAY,
            Error::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
