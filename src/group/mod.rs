use std::fmt::{self, Display};
use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{chat, state::AppState, user};
use model::Group;
use repository::GroupRepository;
use service::GroupService;

mod handler;
pub mod members;
pub mod model;
pub mod repository;
pub mod service;

type Result<T> = std::result::Result<T, Error>;
pub type Repository = Arc<dyn GroupRepository + Send + Sync>;
pub type Service = Arc<dyn GroupService + Send + Sync>;

pub fn api<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/groups", get(handler::api::find_mine).post(handler::api::create))
        .route(
            "/groups/{id}",
            get(handler::api::find_one)
                .patch(handler::api::edit)
                .delete(handler::api::delete),
        )
        .route("/groups/{id}/join", post(handler::api::join))
        .route("/groups/{id}/leave", post(handler::api::leave))
        .with_state(s)
}

pub fn public<S>(s: AppState) -> Router<S> {
    Router::new()
        .route("/groups/all", get(handler::public::find_all))
        .with_state(s)
}

/// Group identifier. The same value names the group's chat channel.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// `group_<unix millis>_<random suffix>`; the suffix keeps ids unique
    /// across concurrent creations within the same millisecond.
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("group_{millis}_{}", &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<&Id> for chat::ChannelRef {
    fn from(id: &Id) -> Self {
        chat::ChannelRef::new(id.as_str())
    }
}

/// Remote step of a group operation.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Stage {
    UpsertUser,
    CreateChannel,
    AddMembers,
    RemoveMembers,
    UpdateChannel,
    DeleteChannel,
}

impl Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UpsertUser => "upsert user",
            Self::CreateChannel => "create channel",
            Self::AddMembers => "add members",
            Self::RemoveMembers => "remove members",
            Self::UpdateChannel => "update channel",
            Self::DeleteChannel => "delete channel",
        };
        write!(f, "{s}")
    }
}

/// What the local record and the chat channel disagree on.
#[derive(Clone, Debug, PartialEq)]
pub enum Divergence {
    /// Channel exists remotely, record was never stored.
    OrphanedChannel,
    /// Channel deletion failed, record kept.
    ChannelNotDeleted,
    /// Channel deleted, record still stored.
    RecordNotDeleted,
    NameNotRecorded(String),
    MembershipNotRecorded(Vec<user::Id>),
    MembershipNotRemoved(Vec<user::Id>),
}

impl Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrphanedChannel => write!(f, "chat channel created but group was not stored"),
            Self::ChannelNotDeleted => write!(f, "chat channel could not be deleted, group kept"),
            Self::RecordNotDeleted => write!(f, "chat channel deleted but group is still stored"),
            Self::NameNotRecorded(name) => {
                write!(f, "chat channel renamed to '{name}' but group was not updated")
            }
            Self::MembershipNotRecorded(ids) => {
                write!(f, "{ids:?} added to chat channel but not to group")
            }
            Self::MembershipNotRemoved(ids) => {
                write!(f, "{ids:?} removed from chat channel but not from group")
            }
        }
    }
}

#[derive(Debug)]
pub struct EditFailure {
    pub stage: Stage,
    pub source: chat::Error,
}

/// Outcome of an edit where some change sets were rejected remotely.
/// `group` reflects every change set that did go through.
#[derive(Debug)]
pub struct EditReport {
    pub group: Group,
    pub failures: Vec<EditFailure>,
}

impl Display for EditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group {} was only partially updated:", self.group.id())?;
        for failure in &self.failures {
            write!(f, " [{} failed: {}]", failure.stage, failure.source)?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("group not found: {0}")]
    NotFound(Id),
    #[error("users not found: {0:?}")]
    UsersNotFound(Vec<user::Id>),
    #[error("only the group admin can modify the group")]
    Forbidden,
    #[error("{0} is already a member of this group")]
    AlreadyMember(user::Id),
    #[error("{0} is not a member of this group")]
    NotMember(user::Id),
    #[error("group admin cannot leave the group, delete it instead")]
    AdminCannotLeave,
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
    #[error("group {0} has no chat channel")]
    Misconfigured(Id),
    #[error("missing group name")]
    MissingName,
    #[error("missing group icon")]
    MissingIcon,

    #[error("chat provider failed to {stage}: {source}")]
    Remote { stage: Stage, source: chat::Error },
    #[error("group {group} is out of sync with its chat channel: {divergence}")]
    PartialFailure {
        group: Id,
        divergence: Divergence,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("{0}")]
    EditIncomplete(Box<EditReport>),

    #[error(transparent)]
    _User(#[from] user::Error),
    #[error(transparent)]
    _MongoDB(#[from] mongodb::error::Error),
}

impl From<&Error> for StatusCode {
    fn from(e: &Error) -> Self {
        match e {
            Error::NotFound(_) | Error::UsersNotFound(_) => StatusCode::NOT_FOUND,
            Error::Forbidden => StatusCode::FORBIDDEN,
            Error::AlreadyMember(_) | Error::Misconfigured(_) => StatusCode::CONFLICT,
            Error::NotMember(_)
            | Error::AdminCannotLeave
            | Error::InvalidOperation(_)
            | Error::MissingName
            | Error::MissingIcon => StatusCode::BAD_REQUEST,
            Error::Remote { .. } | Error::EditIncomplete(_) => StatusCode::BAD_GATEWAY,
            Error::PartialFailure { .. } | Error::_User(_) | Error::_MongoDB(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
