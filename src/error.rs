use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, warn};
use serde::Serialize;

use crate::{auth, chat, group, user};

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    _Auth(#[from] auth::Error),
    _Chat(#[from] chat::Error),
    _Group(#[from] group::Error),
    _User(#[from] user::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Self::_Auth(ref e) => StatusCode::from(e),
            Self::_Chat(ref e) => StatusCode::from(e),
            Self::_Group(ref e) => StatusCode::from(e),
            Self::_User(ref e) => StatusCode::from(e),
        };

        if let Self::_Group(group::Error::PartialFailure { .. }) = self {
            error!("operator attention required: {self}");
        } else if status.is_server_error() {
            error!("{self}");
        } else {
            warn!("{self}");
        }

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            match self {
                Self::_Group(ref e @ group::Error::PartialFailure { .. }) => e.to_string(),
                _ => "Internal server error".to_owned(),
            }
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}
