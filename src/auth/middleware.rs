use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use log::debug;

use crate::{auth, user};

const TOKEN_COOKIE: &str = "jwt";

pub async fn authorize(
    auth_service: State<auth::Service>,
    user_repo: State<user::Repository>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> crate::Result<Response> {
    let token = jar
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_owned())
        .or_else(|| bearer(&req))
        .ok_or(auth::Error::MissingToken)?;

    let id = auth_service.validate(&token)?;

    let user = user_repo
        .find_by_id(&id)
        .await
        .map_err(auth::Error::from)?
        .ok_or_else(|| {
            debug!("Token holder {id} is not a registered user");
            auth::Error::UnknownUser
        })?;

    req.extensions_mut().insert(auth::User::from(user));

    Ok(next.run(req).await)
}

fn bearer(req: &Request) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}
