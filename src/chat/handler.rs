pub(super) mod api {
    use axum::{Extension, Json, extract::State};
    use log::debug;
    use serde::Serialize;

    use crate::{auth, chat};

    #[derive(Serialize)]
    pub struct TokenResponse {
        token: String,
    }

    pub async fn token(
        auth_user: Extension<auth::User>,
        chat: State<chat::Provider>,
    ) -> crate::Result<Json<TokenResponse>> {
        debug!("Issuing chat token for {}", auth_user.name());
        let token = chat.user_token(auth_user.id())?;
        Ok(Json(TokenResponse { token }))
    }
}
