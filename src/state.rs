use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::service::JwtAuthService;
use crate::chat::stream::StreamChatProvider;
use crate::group::repository::MongoGroupRepository;
use crate::group::service::GroupServiceImpl;
use crate::integration::{self, Config};
use crate::user::repository::MongoUserRepository;
use crate::{auth, chat, group, user};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: auth::Service,
    pub user_repo: user::Repository,
    pub chat: chat::Provider,
    pub group_service: group::Service,
}

impl AppState {
    pub fn init(cfg: &Config) -> Self {
        let database = cfg.mongo.connect();
        let http = integration::init_http_client();

        let user_repo: user::Repository = Arc::new(MongoUserRepository::new(&database));
        let chat: chat::Provider = Arc::new(StreamChatProvider::new(&cfg.stream, http));
        let group_repo: group::Repository = Arc::new(MongoGroupRepository::new(&database));

        Self::new(
            Arc::new(JwtAuthService::new(&cfg.jwt_secret)),
            user_repo.clone(),
            chat.clone(),
            Arc::new(GroupServiceImpl::new(group_repo, user_repo, chat)),
        )
    }

    pub fn new(
        auth_service: auth::Service,
        user_repo: user::Repository,
        chat: chat::Provider,
        group_service: group::Service,
    ) -> Self {
        Self {
            auth_service,
            user_repo,
            chat,
            group_service,
        }
    }
}

impl FromRef<AppState> for auth::Service {
    fn from_ref(s: &AppState) -> Self {
        s.auth_service.clone()
    }
}

impl FromRef<AppState> for user::Repository {
    fn from_ref(s: &AppState) -> Self {
        s.user_repo.clone()
    }
}

impl FromRef<AppState> for chat::Provider {
    fn from_ref(s: &AppState) -> Self {
        s.chat.clone()
    }
}

impl FromRef<AppState> for group::Service {
    fn from_ref(s: &AppState) -> Self {
        s.group_service.clone()
    }
}
