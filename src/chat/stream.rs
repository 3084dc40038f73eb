use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use log::debug;
use reqwest::{Method, RequestBuilder, header::AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::integration::stream;
use crate::user;

use super::provider::ChatProvider;
use super::{ChannelRef, ChannelUpdate, RemoteUser};

const CHANNEL_TYPE: &str = "messaging";

#[derive(Serialize)]
struct ServerClaims {
    server: bool,
}

#[derive(Serialize)]
struct UserClaims<'a> {
    user_id: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Stream Chat server-side REST client.
#[derive(Clone)]
pub struct StreamChatProvider {
    cfg: Arc<stream::Config>,
    http: reqwest::Client,
    key: Arc<EncodingKey>,
}

impl StreamChatProvider {
    pub fn new(cfg: &stream::Config, http: reqwest::Client) -> Self {
        Self {
            cfg: Arc::new(cfg.to_owned()),
            http,
            key: Arc::new(EncodingKey::from_secret(cfg.api_secret().as_bytes())),
        }
    }
}

impl StreamChatProvider {
    fn sign<T: Serialize>(&self, claims: &T) -> super::Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.key).map_err(super::Error::from)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let base = self.cfg.base_url().as_str().trim_end_matches('/');
        self.http.request(method, format!("{base}{path}"))
    }

    fn channel_path(channel: &ChannelRef) -> String {
        format!("/channels/{CHANNEL_TYPE}/{channel}")
    }

    async fn send(&self, req: RequestBuilder) -> super::Result<()> {
        let token = self.sign(&ServerClaims { server: true })?;

        let resp = req
            .query(&[("api_key", self.cfg.api_key())])
            .header(AUTHORIZATION, token)
            .header("Stream-Auth-Type", "jwt")
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);

        Err(super::Error::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ChatProvider for StreamChatProvider {
    async fn upsert_user(&self, user: &RemoteUser) -> super::Result<()> {
        debug!("Upserting chat user {}", user.id());

        let users = HashMap::from([(user.id().as_str(), user)]);
        let req = self
            .request(Method::POST, "/users")
            .json(&json!({ "users": users }));

        self.send(req).await
    }

    async fn create_channel(
        &self,
        channel: &ChannelRef,
        name: &str,
        members: &[user::Id],
        owner: &user::Id,
    ) -> super::Result<()> {
        debug!("Creating channel {channel} with {} members", members.len());

        let path = format!("{}/query", Self::channel_path(channel));
        let req = self.request(Method::POST, &path).json(&json!({
            "data": {
                "name": name,
                "members": members,
                "created_by_id": owner,
            },
        }));

        self.send(req).await
    }

    async fn add_members(&self, channel: &ChannelRef, ids: &[user::Id]) -> super::Result<()> {
        debug!("Adding {ids:?} to channel {channel}");

        let req = self
            .request(Method::POST, &Self::channel_path(channel))
            .json(&json!({ "add_members": ids }));

        self.send(req).await
    }

    async fn remove_members(&self, channel: &ChannelRef, ids: &[user::Id]) -> super::Result<()> {
        debug!("Removing {ids:?} from channel {channel}");

        let req = self
            .request(Method::POST, &Self::channel_path(channel))
            .json(&json!({ "remove_members": ids }));

        self.send(req).await
    }

    async fn update_channel(
        &self,
        channel: &ChannelRef,
        update: &ChannelUpdate,
    ) -> super::Result<()> {
        debug!("Updating channel {channel}");

        let req = self
            .request(Method::PATCH, &Self::channel_path(channel))
            .json(&json!({ "set": update }));

        self.send(req).await
    }

    async fn delete_channel(&self, channel: &ChannelRef) -> super::Result<()> {
        debug!("Deleting channel {channel}");

        let req = self.request(Method::DELETE, &Self::channel_path(channel));

        self.send(req).await
    }

    fn user_token(&self, id: &user::Id) -> super::Result<String> {
        self.sign(&UserClaims {
            user_id: id.as_str(),
        })
    }
}
