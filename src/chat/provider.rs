use async_trait::async_trait;

use crate::user;

use super::{ChannelRef, ChannelUpdate, RemoteUser};

/// Remote channel operations. Every call may fail independently and is
/// never retried by the caller.
#[async_trait]
pub trait ChatProvider {
    async fn upsert_user(&self, user: &RemoteUser) -> super::Result<()>;

    async fn create_channel(
        &self,
        channel: &ChannelRef,
        name: &str,
        members: &[user::Id],
        owner: &user::Id,
    ) -> super::Result<()>;

    async fn add_members(&self, channel: &ChannelRef, ids: &[user::Id]) -> super::Result<()>;

    async fn remove_members(&self, channel: &ChannelRef, ids: &[user::Id]) -> super::Result<()>;

    async fn update_channel(&self, channel: &ChannelRef, update: &ChannelUpdate)
    -> super::Result<()>;

    async fn delete_channel(&self, channel: &ChannelRef) -> super::Result<()>;

    /// Token the client SDK uses to connect as `id`.
    fn user_token(&self, id: &user::Id) -> super::Result<String>;
}
