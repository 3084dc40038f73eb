use std::slice;

use async_trait::async_trait;
use futures::future::try_join_all;
use log::{error, info, warn};

use crate::chat::{self, ChannelRef, ChannelUpdate, RemoteUser};
use crate::user::{self, model::User};

use super::model::{
    CreateGroup, EditGroup, Filter, Group, GroupDto, GroupPatch, Page, Paginated, Pagination,
};
use super::{Divergence, EditFailure, EditReport, Id, Repository, Stage, members};

/// Keeps the local group roster and the chat provider's channels in step.
///
/// Every mutation validates first, then writes remotely, then locally.
/// Remote failures abort before the local write; a local failure after a
/// remote write surfaces as `Error::PartialFailure`.
#[async_trait]
pub trait GroupService {
    async fn create(&self, admin: &user::Id, params: CreateGroup) -> super::Result<Group>;

    async fn find_by_id(&self, id: &Id) -> super::Result<Group>;

    async fn find_all(&self, page: &Page) -> super::Result<Paginated>;

    async fn find_by_member(&self, member: &user::Id, page: &Page) -> super::Result<Paginated>;

    async fn join(&self, member: &user::Id, id: &Id) -> super::Result<Group>;

    async fn leave(&self, member: &user::Id, id: &Id) -> super::Result<()>;

    async fn edit(&self, admin: &user::Id, id: &Id, params: EditGroup) -> super::Result<Group>;

    async fn delete(&self, admin: &user::Id, id: &Id) -> super::Result<()>;
}

#[derive(Clone)]
pub struct GroupServiceImpl {
    repo: Repository,
    users: user::Repository,
    chat: chat::Provider,
}

impl GroupServiceImpl {
    pub fn new(repo: Repository, users: user::Repository, chat: chat::Provider) -> Self {
        Self { repo, users, chat }
    }
}

#[async_trait]
impl GroupService for GroupServiceImpl {
    async fn create(&self, admin: &user::Id, params: CreateGroup) -> super::Result<Group> {
        let name = params.name.trim();
        if name.is_empty() {
            return Err(super::Error::MissingName);
        }
        let icon = params.icon.trim();
        if icon.is_empty() {
            return Err(super::Error::MissingIcon);
        }

        let members = members::canonical(admin, &params.members);
        let users = self.resolve(&members).await?;

        self.upsert_remote(&users).await.map_err(remote(Stage::UpsertUser))?;

        let id = Id::generate();
        let channel = ChannelRef::from(&id);
        self.chat
            .create_channel(&channel, name, &members, admin)
            .await
            .map_err(remote(Stage::CreateChannel))?;

        let group = Group::new(id, name, icon, admin.clone(), members);
        if let Err(e) = self.repo.insert(&group).await {
            return Err(partial(group.id(), Divergence::OrphanedChannel, e));
        }

        info!("Group {} created by {admin}", group.id());
        Ok(group)
    }

    async fn find_by_id(&self, id: &Id) -> super::Result<Group> {
        let group = self.find_existing(id).await?;
        if group.channel().is_none() {
            return Err(super::Error::Misconfigured(id.clone()));
        }
        Ok(group)
    }

    async fn find_all(&self, page: &Page) -> super::Result<Paginated> {
        self.paginate(&Filter::All, page).await
    }

    async fn find_by_member(&self, member: &user::Id, page: &Page) -> super::Result<Paginated> {
        self.paginate(&Filter::Member(member.clone()), page).await
    }

    async fn join(&self, member: &user::Id, id: &Id) -> super::Result<Group> {
        let group = self.find_existing(id).await?;
        if group.is_member(member) {
            return Err(super::Error::AlreadyMember(member.clone()));
        }

        let user = self
            .users
            .find_by_id(member)
            .await?
            .ok_or_else(|| super::Error::UsersNotFound(vec![member.clone()]))?;

        let channel = group
            .channel()
            .ok_or_else(|| super::Error::Misconfigured(id.clone()))?;

        self.chat
            .upsert_user(&RemoteUser::from(&user))
            .await
            .map_err(remote(Stage::UpsertUser))?;
        self.chat
            .add_members(&channel, slice::from_ref(member))
            .await
            .map_err(remote(Stage::AddMembers))?;

        let group = self
            .repo
            .add_members(id, slice::from_ref(member))
            .await
            .map_err(|e| partial(id, Divergence::MembershipNotRecorded(vec![member.clone()]), e))?;

        info!("{member} joined group {id}");
        Ok(group)
    }

    async fn leave(&self, member: &user::Id, id: &Id) -> super::Result<()> {
        let group = self.find_existing(id).await?;
        if !group.is_member(member) {
            return Err(super::Error::NotMember(member.clone()));
        }
        if group.is_admin(member) {
            return Err(super::Error::AdminCannotLeave);
        }

        let channel = group
            .channel()
            .ok_or_else(|| super::Error::Misconfigured(id.clone()))?;

        self.chat
            .remove_members(&channel, slice::from_ref(member))
            .await
            .map_err(remote(Stage::RemoveMembers))?;

        self.repo
            .remove_members(id, slice::from_ref(member))
            .await
            .map_err(|e| partial(id, Divergence::MembershipNotRemoved(vec![member.clone()]), e))?;

        info!("{member} left group {id}");
        Ok(())
    }

    async fn edit(&self, admin: &user::Id, id: &Id, params: EditGroup) -> super::Result<Group> {
        let group = self.find_existing(id).await?;
        if !group.is_admin(admin) {
            return Err(super::Error::Forbidden);
        }

        let rename = params
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty() && *n != group.name())
            .map(str::to_owned);

        if let Some(target) = &params.remove_member {
            if group.is_admin(target) {
                return Err(super::Error::InvalidOperation("the group admin cannot be removed"));
            }
            if !group.is_member(target) {
                return Err(super::Error::NotMember(target.clone()));
            }
        }

        let requested = members::dedup(&params.add_members);
        if let Some(target) = &params.remove_member {
            if requested.contains(target) {
                return Err(super::Error::InvalidOperation(
                    "a member cannot be added and removed in the same edit",
                ));
            }
        }

        let additions = members::additions(group.members(), &requested);
        let new_users = if requested.is_empty() {
            Vec::new()
        } else {
            self.resolve(&requested)
                .await?
                .into_iter()
                .filter(|u| additions.contains(&u.id()))
                .collect::<Vec<_>>()
        };

        if rename.is_none() && additions.is_empty() && params.remove_member.is_none() {
            return Ok(group);
        }

        let channel = group
            .channel()
            .ok_or_else(|| super::Error::Misconfigured(id.clone()))?;

        let mut current = group;
        let mut failures = Vec::new();

        if let Some(name) = rename {
            let update = ChannelUpdate {
                name: Some(name.clone()),
            };
            match self.chat.update_channel(&channel, &update).await {
                Ok(()) => {
                    let patch = GroupPatch {
                        name: Some(name.clone()),
                    };
                    current = self
                        .repo
                        .update_fields(id, &patch)
                        .await
                        .map_err(|e| partial(id, Divergence::NameNotRecorded(name), e))?;
                }
                Err(source) => {
                    warn!("Failed to rename channel {channel}: {source}");
                    failures.push(EditFailure {
                        stage: Stage::UpdateChannel,
                        source,
                    });
                }
            }
        }

        if !additions.is_empty() {
            match self.add_remote(&channel, &new_users, &additions).await {
                Ok(()) => {
                    current = self.repo.add_members(id, &additions).await.map_err(|e| {
                        partial(id, Divergence::MembershipNotRecorded(additions.clone()), e)
                    })?;
                }
                Err(failure) => {
                    warn!("Failed to add {additions:?} to channel {channel}: {}", failure.source);
                    failures.push(failure);
                }
            }
        }

        if let Some(target) = params.remove_member {
            let removed = slice::from_ref(&target);
            match self.chat.remove_members(&channel, removed).await {
                Ok(()) => {
                    current = self.repo.remove_members(id, removed).await.map_err(|e| {
                        partial(id, Divergence::MembershipNotRemoved(vec![target.clone()]), e)
                    })?;
                }
                Err(source) => {
                    warn!("Failed to remove {target} from channel {channel}: {source}");
                    failures.push(EditFailure {
                        stage: Stage::RemoveMembers,
                        source,
                    });
                }
            }
        }

        if failures.is_empty() {
            info!("Group {id} edited by {admin}");
            Ok(current)
        } else {
            Err(super::Error::EditIncomplete(Box::new(EditReport {
                group: current,
                failures,
            })))
        }
    }

    async fn delete(&self, admin: &user::Id, id: &Id) -> super::Result<()> {
        let group = self.find_existing(id).await?;
        if !group.is_admin(admin) {
            return Err(super::Error::Forbidden);
        }

        let remote_deleted = match group.channel() {
            Some(channel) => match self.chat.delete_channel(&channel).await {
                Ok(()) => true,
                Err(e) if e.is_not_found() => {
                    warn!("Channel {channel} was already gone");
                    true
                }
                Err(e) => return Err(partial(id, Divergence::ChannelNotDeleted, e)),
            },
            None => {
                warn!("Group {id} has no chat channel, deleting record only");
                false
            }
        };

        match self.repo.delete(id).await {
            Ok(_) => {
                info!("Group {id} deleted by {admin}");
                Ok(())
            }
            Err(e) if remote_deleted => Err(partial(id, Divergence::RecordNotDeleted, e)),
            Err(e) => Err(e),
        }
    }
}

impl GroupServiceImpl {
    async fn find_existing(&self, id: &Id) -> super::Result<Group> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| super::Error::NotFound(id.clone()))
    }

    /// Loads every user in `ids`, failing with the ids that do not resolve.
    async fn resolve(&self, ids: &[user::Id]) -> super::Result<Vec<User>> {
        let users = self.users.find_by_ids(ids).await?;

        let missing = members::missing(ids, &users);
        if !missing.is_empty() {
            return Err(super::Error::UsersNotFound(missing));
        }

        Ok(users)
    }

    async fn upsert_remote(&self, users: &[User]) -> Result<(), chat::Error> {
        let remote = users.iter().map(RemoteUser::from).collect::<Vec<_>>();
        try_join_all(remote.iter().map(|u| self.chat.upsert_user(u))).await?;
        Ok(())
    }

    async fn add_remote(
        &self,
        channel: &ChannelRef,
        users: &[User],
        ids: &[user::Id],
    ) -> Result<(), EditFailure> {
        self.upsert_remote(users)
            .await
            .map_err(|source| EditFailure {
                stage: Stage::UpsertUser,
                source,
            })?;

        self.chat
            .add_members(channel, ids)
            .await
            .map_err(|source| EditFailure {
                stage: Stage::AddMembers,
                source,
            })
    }

    async fn paginate(&self, filter: &Filter, page: &Page) -> super::Result<Paginated> {
        let (groups, total) = self.repo.paginate(filter, page).await?;

        let admins = if groups.is_empty() {
            Vec::new()
        } else {
            let ids = groups.iter().map(|g| g.admin().clone()).collect::<Vec<_>>();
            self.users.find_by_ids(&members::dedup(&ids)).await?
        };

        let groups = groups
            .into_iter()
            .map(|g| {
                let admin = admins.iter().find(|u| u.id().eq(g.admin())).cloned();
                let dto = GroupDto::from(g);
                match admin {
                    Some(admin) => dto.with_admin(&admin),
                    None => dto,
                }
            })
            .collect();

        Ok(Paginated {
            groups,
            pagination: Pagination::new(page, total),
        })
    }
}

fn remote(stage: Stage) -> impl FnOnce(chat::Error) -> super::Error {
    move |source| super::Error::Remote { stage, source }
}

fn partial(
    id: &Id,
    divergence: Divergence,
    source: impl std::error::Error + Send + Sync + 'static,
) -> super::Error {
    error!("Group {id} diverged from its chat channel ({divergence}): {source}");

    super::Error::PartialFailure {
        group: id.clone(),
        divergence,
        source: Box::new(source),
    }
}
