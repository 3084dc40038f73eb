use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::{DateTime, Document, doc};
use mongodb::options::ReturnDocument;

use crate::user;

use super::Id;
use super::model::{Filter, Group, GroupPatch, Page};

const GROUPS_COLLECTION: &str = "groups";

/// System of record for groups. Membership changes go through atomic
/// set primitives so concurrent joins never duplicate or lose members.
#[async_trait]
pub trait GroupRepository {
    async fn insert(&self, group: &Group) -> super::Result<()>;

    async fn find_by_id(&self, id: &Id) -> super::Result<Option<Group>>;

    async fn update_fields(&self, id: &Id, patch: &GroupPatch) -> super::Result<Group>;

    async fn add_members(&self, id: &Id, ids: &[user::Id]) -> super::Result<Group>;

    async fn remove_members(&self, id: &Id, ids: &[user::Id]) -> super::Result<Group>;

    async fn delete(&self, id: &Id) -> super::Result<bool>;

    /// Groups matching `filter` that have a valid chat channel, oldest first.
    async fn paginate(&self, filter: &Filter, page: &Page) -> super::Result<(Vec<Group>, u64)>;
}

pub struct MongoGroupRepository {
    col: mongodb::Collection<Group>,
}

impl MongoGroupRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            col: db.collection(GROUPS_COLLECTION),
        }
    }
}

impl MongoGroupRepository {
    async fn update(&self, id: &Id, update: Document) -> super::Result<Group> {
        self.col
            .find_one_and_update(doc! { "_id": id.as_str() }, update)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| super::Error::NotFound(id.clone()))
    }
}

#[async_trait]
impl GroupRepository for MongoGroupRepository {
    async fn insert(&self, group: &Group) -> super::Result<()> {
        self.col.insert_one(group).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &Id) -> super::Result<Option<Group>> {
        self.col
            .find_one(doc! { "_id": id.as_str() })
            .await
            .map_err(super::Error::from)
    }

    async fn update_fields(&self, id: &Id, patch: &GroupPatch) -> super::Result<Group> {
        let mut set = doc! { "updated_at": DateTime::now() };
        if let Some(name) = &patch.name {
            set.insert("name", name.as_str());
        }

        self.update(id, doc! { "$set": set }).await
    }

    async fn add_members(&self, id: &Id, ids: &[user::Id]) -> super::Result<Group> {
        let ids = ids.iter().map(user::Id::as_str).collect::<Vec<_>>();

        self.update(
            id,
            doc! {
                "$addToSet": { "members": { "$each": ids } },
                "$set": { "updated_at": DateTime::now() },
            },
        )
        .await
    }

    async fn remove_members(&self, id: &Id, ids: &[user::Id]) -> super::Result<Group> {
        let ids = ids.iter().map(user::Id::as_str).collect::<Vec<_>>();

        self.update(
            id,
            doc! {
                "$pull": { "members": { "$in": ids } },
                "$set": { "updated_at": DateTime::now() },
            },
        )
        .await
    }

    async fn delete(&self, id: &Id) -> super::Result<bool> {
        let res = self.col.delete_one(doc! { "_id": id.as_str() }).await?;
        Ok(res.deleted_count > 0)
    }

    async fn paginate(&self, filter: &Filter, page: &Page) -> super::Result<(Vec<Group>, u64)> {
        let mut query = doc! { "$expr": { "$eq": ["$channel", "$_id"] } };
        if let Filter::Member(member) = filter {
            query.insert("members", member.as_str());
        }

        let (cursor, total) = tokio::try_join!(
            self.col
                .find(query.clone())
                .sort(doc! { "created_at": 1, "_id": 1 })
                .skip(page.skip())
                .limit(page.limit() as i64)
                .into_future(),
            self.col.count_documents(query.clone()).into_future(),
        )?;

        let groups: Vec<Group> = cursor.try_collect().await?;

        Ok((groups, total))
    }
}
