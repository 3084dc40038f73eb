use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::{doc, oid::ObjectId};

use super::Id;
use super::model::User;

const USERS_COLLECTION: &str = "users";

/// Directory of registered users. Ids that do not resolve are omitted
/// from the result rather than reported as errors.
#[async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Id) -> super::Result<Option<User>>;

    async fn find_by_ids(&self, ids: &[Id]) -> super::Result<Vec<User>>;
}

pub struct MongoUserRepository {
    col: mongodb::Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            col: db.collection(USERS_COLLECTION),
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find_by_id(&self, id: &Id) -> super::Result<Option<User>> {
        let Ok(oid) = ObjectId::parse_str(id.as_str()) else {
            return Ok(None);
        };

        self.col
            .find_one(doc! { "_id": oid })
            .projection(projection())
            .await
            .map_err(super::Error::from)
    }

    async fn find_by_ids(&self, ids: &[Id]) -> super::Result<Vec<User>> {
        let oids = ids
            .iter()
            .filter_map(|id| ObjectId::parse_str(id.as_str()).ok())
            .collect::<Vec<_>>();

        if oids.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self
            .col
            .find(doc! { "_id": { "$in": oids } })
            .projection(projection())
            .await?;

        cursor.try_collect().await.map_err(super::Error::from)
    }
}

fn projection() -> mongodb::bson::Document {
    doc! { "name": 1, "email": 1, "avatar": 1 }
}
