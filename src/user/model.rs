use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::Id;

const AVATAR_FALLBACK_URL: &str = "https://ui-avatars.com/api/?name=";

/// Projection of the `users` collection. Credentials and verification
/// state are owned by the auth subsystem and never loaded here.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    #[serde(rename = "_id")]
    oid: ObjectId,
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    avatar: String,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            oid: ObjectId::new(),
            name: name.into(),
            email: email.into(),
            avatar: String::new(),
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = avatar.into();
        self
    }

    pub fn id(&self) -> Id {
        Id::from(self.oid)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Avatar URL, falling back to a generated initials image.
    pub fn image(&self) -> String {
        if self.avatar.is_empty() {
            let name: String = url::form_urlencoded::byte_serialize(self.name.as_bytes()).collect();
            format!("{AVATAR_FALLBACK_URL}{name}")
        } else {
            self.avatar.clone()
        }
    }
}
