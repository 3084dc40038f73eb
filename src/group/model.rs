use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::chat::ChannelRef;
use crate::user::{self, model::User};

use super::Id;

const DEFAULT_ICON: &str = "💬";
const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 100;
const MAX_SKIP: u64 = i64::MAX as u64;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Group {
    #[serde(rename = "_id")]
    id: Id,
    name: String,
    #[serde(default)]
    icon: String,
    admin: user::Id,
    members: Vec<user::Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    channel: Option<ChannelRef>,
    created_at: DateTime,
    updated_at: DateTime,
}

impl Group {
    /// `members` must already be canonical: unique and containing `admin`.
    pub fn new(
        id: Id,
        name: impl Into<String>,
        icon: impl Into<String>,
        admin: user::Id,
        members: Vec<user::Id>,
    ) -> Self {
        debug_assert!(members.contains(&admin));

        let now = DateTime::now();
        Self {
            channel: Some(ChannelRef::from(&id)),
            id,
            name: name.into(),
            icon: icon.into(),
            admin,
            members,
            created_at: now,
            updated_at: now,
        }
    }

    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub const fn admin(&self) -> &user::Id {
        &self.admin
    }

    pub fn members(&self) -> &[user::Id] {
        &self.members
    }

    pub fn is_admin(&self, id: &user::Id) -> bool {
        self.admin.eq(id)
    }

    pub fn is_member(&self, id: &user::Id) -> bool {
        self.members.contains(id)
    }

    /// The chat channel mirroring this group, if the record was stored
    /// with one and it still names this group.
    pub fn channel(&self) -> Option<ChannelRef> {
        let expected = ChannelRef::from(&self.id);
        self.channel.as_ref().filter(|c| expected.eq(c)).cloned()
    }

    #[cfg(test)]
    pub(crate) fn without_channel(mut self) -> Self {
        self.channel = None;
        self
    }

    #[cfg(test)]
    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = DateTime::now();
    }

    #[cfg(test)]
    pub(crate) fn members_mut(&mut self) -> &mut Vec<user::Id> {
        self.updated_at = DateTime::now();
        &mut self.members
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroup {
    #[serde(alias = "GroupName")]
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub members: Vec<user::Id>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EditGroup {
    #[serde(default, alias = "groupName")]
    pub name: Option<String>,
    #[serde(default)]
    pub remove_member: Option<user::Id>,
    #[serde(default)]
    pub add_members: Vec<user::Id>,
}

/// Fields replaced wholesale by `GroupRepository::update_fields`.
#[derive(Default, Clone, Debug)]
pub struct GroupPatch {
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    All,
    Member(user::Id),
}

/// 1-based page window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    number: u64,
    limit: u64,
}

impl Page {
    pub fn new(number: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            number: number.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub const fn number(&self) -> u64 {
        self.number
    }

    pub const fn limit(&self) -> u64 {
        self.limit
    }

    /// Documents before this page, capped at what the store accepts.
    pub const fn skip(&self) -> u64 {
        let skip = self.number.saturating_sub(1).saturating_mul(self.limit);
        if skip > MAX_SKIP { MAX_SKIP } else { skip }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    current_page: u64,
    total_pages: u64,
    total_groups: u64,
}

impl Pagination {
    pub fn new(page: &Page, total: u64) -> Self {
        Self {
            current_page: page.number(),
            total_pages: total.div_ceil(page.limit()),
            total_groups: total,
        }
    }

    pub const fn total_pages(&self) -> u64 {
        self.total_pages
    }

    pub const fn total_groups(&self) -> u64 {
        self.total_groups
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GroupDto {
    id: Id,
    name: String,
    icon: String,
    admin: user::Id,
    members: Vec<user::Id>,
    total_members: usize,
    channel: Option<ChannelRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    admin_details: Option<AdminDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
}

impl GroupDto {
    pub const fn id(&self) -> &Id {
        &self.id
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub const fn admin(&self) -> &user::Id {
        &self.admin
    }

    pub const fn total_members(&self) -> usize {
        self.total_members
    }

    pub const fn admin_details(&self) -> Option<&AdminDto> {
        self.admin_details.as_ref()
    }

    pub fn with_admin(mut self, admin: &User) -> Self {
        self.admin_details = Some(AdminDto::from(admin));
        self
    }
}

impl From<Group> for GroupDto {
    fn from(g: Group) -> Self {
        let channel = g.channel();
        Self {
            total_members: g.members.len(),
            created_at: rfc3339(g.created_at),
            updated_at: rfc3339(g.updated_at),
            id: g.id,
            name: g.name,
            icon: if g.icon.is_empty() {
                DEFAULT_ICON.to_owned()
            } else {
                g.icon
            },
            admin: g.admin,
            members: g.members,
            channel,
            admin_details: None,
        }
    }
}

/// Contact card of a group admin shown in listings.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct AdminDto {
    id: user::Id,
    name: String,
    email: String,
}

impl AdminDto {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl From<&User> for AdminDto {
    fn from(u: &User) -> Self {
        Self {
            id: u.id(),
            name: u.name().to_owned(),
            email: u.email().to_owned(),
        }
    }
}

fn rfc3339(dt: DateTime) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(dt.timestamp_millis()).map(|d| d.to_rfc3339())
}

#[derive(Serialize, Debug)]
pub struct Paginated {
    pub groups: Vec<GroupDto>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod test {
    use super::*;

    fn group() -> Group {
        let admin = user::Id::from("admin");
        Group::new(
            Id::from("group_1_abcdef01"),
            "Compilers",
            "💬",
            admin.clone(),
            vec![admin, user::Id::from("ada")],
        )
    }

    #[test]
    fn should_mirror_id_as_channel() {
        let g = group();

        assert_eq!(g.channel().unwrap().as_str(), g.id().as_str());
    }

    #[test]
    fn should_not_expose_missing_channel() {
        let g = group().without_channel();

        assert!(g.channel().is_none());
    }

    #[test]
    fn should_not_expose_foreign_channel() {
        let mut g = group();
        g.channel = Some(ChannelRef::new("group_2_ffffffff"));

        assert!(g.channel().is_none());
    }

    #[test]
    fn should_normalize_page() {
        assert_eq!(Page::new(None, None), Page::new(Some(1), Some(10)));
        assert_eq!(Page::new(Some(0), Some(0)), Page::new(Some(1), Some(1)));
        assert_eq!(Page::new(Some(3), Some(1000)).limit(), 100);
        assert_eq!(Page::new(Some(3), Some(10)).skip(), 20);
    }

    #[test]
    fn should_saturate_skip_of_huge_page() {
        let page = Page::new(Some(u64::MAX), Some(10));

        assert_eq!(page.number(), u64::MAX);
        assert_eq!(page.skip(), i64::MAX as u64);

        let p = Pagination::new(&page, 25);
        assert_eq!(p.total_pages(), 3);
    }

    #[test]
    fn should_round_total_pages_up() {
        let p = Pagination::new(&Page::new(Some(2), Some(10)), 25);
        assert_eq!(p.total_pages(), 3);

        let p = Pagination::new(&Page::new(Some(1), Some(10)), 20);
        assert_eq!(p.total_pages(), 2);

        let p = Pagination::new(&Page::default(), 0);
        assert_eq!(p.total_pages(), 0);
    }

    #[test]
    fn should_count_members_in_dto() {
        let dto = GroupDto::from(group());

        assert_eq!(dto.total_members(), 2);
    }

    #[test]
    fn should_fall_back_to_default_icon() {
        let admin = user::Id::from("admin");
        let g = Group::new(
            Id::from("group_1_abcdef01"),
            "Compilers",
            "",
            admin.clone(),
            vec![admin],
        );

        assert_eq!(GroupDto::from(g).icon(), "💬");
    }

    #[test]
    fn should_attach_admin_card() {
        let ada = User::new("Ada", "ada@example.com");
        let g = Group::new(
            Id::from("group_1_abcdef01"),
            "Compilers",
            "💬",
            ada.id(),
            vec![ada.id()],
        );

        let dto = GroupDto::from(g).with_admin(&ada);
        let json = serde_json::to_value(&dto).unwrap();

        assert_eq!(json["adminDetails"]["name"], "Ada");
        assert_eq!(json["adminDetails"]["email"], "ada@example.com");
        assert_eq!(json["adminDetails"]["id"], ada.id().as_str());
        assert!(GroupDto::from(group()).admin_details().is_none());
    }

    #[test]
    fn should_accept_legacy_field_names() {
        let params: CreateGroup =
            serde_json::from_str(r#"{"GroupName":"Algo","icon":"📘","members":["a","b"]}"#)
                .unwrap();
        assert_eq!(params.name, "Algo");
        assert_eq!(params.members.len(), 2);

        let params: EditGroup =
            serde_json::from_str(r#"{"groupName":"Algo II","removeMember":"b"}"#).unwrap();
        assert_eq!(params.name.as_deref(), Some("Algo II"));
        assert_eq!(params.remove_member, Some(user::Id::from("b")));
        assert!(params.add_members.is_empty());
    }
}
