//! Member-set arithmetic shared by group operations.
//!
//! Member lists are kept as vectors for storage, but every helper here
//! returns duplicate-free output in first-seen order.

use std::collections::HashSet;

use crate::user::{self, model::User};

/// `ids` without repeats, first occurrence wins.
pub fn dedup(ids: &[user::Id]) -> Vec<user::Id> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}

/// Union of `{admin}` and `requested`, admin first.
pub fn canonical(admin: &user::Id, requested: &[user::Id]) -> Vec<user::Id> {
    let mut all = Vec::with_capacity(requested.len() + 1);
    all.push(admin.clone());
    all.extend_from_slice(requested);
    dedup(&all)
}

/// Ids in `requested` that none of `found` resolves to.
pub fn missing(requested: &[user::Id], found: &[User]) -> Vec<user::Id> {
    let found = found.iter().map(User::id).collect::<HashSet<_>>();
    dedup(requested)
        .into_iter()
        .filter(|id| !found.contains(id))
        .collect()
}

/// Ids in `requested` not yet in `current`.
pub fn additions(current: &[user::Id], requested: &[user::Id]) -> Vec<user::Id> {
    let current = current.iter().collect::<HashSet<_>>();
    dedup(requested)
        .into_iter()
        .filter(|id| !current.contains(id))
        .collect()
}
