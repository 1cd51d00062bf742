use super::{KeyFormat, UserFilter, UserStore};
use crate::{models::User, utils::ApiResult};
use async_trait::async_trait;
use std::sync::{PoisonError, RwLock};

/// In-process user store, for tests and local runs
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
    key_format: KeyFormat,
}

impl MemoryUserStore {
    pub fn new(key_format: KeyFormat) -> Self {
        Self {
            users: RwLock::new(Vec::new()),
            key_format,
        }
    }

    pub fn with_users(key_format: KeyFormat, users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().collect()),
            key_format,
        }
    }

    pub fn insert(&self, user: User) {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(user);
    }

    pub fn len(&self) -> usize {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_one(&self, filter: &UserFilter) -> ApiResult<Option<User>> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.iter().find(|user| filter.matches(user)).cloned())
    }

    fn key_format(&self) -> KeyFormat {
        self.key_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, username: &str) -> User {
        User {
            id: id.to_string(),
            username: username.to_string(),
            email: Some(format!("{username}@example.com")),
            email_address: None,
            password_hash: "hash".to_string(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let store = MemoryUserStore::with_users(
            KeyFormat::Text,
            [user("u1", "alice"), user("alice", "mallory")],
        );

        let found = store
            .find_one(&UserFilter::identifier("alice", KeyFormat::Text))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, "u1");
    }

    #[tokio::test]
    async fn test_insert_and_miss() {
        let store = MemoryUserStore::new(KeyFormat::Text);
        assert!(store.is_empty());
        store.insert(user("u2", "bob"));
        assert_eq!(store.len(), 1);

        let missing = store.find_one(&UserFilter::id("u9")).await.unwrap();
        assert!(missing.is_none());
    }
}
