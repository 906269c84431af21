use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use notepad_core::domain::User;
use notepad_core::error::RepoError;
use notepad_core::pagination::{Page, PageRequest};
use notepad_core::ports::{BaseRepository, UserFilter, UserRepository};

use super::{matches_search, paginate};

/// User store backed by a `HashMap` behind an async `RwLock`.
///
/// Enforces the same uniqueness rules as the `users` table.
#[derive(Default)]
pub struct InMemoryUserRepository {
    store: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn conflicts(store: &HashMap<Uuid, User>, user: &User) -> Option<RepoError> {
        store.values().filter(|u| u.id != user.id).find_map(|u| {
            if u.email == user.email {
                Some(RepoError::Constraint("Email already registered".to_string()))
            } else if u.username == user.username {
                Some(RepoError::Constraint("Username already taken".to_string()))
            } else {
                None
            }
        })
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;
        if store.contains_key(&user.id) {
            return Err(RepoError::Constraint("User already exists".to_string()));
        }
        if let Some(err) = Self::conflicts(&store, &user) {
            return Err(err);
        }
        store.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;
        if !store.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        if let Some(err) = Self::conflicts(&store, &user) {
            return Err(err);
        }
        store.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|u| u.username == username).cloned())
    }

    async fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<Page<User>, RepoError> {
        let store = self.store.read().await;
        let mut users: Vec<User> = store
            .values()
            .filter(|u| {
                matches_search(&u.username, &filter.search) || matches_search(&u.email, &filter.search)
            })
            .cloned()
            .collect();
        users.sort_by_cached_key(|u| (u.username.to_lowercase(), u.username.clone()));

        Ok(paginate(&users, page))
    }

    async fn clear_expired_blocks(&self, now: DateTime<Utc>) -> Result<u64, RepoError> {
        let mut store = self.store.write().await;
        let mut cleared = 0;
        for user in store.values_mut() {
            if user.blocked_until.is_some_and(|until| until <= now) {
                user.unblock(now);
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}
