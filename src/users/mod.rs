use serde::{Deserialize, Serialize};

use crate::store::MemStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Technician,
}

/// Staff account. The password is stored as given; credential checks and
/// response scrubbing are the route layer's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub role: UserRole,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
    pub role: UserRole,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl MemStore {
    pub async fn create_user(&self, data: CreateUser) -> User {
        let user = self
            .users
            .insert(|id| User {
                id,
                username: data.username.clone(),
                password: data.password.clone(),
                role: data.role,
                full_name: data.full_name.clone(),
                email: data.email.clone(),
                phone: data.phone.clone(),
            })
            .await;
        log::info!("created user {} ({:?})", user.username, user.role);
        user
    }

    pub async fn get_user(&self, id: i64) -> Option<User> {
        self.users.get(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.users
            .all()
            .await
            .into_iter()
            .find(|u| u.username == username)
    }

    pub async fn update_user(&self, id: i64, update: UserUpdate) -> Option<User> {
        self.users
            .modify(id, |user| {
                if let Some(password) = update.password {
                    user.password = password;
                }
                if let Some(role) = update.role {
                    user.role = role;
                }
                if let Some(full_name) = update.full_name {
                    user.full_name = full_name;
                }
                if let Some(email) = update.email {
                    user.email = Some(email);
                }
                if let Some(phone) = update.phone {
                    user.phone = Some(phone);
                }
            })
            .await
    }

    pub async fn list_users(&self) -> Vec<User> {
        self.users.all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn technician(username: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            password: "hunter2".to_string(),
            role: UserRole::Technician,
            full_name: format!("{username} full"),
            email: None,
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_by_username() {
        let store = MemStore::default();
        let created = store.create_user(technician("alex")).await;
        assert_eq!(created.id, 1);

        let found = store.get_user_by_username("alex").await;
        assert_eq!(found.map(|u| u.id), Some(created.id));
        assert!(store.get_user_by_username("nobody").await.is_none());
    }

    #[tokio::test]
    async fn test_update_merges_only_provided_fields() {
        let store = MemStore::default();
        let user = store.create_user(technician("sam")).await;

        let updated = store
            .update_user(
                user.id,
                UserUpdate {
                    role: Some(UserRole::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, UserRole::Admin);
        assert_eq!(updated.username, "sam");
        assert_eq!(updated.password, "hunter2");

        assert!(store.update_user(999, UserUpdate::default()).await.is_none());
    }
}
