use std::sync::Mutex;

use async_trait::async_trait;

use super::{NewUser, StoreError, User, UserStore};

/// In-process store for router tests; mirrors the unique index on
/// `lower(correo)` and the case-insensitive lookup.
#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn stored_hash(&self, email: &str) -> Option<String> {
        let rows = self.rows.lock().unwrap();
        rows.iter()
            .find(|u| same_email(&u.email, email))
            .map(|u| u.password_hash.clone())
    }
}

fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| same_email(&u.email, email)).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new: NewUser<'_>) -> Result<User, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|u| same_email(&u.email, new.email)) {
            return Err(StoreError::EmailTaken);
        }
        let user = User {
            id: rows.len() as i32 + 1,
            name: new.name.to_string(),
            email: new.email.to_string(),
            password_hash: new.password_hash.to_string(),
        };
        rows.push(user.clone());
        Ok(user)
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user<'a>(email: &'a str) -> NewUser<'a> {
        NewUser {
            name: "Ana",
            email,
            password_hash: "$2b$04$hash",
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = MemoryUserStore::default();
        let first = store.create(new_user("ana@padel.es")).await.expect("first insert");
        assert_eq!(first.id, 1);

        let err = store.create(new_user("ana@padel.es")).await.unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken));
    }

    #[tokio::test]
    async fn email_matching_ignores_case() {
        let store = MemoryUserStore::default();
        store.create(new_user("Ana@Padel.es")).await.unwrap();

        let found = store.find_by_email("ana@padel.es").await.unwrap().unwrap();
        assert_eq!(found.email, "Ana@Padel.es");

        let err = store.create(new_user("ANA@PADEL.ES")).await.unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken));
    }

    #[tokio::test]
    async fn update_password_reports_missing_row() {
        let store = MemoryUserStore::default();
        let user = store.create(new_user("ana@padel.es")).await.unwrap();

        assert!(store.update_password(user.id, "new").await.unwrap());
        assert!(!store.update_password(99, "new").await.unwrap());
        assert_eq!(store.stored_hash("ana@padel.es").as_deref(), Some("new"));
    }
}
