use async_trait::async_trait;
use sqlx::PgPool;

use super::{NewUser, StoreError, User, UserStore};

const SELECT_USER: &str = r#"
    SELECT id, nombre AS name, correo AS email, contrasena AS password_hash
    FROM usuarios
"#;

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("{SELECT_USER} WHERE lower(correo) = lower($1)");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn create(&self, new: NewUser<'_>) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO usuarios (nombre, correo, contrasena)
            VALUES ($1, $2, $3)
            RETURNING id, nombre AS name, correo AS email, contrasena AS password_hash
            "#,
        )
        .bind(new.name)
        .bind(new.email)
        .bind(new.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::EmailTaken,
            other => StoreError::Database(other),
        })
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(r#"UPDATE usuarios SET contrasena = $1 WHERE id = $2"#)
            .bind(password_hash)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
