//! Postgres-backed user store.
//!
//! The role graph lives in join tables (`users_roles`, `roles_permissions`)
//! and is loaded with a single LEFT JOIN; rows are folded back into one
//! `User` with its roles and permissions.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use pbac_auth::{Permission, Role, User};
use pbac_core::UserId;

use super::r#trait::UserStore;
use crate::error::{StoreError, map_sqlx_error};

const SELECT_USER_GRAPH: &str = r#"
    SELECT
        u.id,
        u.username,
        u.email,
        u.password_hash,
        u.active,
        r.name AS role_name,
        p.name AS permission_name
    FROM users u
    LEFT JOIN users_roles ur ON ur.user_id = u.id
    LEFT JOIN roles r ON r.id = ur.role_id
    LEFT JOIN roles_permissions rp ON rp.role_id = r.id
    LEFT JOIN permissions p ON p.id = rp.permission_id
"#;

#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: Arc<PgPool>,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn find_where(
        &self,
        column: &'static str,
        value: &str,
    ) -> Result<Option<User>, StoreError> {
        let sql = format!("{SELECT_USER_GRAPH} WHERE u.{column} = $1 ORDER BY r.name, p.name");
        let rows = sqlx::query(&sql)
            .bind(value)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user", e))?;

        fold_user_rows(&rows)
    }
}

/// Fold the flattened join rows of one user into a `User`.
fn fold_user_rows(rows: &[PgRow]) -> Result<Option<User>, StoreError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode user", e);

    let Some(first) = rows.first() else {
        return Ok(None);
    };

    let mut user = User {
        id: UserId::from_uuid(first.try_get("id").map_err(decode)?),
        username: first.try_get("username").map_err(decode)?,
        email: first.try_get("email").map_err(decode)?,
        password_hash: first.try_get("password_hash").map_err(decode)?,
        active: first.try_get("active").map_err(decode)?,
        roles: Vec::new(),
    };

    for row in rows {
        let role_name: Option<String> = row.try_get("role_name").map_err(decode)?;
        let permission: Option<String> = row.try_get("permission_name").map_err(decode)?;

        let Some(role_name) = role_name else {
            continue;
        };

        // Rows arrive ordered by role name, so a role's rows are contiguous.
        if user.roles.last().map(|r| r.name.as_str()) != Some(role_name.as_str()) {
            user.roles.push(Role::new(role_name, []));
        }
        if let (Some(role), Some(permission)) = (user.roles.last_mut(), permission) {
            role.permissions.push(Permission::new(permission));
        }
    }

    Ok(Some(user))
}

async fn upsert_named(
    tx: &mut Transaction<'_, Postgres>,
    table: &'static str,
    name: &str,
) -> Result<i64, StoreError> {
    let sql = format!(
        "INSERT INTO {table} (name) VALUES ($1) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id"
    );
    let row = sqlx::query(&sql)
        .bind(name)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("upsert_role_graph", e))?;
    row.try_get("id")
        .map_err(|e| map_sqlx_error("upsert_role_graph", e))
}

#[async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self), err)]
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.find_where("username", username).await
    }

    #[instrument(skip(self), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_where("email", email).await
    }

    #[instrument(skip_all, fields(username = %user.username), err)]
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_insert_user", e))?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, active)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.active)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        for role in &user.roles {
            let role_id = upsert_named(&mut tx, "roles", role.name()).await?;

            sqlx::query(
                "INSERT INTO users_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user.id.as_uuid())
            .bind(role_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_user_role", e))?;

            for permission in &role.permissions {
                let permission_id = upsert_named(&mut tx, "permissions", permission.as_str()).await?;

                sqlx::query(
                    "INSERT INTO roles_permissions (role_id, permission_id) VALUES ($1, $2) \
                     ON CONFLICT DO NOTHING",
                )
                .bind(role_id)
                .bind(permission_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("insert_role_permission", e))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_insert_user", e))?;

        Ok(user)
    }

    #[instrument(skip(self), err)]
    async fn set_active(&self, username: &str, active: bool) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET active = $1 WHERE username = $2")
            .bind(active)
            .bind(username)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_active", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("user {username}")));
        }
        Ok(())
    }
}
