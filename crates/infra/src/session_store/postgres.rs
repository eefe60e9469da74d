//! Postgres-backed session store.
//!
//! `refresh_token` carries a UNIQUE constraint; rotation is a single
//! `UPDATE ... WHERE refresh_token = $old RETURNING ...`, so the row lock taken
//! by the first writer makes every later rotation of the same token match zero
//! rows.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use pbac_auth::Session;
use pbac_core::SessionId;

use super::r#trait::SessionStore;
use crate::error::{StoreError, map_sqlx_error};

#[derive(Debug, Clone)]
pub struct PostgresSessionStore {
    pool: Arc<PgPool>,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn session_from_row(row: &PgRow) -> Result<Session, StoreError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode session", e);
    Ok(Session {
        id: SessionId::from_uuid(row.try_get("id").map_err(decode)?),
        refresh_token: row.try_get("refresh_token").map_err(decode)?,
        access_token: row.try_get("access_token").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
        rotated_at: row.try_get("rotated_at").map_err(decode)?,
    })
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    #[instrument(skip_all, err)]
    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, refresh_token, access_token, created_at, rotated_at
            FROM sessions
            WHERE refresh_token = $1
            "#,
        )
        .bind(refresh_token)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_refresh_token", e))?;

        row.as_ref().map(session_from_row).transpose()
    }

    #[instrument(skip_all, fields(session_id = %session.id), err)]
    async fn insert(&self, session: Session) -> Result<Session, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO sessions (id, refresh_token, access_token, created_at, rotated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, refresh_token, access_token, created_at, rotated_at
            "#,
        )
        .bind(session.id.as_uuid())
        .bind(&session.refresh_token)
        .bind(&session.access_token)
        .bind(session.created_at)
        .bind(session.rotated_at)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_session", e))?;

        session_from_row(&row)
    }

    #[instrument(skip_all, err)]
    async fn rotate(
        &self,
        old_refresh_token: &str,
        new_access_token: &str,
        new_refresh_token: &str,
    ) -> Result<Session, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE sessions
            SET access_token = $1, refresh_token = $2, rotated_at = NOW()
            WHERE refresh_token = $3
            RETURNING id, refresh_token, access_token, created_at, rotated_at
            "#,
        )
        .bind(new_access_token)
        .bind(new_refresh_token)
        .bind(old_refresh_token)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("rotate_session", e))?;

        match row {
            Some(row) => session_from_row(&row),
            None => Err(StoreError::not_found("no session matches the refresh token")),
        }
    }
}
