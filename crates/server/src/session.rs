//! Session store: durable records anchoring one login each.
//!
//! This is the only place session rows are created or mutated. The resolver
//! consults it during refresh, and the session endpoints use it for listing
//! and revocation. A session never transitions back to valid.

use crate::entity::session;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::sync::Arc;
use time::OffsetDateTime;

#[derive(Clone)]
pub struct SessionStore {
    db: Arc<DatabaseConnection>,
}

impl SessionStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Record a new login. The returned session id is what issued
    /// credentials reference.
    #[tracing::instrument(skip(self))]
    pub async fn create(
        &self,
        user_id: &str,
        user_agent: &str,
    ) -> Result<session::Model, sea_orm::DbErr> {
        let now = OffsetDateTime::now_utc();
        let model = session::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            user_agent: Set(user_agent.to_string()),
            valid: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        model.insert(self.db.as_ref()).await
    }

    /// All still-valid sessions for a user, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn find_active(&self, user_id: &str) -> Result<Vec<session::Model>, sea_orm::DbErr> {
        session::Entity::find()
            .filter(session::Column::UserId.eq(user_id))
            .filter(session::Column::Valid.eq(true))
            .order_by_desc(session::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
    }

    /// Lookup used by the resolver during refresh. Callers treat "not
    /// found" and "found but invalid" the same way: refresh denied.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: &str) -> Result<Option<session::Model>, sea_orm::DbErr> {
        session::Entity::find_by_id(id).one(self.db.as_ref()).await
    }

    /// Revoke a session. Idempotent: revoking an already-invalid or unknown
    /// session succeeds without changing anything.
    #[tracing::instrument(skip(self))]
    pub async fn invalidate(&self, id: &str) -> Result<(), sea_orm::DbErr> {
        let result = session::Entity::update_many()
            .col_expr(
                session::Column::Valid,
                sea_orm::sea_query::Expr::value(false),
            )
            .col_expr(
                session::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(OffsetDateTime::now_utc()),
            )
            .filter(session::Column::Id.eq(id))
            .filter(session::Column::Valid.eq(true))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected > 0 {
            tracing::info!(session_id = id, "session revoked");
        }
        Ok(())
    }
}
