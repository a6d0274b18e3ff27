//! Notification repository.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use tally_core::notification::Notification;
use tally_core::store::{NotificationStore, StoreResult};
use tally_shared::types::{NotificationId, UserId};

use super::convert::{notification_from_row, notification_to_row};
use super::store_err;
use crate::entities::notifications;

/// Notifications backed by the `notifications` table.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        notification_to_row(notification)
            .insert(&self.db)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn list_notifications(
        &self,
        user: UserId,
        limit: u64,
    ) -> StoreResult<Vec<Notification>> {
        let rows = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user.into_inner()))
            .order_by_desc(notifications::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(store_err)?;
        rows.into_iter().map(notification_from_row).collect()
    }

    async fn count_unread(&self, user: UserId) -> StoreResult<u64> {
        notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user.into_inner()))
            .filter(notifications::Column::Read.eq(false))
            .count(&self.db)
            .await
            .map_err(store_err)
    }

    async fn mark_read(&self, user: UserId, id: NotificationId) -> StoreResult<bool> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::Read, Expr::value(true))
            .filter(notifications::Column::Id.eq(id.into_inner()))
            .filter(notifications::Column::UserId.eq(user.into_inner()))
            .exec(&self.db)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn mark_all_read(&self, user: UserId) -> StoreResult<u64> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::Read, Expr::value(true))
            .filter(notifications::Column::UserId.eq(user.into_inner()))
            .filter(notifications::Column::Read.eq(false))
            .exec(&self.db)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected)
    }
}
