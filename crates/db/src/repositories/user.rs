//! User repository.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use tally_core::auth::User;
use tally_core::store::{StoreResult, UserStore};
use tally_shared::types::UserId;
use uuid::Uuid;

use super::convert::{user_from_row, user_to_row};
use super::store_err;
use crate::entities::users;

/// Users backed by the `users` table.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        user_to_row(user).insert(&self.db).await.map_err(store_err)?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = users::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?;
        Ok(row.map(user_from_row))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(store_err)?;
        Ok(row.map(user_from_row))
    }

    async fn update_user(&self, user: &User) -> StoreResult<bool> {
        let mut row = user_to_row(user);
        row.id = sea_orm::ActiveValue::Unchanged(user.id.into_inner());
        let result = users::Entity::update_many()
            .set(row)
            .filter(users::Column::Id.eq(user.id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .order_by_asc(users::Column::Email)
            .all(&self.db)
            .await
            .map_err(store_err)?;
        Ok(rows.into_iter().map(user_from_row).collect())
    }

    async fn consume_reset_token(
        &self,
        id: UserId,
        token_id: Uuid,
        password_hash: &str,
    ) -> StoreResult<bool> {
        // The token-id guard makes concurrent resets with one token race to a single winner.
        let result = users::Entity::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(users::Column::ResetTokenId, Expr::value(Option::<Uuid>::None))
            .filter(users::Column::Id.eq(id.into_inner()))
            .filter(users::Column::ResetTokenId.eq(token_id))
            .exec(&self.db)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected > 0)
    }
}
