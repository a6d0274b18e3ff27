//! Quote repository.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tally_core::quote::{Quote, QuoteDeletion, QuoteFilter, QuoteStatus};
use tally_core::store::{QuoteStore, StoreResult};
use tally_shared::types::QuoteId;

use super::convert::{quote_from_row, quote_to_row};
use super::{store_err, within_days};
use crate::entities::quotes;

/// Escapes `%`, `_` and `\` so the needle matches literally.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Quotes backed by the `quotes` table.
#[derive(Debug, Clone)]
pub struct QuoteRepository {
    db: DatabaseConnection,
}

impl QuoteRepository {
    /// Creates a new quote repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl QuoteStore for QuoteRepository {
    async fn insert_quote(&self, quote: &Quote) -> StoreResult<()> {
        quote_to_row(quote)?
            .insert(&self.db)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn get_quote(&self, id: QuoteId) -> StoreResult<Option<Quote>> {
        quotes::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_err)?
            .map(quote_from_row)
            .transpose()
    }

    async fn replace_quote(&self, quote: &Quote, expected: QuoteStatus) -> StoreResult<bool> {
        let mut row = quote_to_row(quote)?;
        row.id = ActiveValue::Unchanged(quote.id.into_inner());
        let result = quotes::Entity::update_many()
            .set(row)
            .filter(quotes::Column::Id.eq(quote.id.into_inner()))
            .filter(quotes::Column::Status.eq(expected.as_str()))
            .exec(&self.db)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_quote(&self, id: QuoteId) -> StoreResult<QuoteDeletion> {
        let txn = self.db.begin().await.map_err(store_err)?;

        let Some(row) = quotes::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(store_err)?
        else {
            return Ok(QuoteDeletion::NotFound);
        };
        if row.status == QuoteStatus::Invoiced.as_str() {
            return Ok(QuoteDeletion::Invoiced);
        }

        quotes::Entity::delete_by_id(row.id)
            .exec(&txn)
            .await
            .map_err(store_err)?;
        txn.commit().await.map_err(store_err)?;
        Ok(QuoteDeletion::Deleted)
    }

    async fn list_quotes(&self, filter: &QuoteFilter) -> StoreResult<Vec<Quote>> {
        let mut query = quotes::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(quotes::Column::Status.eq(status.as_str()));
        }
        let rows = within_days(query, quotes::Column::CreatedAt, filter.from, filter.to)
            .order_by_desc(quotes::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_err)?;
        rows.into_iter().map(quote_from_row).collect()
    }

    async fn search_quotes(&self, text: &str) -> StoreResult<Vec<Quote>> {
        let pattern = like_pattern(&text.trim().to_lowercase());
        let matches = |column: quotes::Column| {
            Expr::expr(Func::lower(Expr::col(column)))
                .like(LikeExpr::new(pattern.clone()).escape('\\'))
        };
        let rows = quotes::Entity::find()
            .filter(
                Condition::any()
                    .add(matches(quotes::Column::Number))
                    .add(matches(quotes::Column::CustomerName))
                    .add(matches(quotes::Column::CustomerCompany))
                    .add(matches(quotes::Column::CustomerEmail)),
            )
            .order_by_desc(quotes::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(store_err)?;
        rows.into_iter().map(quote_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
        assert_eq!(like_pattern("ana"), "%ana%");
    }

    proptest! {
        #[test]
        fn prop_unescaping_restores_needle(needle in ".{0,24}") {
            let pattern = like_pattern(&needle);
            let inner = &pattern[1..pattern.len() - 1];
            let mut restored = String::new();
            let mut chars = inner.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    let escaped = chars.next();
                    prop_assert!(matches!(escaped, Some('%' | '_' | '\\')));
                    restored.extend(escaped);
                } else {
                    prop_assert!(c != '%' && c != '_');
                    restored.push(c);
                }
            }
            prop_assert_eq!(restored, needle);
        }
    }
}
