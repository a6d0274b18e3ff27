//! Business settings repository.

use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait};
use tally_core::settings::BusinessSettings;
use tally_core::store::{SettingsStore, StoreResult};
use uuid::Uuid;

use super::convert::{from_json, to_json};
use super::store_err;
use crate::entities::business_settings::{self, SINGLETON_ID};

/// Settings stored as one JSONB document.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    db: DatabaseConnection,
}

impl SettingsRepository {
    /// Creates a new settings repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    async fn load_settings(&self) -> StoreResult<Option<BusinessSettings>> {
        let row = business_settings::Entity::find_by_id(SINGLETON_ID)
            .one(&self.db)
            .await
            .map_err(store_err)?;
        row.map(|row| from_json("settings", Uuid::nil(), row.data))
            .transpose()
    }

    async fn save_settings(&self, settings: &BusinessSettings) -> StoreResult<()> {
        let row = business_settings::ActiveModel {
            id: Set(SINGLETON_ID),
            data: Set(to_json(settings)?),
            updated_at: Set(settings.updated_at.into()),
        };
        business_settings::Entity::insert(row)
            .on_conflict(
                OnConflict::column(business_settings::Column::Id)
                    .update_columns([
                        business_settings::Column::Data,
                        business_settings::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(store_err)?;
        Ok(())
    }
}
