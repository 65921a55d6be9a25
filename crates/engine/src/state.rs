//! Per-user scalar persistence.
//!
//! Every expense operation receives a [`UserState`] explicitly; `get`/`set`
//! are its only accessors, so the counter and the active spreadsheet URL are
//! never held in process memory between requests.

use async_trait::async_trait;
use sea_orm::{ActiveValue, DatabaseConnection, prelude::*, sea_query::OnConflict};

use crate::{ResultEngine, user_properties};

/// Key holding the next expense id, as decimal digits.
pub const COUNTER_KEY: &str = "EXPENSE_ID";
/// Key holding the URL of the active spreadsheet.
pub const LOCATION_KEY: &str = "SPREADSHEET_URL";

#[async_trait]
pub trait UserState: Send + Sync {
    async fn get(&self, key: &str) -> ResultEngine<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> ResultEngine<()>;
}

/// [`UserState`] stored in the `user_properties` table.
#[derive(Clone, Debug)]
pub struct UserProperties {
    database: DatabaseConnection,
    user_id: String,
}

impl UserProperties {
    pub fn new(database: DatabaseConnection, user_id: &str) -> Self {
        Self {
            database,
            user_id: user_id.to_string(),
        }
    }
}

#[async_trait]
impl UserState for UserProperties {
    async fn get(&self, key: &str) -> ResultEngine<Option<String>> {
        let property =
            user_properties::Entity::find_by_id((self.user_id.clone(), key.to_string()))
                .one(&self.database)
                .await?;
        Ok(property.map(|p| p.value))
    }

    async fn set(&self, key: &str, value: &str) -> ResultEngine<()> {
        let model = user_properties::ActiveModel {
            user_id: ActiveValue::Set(self.user_id.clone()),
            key: ActiveValue::Set(key.to_string()),
            value: ActiveValue::Set(value.to_string()),
        };
        user_properties::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    user_properties::Column::UserId,
                    user_properties::Column::Key,
                ])
                .update_column(user_properties::Column::Value)
                .to_owned(),
            )
            .exec_without_returning(&self.database)
            .await?;
        Ok(())
    }
}
