//! DynamoDB repository implementation.
//!
//! Implements `RoutePreferenceRepository` from `officemate_core::storage`.

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use uuid::Uuid;

use officemate_core::route::{RoutePreference, RouteType};
use officemate_core::storage::{Result, RoutePreferenceRepository};

use super::conversions::{item_to_preference, preference_to_item};
use super::error::{map_preference_error, PreferenceOp};
use super::keys::{self, PARTITION_KEY};

/// DynamoDB-backed store for commute route preferences.
#[derive(Debug, Clone)]
pub struct DynamoDbRepository {
    client: Client,
    table_name: String,
}

impl DynamoDbRepository {
    /// Creates a new repository with the given DynamoDB client and table name.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Creates a repository from an already loaded AWS SDK config.
    pub fn from_sdk_config(config: &aws_config::SdkConfig, table_name: impl Into<String>) -> Self {
        Self::new(Client::new(config), table_name)
    }
}

#[async_trait]
impl RoutePreferenceRepository for DynamoDbRepository {
    async fn save_preference(&self, preference: &RoutePreference) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(preference_to_item(preference)))
            .send()
            .await
            .map_err(|e| map_preference_error(e, PreferenceOp::Save, preference.user_id))?;

        tracing::debug!(
            user_id = %preference.user_id,
            route_type = %preference.route_type,
            "Saved route preference"
        );
        Ok(())
    }

    async fn get_preference(
        &self,
        user_id: Uuid,
        route_type: RouteType,
    ) -> Result<Option<RoutePreference>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(keys::route_key(user_id, route_type)))
            .send()
            .await
            .map_err(|e| map_preference_error(e, PreferenceOp::Get, user_id))?;

        match result.item {
            Some(item) => Ok(Some(item_to_preference(&item)?)),
            None => Ok(None),
        }
    }

    async fn list_preferences(&self, user_id: Uuid) -> Result<Vec<RoutePreference>> {
        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("#pk = :pk")
            .expression_attribute_names("#pk", PARTITION_KEY)
            .expression_attribute_values(":pk", keys::user_pk(user_id))
            .send()
            .await
            .map_err(|e| map_preference_error(e, PreferenceOp::List, user_id))?;

        let items = result.items.unwrap_or_default();
        items.iter().map(item_to_preference).collect()
    }

    async fn delete_preferences(&self, user_id: Uuid) -> Result<()> {
        // At most one item per route type.
        for route_type in [RouteType::HomeToWork, RouteType::WorkToHome] {
            self.client
                .delete_item()
                .table_name(&self.table_name)
                .set_key(Some(keys::route_key(user_id, route_type)))
                .send()
                .await
                .map_err(|e| map_preference_error(e, PreferenceOp::Delete, user_id))?;
        }

        tracing::debug!(user_id = %user_id, "Deleted route preferences");
        Ok(())
    }
}
