use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use officemate_core::route::{build_route_pair, RoutePreference, RoutePreferencesInput, RouteType};
use officemate_core::storage::{RepositoryError, RoutePreferenceRepository};

/// Commute legs for a user. Saving always writes both directions.
#[derive(Clone)]
pub struct RoutePreferenceService {
    routes: Arc<dyn RoutePreferenceRepository>,
}

impl RoutePreferenceService {
    pub fn new(routes: Arc<dyn RoutePreferenceRepository>) -> Self {
        Self { routes }
    }

    /// Stores the home-to-work leg from `input` and its reverse.
    pub async fn save_route_preferences(
        &self,
        user_id: Uuid,
        input: &RoutePreferencesInput,
    ) -> Result<Vec<RoutePreference>> {
        let created_at = self
            .routes
            .get_preference(user_id, RouteType::HomeToWork)
            .await?
            .map(|existing| existing.created_at);

        let pair = build_route_pair(user_id, input, created_at, Utc::now())?;
        for leg in &pair {
            self.routes.save_preference(leg).await?;
        }

        tracing::info!(
            user_id = %user_id,
            start_times = input.preferred_start_times.len(),
            "Route preferences saved"
        );
        Ok(pair.to_vec())
    }

    pub async fn get_route_preference(
        &self,
        user_id: Uuid,
        route_type: RouteType,
    ) -> Result<RoutePreference> {
        Ok(self
            .routes
            .get_preference(user_id, route_type)
            .await?
            .ok_or_else(|| {
                RepositoryError::not_found("RoutePreference", format!("{user_id}/{route_type}"))
            })?)
    }

    pub async fn list_route_preferences(&self, user_id: Uuid) -> Result<Vec<RoutePreference>> {
        let mut preferences = self.routes.list_preferences(user_id).await?;
        preferences.sort_by_key(|p| p.route_type.as_str());
        Ok(preferences)
    }

    pub async fn delete_route_preferences(&self, user_id: Uuid) -> Result<()> {
        self.routes.delete_preferences(user_id).await?;
        tracing::info!(user_id = %user_id, "Route preferences deleted");
        Ok(())
    }
}
