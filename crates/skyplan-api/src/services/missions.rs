//! Project-scoped mission collections.
//!
//! All missions for one project live in a single JSON document under the
//! key `missions-{project_id}`. Every mutation is a full read-modify-write
//! of that document and runs under the project's lock; without it two
//! concurrent writers would silently drop each other's missions.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use skyplan_core::error::{Result, SkyplanError};
use skyplan_core::ingest::{self, MissionInput, MissionPatch};
use skyplan_core::models::Mission;
use skyplan_core::ports::DocumentStore;
use skyplan_store::KeyedLocks;

/// CRUD service over per-project mission collections.
pub struct MissionRegistry {
    store: Arc<dyn DocumentStore>,
    locks: KeyedLocks,
}

impl MissionRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }

    fn key(project_id: &str) -> String {
        format!("missions-{project_id}")
    }

    /// List a project's missions.
    pub async fn list(&self, project_id: &str) -> Result<Vec<Mission>> {
        let key = Self::key(project_id);
        let _guard = self.locks.acquire(&key).await;
        self.load(&key).await
    }

    /// Fetch one mission by id.
    pub async fn get(&self, project_id: &str, mission_id: &str) -> Result<Mission> {
        let key = Self::key(project_id);
        let _guard = self.locks.acquire(&key).await;

        let missions = self.load(&key).await?;
        find_position(&missions, mission_id)
            .map(|position| missions[position].clone())
            .ok_or_else(|| not_found(mission_id))
    }

    /// Create a mission and append it to the project collection.
    pub async fn create(&self, project_id: &str, input: MissionInput) -> Result<Mission> {
        let key = Self::key(project_id);
        let _guard = self.locks.acquire(&key).await;

        let mut missions = self.load(&key).await?;
        let mission = ingest::build_mission(input)?;
        missions.push(mission.clone());
        self.save(&key, &missions).await?;

        tracing::info!(
            project_id = %project_id,
            mission_id = %mission.id,
            feature_count = mission.geometry.len(),
            "Created mission"
        );
        Ok(mission)
    }

    /// Patch an existing mission in place.
    pub async fn update(
        &self,
        project_id: &str,
        mission_id: &str,
        patch: MissionPatch,
    ) -> Result<Mission> {
        let key = Self::key(project_id);
        let _guard = self.locks.acquire(&key).await;

        let mut missions = self.load(&key).await?;
        let position =
            find_position(&missions, mission_id).ok_or_else(|| not_found(mission_id))?;

        let updated = ingest::apply_update(&missions[position], patch)?;
        missions[position] = updated.clone();
        self.save(&key, &missions).await?;

        tracing::info!(project_id = %project_id, mission_id = %mission_id, "Updated mission");
        Ok(updated)
    }

    /// Remove a mission from the project collection.
    pub async fn delete(&self, project_id: &str, mission_id: &str) -> Result<()> {
        let key = Self::key(project_id);
        let _guard = self.locks.acquire(&key).await;

        let mut missions = self.load(&key).await?;
        let position =
            find_position(&missions, mission_id).ok_or_else(|| not_found(mission_id))?;

        missions.remove(position);
        self.save(&key, &missions).await?;

        tracing::info!(project_id = %project_id, mission_id = %mission_id, "Deleted mission");
        Ok(())
    }

    /// Load a project collection, dropping records that no longer
    /// deserialize as missions. A cleaned collection is written back
    /// immediately.
    async fn load(&self, key: &str) -> Result<Vec<Mission>> {
        let Some(document) = self.store.get_document(key).await? else {
            return Ok(Vec::new());
        };

        let raw: Vec<Value> = serde_json::from_value(document)
            .map_err(|e| SkyplanError::Serialization(e.to_string()))?;

        let total = raw.len();
        let missions: Vec<Mission> = raw
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect();

        if missions.len() != total {
            tracing::warn!(
                key = %key,
                dropped = total - missions.len(),
                "Dropped malformed mission records"
            );
            self.save(key, &missions).await?;
        }

        Ok(missions)
    }

    async fn save(&self, key: &str, missions: &[Mission]) -> Result<()> {
        let document = serde_json::to_value(missions)
            .map_err(|e| SkyplanError::Serialization(e.to_string()))?;
        self.store.put_document(key, document).await
    }
}

fn find_position(missions: &[Mission], mission_id: &str) -> Option<usize> {
    let id = Uuid::parse_str(mission_id).ok()?;
    missions.iter().position(|mission| mission.id == id)
}

fn not_found(mission_id: &str) -> SkyplanError {
    SkyplanError::MissionNotFound {
        id: mission_id.to_string(),
    }
}
