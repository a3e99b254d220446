use std::sync::Arc;

use tracing::info;

use crate::error::{AppError, AppResult};
use crate::storage::{AssessmentStore, RomRecord};

/// Range-of-motion submission and retrieval.
///
/// Submissions append to an assessment's record set and never touch its
/// status.
pub struct RomService<S> {
    store: Arc<S>,
}

impl<S> Clone for RomService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> RomService<S>
where
    S: AssessmentStore,
{
    /// Create a new ROM service
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Attach a ROM payload to an existing assessment
    pub async fn submit(&self, assessment_id: &str, payload: serde_json::Value) -> AppResult<RomRecord> {
        self.store
            .get_assessment(assessment_id)
            .await?
            .ok_or_else(|| AppError::assessment_not_found(assessment_id))?;

        let record = RomRecord::new(assessment_id, payload);
        self.store.append_rom(&record).await?;

        info!(
            assessment_id = %assessment_id,
            rom_id = %record.id,
            "ROM analysis submitted"
        );

        Ok(record)
    }

    /// Get all ROM records for an assessment
    pub async fn get(&self, assessment_id: &str) -> AppResult<Vec<RomRecord>> {
        self.store
            .get_assessment(assessment_id)
            .await?
            .ok_or_else(|| AppError::assessment_not_found(assessment_id))?;

        let records = self.store.get_rom_records(assessment_id).await?;
        if records.is_empty() {
            return Err(AppError::NotFound {
                resource: "ROM data",
                id: assessment_id.to_string(),
            });
        }

        Ok(records)
    }
}
