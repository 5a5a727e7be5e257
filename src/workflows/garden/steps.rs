use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::workflows::error::StepError;

/// Garden data collected by the wizard, submitted as one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GardenDraft {
    pub name: String,
    pub description: String,
    pub location: String,
    pub banner_cid: Option<String>,
    pub operators: Vec<String>,
}

/// Host-supplied executor for the single garden submission step
#[async_trait]
pub trait GardenStepExecutor: Send + Sync {
    /// Submit the collected garden data; returns a transaction handle
    async fn submit_garden(&self, draft: &GardenDraft) -> Result<String, StepError>;
}
