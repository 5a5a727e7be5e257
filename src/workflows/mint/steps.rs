use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::workflows::error::{StepError, WorkflowError};

/// One allowlist entry: an address and its unit share of the hypercert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowlistEntry {
    pub address: String,
    pub units: u64,
}

/// Immutable parameters of one mint operation, supplied at start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintInput {
    /// Hypercert metadata payload, uploaded as-is
    pub metadata: serde_json::Value,
    pub allowlist: Vec<AllowlistEntry>,
    /// Invariant the allowlist uploader validates the entries against
    pub total_units: u64,
    pub garden_id: String,
    /// Attestation UIDs referenced by the minted hypercert
    pub attestation_uids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataUpload {
    pub cid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowlistUpload {
    pub cid: String,
    pub merkle_root: String,
}

/// Derived input for the signing step; both artifacts must already exist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigningRequest {
    pub input: MintInput,
    pub metadata_cid: String,
    pub merkle_root: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedUserOp {
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    pub tx_hash: String,
    pub hypercert_id: String,
}

/// Host-supplied executors for the four mint steps.
///
/// Implementations own the actual IPFS pinning, user-op construction, wallet
/// signing, and chain reads. Allowlist validation against `total_units` and
/// Merkle tree construction belong to `upload_allowlist`; a violation is an
/// ordinary step failure.
#[async_trait]
pub trait MintStepExecutor: Send + Sync {
    async fn upload_metadata(&self, input: &MintInput) -> Result<MetadataUpload, StepError>;

    async fn upload_allowlist(&self, input: &MintInput) -> Result<AllowlistUpload, StepError>;

    async fn build_and_sign_user_op(
        &self,
        request: &SigningRequest,
    ) -> Result<SubmittedUserOp, StepError>;

    async fn poll_for_receipt(&self, user_op_hash: &str) -> Result<MintReceipt, StepError>;
}

impl SigningRequest {
    /// Derive the signing input from context artifacts. Both uploads must
    /// have completed; a missing artifact is a hard precondition failure,
    /// never a silent proceed.
    pub fn derive(
        input: &MintInput,
        metadata_cid: Option<&str>,
        merkle_root: Option<&str>,
    ) -> Result<Self, WorkflowError> {
        let metadata_cid = metadata_cid.ok_or(WorkflowError::MissingArtifact {
            step: "build_and_sign_user_op",
            artifact: "metadata_cid",
        })?;
        let merkle_root = merkle_root.ok_or(WorkflowError::MissingArtifact {
            step: "build_and_sign_user_op",
            artifact: "merkle_root",
        })?;

        Ok(Self {
            input: input.clone(),
            metadata_cid: metadata_cid.to_string(),
            merkle_root: merkle_root.to_string(),
        })
    }
}
