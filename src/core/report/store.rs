//! Assessment persistence seam.
//!
//! The gateway stores finalized assessments keyed by user identity. The
//! relay core never reads this store; only the REST surface does.

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use super::AssessmentRecord;

/// Errors from the assessment store.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// Backend failure
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Stores finalized assessment records keyed by user identity (email).
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// Store one finalized record for a user.
    async fn put(&self, user: &str, record: AssessmentRecord) -> Result<(), StoreError>;

    /// List a user's records, newest first.
    async fn list(&self, user: &str) -> Result<Vec<AssessmentRecord>, StoreError>;
}

/// In-process store. State lives for the process lifetime only.
#[derive(Debug, Default)]
pub struct MemoryAssessmentStore {
    records: DashMap<String, Vec<AssessmentRecord>>,
}

impl MemoryAssessmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssessmentStore for MemoryAssessmentStore {
    async fn put(&self, user: &str, record: AssessmentRecord) -> Result<(), StoreError> {
        self.records.entry(user.to_string()).or_default().push(record);
        Ok(())
    }

    async fn list(&self, user: &str) -> Result<Vec<AssessmentRecord>, StoreError> {
        Ok(self
            .records
            .get(user)
            .map(|records| records.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}
