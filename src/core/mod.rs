//! Core subsystems: the realtime relay, the sidecar analyzer, the shared
//! inference client, and the report subsystem.

pub mod inference;
pub mod relay;
pub mod report;
pub mod sidecar;

pub use inference::{InferenceClient, InferenceConfig, InferenceError};
pub use relay::{RelayError, Session, SessionState, Transcript, Turn, TurnRole};
pub use report::{AssessmentRecord, AssessmentStore, MailError, ReportMailer, StoreError};
pub use sidecar::{SidecarAnalysis, SidecarAnalyzer};
