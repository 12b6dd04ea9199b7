//! Sidecar assessment analysis.
//!
//! Each completed user turn fires one detached analysis task: the transcript
//! snapshot is scored against the five cultural-intelligence dimensions by
//! the inference service, and the resulting JSON text is injected back into
//! the downstream stream as a synthetic tool-call event.
//!
//! The whole pass is best effort. Failures are logged and absorbed here;
//! they never reach the forwarding loops. Results that outlive their session
//! are dropped by the injector.

mod analyzer;

pub use analyzer::{SidecarAnalysis, SidecarAnalyzer};

use std::sync::Arc;
use tracing::warn;

use crate::core::relay::{DownstreamSender, InjectedToolCall, RelayError, Turn};

/// Body of one detached sidecar task.
///
/// Runs to completion regardless of session state; never returns an error.
pub async fn run_analysis(
    analyzer: Arc<SidecarAnalyzer>,
    snapshot: Vec<Turn>,
    downstream: DownstreamSender,
) {
    match analyzer.analyze(&snapshot).await {
        Ok(analysis) => {
            downstream
                .inject(InjectedToolCall::new(analysis.arguments))
                .await;
        }
        Err(e) => {
            let failure = RelayError::SidecarInvocationFailure(e);
            warn!(turns = snapshot.len(), "{failure}");
        }
    }
}
