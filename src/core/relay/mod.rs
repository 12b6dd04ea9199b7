//! Realtime relay core.
//!
//! A relay session bridges one downstream browser WebSocket to one upstream
//! realtime speech endpoint. Two forwarding loops run concurrently for the
//! life of the session:
//!
//! - downstream → upstream, with session-configuration rewriting: declared
//!   tool lists are stripped (tool execution belongs to the sidecar) and
//!   input transcription is forced on (the transcript tracker needs it)
//! - upstream → downstream, with transcript capture: completed user and
//!   assistant transcripts are appended to the session transcript, and each
//!   user turn fires one detached sidecar analysis task
//!
//! All writes to the downstream socket (forwarded traffic and injected
//! sidecar results alike) go through a single sender task so frames are
//! never interleaved. Sidecar tasks are fire-and-forget: they are never
//! cancelled, and results that arrive after the session ended are dropped
//! silently.

pub mod error;
pub mod events;
pub mod injector;
pub mod intercept;
pub mod session;
pub mod upstream;

pub use error::{RelayError, RelayResult};
pub use events::{InjectedToolCall, capture_turn};
pub use injector::{DownstreamSender, RelayRoute};
pub use session::{Session, SessionState, Transcript, Turn, TurnRole};
pub use upstream::UpstreamStream;
