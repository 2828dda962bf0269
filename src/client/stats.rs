//! Diagnostics snapshot exposed by the client.

use crate::cache::CacheStats;
use crate::resilience::CircuitStats;

/// Point-in-time view of the client's reliability state, consumed by
/// diagnostic panels.
#[derive(Debug, Clone)]
pub struct ClientStats {
    /// Response cache counters.
    pub cache: CacheStats,
    /// Circuit breaker state and counters.
    pub circuit: CircuitStats,
    /// Attempts used by the most recent resilient call.
    pub last_retry_attempts: u32,
    /// Whether streaming is currently degraded to non-streaming.
    pub streaming_disabled: bool,
    /// The pinned session model, if any.
    pub session_model: Option<String>,
}
