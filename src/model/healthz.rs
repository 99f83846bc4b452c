//! Health check payload.

use serde::{Deserialize, Serialize};

/// Liveness response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthzResponse {
    /// Always `"OK"` while the process is serving.
    pub message: String,
}

impl HealthzResponse {
    /// The static liveness answer.
    pub fn ok() -> Self {
        Self {
            message: "OK".to_string(),
        }
    }
}
