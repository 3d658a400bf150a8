use serde::Serialize;

/// Health payload reporting whether the league store answers.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
}

impl HealthResponse {
    /// The store answered its ping.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// The store could not be reached.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
        }
    }
}
