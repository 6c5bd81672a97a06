pub const HISTORY_KEY: &str = "finishedGameHistory";
pub const MOUNT_ID: &str = "root";
pub const COMMIT_PORT: &str = "storeFinishedGameHistory";

/// Names shared between the page, durable storage and the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootConfig {
    pub history_key: String,
    pub mount_id: String,
    pub commit_port: String,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            history_key: HISTORY_KEY.to_string(),
            mount_id: MOUNT_ID.to_string(),
            commit_port: COMMIT_PORT.to_string(),
        }
    }
}
