use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, BootError>;

#[derive(Debug, Error)]
pub enum BootError {
    #[error("no global `window` exists")]
    NoWindow,

    #[error("localStorage is not available")]
    StorageUnavailable,

    #[error("storage write failed: {0}")]
    Storage(String),

    #[error("mount point `#{0}` not found")]
    MountPointMissing(String),

    #[error("history replace failed: {0}")]
    History(String),

    #[error("engine error: {0}")]
    Engine(String),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// Renders a thrown JS value for the string-carrying variants.
pub fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            js_sys::JSON::stringify(value)
                .ok()
                .and_then(|s| s.as_string())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}
