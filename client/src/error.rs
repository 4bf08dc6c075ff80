use thiserror::Error;

/// Failures the engine can surface to its host.
///
/// Only construction can fail: once an engine exists every frame step is total.
/// Audio problems never show up here, they degrade to silence instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to create rendering surface: {0}")]
    Surface(String),
    #[error("no compatible graphics adapter: {0}")]
    Adapter(String),
    #[error("failed to acquire graphics device: {0}")]
    Device(String),
    #[error("host page unavailable: {0}")]
    Dom(String),
    #[error("invalid settings payload: {0}")]
    Settings(#[from] serde_json::Error),
}
