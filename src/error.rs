// One error type for the whole pipeline.
// Every variant states *where* things went wrong, so the log line alone tells
// you which stage (load, preprocess, inference, window) broke.
use thiserror::Error;

/// Result alias used by every fallible call in the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Model (or label source) missing or corrupt.
    #[error("load failure: {0}")]
    Load(String),

    /// `classify` called before the model finished loading.
    #[error("classifier not ready")]
    NotReady,

    /// Reading the drawing surface into a grid failed.
    #[error("preprocess failure: {0}")]
    Preprocess(String),

    /// The model runtime errored during a classify call.
    #[error("inference failure: {0}")]
    Inference(String),

    /// Creating the window failed
    #[error("window init error: {0}")]
    WindowInit(String),

    /// Updating the window buffer failed
    #[error("window update error: {0}")]
    WindowUpdate(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
