//! Doodle classifier: draw with the mouse, get ranked guesses from a
//! pre-trained model.
//!
//! ```text
//! input events -> surface (strokes + raster) -> preprocess (28x28 grid)
//!              -> classifier (model) -> ranking + labels -> presenter
//! ```
//!
//! [`session::Session`] ties the stages together; the binary only polls the
//! window, runs model calls on tokio, and presents frames.

pub mod classifier;
pub mod config;
pub mod draw;
pub mod error;
pub mod gamma;
pub mod labels;
pub mod logging;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod preprocess;
pub mod presenter;
pub mod ranking;
pub mod session;
pub mod strokes;
pub mod surface;
pub mod types;

pub use error::{Error, Result};
