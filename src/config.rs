// Command-line settings. Everything has a default, so a bare
// `doodle-classifier` run works from a directory holding `model/` and
// `class_names.txt`.

use crate::error::{Error, Result};
use crate::labels::DEFAULT_CLASS_COUNT;
use crate::ranking::DEFAULT_TOP_K;
use crate::types::GRID_SIZE;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "doodle-classifier", about = "Draw a doodle, watch a model guess it")]
pub struct Settings {
    /// Path to the exported classifier model
    #[arg(long, default_value = "model/model.onnx")]
    pub model: PathBuf,

    /// Class names, one per line (`index: name` or `name`)
    #[arg(long, default_value = "class_names.txt")]
    pub labels: PathBuf,

    /// How many predictions to list
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Number of classes the model outputs
    #[arg(long, default_value_t = DEFAULT_CLASS_COUNT)]
    pub classes: usize,

    /// On-screen size of the drawing surface in pixels (it is always 280x280 inside)
    #[arg(long, default_value_t = 420)]
    pub display_size: usize,

    /// Enable debug logging (RUST_LOG is honoured only with this flag)
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::Config("--top-k must be at least 1".into()));
        }
        if self.classes == 0 {
            return Err(Error::Config("--classes must be at least 1".into()));
        }
        if self.display_size < GRID_SIZE {
            return Err(Error::Config(format!("--display-size must be at least {GRID_SIZE}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::parse_from(["doodle-classifier"]);
        assert_eq!(settings.top_k, 10);
        assert_eq!(settings.classes, 365);
        assert_eq!(settings.model, PathBuf::from("model/model.onnx"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let settings = Settings::parse_from(["doodle-classifier", "--top-k", "0"]);
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn tiny_display_is_rejected() {
        let settings = Settings::parse_from(["doodle-classifier", "--display-size", "10"]);
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }
}
