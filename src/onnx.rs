//! ONNX Runtime backend for the classifier (feature `onnx`).

use crate::classifier::{Model, ModelLoader};
use crate::error::{Error, Result};
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use tracing::info;

/// Opens `.onnx` doodle models exported with an NHWC `[1, 28, 28, 1]` input.
pub struct OnnxLoader;

impl ModelLoader for OnnxLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn Model>> {
        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(1))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| Error::Load(format!("onnx model {}: {e}", path.display())))?;
        info!("onnx session ready: {}", path.display());
        Ok(Box::new(OnnxModel { session }))
    }
}

struct OnnxModel {
    session: Session,
}

impl Model for OnnxModel {
    fn infer(&mut self, input: &[f32], shape: [usize; 4]) -> Result<Vec<f32>> {
        let tensor = Tensor::from_array((shape, input.to_vec()))
            .map_err(|e| Error::Inference(format!("failed to create input tensor: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| Error::Inference(format!("ONNX inference failed: {e}")))?;

        // Output shape: [1, classes]
        let (_shape, data) = outputs[0_usize]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference(format!("failed to extract output tensor: {e}")))?;
        Ok(data.to_vec())
    }
}
