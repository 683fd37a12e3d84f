use std::path::{Path, PathBuf};

use dora_image_utils::Rgb8;
use kornia_image::allocator::CpuAllocator;
use kornia_vlm::smolvlm2::{InputMedia, SmolVlm2, SmolVlm2Config, SmolVlm2Error};

use crate::config::DEFAULT_MODEL;
use crate::error::VlmError;
use crate::model::VisionLanguageModel;

// video frames are never sent by this node
const MAX_VIDEO_FRAMES: usize = 32;

/// Where the model weights come from.
#[derive(Debug, Clone, PartialEq)]
pub enum WeightsSource {
    /// Download the default model from the HuggingFace hub.
    Hub,
    /// Local safetensors files.
    Local(Vec<PathBuf>),
}

/// Resolve `MODEL_NAME_OR_PATH` into weight files.
///
/// A local file is used as is, a local directory contributes every
/// `.safetensors` file it holds in name order. Anything else is treated as a
/// hub identifier and needs `use_hub`.
pub fn resolve_weights(model_name_or_path: &str, use_hub: bool) -> Result<WeightsSource, VlmError> {
    let path = Path::new(model_name_or_path);

    if path.is_file() {
        return Ok(WeightsSource::Local(vec![path.to_path_buf()]));
    }

    if path.is_dir() {
        let mut files = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "safetensors"))
            .collect::<Vec<_>>();
        files.sort();

        if files.is_empty() {
            return Err(VlmError::ModelNotFound(format!(
                "no .safetensors file in {}",
                path.display()
            )));
        }
        return Ok(WeightsSource::Local(files));
    }

    if !use_hub {
        return Err(VlmError::ModelNotFound(model_name_or_path.to_string()));
    }

    if model_name_or_path != DEFAULT_MODEL {
        return Err(VlmError::UnsupportedModel {
            requested: model_name_or_path.to_string(),
            supported: DEFAULT_MODEL,
        });
    }

    Ok(WeightsSource::Hub)
}

/// SmolVLM2 running on kornia-vlm.
///
/// The conversation is owned by the node, so the model context is cleared
/// before every generation and the full prompt is replayed.
pub struct SmolVlm2Backend {
    model: SmolVlm2<MAX_VIDEO_FRAMES, CpuAllocator>,
}

impl SmolVlm2Backend {
    pub fn new(weights: WeightsSource) -> Result<Self, VlmError> {
        let weights_path = match weights {
            WeightsSource::Hub => None,
            WeightsSource::Local(paths) => Some(paths),
        };

        log::info!(
            "Loading SmolVLM2 weights from {}",
            match &weights_path {
                Some(paths) => format!("{} local file(s)", paths.len()),
                None => DEFAULT_MODEL.to_string(),
            }
        );

        let config = SmolVlm2Config {
            do_sample: false,
            weights_path,
            ..Default::default()
        };
        let model = SmolVlm2::new(config).map_err(|e| VlmError::Model(Box::new(e)))?;

        Ok(Self { model })
    }
}

impl VisionLanguageModel for SmolVlm2Backend {
    type Error = SmolVlm2Error;

    fn generate(
        &mut self,
        prompt: &str,
        images: Vec<Rgb8>,
        max_new_tokens: usize,
    ) -> Result<String, Self::Error> {
        self.model.clear_context()?;

        let response = self.model.inference_raw(
            prompt,
            Some(InputMedia::Images(images)),
            max_new_tokens,
            CpuAllocator,
        )?;

        Ok(response.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_local_directory() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("model-00002-of-00002.safetensors"), b"")?;
        std::fs::write(dir.path().join("model-00001-of-00002.safetensors"), b"")?;
        std::fs::write(dir.path().join("config.json"), b"{}")?;

        let source = resolve_weights(dir.path().to_str().unwrap(), false)?;
        assert_eq!(
            source,
            WeightsSource::Local(vec![
                dir.path().join("model-00001-of-00002.safetensors"),
                dir.path().join("model-00002-of-00002.safetensors"),
            ])
        );
        Ok(())
    }

    #[test]
    fn resolve_local_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("model.safetensors");
        std::fs::write(&file, b"")?;

        let source = resolve_weights(file.to_str().unwrap(), false)?;
        assert_eq!(source, WeightsSource::Local(vec![file]));
        Ok(())
    }

    #[test]
    fn resolve_empty_directory() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let err = resolve_weights(dir.path().to_str().unwrap(), true).unwrap_err();
        assert!(matches!(err, VlmError::ModelNotFound(_)));
        Ok(())
    }

    #[test]
    fn resolve_hub() -> Result<(), VlmError> {
        assert_eq!(resolve_weights(DEFAULT_MODEL, true)?, WeightsSource::Hub);
        assert!(matches!(
            resolve_weights(DEFAULT_MODEL, false),
            Err(VlmError::ModelNotFound(_))
        ));
        assert!(matches!(
            resolve_weights("Qwen/Qwen2.5-VL-3B-Instruct", true),
            Err(VlmError::UnsupportedModel { .. })
        ));
        Ok(())
    }

    // cargo test -p dora-vlm smolvlm2_describe --features cuda -- --nocapture --ignored
    #[test]
    #[ignore = "Requires downloading the model weights"]
    fn smolvlm2_describe() -> Result<(), Box<dyn std::error::Error>> {
        use dora_image_utils::{decode_image, PixelEncoding};
        use kornia_image::ImageSize;

        let image = decode_image(
            &[128u8; 64 * 64 * 3],
            PixelEncoding::Rgb8,
            ImageSize {
                width: 64,
                height: 64,
            },
        )?;

        let mut backend = SmolVlm2Backend::new(WeightsSource::Hub)?;
        let response = backend.generate(
            "<|im_start|>User:<image>Describe this image<end_of_utterance>\nAssistant:",
            vec![image],
            16,
        )?;
        assert!(!response.is_empty());
        Ok(())
    }
}
