use dora_image_utils::{resize_by_ratio, Rgb8};

use crate::conversation::{ConversationHistory, Message};
use crate::error::VlmError;
use crate::frames::FrameStore;
use crate::model::VisionLanguageModel;
use crate::template::ChatTemplate;

/// Knobs applied to every generation.
#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    /// Scale factor applied to every selected frame.
    pub resize_ratio: f32,
    /// Generation length limit.
    pub max_new_tokens: usize,
    /// Append the question and the answer to the history.
    pub retain_history: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            resize_ratio: 1.0,
            max_new_tokens: 128,
            retain_history: false,
        }
    }
}

/// Builds the multimodal prompt and runs the model on it.
pub struct InferenceInvoker<M: VisionLanguageModel> {
    model: M,
    template: ChatTemplate,
    settings: GenerationSettings,
}

impl<M: VisionLanguageModel> InferenceInvoker<M> {
    pub fn new(model: M, template: ChatTemplate, settings: GenerationSettings) -> Self {
        Self {
            model,
            template,
            settings,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Answer `question` about the stored frames.
    ///
    /// # Arguments
    ///
    /// * `frames` - The decoded frames.
    /// * `question` - The user question.
    /// * `history` - The conversation replayed before the new turn. Updated in
    ///   place when history retention is enabled.
    /// * `image_id` - Restrict the visual context to one frame, all frames
    ///   otherwise.
    ///
    /// # Returns
    ///
    /// The generated text.
    pub fn generate(
        &mut self,
        frames: &FrameStore,
        question: &str,
        history: &mut ConversationHistory,
        image_id: Option<&str>,
    ) -> Result<String, VlmError> {
        let selected: Vec<&Rgb8> = match image_id {
            Some(id) => vec![frames
                .get(id)
                .ok_or_else(|| VlmError::UnknownFrame(id.to_string()))?],
            None => frames.iter().map(|(_, frame)| frame).collect(),
        };

        if selected.is_empty() {
            return Err(VlmError::NoFrames);
        }

        let images = selected
            .into_iter()
            .map(|frame| resize_by_ratio(frame, self.settings.resize_ratio))
            .collect::<Result<Vec<_>, _>>()?;

        let mut messages = history.messages();
        messages.push(Message::user_with_images(images.len(), question));
        let prompt = self.template.render(&messages, true)?;

        log::debug!("Prompt with {} image(s): {prompt:?}", images.len());

        let response = self
            .model
            .generate(&prompt, images, self.settings.max_new_tokens)
            .map_err(|e| VlmError::Model(Box::new(e)))?;

        if self.settings.retain_history {
            history.push_exchange(question, &response);
        }

        Ok(response)
    }
}
