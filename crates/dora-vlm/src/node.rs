use dora_image_utils::{decode_image, PixelEncoding};
use kornia_image::ImageSize;

use crate::config::VlmConfig;
use crate::conversation::ConversationHistory;
use crate::error::VlmError;
use crate::frames::FrameStore;
use crate::invoker::{GenerationSettings, InferenceInvoker};
use crate::model::VisionLanguageModel;
use crate::template::ChatTemplate;

/// Provenance tag used when every frame was part of the prompt.
pub const ALL_FRAMES: &str = "all";

/// An input of the node, already detached from the dataflow runtime.
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// A camera frame. `width` and `height` are only read for planar encodings.
    Image {
        id: String,
        data: Vec<u8>,
        encoding: String,
        width: usize,
        height: usize,
    },
    /// A text prompt, optionally targeting a single frame.
    Text {
        id: String,
        text: Option<String>,
        image_id: Option<String>,
    },
    /// An error reported by the runtime.
    Error(String),
}

/// Why an event did not lead to a generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyText,
    NoActivationWord,
    NoFrames,
    UnknownFrame(String),
    UpstreamError(String),
}

/// A generated answer, to be sent on the `text` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextOutput {
    pub text: String,
    /// The targeted frame id or [`ALL_FRAMES`].
    pub image_id: String,
}

/// Result of handling one event. Rejected events surface as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Ignored(IgnoreReason),
    Responded(TextOutput),
}

/// State of the vision-language node: stored frames, conversation and model.
pub struct VlmNode<M: VisionLanguageModel> {
    invoker: InferenceInvoker<M>,
    frames: FrameStore,
    history: ConversationHistory,
    pending_question: String,
    activation_words: Vec<String>,
}

impl<M: VisionLanguageModel> VlmNode<M> {
    /// Build the node state around an already loaded model.
    pub fn new(config: &VlmConfig, model: M) -> Result<Self, VlmError> {
        let settings = GenerationSettings {
            resize_ratio: config.image_resize_ratio,
            max_new_tokens: config.max_new_tokens,
            retain_history: config.history,
        };
        let invoker = InferenceInvoker::new(model, ChatTemplate::smolvlm2()?, settings);

        Ok(Self {
            invoker,
            frames: FrameStore::new(),
            history: ConversationHistory::new(&config.system_prompt, config.history_max_turns),
            pending_question: config.default_question.clone(),
            activation_words: config.activation_words.clone(),
        })
    }

    /// Handle one event to completion.
    pub fn handle(&mut self, event: NodeEvent) -> Result<Outcome, VlmError> {
        match event {
            NodeEvent::Image {
                id,
                data,
                encoding,
                width,
                height,
            } => {
                let encoding: PixelEncoding = encoding.parse()?;
                let frame = decode_image(&data, encoding, ImageSize { width, height })?;
                log::debug!("Stored frame `{id}` ({encoding}, {})", frame.size());
                self.frames.insert(id, frame);
                Ok(Outcome::Accepted)
            }
            NodeEvent::Text { id, text, image_id } => {
                let outcome = self.handle_text(text, image_id)?;
                if let Outcome::Ignored(reason) = &outcome {
                    log::debug!("Ignoring text input `{id}`: {reason:?}");
                }
                Ok(outcome)
            }
            NodeEvent::Error(message) => {
                log::warn!("Event Error: {message}");
                Ok(Outcome::Ignored(IgnoreReason::UpstreamError(message)))
            }
        }
    }

    fn handle_text(
        &mut self,
        text: Option<String>,
        image_id: Option<String>,
    ) -> Result<Outcome, VlmError> {
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            return Ok(Outcome::Ignored(IgnoreReason::EmptyText));
        };

        if !self.is_activated(&text) {
            return Ok(Outcome::Ignored(IgnoreReason::NoActivationWord));
        }

        self.pending_question = text;

        if self.frames.is_empty() {
            return Ok(Outcome::Ignored(IgnoreReason::NoFrames));
        }

        if let Some(id) = image_id.as_deref() {
            if !self.frames.contains(id) {
                return Ok(Outcome::Ignored(IgnoreReason::UnknownFrame(id.to_string())));
            }
        }

        let response = self.invoker.generate(
            &self.frames,
            &self.pending_question,
            &mut self.history,
            image_id.as_deref(),
        )?;

        log::info!("Generated: {response}");

        Ok(Outcome::Responded(TextOutput {
            text: response,
            image_id: image_id.unwrap_or_else(|| ALL_FRAMES.to_string()),
        }))
    }

    fn is_activated(&self, text: &str) -> bool {
        self.activation_words.is_empty()
            || text
                .split_whitespace()
                .any(|word| self.activation_words.iter().any(|w| w == word))
    }

    /// The last accepted question, or the configured default.
    pub fn pending_question(&self) -> &str {
        &self.pending_question
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn frames(&self) -> &FrameStore {
        &self.frames
    }

    pub fn model(&self) -> &M {
        self.invoker.model()
    }
}
