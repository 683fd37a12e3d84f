use std::path::PathBuf;

use crate::error::ConfigError;

/// Hub identifier of the model loaded when nothing else is configured.
pub const DEFAULT_MODEL: &str = "HuggingFaceTB/SmolVLM2-2.2B-Instruct";

const DEFAULT_SYSTEM_PROMPT: &str =
    "You're a very succinct AI assistant, that describes image with a very short sentence.";
const DEFAULT_QUESTION: &str = "Describe this image";
const DEFAULT_MAX_NEW_TOKENS: usize = 128;
const DEFAULT_HISTORY_MAX_TURNS: usize = 64;

/// Runtime configuration of the vision-language node.
///
/// Every field maps to one environment variable, see [`VlmConfig::from_env`].
#[derive(Clone, Debug, PartialEq)]
pub struct VlmConfig {
    /// `MODEL_NAME_OR_PATH`: a local weights directory or file, or a hub id.
    pub model_name_or_path: String,
    /// `USE_MODEL_HUB`: allow downloading when the path is not local.
    pub use_model_hub: bool,
    /// `SYSTEM_PROMPT`: first turn of the conversation, empty to disable.
    pub system_prompt: String,
    /// `ACTIVATION_WORDS`: whitespace separated, empty disables the filter.
    pub activation_words: Vec<String>,
    /// `DEFAULT_QUESTION`: question used before any text input arrives.
    pub default_question: String,
    /// `IMAGE_RESIZE_RATIO`: scale factor applied to every frame.
    pub image_resize_ratio: f32,
    /// `HISTORY`: keep the question and answer turns between generations.
    pub history: bool,
    /// `HISTORY_MAX_TURNS`: cap on the retained turns, `None` when unbounded.
    ///
    /// Defaults to 64 turns, so the history only grows by two turns per
    /// generation for the first 32 generations. Set `0` to keep every turn.
    pub history_max_turns: Option<usize>,
    /// `ADAPTER_PATH`: optional adapter weights.
    pub adapter_path: Option<PathBuf>,
    /// `MAX_NEW_TOKENS`: generation length limit.
    pub max_new_tokens: usize,
}

impl Default for VlmConfig {
    fn default() -> Self {
        Self {
            model_name_or_path: DEFAULT_MODEL.to_string(),
            use_model_hub: true,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            activation_words: Vec::new(),
            default_question: DEFAULT_QUESTION.to_string(),
            image_resize_ratio: 1.0,
            history: false,
            history_max_turns: Some(DEFAULT_HISTORY_MAX_TURNS),
            adapter_path: None,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
        }
    }
}

impl VlmConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, falling back to the defaults
    /// for every variable that is not set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("MODEL_NAME_OR_PATH").filter(|v| !v.is_empty()) {
            config.model_name_or_path = value;
        }
        if let Some(value) = lookup("USE_MODEL_HUB") {
            config.use_model_hub = parse_bool("USE_MODEL_HUB", &value)?;
        }
        if let Some(value) = lookup("SYSTEM_PROMPT") {
            config.system_prompt = value;
        }
        if let Some(value) = lookup("ACTIVATION_WORDS") {
            config.activation_words = value.split_whitespace().map(str::to_string).collect();
        }
        if let Some(value) = lookup("DEFAULT_QUESTION") {
            config.default_question = value;
        }
        if let Some(value) = lookup("IMAGE_RESIZE_RATIO") {
            config.image_resize_ratio = match value.trim().parse::<f32>() {
                Ok(ratio) if ratio.is_finite() && ratio > 0.0 => ratio,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "IMAGE_RESIZE_RATIO",
                        value,
                        reason: "expected a positive number",
                    })
                }
            };
        }
        if let Some(value) = lookup("HISTORY") {
            config.history = parse_bool("HISTORY", &value)?;
        }
        if let Some(value) = lookup("HISTORY_MAX_TURNS") {
            config.history_max_turns = match parse_usize("HISTORY_MAX_TURNS", &value)? {
                0 => None,
                n => Some(n),
            };
        }
        if let Some(value) = lookup("ADAPTER_PATH").filter(|v| !v.is_empty()) {
            config.adapter_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("MAX_NEW_TOKENS") {
            config.max_new_tokens = match parse_usize("MAX_NEW_TOKENS", &value)? {
                0 => {
                    return Err(ConfigError::InvalidValue {
                        name: "MAX_NEW_TOKENS",
                        value,
                        reason: "expected at least one token",
                    })
                }
                n => n,
            };
        }

        Ok(config)
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "true" | "True" | "1" => Ok(true),
        "false" | "False" | "0" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "expected true or false",
        }),
    }
}

fn parse_usize(name: &'static str, value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "expected a non-negative integer",
        })
}
