use minijinja::{context, AutoEscape, Environment};

use crate::conversation::Message;

/// SmolVLM2 chat template, one `<image>` placeholder per image line.
// https://github.com/huggingface/transformers/blob/3e975acc8bf6d029ec0a54b1c5d0691489dfb051/src/transformers/models/smolvlm/processing_smolvlm.py#L57C26-L57C479
pub const SMOLVLM2_CHAT_TEMPLATE: &str = "<|im_start|>{% for message in messages %}{{message['role'] | capitalize}}{% if message['content'][0]['type'] == 'image' %}{{':'}}{% else %}{{': '}}{% endif %}{% for line in message['content'] %}{% if line['type'] == 'text' %}{{line['text']}}{% elif line['type'] == 'image' %}{{ '<image>' }}{% elif line['type'] == 'video' %}{{ '<video>' }}{% endif %}{% endfor %}<end_of_utterance>\n{% endfor %}{% if add_generation_prompt %}{{ 'Assistant:' }}{% endif %}";

const TEMPLATE_NAME: &str = "chat";

/// Renders a conversation into the single text prompt fed to the model.
pub struct ChatTemplate {
    env: Environment<'static>,
}

impl ChatTemplate {
    /// Compile a jinja chat template.
    pub fn new(source: impl Into<String>) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        // plain text prompt, not HTML
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_template_owned(TEMPLATE_NAME, source.into())?;
        Ok(Self { env })
    }

    /// The SmolVLM2 chat template.
    pub fn smolvlm2() -> Result<Self, minijinja::Error> {
        Self::new(SMOLVLM2_CHAT_TEMPLATE)
    }

    /// Render `messages`, optionally opening the assistant turn.
    pub fn render(
        &self,
        messages: &[Message],
        add_generation_prompt: bool,
    ) -> Result<String, minijinja::Error> {
        self.env.get_template(TEMPLATE_NAME)?.render(context! {
            messages => messages,
            add_generation_prompt => add_generation_prompt,
        })
    }
}
