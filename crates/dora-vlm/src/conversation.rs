use serde::Serialize;

/// Author of a conversation turn.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One part of a turn, serialized the way chat templates expect it.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
pub enum Line {
    Text { text: String },
    // placeholder, the pixels travel next to the rendered prompt
    Image,
}

/// A role tagged turn.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<Line>,
}

impl Message {
    /// A turn holding a single piece of text.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![Line::Text { text: text.into() }],
        }
    }

    /// A user turn with `num_images` image placeholders followed by `question`.
    pub fn user_with_images(num_images: usize, question: impl Into<String>) -> Self {
        let mut content = vec![Line::Image; num_images];
        content.push(Line::Text {
            text: question.into(),
        });
        Self {
            role: Role::User,
            content,
        }
    }
}

/// The conversation replayed to the model on every generation.
///
/// The optional system turn always stays first. The remaining turns are
/// question and answer pairs; once `max_turns` is exceeded the oldest pair is
/// evicted.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    system: Option<Message>,
    turns: Vec<Message>,
    max_turns: Option<usize>,
}

impl ConversationHistory {
    /// Create a history seeded with `system_prompt`, if not empty.
    pub fn new(system_prompt: &str, max_turns: Option<usize>) -> Self {
        let system =
            (!system_prompt.is_empty()).then(|| Message::text(Role::System, system_prompt));
        Self {
            system,
            turns: Vec::new(),
            max_turns,
        }
    }

    /// Record a completed exchange.
    pub fn push_exchange(&mut self, question: &str, answer: &str) {
        self.turns.push(Message::text(Role::User, question));
        self.turns.push(Message::text(Role::Assistant, answer));

        if let Some(max_turns) = self.max_turns {
            while self.turns.len() > max_turns {
                let evict = self.turns.len().min(2);
                self.turns.drain(..evict);
                log::debug!("History full, evicted the oldest exchange");
            }
        }
    }

    /// All turns in order, the system turn first.
    pub fn messages(&self) -> Vec<Message> {
        self.system
            .iter()
            .chain(self.turns.iter())
            .cloned()
            .collect()
    }

    /// Number of turns including the system turn.
    pub fn len(&self) -> usize {
        self.turns.len() + usize::from(self.system.is_some())
    }

    /// Whether the history holds no turn at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
