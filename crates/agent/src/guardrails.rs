//! Input limits applied before any prompt reaches the completion service.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptKind {
    Ask,
    Summarize,
    Explain,
}

impl PromptKind {
    pub fn command(&self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::Summarize => "summarize",
            Self::Explain => "explain",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardrailIntent<'a> {
    pub kind: PromptKind,
    pub input: &'a str,
}

impl<'a> GuardrailIntent<'a> {
    pub fn new(kind: PromptKind, input: &'a str) -> Self {
        Self { kind, input }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    Deny { reason_code: &'static str, user_message: String },
}

impl GuardrailDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Character limits are counted in Unicode scalar values, not bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardrailPolicy {
    pub max_question_chars: usize,
    pub min_summary_chars: usize,
    pub max_summary_chars: usize,
    pub max_topic_chars: usize,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self {
            max_question_chars: 1000,
            min_summary_chars: 100,
            max_summary_chars: 4000,
            max_topic_chars: 200,
        }
    }
}

impl GuardrailPolicy {
    pub fn evaluate(&self, intent: &GuardrailIntent<'_>) -> GuardrailDecision {
        let input = intent.input.trim();
        let length = intent.input.chars().count();

        match intent.kind {
            PromptKind::Ask if input.is_empty() => deny(
                "missing_question",
                "Please provide a question to ask.\nExample: `@bot ask What is machine learning?`"
                    .to_owned(),
            ),
            PromptKind::Ask if length > self.max_question_chars => deny(
                "question_too_long",
                format!(
                    "Question is too long. Please keep it under {} characters.",
                    self.max_question_chars
                ),
            ),
            PromptKind::Summarize if input.is_empty() => deny(
                "missing_text",
                "Please provide text to summarize.\nExample: `@bot summarize [paste your text here]`"
                    .to_owned(),
            ),
            PromptKind::Summarize if length < self.min_summary_chars => deny(
                "text_too_short",
                format!(
                    "Text is too short to summarize. Please provide at least {} characters.",
                    self.min_summary_chars
                ),
            ),
            PromptKind::Summarize if length > self.max_summary_chars => deny(
                "text_too_long",
                format!(
                    "Text is too long. Please keep it under {} characters.",
                    self.max_summary_chars
                ),
            ),
            PromptKind::Explain if input.is_empty() => deny(
                "missing_topic",
                "Please provide a topic to explain.\nExample: `@bot explain blockchain` or `@bot explain REST APIs`"
                    .to_owned(),
            ),
            PromptKind::Explain if length > self.max_topic_chars => deny(
                "topic_too_long",
                format!(
                    "Topic is too long. Please keep it under {} characters.",
                    self.max_topic_chars
                ),
            ),
            _ => GuardrailDecision::Allow,
        }
    }
}

fn deny(reason_code: &'static str, user_message: String) -> GuardrailDecision {
    GuardrailDecision::Deny { reason_code, user_message }
}
