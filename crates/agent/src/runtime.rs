use thiserror::Error;
use tracing::info;

use crate::guardrails::{GuardrailDecision, GuardrailIntent, GuardrailPolicy, PromptKind};
use crate::llm::{CompletionCapability, CompletionError, CompletionRequest};

const ASK_SYSTEM_PROMPT: &str = "You are a knowledgeable assistant in a Slack workspace. \nAnswer questions clearly and concisely. If you're not sure about something, say so. \nKeep responses under 400 words and use a professional but friendly tone.";

const SUMMARIZE_SYSTEM_PROMPT: &str = "You are an expert at summarizing text. Create concise summaries that capture the essential information. \nUse bullet points when appropriate and keep summaries under 300 words.";

const EXPLAIN_SYSTEM_PROMPT: &str = "You are an expert educator who explains complex topics in simple terms. \nUse analogies and examples when helpful. Keep explanations under 500 words and well-structured.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AssistantError {
    #[error("completion service is not configured")]
    Unavailable,
    #[error("input rejected ({reason_code})")]
    Rejected { reason_code: &'static str, user_message: String },
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl AssistantError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Unavailable => {
                "AI features are not available. OpenAI API key is not configured.".to_owned()
            }
            Self::Rejected { user_message, .. } => user_message.clone(),
            Self::Completion(error) => error.user_message(),
        }
    }
}

/// Turns validated user input into completion requests.
#[derive(Clone, Debug)]
pub struct AgentRuntime {
    completion: CompletionCapability,
    guardrails: GuardrailPolicy,
}

impl AgentRuntime {
    pub fn new(completion: CompletionCapability, guardrails: GuardrailPolicy) -> Self {
        Self { completion, guardrails }
    }

    pub fn unavailable() -> Self {
        Self::new(CompletionCapability::Unavailable, GuardrailPolicy::default())
    }

    pub fn is_available(&self) -> bool {
        self.completion.is_available()
    }

    pub async fn ask(&self, question: &str) -> Result<String, AssistantError> {
        self.run(PromptKind::Ask, question).await
    }

    pub async fn summarize(&self, text: &str) -> Result<String, AssistantError> {
        self.run(PromptKind::Summarize, text).await
    }

    pub async fn explain(&self, topic: &str) -> Result<String, AssistantError> {
        self.run(PromptKind::Explain, topic).await
    }

    async fn run(&self, kind: PromptKind, input: &str) -> Result<String, AssistantError> {
        let service = self.completion.service().ok_or(AssistantError::Unavailable)?;

        if let GuardrailDecision::Deny { reason_code, user_message } =
            self.guardrails.evaluate(&GuardrailIntent::new(kind, input))
        {
            return Err(AssistantError::Rejected { reason_code, user_message });
        }

        info!(
            event_name = "agent.completion.requested",
            command = kind.command(),
            input_chars = input.chars().count(),
            "running assistant prompt"
        );

        Ok(service.complete(build_request(kind, input)).await?)
    }
}

pub fn build_request(kind: PromptKind, input: &str) -> CompletionRequest {
    match kind {
        PromptKind::Ask => CompletionRequest::new(input)
            .system_prompt(ASK_SYSTEM_PROMPT)
            .max_tokens(600)
            .temperature(0.7),
        PromptKind::Summarize => CompletionRequest::new(format!(
            "Please summarize the following text in a clear, concise manner. Focus on the key points and main ideas:\n\n{input}"
        ))
        .system_prompt(SUMMARIZE_SYSTEM_PROMPT)
        .max_tokens(400)
        .temperature(0.5),
        PromptKind::Explain => CompletionRequest::new(format!(
            "Please explain \"{input}\" in a clear, easy-to-understand way. Include:\n- What it is\n- Why it's important or relevant\n- Key concepts or components\n- Real-world examples if applicable\n\nKeep the explanation accessible but informative."
        ))
        .system_prompt(EXPLAIN_SYSTEM_PROMPT)
        .max_tokens(700)
        .temperature(0.6),
    }
}
