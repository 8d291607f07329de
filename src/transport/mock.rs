//! In-process responder with canned replies and simulated latency.

use super::{Catalog, ChatRequest, ChatTransport, ModelCatalog, TemplateCatalog};
use crate::core::{
    AIModel, AetherError, ChatMessage, ParameterKind, PromptTemplate, TemplateParameter,
};
use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::Value;
use std::time::Duration;

const MOCK_RESPONSES: [&str; 5] = [
    "I understand your request. Let me provide a comprehensive response based on the context you've provided.",
    "That's an interesting question. Here's my analysis of the situation and some recommendations.",
    "Based on the parameters you've set, I can offer several insights and suggestions for your consideration.",
    "I've processed your input using the specified model settings. Here are the key points to consider.",
    "Thank you for the detailed prompt. I'll address each aspect of your request systematically.",
];

const MODELS_DELAY: Duration = Duration::from_millis(500);
const TEMPLATES_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct MockBackend {
    min_latency: Duration,
    max_latency: Duration,
    catalog_delays: bool,
}

impl MockBackend {
    pub fn new(min_latency_ms: u64, max_latency_ms: u64) -> Self {
        Self {
            min_latency: Duration::from_millis(min_latency_ms),
            max_latency: Duration::from_millis(max_latency_ms.max(min_latency_ms)),
            catalog_delays: true,
        }
    }

    /// No simulated latency at all.
    pub fn instant() -> Self {
        Self {
            min_latency: Duration::ZERO,
            max_latency: Duration::ZERO,
            catalog_delays: false,
        }
    }

    fn reply_delay(&self) -> Duration {
        if self.max_latency <= self.min_latency {
            return self.min_latency;
        }
        rand::thread_rng().gen_range(self.min_latency..=self.max_latency)
    }

    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(1000, 3000)
    }
}

#[async_trait]
impl ChatTransport for MockBackend {
    async fn send(&self, request: &ChatRequest) -> Result<ChatMessage, AetherError> {
        self.pause(self.reply_delay()).await;

        let canned = MOCK_RESPONSES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(MOCK_RESPONSES[0]);
        let content = format!(
            "{}\n\n*This is a mock response generated using {} with temperature {}.*",
            canned, request.model, request.parameters.temperature
        );
        tracing::debug!(model = %request.model, history = request.messages.len(), "mock reply");
        Ok(ChatMessage::assistant(content, request.model.clone()))
    }
}

#[async_trait]
impl Catalog for MockBackend {
    async fn models(&self) -> Result<ModelCatalog, AetherError> {
        if self.catalog_delays {
            self.pause(MODELS_DELAY).await;
        }
        let models = builtin_models();
        Ok(ModelCatalog {
            total: models.len(),
            models,
        })
    }

    async fn templates(&self) -> Result<TemplateCatalog, AetherError> {
        if self.catalog_delays {
            self.pause(TEMPLATES_DELAY).await;
        }
        let templates = builtin_templates();
        Ok(TemplateCatalog {
            total: templates.len(),
            templates,
        })
    }
}

fn model(
    id: &str,
    name: &str,
    provider: &str,
    description: &str,
    max_tokens: u32,
    features: &[&str],
) -> AIModel {
    AIModel {
        id: id.to_string(),
        name: name.to_string(),
        provider: provider.to_string(),
        description: description.to_string(),
        max_tokens,
        supported_features: features.iter().map(|f| f.to_string()).collect(),
    }
}

pub fn builtin_models() -> Vec<AIModel> {
    vec![
        model(
            "gpt-4-turbo",
            "GPT-4 Turbo",
            "OpenAI",
            "Most capable GPT-4 model with improved instruction following",
            4096,
            &["chat", "completion", "function-calling"],
        ),
        model(
            "claude-3-opus",
            "Claude 3 Opus",
            "Anthropic",
            "Most powerful model for highly complex tasks",
            4096,
            &["chat", "completion", "analysis"],
        ),
        model(
            "gemini-pro",
            "Gemini Pro",
            "Google",
            "Advanced reasoning and code generation capabilities",
            2048,
            &["chat", "completion", "multimodal"],
        ),
        model(
            "llama-2-70b",
            "Llama 2 70B",
            "Meta",
            "Open-source large language model",
            4096,
            &["chat", "completion"],
        ),
        model(
            "mistral-large",
            "Mistral Large",
            "Mistral AI",
            "High-performance model for complex reasoning",
            8192,
            &["chat", "completion", "function-calling"],
        ),
    ]
}

fn text_param(name: &str, default: &str, description: &str) -> TemplateParameter {
    TemplateParameter {
        name: name.to_string(),
        kind: ParameterKind::String,
        default_value: Value::String(default.to_string()),
        description: description.to_string(),
    }
}

fn prompt_template(
    id: &str,
    name: &str,
    description: &str,
    category: &str,
    content: &str,
    parameters: Vec<TemplateParameter>,
) -> PromptTemplate {
    PromptTemplate {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        content: content.to_string(),
        parameters,
    }
}

pub fn builtin_templates() -> Vec<PromptTemplate> {
    vec![
        prompt_template(
            "creative-writing",
            "Creative Writing Assistant",
            "Help with creative writing tasks and storytelling",
            "Creative",
            "You are a creative writing assistant. Help the user with their writing project: {topic}. Consider the tone: {tone} and target audience: {audience}.",
            vec![
                text_param("topic", "", "Writing topic or theme"),
                text_param("tone", "neutral", "Writing tone (formal, casual, humorous, etc.)"),
                text_param("audience", "general", "Target audience"),
            ],
        ),
        prompt_template(
            "code-review",
            "Code Review Assistant",
            "Analyze and provide feedback on code",
            "Development",
            "Please review the following {language} code and provide feedback on:\n1. Code quality and best practices\n2. Potential bugs or issues\n3. Performance optimizations\n4. Security considerations\n\nCode:\n{code}",
            vec![
                text_param("language", "JavaScript", "Programming language"),
                text_param("code", "", "Code to review"),
            ],
        ),
        prompt_template(
            "data-analysis",
            "Data Analysis Helper",
            "Assist with data analysis and interpretation",
            "Analytics",
            "Analyze the following dataset and provide insights:\n\nDataset: {dataset}\nAnalysis focus: {focus}\nOutput format: {format}",
            vec![
                text_param("dataset", "", "Dataset description or sample"),
                text_param("focus", "trends", "Analysis focus area"),
                text_param("format", "summary", "Desired output format"),
            ],
        ),
        prompt_template(
            "learning-tutor",
            "Learning Tutor",
            "Educational assistant for learning new topics",
            "Education",
            "Act as a tutor for {subject}. Explain {topic} at a {level} level. Use examples and break down complex concepts into digestible parts.",
            vec![
                text_param("subject", "", "Subject area"),
                text_param("topic", "", "Specific topic to learn"),
                text_param("level", "beginner", "Learning level (beginner, intermediate, advanced)"),
            ],
        ),
        prompt_template(
            "business-strategy",
            "Business Strategy Advisor",
            "Strategic business planning and analysis",
            "Business",
            "Provide strategic advice for a {industry} business facing {challenge}. Consider market conditions, competitive landscape, and growth opportunities. Focus on {timeframe} planning.",
            vec![
                text_param("industry", "", "Industry or business sector"),
                text_param("challenge", "", "Current business challenge"),
                text_param("timeframe", "short-term", "Planning timeframe"),
            ],
        ),
    ]
}
