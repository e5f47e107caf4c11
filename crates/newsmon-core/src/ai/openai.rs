use async_openai::{
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};

use super::{Oracle, CATEGORIES};
use crate::model::Article;
use crate::{Error, Result};

const MAX_DIGEST_ARTICLES: usize = 20;

/// OpenAI-backed oracle
pub struct OpenAiOracle {
    client: Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAiOracle {
    pub fn new(api_key: &str, model: &str) -> Self {
        let config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);

        Self {
            client,
            model: model.to_string(),
        }
    }

    async fn chat(&self, system: &str, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestMessage::System(
                    ChatCompletionRequestSystemMessageArgs::default()
                        .content(system)
                        .build()
                        .map_err(|e| Error::AiProvider(e.to_string()))?,
                ),
                ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(prompt)
                        .build()
                        .map_err(|e| Error::AiProvider(e.to_string()))?,
                ),
            ])
            .max_tokens(max_tokens)
            .build()
            .map_err(|e| Error::AiProvider(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| Error::AiProvider(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        Ok(content)
    }
}

#[async_trait::async_trait]
impl Oracle for OpenAiOracle {
    async fn categorize(&self, title: &str, description: &str) -> Result<String> {
        let system = format!(
            "You are a tech news categorizer. Categorize the given article into ONE of these categories:\n{}\n\nRespond with ONLY the category name, nothing else.",
            CATEGORIES
                .iter()
                .map(|c| format!("- {c}"))
                .collect::<Vec<_>>()
                .join("\n")
        );

        let prompt = format!("Title: {title}\nDescription: {description}");

        self.chat(&system, &prompt, 20).await
    }

    async fn summarize(&self, articles: &[Article], category: Option<&str>) -> Result<String> {
        let mut articles_text = String::new();
        for (i, article) in articles.iter().take(MAX_DIGEST_ARTICLES).enumerate() {
            articles_text.push_str(&format!(
                "\n---\n{}. **{}**\nSource: {}\nDescription: {}\n",
                i + 1,
                article.title,
                article.source_name.as_deref().unwrap_or("Unknown"),
                article.description,
            ));
        }

        let mut system = String::from(
            "You are a tech news analyst. Analyze the following tech news articles \
             and provide an insightful summary.\n\n\
             Filter and focus on these topics:\n\
             - AI/ML advancements\n\
             - Software development trends\n\
             - Cybersecurity news\n\
             - New technologies and research breakthroughs\n\n\
             Ignore irrelevant or low-quality content.\n\n\
             Format your response as clean markdown with sections for a brief \
             Summary, Key Trends, Top Stories, and headlines grouped By Category.",
        );

        if let Some(category) = category {
            system.push_str(&format!(
                "\n\nFocus specifically on articles related to: {category}"
            ));
        }

        let prompt = format!("Here are the articles to analyze:\n{articles_text}");

        self.chat(&system, &prompt, 1500).await
    }
}
