use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::{ExtractedAssetTransaction, ExtractedTransaction, ExtractionError, Extractor};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_MAX_TOKENS: u32 = 300;
const DEFAULT_TEMPERATURE: f32 = 0.1;

const TRANSACTION_PROMPT: &str = "You are a financial assistant. Extract transaction \
information from the user's text and respond with ONLY a JSON object with these fields: \
\"type\" (\"income\" or \"expense\"), \"amount\" (number), \"category\" (string), \
\"description\" (string), \"isRecurring\" (boolean), and \"recurringInterval\" \
(\"weekly\", \"monthly\" or \"yearly\", only when isRecurring is true). \
Do not include any other text.";

const ASSET_TRANSACTION_PROMPT: &str = "You are a financial assistant. Extract an investment \
operation from the user's text and respond with ONLY a JSON object with these fields: \
\"assetName\" (string), \"assetKind\" (\"equity\", \"etf\", \"fund\", \"crypto\", \"cash\", \
\"bond\", \"commodity\", \"forex\" or \"real_estate\"), \"type\" (\"buy\", \"sell\", \
\"dividend\", \"fee\" or \"transfer\"), \"amount\" (number, total value), \"quantity\" \
(number, optional), \"price\" (number, per unit, optional), \"currency\" (ISO code) and \
\"notes\" (string, optional). Do not include any other text.";

/// Extractor backed by the OpenAI chat completions API.
pub struct OpenAiExtractor {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiExtractor {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cheap plausibility check so obviously bad keys fail before a request
    /// is made.
    fn key_looks_valid(&self) -> bool {
        self.api_key.starts_with("sk-") && self.api_key.len() > 20
    }

    async fn chat(&self, system_prompt: &str, text: &str) -> Result<String, ExtractionError> {
        if !self.key_looks_valid() {
            return Err(ExtractionError::InvalidApiKey);
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(ExtractionError::Network)?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(ExtractionError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => return Err(ExtractionError::RateLimited),
            status if !status.is_success() => {
                debug!(%status, "extraction request failed");
                return Err(ExtractionError::MalformedResponse);
            }
            _ => {}
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|_| ExtractionError::MalformedResponse)?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ExtractionError::MalformedResponse)
    }
}

#[async_trait]
impl Extractor for OpenAiExtractor {
    async fn extract_transaction(
        &self,
        text: &str,
    ) -> Result<ExtractedTransaction, ExtractionError> {
        let content = self.chat(TRANSACTION_PROMPT, text).await?;
        let mut value = json_payload(&content)?;
        if let Some(obj) = value.as_object_mut() {
            obj.entry("category").or_insert(json!("Other"));
            obj.entry("description").or_insert(json!(text));
        }
        let draft: ExtractedTransaction =
            serde_json::from_value(value).map_err(|_| ExtractionError::MalformedResponse)?;
        if draft.amount <= Decimal::ZERO {
            return Err(ExtractionError::InvalidAmount);
        }
        Ok(draft)
    }

    async fn extract_asset_transaction(
        &self,
        text: &str,
    ) -> Result<ExtractedAssetTransaction, ExtractionError> {
        let content = self.chat(ASSET_TRANSACTION_PROMPT, text).await?;
        let mut value = json_payload(&content)?;
        if let Some(obj) = value.as_object_mut() {
            obj.entry("currency").or_insert(json!("EUR"));
            // The raw input doubles as the note when the model returns none,
            // same as the description fallback on plain transactions.
            obj.entry("notes").or_insert(json!(text));
        }
        let draft: ExtractedAssetTransaction =
            serde_json::from_value(value).map_err(|_| ExtractionError::MalformedResponse)?;
        if draft.amount <= Decimal::ZERO {
            return Err(ExtractionError::InvalidAmount);
        }
        Ok(draft)
    }
}

/// Models wrap the JSON in prose often enough that we cut out the first
/// brace-delimited blob instead of parsing the reply verbatim.
fn json_payload(content: &str) -> Result<Value, ExtractionError> {
    static JSON_BLOB: OnceLock<Regex> = OnceLock::new();
    let re = JSON_BLOB.get_or_init(|| Regex::new(r"\{[\s\S]*\}").expect("literal pattern"));
    let blob = re
        .find(content)
        .ok_or(ExtractionError::MalformedResponse)?
        .as_str();
    serde_json::from_str(blob).map_err(|_| ExtractionError::MalformedResponse)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}
