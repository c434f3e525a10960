use anyhow::{Context, Result, bail};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;

use nosh_core::service::MealVisionProvider;
use nosh_core::vision::{ChatResponse, MealGuess, parse_guesses};

const DEFAULT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

const INSTRUCTION: &str = "You are a nutrition assistant. Identify each distinct food item in \
the photo(s) and estimate its nutrition. Reply with ONLY a JSON array, one object per item: \
{\"name\": string, \"calories\": number, \"protein\": number, \"carbs\": number, \
\"fat\": number, \"amount\": number, \"unit\": string}. Calories and macros are totals for \
the portion shown, in kcal and grams. No prose, no markdown fences.";

/// Client for an OpenAI-compatible vision endpoint.
///
/// Configured through the environment:
/// `NOSH_VISION_API_KEY` (required), `NOSH_VISION_URL`, `NOSH_VISION_MODEL`.
pub struct VisionClient {
    client: reqwest::Client,
    rt: tokio::runtime::Handle,
    url: String,
    model: String,
    api_key: String,
}

// --- Chat-completions request shapes ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

impl VisionClient {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("NOSH_VISION_API_KEY").map_err(|_| {
            anyhow::anyhow!(
                "NOSH_VISION_API_KEY is not set. Export an API key for an \
                 OpenAI-compatible vision endpoint to use photo analysis"
            )
        })?;
        if api_key.trim().is_empty() {
            bail!("NOSH_VISION_API_KEY is empty");
        }
        let url = std::env::var("NOSH_VISION_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let model = std::env::var("NOSH_VISION_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let client = reqwest::Client::builder()
            .user_agent(format!("nosh-cli/{}", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            rt: tokio::runtime::Handle::current(),
            url,
            model,
            api_key,
        })
    }

    fn build_request(&self, images: &[Vec<u8>]) -> ChatRequest {
        let mut content = vec![ContentPart::Text {
            text: INSTRUCTION.to_string(),
        }];
        for image in images {
            content.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: format!("data:image/jpeg;base64,{}", BASE64.encode(image)),
                },
            });
        }
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
        }
    }

    pub async fn analyze_async(&self, images: &[Vec<u8>]) -> Result<Vec<MealGuess>> {
        let request = self.build_request(images);

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to reach vision API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Vision API returned {status}: {body}");
        }

        let data: ChatResponse = resp
            .json()
            .await
            .context("Failed to parse vision API response")?;

        parse_guesses(data.content()?)
    }
}

impl MealVisionProvider for VisionClient {
    fn analyze(&self, images: &[Vec<u8>]) -> Result<Vec<MealGuess>> {
        self.rt.block_on(self.analyze_async(images))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> VisionClient {
        VisionClient {
            client: reqwest::Client::new(),
            rt: tokio::runtime::Handle::current(),
            url: DEFAULT_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_build_request_embeds_images() {
        let client = test_client();
        let request = client.build_request(&[vec![0xFF, 0xD8, 0xFF]]);

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content.len(), 2);

        let json = serde_json::to_value(&request).unwrap();
        let parts = json["messages"][0]["content"].as_array().unwrap();
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        let url = parts[1]["image_url"]["url"].as_str().unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert!(url.ends_with(&BASE64.encode([0xFF, 0xD8, 0xFF])));
    }

    #[tokio::test]
    async fn test_build_request_multiple_images() {
        let client = test_client();
        let request = client.build_request(&[vec![1], vec![2], vec![3]]);
        // One text part plus one part per image
        assert_eq!(request.messages[0].content.len(), 4);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_analyze_bridges_from_blocking_task() {
        let mut client = test_client();
        // Unroutable endpoint so the request fails fast at the socket
        client.url = "http://127.0.0.1:9/v1/chat/completions".to_string();

        let result = tokio::task::spawn_blocking(move || client.analyze(&[vec![1, 2, 3]]))
            .await
            .expect("runtime bridge must not panic inside a running runtime");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to reach vision API"));
    }
}
