// src/images.rs
// Image synthesis seam. Failure here never blocks text delivery; the
// orchestrator degrades to text-only.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// At least one of `url`/`bytes` must be usable by the publisher; a result
/// with neither is an error inside the client.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub url: Option<String>,
    pub bytes: Option<Vec<u8>>,
}

#[async_trait]
pub trait ImageClient: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage>;
}

pub struct OpenAiImageClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiImageClient {
    pub fn new(api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("tg-auto-channels/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            model: "gpt-image-1".to_string(),
        }
    }
}

#[async_trait]
impl ImageClient for OpenAiImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage> {
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            prompt: String,
            size: &'a str,
        }
        #[derive(Deserialize)]
        struct Resp {
            data: Vec<ImageData>,
        }
        #[derive(Deserialize)]
        struct ImageData {
            url: Option<String>,
            b64_json: Option<String>,
        }

        let req = Req {
            model: &self.model,
            prompt: build_image_prompt(prompt),
            size: "1024x1024",
        };

        let response = self
            .http
            .post("https://api.openai.com/v1/images/generations")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("image generation request")?
            .error_for_status()
            .context("image generation status")?;

        let body: Resp = response.json().await.context("image generation body")?;
        let first = body
            .data
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no image data returned"))?;

        let bytes = match first.b64_json {
            Some(b64) => Some(BASE64.decode(b64).context("decoding base64 image")?),
            None => None,
        };
        if first.url.is_none() && bytes.is_none() {
            return Err(anyhow!("image response carried neither url nor bytes"));
        }
        Ok(GeneratedImage {
            url: first.url,
            bytes,
        })
    }
}

fn build_image_prompt(post_content: &str) -> String {
    format!(
        "Create a high-quality image that illustrates the following post. \
         Use subjects and scenes that best match the content. \
         Do not include any text, captions, watermarks, or overlays. \
         Post content: {post_content}"
    )
}
