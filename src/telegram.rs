// src/telegram.rs
// Publisher seam and the Telegram Bot API implementation. One shared client
// instance is reused across ticks; the non-overlapping-tick rule keeps
// deliveries to a destination sequential.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Clone)]
pub enum PhotoRef {
    Url(String),
    Bytes(Vec<u8>),
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;
    async fn send_photo(&self, chat_id: i64, photo: &PhotoRef, caption: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct TelegramPublisher {
    token: String,
    client: reqwest::Client,
    timeout: Duration,
    max_retries: u8,
}

/// Bot API envelope: `ok=false` is a failure even on HTTP 200.
#[derive(Deserialize)]
struct ApiEnvelope {
    ok: bool,
    description: Option<String>,
}

impl TelegramPublisher {
    pub fn new(token: String) -> Self {
        Self {
            token,
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.token, method)
    }

    async fn call_json(&self, method: &str, body: serde_json::Value) -> Result<()> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(self.method_url(method))
                .timeout(self.timeout)
                .json(&body)
                .send()
                .await;

            match res {
                Ok(rsp) => {
                    if let Err(e) = rsp.error_for_status_ref() {
                        if attempt < self.max_retries {
                            tokio::time::sleep(backoff_delay(attempt)).await;
                            continue;
                        }
                        return Err(anyhow!("telegram {method} HTTP error: {e}"));
                    }
                    return check_envelope(rsp, method).await;
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(backoff_delay(attempt)).await;
                        continue;
                    }
                    return Err(anyhow!("telegram {method} request failed: {e}"));
                }
            }
        }
    }

    async fn send_photo_bytes(&self, chat_id: i64, bytes: &[u8], caption: &str) -> Result<()> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            // The form is consumed by send(), so it is rebuilt per attempt.
            let part = reqwest::multipart::Part::bytes(bytes.to_vec())
                .file_name("post.png")
                .mime_str("image/png")
                .context("building photo part")?;
            let form = reqwest::multipart::Form::new()
                .text("chat_id", chat_id.to_string())
                .text("caption", caption.to_string())
                .text("parse_mode", "HTML")
                .part("photo", part);

            let res = self
                .client
                .post(self.method_url("sendPhoto"))
                .timeout(self.timeout)
                .multipart(form)
                .send()
                .await;

            match res {
                Ok(rsp) => {
                    if let Err(e) = rsp.error_for_status_ref() {
                        if attempt < self.max_retries {
                            tokio::time::sleep(backoff_delay(attempt)).await;
                            continue;
                        }
                        return Err(anyhow!("telegram sendPhoto HTTP error: {e}"));
                    }
                    return check_envelope(rsp, "sendPhoto").await;
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(backoff_delay(attempt)).await;
                        continue;
                    }
                    return Err(anyhow!("telegram sendPhoto upload failed: {e}"));
                }
            }
        }
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.call_json(
            "sendMessage",
            json!({ "chat_id": chat_id, "text": text, "parse_mode": "HTML" }),
        )
        .await
    }

    async fn send_photo(&self, chat_id: i64, photo: &PhotoRef, caption: &str) -> Result<()> {
        match photo {
            PhotoRef::Url(url) => {
                self.call_json(
                    "sendPhoto",
                    json!({
                        "chat_id": chat_id,
                        "photo": url,
                        "caption": caption,
                        "parse_mode": "HTML"
                    }),
                )
                .await
            }
            PhotoRef::Bytes(bytes) => self.send_photo_bytes(chat_id, bytes, caption).await,
        }
    }
}

async fn check_envelope(rsp: reqwest::Response, method: &str) -> Result<()> {
    let envelope: ApiEnvelope = rsp
        .json()
        .await
        .with_context(|| format!("telegram {method} response body"))?;
    if !envelope.ok {
        return Err(anyhow!(
            "telegram {method} rejected: {}",
            envelope.description.unwrap_or_else(|| "no description".into())
        ));
    }
    Ok(())
}

fn backoff_delay(attempt: u8) -> Duration {
    Duration::from_millis(500u64 << (attempt - 1))
}
