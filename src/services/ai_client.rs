use anyhow::Result;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

const SYSTEM_INSTRUCTION: &str = "You are an experienced and creative real-estate \
marketing assistant. Your goal is to help agents write attractive captions, listing \
descriptions, and copy for social media, websites, and ads. Adapt the content to the \
requested platform and audience, include relevant hashtags when asked, keep it short \
and direct for messaging apps and more descriptive for blogs and websites. Always aim \
to attract potential buyers and generate genuine interest.";

/// Text-generation client for the Gemini API, built on reqwest.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
        }
    }

    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        // https://ai.google.dev/api/generate-content
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let body = json!({
            "system_instruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.7, "maxOutputTokens": 500 }
        });

        debug!(model = %self.model, "gemini: sending generate request");

        let resp = self.http.post(url).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            error!(status = %status, response_body = %body, "gemini api request failed");
            anyhow::bail!("Gemini API request failed (status {})", status);
        }

        #[derive(Deserialize)]
        struct GenerateResp {
            candidates: Option<Vec<Candidate>>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: Option<Content>,
        }

        #[derive(Deserialize)]
        struct Content {
            #[serde(default)]
            parts: Vec<Part>,
        }

        #[derive(Deserialize)]
        struct Part {
            text: Option<String>,
        }

        let parsed: GenerateResp = resp.json().await?;
        let text = parsed
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            anyhow::bail!("Gemini returned an empty completion");
        }

        Ok(text.trim().to_string())
    }
}
