use crate::error::{IoContext, Result, ScriptaError};
use crate::scripta::config::ScriptaTitlerConfig;
use crate::scripta::util::truncate_with_ellipsis;
use reqwest::blocking::Client;
use serde_json::Value;
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 45;
const MAX_TITLE_CHARS: usize = 120;
const MIN_LINE_ALNUM: usize = 3;

/// Turns document text into a short suggested description.
pub trait Titler {
    fn label(&self) -> &'static str;
    fn suggest(&self, text: &str) -> Result<String>;
}

/// Offline fallback: the first line carrying a few letters or digits.
pub struct LocalTitler;

pub struct OpenAiTitler {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

pub struct AnthropicTitler {
    pub api_key: String,
    pub model: String,
}

pub struct GeminiTitler {
    pub api_key: String,
    pub model: String,
}

fn env_non_empty(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn required_key(provider: &str, var: &str) -> Result<String> {
    env_non_empty("SCRIPTA_TITLER_API_KEY")
        .or_else(|| env_non_empty(var))
        .ok_or_else(|| {
            ScriptaError::Titler(format!(
                "{provider} titler needs SCRIPTA_TITLER_API_KEY or {var}"
            ))
        })
}

fn model_or(cfg: &ScriptaTitlerConfig, fallback: &str) -> String {
    if cfg.model.trim().is_empty() {
        fallback.to_string()
    } else {
        cfg.model.trim().to_string()
    }
}

/// Builds the titler named by the configuration. No process-wide model state.
pub fn titler_from_config(cfg: &ScriptaTitlerConfig) -> Result<Box<dyn Titler>> {
    match cfg.provider.as_str() {
        "local" => Ok(Box::new(LocalTitler)),
        "openai" => Ok(Box::new(OpenAiTitler {
            api_key: required_key("openai", "OPENAI_API_KEY")?,
            model: model_or(cfg, "gpt-4.1-mini"),
            base_url: cfg
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
        })),
        "anthropic" => Ok(Box::new(AnthropicTitler {
            api_key: required_key("anthropic", "ANTHROPIC_API_KEY")?,
            model: model_or(cfg, "claude-3-5-haiku-latest"),
        })),
        "gemini" => Ok(Box::new(GeminiTitler {
            api_key: required_key("gemini", "GEMINI_API_KEY")?,
            model: model_or(cfg, "gemini-2.5-flash-lite"),
        })),
        other => Err(ScriptaError::Titler(format!("unknown provider `{other}`"))),
    }
}

/// Reads up to `max_chars` characters of a stored document as lossy UTF-8 text.
pub fn read_document_text(path: &Path, max_chars: usize) -> Result<String> {
    let file = File::open(path).io_context(|| format!("failed to open {}", path.display()))?;
    let mut raw = Vec::new();
    file.take((max_chars as u64).saturating_mul(4))
        .read_to_end(&mut raw)
        .io_context(|| format!("failed to read {}", path.display()))?;
    let text: String = String::from_utf8_lossy(&raw)
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(max_chars)
        .collect();
    if text.trim().is_empty() {
        return Err(ScriptaError::Titler(format!(
            "no readable text in {}",
            path.display()
        )));
    }
    Ok(text)
}

fn build_prompt(text: &str) -> String {
    format!(
        "Suggest a short descriptive title (at most 12 words) for the document below. Reply with the title only, without quotes or commentary.\n\n{text}"
    )
}

/// First non-empty line of a model reply, unquoted and clamped.
fn clean_title(raw: &str) -> Option<String> {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("```"))?;
    let line = line
        .trim_start_matches(['#', '-', '*'])
        .trim()
        .trim_start_matches("Title:")
        .trim()
        .trim_matches(['"', '\'', '“', '”'])
        .trim();
    if line.is_empty() {
        return None;
    }
    Some(truncate_with_ellipsis(line, MAX_TITLE_CHARS))
}

fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|err| ScriptaError::Titler(err.to_string()))
}

fn post_json(request: reqwest::blocking::RequestBuilder, provider: &str) -> Result<Value> {
    let response = request
        .send()
        .map_err(|err| ScriptaError::Titler(format!("{provider} request failed: {err}")))?;
    if !response.status().is_success() {
        return Err(ScriptaError::Titler(format!(
            "{provider} call failed with status {}",
            response.status()
        )));
    }
    response
        .json()
        .map_err(|err| ScriptaError::Titler(format!("{provider} response unreadable: {err}")))
}

fn extract_chat_text(json: &Value) -> Option<String> {
    let content = json
        .get("choices")
        .and_then(Value::as_array)?
        .first()?
        .get("message")?
        .get("content")?;
    match content {
        Value::String(s) => Some(s.to_string()),
        Value::Array(parts) => {
            let chunks: Vec<&str> = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect();
            if chunks.is_empty() {
                None
            } else {
                Some(chunks.join("\n"))
            }
        }
        _ => None,
    }
}

fn extract_anthropic_text(json: &Value) -> Option<String> {
    let chunks: Vec<&str> = json
        .get("content")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if chunks.is_empty() {
        None
    } else {
        Some(chunks.join("\n"))
    }
}

fn extract_gemini_text(json: &Value) -> Option<String> {
    json.get("candidates")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|v| v.get("content"))
        .and_then(|v| v.get("parts"))
        .and_then(Value::as_array)
        .and_then(|parts| parts.first())
        .and_then(|v| v.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn finish(provider: &str, text: Option<String>) -> Result<String> {
    text.as_deref()
        .and_then(clean_title)
        .ok_or_else(|| ScriptaError::Titler(format!("{provider} response missing title text")))
}

impl Titler for LocalTitler {
    fn label(&self) -> &'static str {
        "local"
    }

    fn suggest(&self, text: &str) -> Result<String> {
        text.lines()
            .map(str::trim)
            .find(|l| l.chars().filter(|c| c.is_alphanumeric()).count() >= MIN_LINE_ALNUM)
            .and_then(clean_title)
            .ok_or_else(|| ScriptaError::Titler("no line suitable for a title".to_string()))
    }
}

impl Titler for OpenAiTitler {
    fn label(&self) -> &'static str {
        "openai"
    }

    fn suggest(&self, text: &str) -> Result<String> {
        let base = self.base_url.trim_end_matches('/');
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": build_prompt(text)}
            ],
            "temperature": 0.2
        });
        let request = http_client()?
            .post(format!("{base}/v1/chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&payload);
        let json = post_json(request, "openai")?;
        finish("openai", extract_chat_text(&json))
    }
}

impl Titler for AnthropicTitler {
    fn label(&self) -> &'static str {
        "anthropic"
    }

    fn suggest(&self, text: &str) -> Result<String> {
        let payload = serde_json::json!({
            "model": self.model,
            "max_tokens": 100,
            "temperature": 0.2,
            "messages": [
                {"role": "user", "content": build_prompt(text)}
            ]
        });
        let request = http_client()?
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&payload);
        let json = post_json(request, "anthropic")?;
        finish("anthropic", extract_anthropic_text(&json))
    }
}

impl Titler for GeminiTitler {
    fn label(&self) -> &'static str {
        "gemini"
    }

    fn suggest(&self, text: &str) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let payload = serde_json::json!({
            "contents": [
                {"parts": [{"text": build_prompt(text)}]}
            ]
        });
        let request = http_client()?
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload);
        let json = post_json(request, "gemini")?;
        finish("gemini", extract_gemini_text(&json))
    }
}
