//! Language-model seam for the thinker.
//!
//! The thinker only needs "system instruction + user text -> text". Concrete
//! backends live in [`crate::openai`] and [`crate::gemini`]; both go through
//! [`send_with_retry`] for transient-failure handling.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::config::{LlmProvider, SoulConfig};
use crate::error::SoulError;
use crate::gemini::GeminiClient;
use crate::openai::OpenAiClient;

/// A hosted text-completion capability.
pub trait LanguageModel: Send + Sync + 'static {
    /// Complete `user_prompt` under `system_prompt` and return the generated text.
    fn complete<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> BoxFuture<'a, Result<String, SoulError>>;

    /// Short backend label for logs and status output.
    fn name(&self) -> &str;
}

/// Build the configured backend. Returns `None` when the soul is dormant.
pub fn client_from_config(config: &SoulConfig) -> Result<Option<Arc<dyn LanguageModel>>, SoulError> {
    let Some(api_key) = config.llm_api_key.clone() else {
        return Ok(None);
    };
    let timeout = Duration::from_secs(config.llm_timeout_secs);

    let client: Arc<dyn LanguageModel> = match config.provider {
        LlmProvider::OpenAi => Arc::new(OpenAiClient::new(
            api_key,
            config.llm_model.clone(),
            config.llm_base_url.clone(),
            timeout,
        )?),
        LlmProvider::Gemini => Arc::new(GeminiClient::new(
            api_key,
            config.llm_model.clone(),
            config.llm_base_url.clone(),
            timeout,
        )?),
    };
    Ok(Some(client))
}

/// Build the shared HTTP client used by both backends.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, SoulError> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}

const BACKOFF_MS: [u64; 3] = [500, 1000, 2000];

/// Send a request, retrying transport errors, 429 and 5xx up to three times
/// with exponential backoff + jitter. Returns the successful response body.
pub(crate) async fn send_with_retry<F>(build: F) -> Result<String, SoulError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_err = None;

    for (attempt, base_delay) in BACKOFF_MS.iter().enumerate() {
        let is_last = attempt == BACKOFF_MS.len() - 1;

        match build().send().await {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await?;

                if status.is_success() {
                    return Ok(body);
                }

                let err = SoulError::Llm(format!(
                    "HTTP {}: {}",
                    status,
                    body.chars().take(200).collect::<String>()
                ));
                let retryable = status.is_server_error() || status.as_u16() == 429;
                if !retryable {
                    return Err(err);
                }
                last_err = Some(err);
            }
            Err(e) => {
                last_err = Some(SoulError::Http(e));
            }
        }

        if !is_last {
            tracing::debug!(attempt = attempt + 1, "LLM request failed, retrying");
            tokio::time::sleep(Duration::from_millis(jitter_ms(*base_delay))).await;
        }
    }

    Err(last_err.unwrap_or_else(|| SoulError::Llm("all retries exhausted".to_string())))
}

/// Add ±25% jitter to a base delay.
fn jitter_ms(base: u64) -> u64 {
    let quarter = base / 4;
    let offset = simple_random() % (quarter * 2 + 1);
    base - quarter + offset
}

/// Simple pseudo-random using timestamp nanos (not cryptographic, just for jitter).
fn simple_random() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0)
}
