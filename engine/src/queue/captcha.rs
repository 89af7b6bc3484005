//! CAPTCHA verification capability.
//!
//! Verification is advisory: any error means "no opinion" and the caller
//! proceeds (fail-open).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";
const VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptchaScore {
    pub passed: bool,
    pub score: Option<f64>,
}

#[derive(Error, Debug)]
pub enum CaptchaError {
    #[error("captcha transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("captcha provider rejected request: {0}")]
    Provider(String),
}

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, token: &str, client_ip: Option<&str>) -> Result<CaptchaScore, CaptchaError>;
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// reCAPTCHA v3 server-side verification.
pub struct RecaptchaVerifier {
    client: reqwest::Client,
    secret: String,
    threshold: f64,
    endpoint: String,
}

impl RecaptchaVerifier {
    pub fn new(secret: String, threshold: f64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(VERIFY_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            secret,
            threshold,
            endpoint: RECAPTCHA_VERIFY_URL.to_string(),
        }
    }

    fn evaluate(&self, response: SiteVerifyResponse) -> Result<CaptchaScore, CaptchaError> {
        if !response.success && response.score.is_none() && !response.error_codes.is_empty() {
            return Err(CaptchaError::Provider(response.error_codes.join(",")));
        }
        let passed = response.success && response.score.is_none_or(|s| s >= self.threshold);
        Ok(CaptchaScore {
            passed,
            score: response.score,
        })
    }
}

#[async_trait]
impl CaptchaVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str, client_ip: Option<&str>) -> Result<CaptchaScore, CaptchaError> {
        let form = [
            ("secret", self.secret.as_str()),
            ("response", token),
            ("remoteip", client_ip.unwrap_or("")),
        ];
        let response: SiteVerifyResponse = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(
            success = response.success,
            score = ?response.score,
            "reCAPTCHA verification response"
        );
        self.evaluate(response)
    }
}
