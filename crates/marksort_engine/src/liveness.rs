use std::time::Duration;

use marksort_logging::mark_debug;

use crate::SetupError;

#[derive(Debug, Clone)]
pub struct LivenessSettings {
    pub timeout: Duration,
    pub redirect_limit: usize,
    /// Lowercase substrings that mark a url as dead without probing it.
    pub blocked_patterns: Vec<String>,
}

impl Default for LivenessSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5_000),
            redirect_limit: 10,
            blocked_patterns: vec![
                "checkout".to_string(),
                "/cart".to_string(),
                "/basket".to_string(),
                "checkoutid=".to_string(),
            ],
        }
    }
}

impl LivenessSettings {
    /// Session-bound urls (carts, checkouts) answer a probe fine but are
    /// useless as bookmarks.
    pub fn is_blocked(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        self.blocked_patterns
            .iter()
            .any(|pattern| lower.contains(pattern.as_str()))
    }
}

/// Heuristic alive/dead oracle for a bookmark url.
#[async_trait::async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn check(&self, url: &str) -> bool;
}

/// Probes with a HEAD request. Any response that arrives in time counts as
/// alive, whatever its status; only transport failures and timeouts are dead.
#[derive(Debug, Clone)]
pub struct ReqwestLivenessChecker {
    settings: LivenessSettings,
    client: reqwest::Client,
}

impl ReqwestLivenessChecker {
    pub fn new(settings: LivenessSettings) -> Result<Self, SetupError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()?;
        Ok(Self { settings, client })
    }
}

#[async_trait::async_trait]
impl LivenessProbe for ReqwestLivenessChecker {
    async fn check(&self, url: &str) -> bool {
        if self.settings.is_blocked(url) {
            mark_debug!("Skipping probe for session url {}", url);
            return false;
        }

        let parsed = match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
            Ok(parsed) => {
                mark_debug!("Unprobeable scheme {} for {}", parsed.scheme(), url);
                return false;
            }
            Err(err) => {
                mark_debug!("Invalid url {}: {}", url, err);
                return false;
            }
        };

        match self.client.head(parsed).send().await {
            Ok(response) => {
                mark_debug!("Probe {} answered {}", url, response.status());
                true
            }
            Err(err) => {
                mark_debug!(
                    "Probe {} failed (timeout={}): {}",
                    url,
                    err.is_timeout(),
                    err
                );
                false
            }
        }
    }
}
