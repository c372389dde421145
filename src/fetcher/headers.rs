use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA, USER_AGENT,
};

/// Pool of realistic User-Agent strings for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Linux; Android 14; SM-S918N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
];

/// Supplies per-request headers and the anti-cache token
///
/// The production implementation randomizes both; tests inject a fixed one.
pub trait HeaderProvider: Send + Sync {
    /// Headers for the next request
    fn headers(&self) -> HeaderMap;

    /// Anti-cache token: epoch milliseconds followed by a 3-digit suffix
    fn cache_token(&self, now_ms: i64) -> String;
}

/// Build headers for the announcements API
///
/// # Examples
///
/// ```
/// use notice_sentinel::fetcher::headers::build_notice_headers;
/// use reqwest::header::USER_AGENT;
///
/// let headers = build_notice_headers("Mozilla/5.0");
/// assert_eq!(headers.get(USER_AGENT).unwrap(), "Mozilla/5.0");
/// ```
pub fn build_notice_headers(user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let agent = HeaderValue::from_str(user_agent)
        .unwrap_or_else(|_| HeaderValue::from_static(USER_AGENTS[0]));
    headers.insert(USER_AGENT, agent);
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=1"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));

    headers
}

/// Join epoch milliseconds and a suffix into a cache-busting token
pub fn format_cache_token(now_ms: i64, suffix: u16) -> String {
    format!("{now_ms}{suffix:03}")
}

/// Rotates the User-Agent and draws a fresh random token suffix per request
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomHeaderProvider;

impl RandomHeaderProvider {
    fn random_user_agent(&self) -> &'static str {
        let mut rng = rand::thread_rng();
        USER_AGENTS.choose(&mut rng).unwrap_or(&USER_AGENTS[0])
    }
}

impl HeaderProvider for RandomHeaderProvider {
    fn headers(&self) -> HeaderMap {
        build_notice_headers(self.random_user_agent())
    }

    fn cache_token(&self, now_ms: i64) -> String {
        format_cache_token(now_ms, rand::thread_rng().gen_range(100..=999))
    }
}

/// Deterministic provider for tests and probes
#[derive(Debug, Clone)]
pub struct FixedHeaderProvider {
    pub user_agent: String,
    pub token_suffix: u16,
}

impl FixedHeaderProvider {
    pub fn new(user_agent: impl Into<String>, token_suffix: u16) -> Self {
        Self {
            user_agent: user_agent.into(),
            token_suffix,
        }
    }
}

impl HeaderProvider for FixedHeaderProvider {
    fn headers(&self) -> HeaderMap {
        build_notice_headers(&self.user_agent)
    }

    fn cache_token(&self, now_ms: i64) -> String {
        format_cache_token(now_ms, self.token_suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_notice_headers() {
        let headers = build_notice_headers("Mozilla/5.0");

        assert_eq!(
            headers.get(USER_AGENT).unwrap(),
            HeaderValue::from_static("Mozilla/5.0")
        );
        assert_eq!(
            headers.get(ACCEPT_LANGUAGE).unwrap(),
            HeaderValue::from_static("ko-KR,ko;q=1")
        );
        assert_eq!(
            headers.get(ACCEPT).unwrap(),
            HeaderValue::from_static("application/json, text/plain, */*")
        );
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "no-cache");
        assert_eq!(headers.get(PRAGMA).unwrap(), "no-cache");
    }

    #[test]
    fn test_invalid_user_agent_falls_back() {
        let headers = build_notice_headers("bad\nagent");
        assert_eq!(headers.get(USER_AGENT).unwrap(), USER_AGENTS[0]);
    }

    #[test]
    fn test_user_agent_rotation() {
        let provider = RandomHeaderProvider;

        let mut agents = std::collections::HashSet::new();
        for _ in 0..100 {
            let agent = provider.random_user_agent();
            assert!(USER_AGENTS.contains(&agent));
            agents.insert(agent);
        }

        assert!(agents.len() > 1, "User agents should rotate");
    }

    #[test]
    fn test_random_cache_token_shape() {
        let provider = RandomHeaderProvider;
        for _ in 0..100 {
            let token = provider.cache_token(1_700_000_000_000);
            assert_eq!(token.len(), 16);
            assert!(token.starts_with("1700000000000"));
            let suffix: u16 = token[13..].parse().unwrap();
            assert!((100..=999).contains(&suffix));
        }
    }

    #[test]
    fn test_fixed_provider() {
        let provider = FixedHeaderProvider::new("test-agent", 123);
        assert_eq!(provider.cache_token(42), "42123");
        assert_eq!(provider.headers().get(USER_AGENT).unwrap(), "test-agent");
    }
}
