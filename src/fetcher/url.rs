//! Request and notice-page URL construction

use url::Url;

use crate::utils::error::FetchError;

/// Default announcements endpoint
pub const DEFAULT_API_URL: &str = "https://api-manager.upbit.com/api/v1/announcements.json";

/// Default public page for a single notice
pub const DEFAULT_NOTICE_PAGE_URL: &str = "https://upbit.com/service_center/notice";

/// Fixed query parameters, in the order they are sent
const FIXED_QUERY: &[(&str, &str)] = &[
    ("os", "android"),
    ("page", "1"),
    ("per_page", "1"),
    ("category", "a"),
];

/// Name of the anti-cache query parameter
pub const CACHE_TOKEN_PARAM: &str = "bc";

/// Parse and check the endpoint once, at construction time
pub fn parse_endpoint(endpoint: &str) -> Result<Url, FetchError> {
    let url = Url::parse(endpoint).map_err(|e| FetchError::InvalidUrl(format!("{endpoint}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidUrl(format!(
            "{endpoint}: unsupported scheme '{other}'"
        ))),
    }
}

/// Full request URL for one poll: fixed parameters plus the cache token
pub fn build_request_url(endpoint: &Url, cache_token: &str) -> Url {
    let mut url = endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (key, value) in FIXED_QUERY {
            query.append_pair(key, value);
        }
        query.append_pair(CACHE_TOKEN_PARAM, cache_token);
    }
    url
}

/// Link to the public page of a notice
pub fn notice_page_url(page_base: &str, id: i64) -> String {
    format!("{page_base}?id={id}")
}
