//! Asset code extraction from announcement titles
//!
//! Listing notices put the asset code in parentheses ahead of one of two
//! trigger phrases, e.g. `"비트코인(BTC) 신규 거래지원 안내"` or
//! `"이더리움(ETH) 디지털 자산 추가 안내"`.

use regex::Regex;
use std::sync::OnceLock;

/// Parenthesized code followed, on the same line, by a listing trigger phrase
const TICKER_PATTERN: &str =
    r"\(([A-Z0-9._-]+)\)[^\n]*?(?:신규\s*거래지원\s*안내|디지털\s*자산\s*추가)";

fn ticker_regex() -> &'static Regex {
    static TICKER_RE: OnceLock<Regex> = OnceLock::new();
    TICKER_RE.get_or_init(|| Regex::new(TICKER_PATTERN).expect("Invalid ticker regex pattern"))
}

/// Extract the asset code from a listing title.
///
/// Returns an empty string when the title has no parenthesized code ahead of
/// a trigger phrase. Never fails.
pub fn extract_ticker(title: &str) -> String {
    if title.is_empty() {
        return String::new();
    }

    ticker_regex()
        .captures(title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
