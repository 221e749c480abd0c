//! Tier-0 ticker recall from prior conversation turns.

/// Common words that look like tickers once written in caps but never are.
const TICKER_STOP_WORDS: &[&str] = &[
    "ANALYZE", "CHECK", "PRICE", "STOCK", "SHARE", "ABOUT", "WHAT", "HOW",
    "WHEN", "PORTFOLIO", "ANALYSIS", "MARKET", "GENERAL", "REPORT", "SUMMARY",
    "UPDATE", "SHOW", "TELL", "GIVE", "FIND", "THIS", "THAT", "WITH", "FROM",
    "YOUR", "THEY", "DOES", "WANT", "NEED", "LIKE", "LOOK", "DATA", "REAL",
    "USER", "SURE", "HELP", "LIST", "TYPE", "CODE", "READ", "FILE", "VIEW",
    "EDIT", "TOOL", "CALL", "NAME", "ARGS", "INFO", "API", "LOAD", "SAVE",
    "BEST", "GOOD", "TIME", "YEAR", "MONTH", "WEEK", "DAY", "HOUR", "MIN",
    "SEC", "ALL", "NONE", "NULL", "TRUE", "FALSE", "AND", "THE", "FOR",
    "NOW", "NEW", "OLD", "BUY", "SELL", "HOLD", "NO", "OK", "US", "UK",
    "AI", "TV", "PE", "ETF", "IPO", "CEO", "CFO", "GDP", "USD", "GBP", "EUR",
];

/// Extract the last ticker-shaped token from a piece of text.
///
/// Ticker shape: 3-5 uppercase alphanumeric core characters with at least
/// one letter, an optional `$` prefix, and an optional venue suffix after a
/// literal `.`. Lowercase words never match; shorter cores match only with
/// a `$` prefix or a venue suffix. The *last* occurrence wins so that
/// "forget TSLA, look at AAPL" resolves to AAPL.
pub fn extract_ticker(text: &str) -> Option<String> {
    let mut found = None;
    for token in text.split_whitespace() {
        if let Some(ticker) = token_ticker(token) {
            found = Some(ticker);
        }
    }
    found
}

/// Scan prior turns, newest first, for the most recently mentioned ticker.
pub fn recall_from_history(history: &[String]) -> Option<String> {
    history.iter().rev().find_map(|turn| extract_ticker(turn))
}

fn token_ticker(token: &str) -> Option<String> {
    let stripped =
        token.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '$' && c != '.');
    let stripped = stripped.trim_end_matches('.');

    let (dollar, body) = match stripped.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, stripped),
    };
    if body.is_empty() {
        return None;
    }

    let (core, suffix) = match body.split_once('.') {
        Some((core, suffix)) => (core, Some(suffix)),
        None => (body, None),
    };

    if core.is_empty() || core.len() > 5 {
        return None;
    }
    if !core
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return None;
    }
    if !core.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if let Some(suffix) = suffix {
        let valid = !suffix.is_empty()
            && suffix.len() <= 3
            && suffix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
        if !valid {
            return None;
        }
    }
    // One- and two-letter cores are too noisy in prose ("A", "IS", "ON");
    // demand an explicit marker for anything under three characters.
    if core.len() < 3 && !dollar && suffix.is_none() {
        return None;
    }
    if suffix.is_none() && TICKER_STOP_WORDS.contains(&core) {
        return None;
    }

    Some(body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_plain_ticker() {
        assert_eq!(extract_ticker("what about AAPL today?").as_deref(), Some("AAPL"));
    }

    #[test]
    fn dollar_prefix_matches() {
        assert_eq!(extract_ticker("thoughts on $tsla?"), None); // lowercase never matches
        assert_eq!(extract_ticker("thoughts on $TSLA?").as_deref(), Some("TSLA"));
    }

    #[test]
    fn venue_qualified_ticker_matches() {
        assert_eq!(
            extract_ticker("compare VOD.L against the index").as_deref(),
            Some("VOD.L")
        );
    }

    #[test]
    fn last_occurrence_wins() {
        assert_eq!(
            extract_ticker("forget TSLA, look at AAPL instead").as_deref(),
            Some("AAPL")
        );
    }

    #[test]
    fn stop_words_and_fragments_never_match() {
        assert_eq!(extract_ticker("WHAT IS THE PRICE"), None);
        assert_eq!(extract_ticker("show me a SUMMARY"), None);
        assert_eq!(extract_ticker("how is it going?"), None);
    }

    #[test]
    fn short_cores_need_prefix_or_suffix() {
        assert_eq!(extract_ticker("grade A results"), None);
        assert_eq!(extract_ticker("it IS ON now"), None);
        assert_eq!(extract_ticker("WHAT IS IT AT"), None);
        assert_eq!(extract_ticker("long $F here").as_deref(), Some("F"));
        assert_eq!(extract_ticker("watch $BP today").as_deref(), Some("BP"));
        assert_eq!(extract_ticker("compare BP.L levels").as_deref(), Some("BP.L"));
    }

    #[test]
    fn pure_numbers_never_match() {
        assert_eq!(extract_ticker("up 12345 points"), None);
    }

    #[test]
    fn recall_prefers_most_recent_turn() {
        let history = vec![
            "tell me about TSLA".to_string(),
            "interesting, thanks".to_string(),
            "now check LLOY please".to_string(),
            "and the volume?".to_string(),
        ];
        assert_eq!(recall_from_history(&history).as_deref(), Some("LLOY"));
    }

    #[test]
    fn recall_returns_none_for_chatter() {
        let history = vec![
            "good morning".to_string(),
            "what can you do?".to_string(),
        ];
        assert_eq!(recall_from_history(&history), None);
    }
}
