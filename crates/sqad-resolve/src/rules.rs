//! Tier-1 deterministic ticker normalization.
//!
//! Resolves identifier discrepancies between broker exports and market-data
//! venues: broker suffixes (`AAPL_US_EQ`), mangled UK symbols (`VODL`),
//! share-class digits (`LLOY1`) and missing venue qualifiers (`VOD` vs
//! `VOD.L`). Pure and idempotent; a dotted ticker is never rewritten.

/// Broker-specific suffixes stacked onto exported symbols. Stripped
/// repeatedly since some exports carry several (e.g. `AAPL_US_EQ`).
const BROKER_SUFFIXES: &[&str] = &[
    "_EQ", "_US", "_BE", "_DE", "_GB", "_FR", "_NL", "_ES", "_IT",
];

/// Curated map of broker-mangled symbols to their canonical roots.
const SPECIAL_MAPPINGS: &[(&str, &str)] = &[
    ("SSLNL", "SSLN"),
    ("SGLNL", "SGLN"),
    ("3GLD", "3GLD"),
    ("SGLN", "SGLN"),
    ("PHGP", "PHGP"),
    ("PHAU", "PHAU"),
    ("3LTS", "3LTS"),
    ("3USL", "3USL"),
    ("LLOY1", "LLOY"),
    ("VOD1", "VOD"),
    ("BARC1", "BARC"),
    ("TSCO1", "TSCO"),
    ("BPL1", "BP"),
    ("BPL", "BP"),
    ("AZNL1", "AZN"),
    ("AZNL", "AZN"),
    ("SGLN1", "SGLN"),
    ("MAG5", "MAG5"),
    ("MAG5L", "MAG5"),
    ("MAG7", "MAG7"),
    ("MAG7L", "MAG7"),
    ("GLD3", "GLD3"),
    ("3UKL", "3UKL"),
    ("5QQQ", "5QQQ"),
    ("TSL3", "TSL3"),
    ("NVD3", "NVD3"),
    ("AVL", "AV"),
    ("UUL", "UU"),
    ("BAL", "BA"),
    ("SLL", "SL"),
    ("AU", "AUT"),
    ("RBL", "RKT"),
    ("MICCL", "MICC"),
];

/// US large caps and ETFs that must never receive a `.L` venue suffix even
/// though their length or shape would otherwise classify them as UK-listed.
const US_EXCLUSIONS: &[&str] = &[
    // Tech & growth
    "AAPL", "MSFT", "GOOG", "GOOGL", "AMZN", "NVDA", "TSLA", "META", "NFLX",
    "AMD", "INTC", "PYPL", "ADBE", "CSCO", "COST", "AVGO", "QCOM", "TXN",
    "ORCL", "CRM", "IBM", "UBER", "ABNB", "SNOW", "PLTR", "SQ", "SHOP", "SPOT",
    "SMCI", "MSTR", "COIN", "HOOD", "ARM", "DKNG", "SOFI", "MARA", "RIOT",
    "CRWD", "PANW", "NET", "DDOG", "ZS", "TEAM", "MDB", "OKTA", "DOCU",
    // Financials
    "JPM", "BAC", "WFC", "C", "GS", "MS", "BLK", "AXP", "V", "MA", "COF", "USB",
    // Industrial & auto
    "CAT", "DE", "GE", "GM", "F", "BA", "LMT", "RTX", "HON", "UPS", "FDX", "UNP", "MMM",
    // Consumer
    "WMT", "TGT", "HD", "LOW", "MCD", "SBUX", "NKE", "KO", "PEP", "PG", "CL",
    "MO", "PM", "DIS", "CMCSA",
    // Healthcare
    "JNJ", "PFE", "MRK", "ABBV", "LLY", "UNH", "CVS", "AMGN", "GILD", "BMY",
    "ISRG", "TMO", "ABT", "DHR",
    // Energy
    "XOM", "CVX", "COP", "SLB", "EOG", "OXY", "KMI", "HAL",
    // Telecom
    "T", "VZ", "TMUS",
    // ETFs
    "SPY", "QQQ", "DIA", "IWM", "IVV", "VOO", "VTI", "GLD", "SLV", "ARKK",
    "SMH", "XLF", "XLE", "XLK", "XLV",
    // Single-letter US tickers
    "Z", "O", "D", "R", "K", "X", "S", "M", "A", "G",
];

/// Stems of common UK-listed names whose symbols some brokers export with a
/// trailing share-class digit (`LLOY1`).
const UK_COMMON_STEMS: &[&str] = &[
    "LLOY", "BARC", "VOD", "HSBA", "TSCO", "BP", "AZN", "RR", "NG", "SGLN",
    "SSLN", "GSK", "SHELL", "BATS", "AHT", "NWG", "GLEN",
];

/// Canonicalize a raw user-or-broker ticker string.
///
/// Idempotent: `normalize_ticker(normalize_ticker(x)) == normalize_ticker(x)`
/// for every input, because any rewritten output is venue-qualified and a
/// dotted ticker passes through unchanged.
pub fn normalize_ticker(raw: &str) -> String {
    let cleaned = raw.trim().to_ascii_uppercase();
    let cleaned = cleaned.trim_start_matches('$');
    if cleaned.is_empty() {
        return String::new();
    }

    // Passthrough invariant: a venue-qualified ticker is never rewritten.
    if cleaned.contains('.') {
        return cleaned.to_string();
    }

    let original = cleaned.to_string();
    let mut ticker = strip_broker_suffixes(cleaned);
    ticker = ticker.replace('_', "");

    if let Some(mapped) = alias_for(&ticker) {
        ticker = mapped.to_string();
    }

    // Share-class digit appended by some brokers to disambiguate listings.
    if ticker.len() > 3 && ticker.ends_with('1') {
        let stem = &ticker[..ticker.len() - 1];
        if UK_COMMON_STEMS.contains(&stem) {
            ticker = stem.to_string();
        }
    }

    // Extra trailing L some brokers glue onto a known UK stem (VODL, GSKL).
    // Real US symbols ending in L (GOOGL) are protected by the exclusion set.
    if ticker.ends_with('L') && !US_EXCLUSIONS.contains(&ticker.as_str()) {
        let stem = &ticker[..ticker.len() - 1];
        if UK_COMMON_STEMS.contains(&stem) {
            ticker = stem.to_string();
        }
    }

    if ticker.is_empty() {
        return ticker;
    }

    let is_explicit_uk = original.contains("_EQ") && !original.contains("_US");
    let excluded = US_EXCLUSIONS.contains(&ticker.as_str());
    let is_likely_uk = ticker.len() <= 4 || ticker.ends_with('L');

    if (is_explicit_uk || is_likely_uk || leveraged_shape(&ticker)) && !excluded {
        return format!("{ticker}.L");
    }

    ticker
}

fn strip_broker_suffixes(symbol: &str) -> String {
    let mut out = symbol.to_string();
    loop {
        let mut changed = false;
        for suffix in BROKER_SUFFIXES {
            if let Some(stripped) = out.strip_suffix(suffix) {
                out = stripped.to_string();
                changed = true;
            }
        }
        if !changed {
            return out;
        }
    }
}

fn alias_for(symbol: &str) -> Option<&'static str> {
    SPECIAL_MAPPINGS
        .iter()
        .find(|(from, _)| *from == symbol)
        .map(|(_, to)| *to)
}

/// Leveraged ETPs carry a leading 3/5/7 multiplier or a trailing 2/3/5/7
/// multiplier digit (e.g. `3GLD`, `TSL3`) and list on the LSE.
fn leveraged_shape(symbol: &str) -> bool {
    if symbol.len() > 5 || !symbol.chars().any(|c| c.is_ascii_alphabetic()) {
        return false;
    }
    let leading = symbol
        .chars()
        .next()
        .is_some_and(|c| matches!(c, '3' | '5' | '7'));
    let trailing = symbol
        .chars()
        .last()
        .is_some_and(|c| matches!(c, '2' | '3' | '5' | '7'));
    leading || trailing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_tickers_pass_through_unchanged() {
        assert_eq!(normalize_ticker("VOD.L"), "VOD.L");
        assert_eq!(normalize_ticker("BRK.B"), "BRK.B");
        assert_eq!(normalize_ticker("AAPL.MX"), "AAPL.MX");
    }

    #[test]
    fn broker_suffixes_are_stripped_repeatedly() {
        assert_eq!(normalize_ticker("AAPL_US_EQ"), "AAPL");
        assert_eq!(normalize_ticker("VOD_EQ"), "VOD.L");
        assert_eq!(normalize_ticker("TSLA_US_EQ"), "TSLA");
    }

    #[test]
    fn us_exclusion_list_blocks_venue_suffix() {
        assert_eq!(normalize_ticker("IBM"), "IBM");
        assert_eq!(normalize_ticker("AAPL"), "AAPL");
        assert_eq!(normalize_ticker("SMCI"), "SMCI");
        assert_eq!(normalize_ticker("COIN"), "COIN");
        assert_eq!(normalize_ticker("ARM"), "ARM");
        assert_eq!(normalize_ticker("GOOGL"), "GOOGL");
    }

    #[test]
    fn short_non_us_symbols_get_london_suffix() {
        assert_eq!(normalize_ticker("VOD"), "VOD.L");
        assert_eq!(normalize_ticker("LLOY"), "LLOY.L");
        assert_eq!(normalize_ticker("BARC"), "BARC.L");
        assert_eq!(normalize_ticker("HSBA"), "HSBA.L");
    }

    #[test]
    fn share_class_digit_is_stripped_for_known_stems() {
        assert_eq!(normalize_ticker("LLOY1"), "LLOY.L");
        assert_eq!(normalize_ticker("SGLN1"), "SGLN.L");
        assert_eq!(normalize_ticker("BARC1"), "BARC.L");
    }

    #[test]
    fn trailing_l_on_known_uk_stems_is_stripped() {
        assert_eq!(normalize_ticker("VODL"), "VOD.L");
        assert_eq!(normalize_ticker("GSKL"), "GSK.L");
        assert_eq!(normalize_ticker("BARCL"), "BARC.L");
        assert_eq!(normalize_ticker("TSCOL"), "TSCO.L");
        // US symbols genuinely ending in L keep their symbol.
        assert_eq!(normalize_ticker("GOOGL"), "GOOGL");
    }

    #[test]
    fn alias_table_rewrites_mangled_symbols() {
        assert_eq!(normalize_ticker("SSLNL"), "SSLN.L");
        assert_eq!(normalize_ticker("BPL"), "BP.L");
        assert_eq!(normalize_ticker("AVL"), "AV.L");
        assert_eq!(normalize_ticker("RBL"), "RKT.L");
    }

    #[test]
    fn leveraged_products_are_london_listed() {
        assert_eq!(normalize_ticker("3GLD"), "3GLD.L");
        assert_eq!(normalize_ticker("TSL3"), "TSL3.L");
        assert_eq!(normalize_ticker("5QQQ"), "5QQQ.L");
        assert_eq!(normalize_ticker("MAG5"), "MAG5.L");
    }

    #[test]
    fn dollar_prefix_and_whitespace_are_cleaned() {
        assert_eq!(normalize_ticker(" $aapl "), "AAPL");
        assert_eq!(normalize_ticker("$vod"), "VOD.L");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize_ticker(""), "");
        assert_eq!(normalize_ticker("  $"), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "AAPL", "aapl", "$TSLA", "VOD", "VOD.L", "VOD_EQ", "AAPL_US_EQ",
            "LLOY1", "SSLNL", "BPL", "3GLD", "TSL3", "IBM", "HSBA", "GOOGL",
            "ABCDE", "ZZZZ", "MICCL", "AU", "", "BRK.B", "VODL", "GSKL",
        ];
        for sample in samples {
            let once = normalize_ticker(sample);
            let twice = normalize_ticker(&once);
            assert_eq!(once, twice, "not idempotent for input {sample:?}");
        }
    }
}
