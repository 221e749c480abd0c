use async_trait::async_trait;
use sqad_resolve::extract_ticker;
use tracing::debug;

/// Broad query category. Decides which specialists a query needs when the
/// caller does not pick them explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    PriceCheck,
    ForecastRequest,
    MarketAnalysis,
    PortfolioQuery,
    Educational,
}

/// Classified intent: which specialists to dispatch to and any identifier
/// spotted in the query text.
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub kind: IntentKind,
    pub specialist_needs: Vec<String>,
    pub ticker_hint: Option<String>,
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, query: &str) -> Intent;
}

const ALL_SPECIALISTS: &[&str] = &[
    "technical",
    "price_history",
    "news",
    "forecast",
    "social",
    "flow",
];

/// Keyword-rule classifier. Deterministic and offline; a model-backed
/// classifier can slot in behind the same trait.
pub struct RuleIntentClassifier;

impl RuleIntentClassifier {
    fn kind_for(query: &str, has_ticker: bool) -> IntentKind {
        let lowered = query.to_lowercase();

        if ["forecast", "predict", "price target", "where is it going"]
            .iter()
            .any(|kw| lowered.contains(kw))
        {
            return IntentKind::ForecastRequest;
        }
        if ["portfolio", "holdings", "my positions"]
            .iter()
            .any(|kw| lowered.contains(kw))
        {
            return IntentKind::PortfolioQuery;
        }
        if ["analy", "deep dive", "full picture"]
            .iter()
            .any(|kw| lowered.contains(kw))
        {
            return IntentKind::MarketAnalysis;
        }
        if ["price", "quote", "worth", "trading at", "how much"]
            .iter()
            .any(|kw| lowered.contains(kw))
        {
            return IntentKind::PriceCheck;
        }
        // A bare ticker with no verbs still deserves a full look.
        if has_ticker {
            IntentKind::MarketAnalysis
        } else {
            IntentKind::Educational
        }
    }

    fn needs_for(kind: IntentKind) -> Vec<String> {
        let names: &[&str] = match kind {
            IntentKind::PriceCheck => &["price_history"],
            IntentKind::ForecastRequest => &["forecast", "technical", "price_history"],
            IntentKind::MarketAnalysis => ALL_SPECIALISTS,
            IntentKind::PortfolioQuery => &["price_history", "technical", "flow"],
            IntentKind::Educational => &[],
        };
        names.iter().map(|n| n.to_string()).collect()
    }
}

#[async_trait]
impl IntentClassifier for RuleIntentClassifier {
    async fn classify(&self, query: &str) -> Intent {
        let ticker_hint = extract_ticker(query);
        let kind = Self::kind_for(query, ticker_hint.is_some());
        let specialist_needs = Self::needs_for(kind);
        debug!(?kind, needs = specialist_needs.len(), "classified query intent");
        Intent {
            kind,
            specialist_needs,
            ticker_hint,
        }
    }
}
