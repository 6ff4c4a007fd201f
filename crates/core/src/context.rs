//! Retrieval Context Model
//!
//! Data types for passages retrieved from similarity-search collections,
//! plus the two pure algorithms that operate on them: cross-collection
//! merge/rank and budget truncation.
//!
//! ## Distance Semantics
//!
//! `distance` is a similarity-search score where lower means more relevant.
//! No fixed scale is assumed across collections: sort order is monotonic
//! within a single collection's results but not calibrated between
//! collections that may use different embedding models. Cross-collection
//! ranking is therefore an accepted approximation, kept as-is rather than
//! hidden behind an invented calibration scheme.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which kind of collection a retrieved passage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Official documentation chunks (carry section/title metadata).
    Documentation,
    /// Chat conversation snippets (shown anonymously).
    Chat,
    /// Source could not be determined from metadata.
    Unknown,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Documentation => write!(f, "documentation"),
            SourceKind::Chat => write!(f, "chat"),
            SourceKind::Unknown => write!(f, "unknown"),
        }
    }
}

impl SourceKind {
    /// Parse the `source_type` metadata value emitted by the ingestion side.
    pub fn from_metadata(value: &str) -> Self {
        match value {
            "documentation" => SourceKind::Documentation,
            "chat" => SourceKind::Chat,
            _ => SourceKind::Unknown,
        }
    }
}

/// A single passage returned by a similarity-search collection.
///
/// Immutable once produced by the retriever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedItem {
    /// The passage text.
    pub text: String,
    /// Scalar metadata attached at ingestion time (title, section, ...).
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Similarity distance; lower is more relevant.
    pub distance: f64,
    /// Originating collection kind.
    pub source: SourceKind,
}

impl RetrievedItem {
    /// Look up a string-valued metadata field.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// An ordered sequence of retrieved items, globally sorted ascending by
/// distance. Ties preserve per-collection insertion order (stable sort).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankedContext {
    pub items: Vec<RetrievedItem>,
}

impl RankedContext {
    /// Merge result lists from multiple collections into one globally
    /// ranked sequence: concatenate, then stable-sort ascending by distance.
    pub fn merge(lists: Vec<Vec<RetrievedItem>>) -> Self {
        let mut items: Vec<RetrievedItem> = lists.into_iter().flatten().collect();
        // IEEE total order keeps the comparator total even if a backend
        // emits a NaN distance; NaN sorts after every finite value.
        items.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Count items of a given source kind.
    pub fn count_source(&self, kind: SourceKind) -> usize {
        self.items.iter().filter(|i| i.source == kind).count()
    }
}

/// A rank-order prefix of a [`RankedContext`] that fits a unit budget,
/// plus the number of items dropped to stay within it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetedContext {
    pub items: Vec<RetrievedItem>,
    /// Items cut by budgeting (`total - included`).
    pub dropped: usize,
}

impl BudgetedContext {
    /// Walk the ranked sequence in order, including each item whole while
    /// the running estimated cost stays within `budget_units`, and stop at
    /// the first item that does not fit. Rank order wins over packing
    /// efficiency: later, smaller items are never pulled forward.
    ///
    /// The estimator sees the whole item so callers can charge the form
    /// that actually reaches the model (labels and all), not just the raw
    /// passage text.
    pub fn truncate<F>(ctx: &RankedContext, budget_units: usize, estimator: F) -> Self
    where
        F: Fn(&RetrievedItem) -> usize,
    {
        let mut included = Vec::new();
        let mut used = 0usize;

        for item in &ctx.items {
            let cost = estimator(item);
            if used + cost > budget_units {
                break;
            }
            used += cost;
            included.push(item.clone());
        }

        let dropped = ctx.items.len() - included.len();
        Self {
            items: included,
            dropped,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Count included items of a given source kind.
    pub fn count_source(&self, kind: SourceKind) -> usize {
        self.items.iter().filter(|i| i.source == kind).count()
    }
}

/// Rough token estimate: ~4 bytes of text per token. The budget is a safety
/// margin, not a billing-accurate count, so an exact tokenizer is not needed.
pub fn approx_token_cost(text: &str) -> usize {
    text.len() / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str, distance: f64, source: SourceKind) -> RetrievedItem {
        RetrievedItem {
            text: text.to_string(),
            metadata: BTreeMap::new(),
            distance,
            source,
        }
    }

    #[test]
    fn test_merge_sorts_ascending_and_preserves_length() {
        let docs = vec![
            item("d1", 0.1, SourceKind::Documentation),
            item("d2", 0.2, SourceKind::Documentation),
            item("d3", 0.3, SourceKind::Documentation),
            item("d4", 0.4, SourceKind::Documentation),
            item("d5", 0.5, SourceKind::Documentation),
        ];
        let chat = vec![
            item("c1", 0.05, SourceKind::Chat),
            item("c2", 0.15, SourceKind::Chat),
            item("c3", 0.25, SourceKind::Chat),
            item("c4", 0.35, SourceKind::Chat),
            item("c5", 0.45, SourceKind::Chat),
        ];

        let merged = RankedContext::merge(vec![docs, chat]);
        assert_eq!(merged.len(), 10);
        // Scenario A: starts with the 0.05 item, ends with 0.5.
        assert_eq!(merged.items.first().unwrap().text, "c1");
        assert_eq!(merged.items.last().unwrap().text, "d5");
        for pair in merged.items.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_merge_is_stable_on_ties() {
        let a = vec![
            item("a1", 0.2, SourceKind::Documentation),
            item("a2", 0.2, SourceKind::Documentation),
        ];
        let b = vec![item("b1", 0.2, SourceKind::Chat)];

        let merged = RankedContext::merge(vec![a, b]);
        let order: Vec<&str> = merged.items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(order, vec!["a1", "a2", "b1"]);
    }

    #[test]
    fn test_merge_sorts_nan_distances_last_without_panicking() {
        let hits = vec![
            item("broken", f64::NAN, SourceKind::Chat),
            item("far", 0.9, SourceKind::Chat),
            item("near", 0.1, SourceKind::Chat),
        ];

        let merged = RankedContext::merge(vec![hits]);
        let order: Vec<&str> = merged.items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(order, vec!["near", "far", "broken"]);
        assert!(merged.items.last().unwrap().distance.is_nan());
    }

    #[test]
    fn test_merge_empty_lists() {
        let merged = RankedContext::merge(vec![vec![], vec![]]);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_truncate_never_exceeds_budget() {
        let ctx = RankedContext::merge(vec![vec![
            item("aaaa", 0.1, SourceKind::Chat),
            item("bbbbbbbb", 0.2, SourceKind::Chat),
            item("cccc", 0.3, SourceKind::Chat),
        ]]);

        // Cost = byte length; budget fits the first two items exactly.
        let budgeted = BudgetedContext::truncate(&ctx, 12, |i| i.text.len());
        assert_eq!(budgeted.len(), 2);
        assert_eq!(budgeted.dropped, 1);
        let used: usize = budgeted.items.iter().map(|i| i.text.len()).sum();
        assert!(used <= 12);
    }

    #[test]
    fn test_truncate_zero_budget_yields_empty() {
        let ctx = RankedContext::merge(vec![vec![item("x", 0.1, SourceKind::Chat)]]);
        let budgeted = BudgetedContext::truncate(&ctx, 0, |i| i.text.len());
        assert!(budgeted.is_empty());
        assert_eq!(budgeted.dropped, 1);
    }

    #[test]
    fn test_truncate_stops_at_first_misfit() {
        // The third item would fit the remaining budget, but truncation must
        // stop at the second (rank order over packing efficiency).
        let ctx = RankedContext::merge(vec![vec![
            item("aa", 0.1, SourceKind::Chat),
            item("bbbbbbbbbb", 0.2, SourceKind::Chat),
            item("c", 0.3, SourceKind::Chat),
        ]]);
        let budgeted = BudgetedContext::truncate(&ctx, 4, |i| i.text.len());
        assert_eq!(budgeted.len(), 1);
        assert_eq!(budgeted.items[0].text, "aa");
        assert_eq!(budgeted.dropped, 2);
    }

    #[test]
    fn test_truncate_is_idempotent() {
        let ctx = RankedContext::merge(vec![vec![
            item("aaaa", 0.1, SourceKind::Chat),
            item("bbbb", 0.2, SourceKind::Documentation),
            item("cccc", 0.3, SourceKind::Chat),
        ]]);
        let first = BudgetedContext::truncate(&ctx, 8, |i| i.text.len());
        assert_eq!(first.len(), 2);

        let again = BudgetedContext::truncate(
            &RankedContext {
                items: first.items.clone(),
            },
            8,
            |i| i.text.len(),
        );
        assert_eq!(again.len(), first.len());
        assert_eq!(again.dropped, 0);
    }

    #[test]
    fn test_truncate_budget_fits_exactly_three_of_ten() {
        // Scenario B: budget sized to the cumulative cost of the three
        // lowest-distance items.
        let items: Vec<RetrievedItem> = (0..10)
            .map(|i| item(&"x".repeat(40), 0.1 * (i as f64 + 1.0), SourceKind::Chat))
            .collect();
        let ctx = RankedContext::merge(vec![items]);

        let budgeted = BudgetedContext::truncate(&ctx, 120, |i| i.text.len());
        assert_eq!(budgeted.len(), 3);
        assert_eq!(budgeted.dropped, 7);
        for (i, it) in budgeted.items.iter().enumerate() {
            assert!((it.distance - 0.1 * (i as f64 + 1.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_approx_token_cost() {
        assert_eq!(approx_token_cost(""), 0);
        assert_eq!(approx_token_cost("abcd"), 1);
        assert_eq!(approx_token_cost(&"x".repeat(4000)), 1000);
    }

    #[test]
    fn test_source_kind_from_metadata() {
        assert_eq!(
            SourceKind::from_metadata("documentation"),
            SourceKind::Documentation
        );
        assert_eq!(SourceKind::from_metadata("chat"), SourceKind::Chat);
        assert_eq!(SourceKind::from_metadata("web"), SourceKind::Unknown);
    }

    #[test]
    fn test_count_source() {
        let ctx = RankedContext::merge(vec![vec![
            item("a", 0.1, SourceKind::Documentation),
            item("b", 0.2, SourceKind::Chat),
            item("c", 0.3, SourceKind::Chat),
        ]]);
        assert_eq!(ctx.count_source(SourceKind::Documentation), 1);
        assert_eq!(ctx.count_source(SourceKind::Chat), 2);
        assert_eq!(ctx.count_source(SourceKind::Unknown), 0);
    }
}
