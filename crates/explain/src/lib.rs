//! Explanation generation for ticket triage.
//!
//! Converts classifier evidence into human-readable explanations and renders
//! an analysis result as a plain-text report for operators.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use triage_classify::{Classification, MatchReason};
use triage_model::{AnalysisResult, Category};

/// A structured explanation for one classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    /// Short summary (1 line)
    pub summary: String,

    /// Detailed explanation (1-2 sentences)
    pub detail: String,

    /// Evidence items supporting this explanation
    pub evidence: Vec<EvidenceItem>,
}

/// A piece of evidence supporting a classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Type of evidence
    pub kind: String,

    /// The matched term or phrase
    pub value: String,

    /// Optional context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl EvidenceItem {
    fn new(kind: &str, value: &str) -> Self {
        Self {
            kind: kind.to_string(),
            value: value.to_string(),
            context: None,
        }
    }
}

/// Generate an explanation for a classification.
pub fn explain_classification(classification: &Classification) -> Explanation {
    let category = classification.category;

    match &classification.reason {
        MatchReason::ContractType { contract_type } => Explanation {
            summary: format!("{category}: TV contract"),
            detail: format!(
                "The contract matches the TV subscription type '{contract_type}', \
                 so any reported problem is treated as a TV issue."
            ),
            evidence: vec![EvidenceItem::new("contract_type", contract_type)],
        },

        MatchReason::Term { term } => Explanation {
            summary: format!("{category}: mentions '{term}'"),
            detail: format!(
                "The problem text contains '{term}', a term that points to {}.",
                category_noun(category)
            ),
            evidence: vec![EvidenceItem::new("term", term)],
        },

        MatchReason::Phrase { phrase } => Explanation {
            summary: format!("{category}: '{phrase}'"),
            detail: format!(
                "The problem text contains the phrase '{phrase}', which on its own \
                 identifies {}.",
                category_noun(category)
            ),
            evidence: vec![EvidenceItem::new("phrase", phrase)],
        },

        MatchReason::SignalWithCue { phrase, cue } => Explanation {
            summary: format!("{category}: signal loss with TV context"),
            detail: format!(
                "The problem reports '{phrase}' and the TV cue '{cue}' places it on \
                 the TV service rather than the internet line."
            ),
            evidence: vec![
                EvidenceItem::new("signal_phrase", phrase),
                EvidenceItem {
                    kind: "tv_cue".to_string(),
                    value: cue.clone(),
                    context: Some(format!("'{phrase}' alone is ambiguous")),
                },
            ],
        },

        MatchReason::NegatedTerm { negation, term } => Explanation {
            summary: format!("{category}: '{negation}' + '{term}'"),
            detail: format!(
                "The problem text combines the negation '{negation}' with the \
                 internet term '{term}'."
            ),
            evidence: vec![
                EvidenceItem::new("negation", negation),
                EvidenceItem::new("term", term),
            ],
        },

        MatchReason::WordPair { first, second } => Explanation {
            summary: format!("{category}: '{first}' + '{second}'"),
            detail: format!("Both '{first}' and '{second}' occur in the problem text."),
            evidence: vec![
                EvidenceItem::new("word", first),
                EvidenceItem::new("word", second),
            ],
        },

        MatchReason::Fallback => Explanation {
            summary: format!("{category}: no rule matched"),
            detail: "A problem was described but none of the TV, internet, gaming or \
                     speed rules matched it."
                .to_string(),
            evidence: vec![],
        },
    }
}

fn category_noun(category: Category) -> &'static str {
    match category {
        Category::Internet => "an internet outage",
        Category::Tv => "a TV problem",
        Category::Gaming => "a gaming problem",
        Category::Speed => "a speed problem",
        Category::Other => "a general problem",
    }
}

/// Stats ordered by count descending, then key.
pub fn ranked_stats(stats: &BTreeMap<String, usize>) -> Vec<(&str, usize)> {
    let mut ranked: Vec<(&str, usize)> = stats.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
}

/// Render an analysis result as a plain-text report.
///
/// Categories are listed in map order, so a filtered result only shows the
/// categories it still holds.
pub fn summarize_analysis(result: &AnalysisResult) -> String {
    let mut lines = vec!["Equipment (МКУ):".to_string()];
    lines.extend(stats_lines(&result.equipment_stats));

    lines.push(String::new());
    lines.push("Territories:".to_string());
    lines.extend(stats_lines(&result.territory_stats));

    lines.push(String::new());
    lines.push("Problem categories:".to_string());
    for (category, records) in &result.categories {
        lines.push(format!("  {}: {}", category.label(), records.len()));
        lines.extend(records.iter().map(|record| {
            format!(
                "    - {} ({}): {}",
                record.name,
                record.territory_segment(),
                record.problem.as_deref().unwrap_or_default()
            )
        }));
    }

    lines.join("\n")
}

fn stats_lines(stats: &BTreeMap<String, usize>) -> Vec<String> {
    if stats.is_empty() {
        return vec!["  (none)".to_string()];
    }
    ranked_stats(stats)
        .into_iter()
        .map(|(key, count)| format!("  {key}: {count}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use triage_classify::Classifier;
    use triage_model::CustomerRecord;
    use triage_terms::TermDictionaries;

    #[test]
    fn test_explain_contract_type() {
        let classification = Classification {
            category: Category::Tv,
            reason: MatchReason::ContractType {
                contract_type: "цктв".to_string(),
            },
        };
        let explanation = explain_classification(&classification);
        assert!(explanation.summary.starts_with("TV issues"));
        assert_eq!(explanation.evidence[0].value, "цктв");
    }

    #[test]
    fn test_explain_from_classifier() {
        let classifier = Classifier::new(TermDictionaries::default()).unwrap();
        let classification = classifier
            .classify_text("играю в dota, большой пинг", "")
            .unwrap();
        let explanation = explain_classification(&classification);
        assert_eq!(explanation.summary, "Gaming issues: mentions 'dota'");
        assert!(explanation.detail.contains("gaming"));
    }

    #[test]
    fn test_explain_fallback_has_no_evidence() {
        let classification = Classification {
            category: Category::Other,
            reason: MatchReason::Fallback,
        };
        assert!(explain_classification(&classification).evidence.is_empty());
    }

    #[test]
    fn test_ranked_stats() {
        let stats: BTreeMap<String, usize> = [("B", 2), ("A", 2), ("C", 5)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(ranked_stats(&stats), vec![("C", 5), ("A", 2), ("B", 2)]);
    }

    #[test]
    fn test_summarize_analysis() {
        let mut result = AnalysisResult::default();
        result.territory_stats.insert("North".to_string(), 1);
        result.categories.insert(
            Category::Tv,
            vec![CustomerRecord::new("Ivan", "Cable TV", "Main St 1", "North, Zone 2")
                .with_problem("Нет сигнала на тв")],
        );

        let report = summarize_analysis(&result);
        assert!(report.contains("Equipment (МКУ):\n  (none)"));
        assert!(report.contains("  North: 1"));
        assert!(report.contains("  TV issues: 1\n    - Ivan (North): Нет сигнала на тв"));
        assert!(report.contains("  Other issues: 0"));
    }

    #[test]
    fn test_summarize_filtered_categories() {
        let mut result = AnalysisResult::default();
        result.categories.retain(|category, _| *category == Category::Gaming);

        let report = summarize_analysis(&result);
        assert_eq!(
            report.lines().skip_while(|l| *l != "Problem categories:").collect::<Vec<_>>(),
            vec!["Problem categories:", "  Gaming issues: 0"]
        );
        assert!(!report.ends_with('\n'));
    }
}
