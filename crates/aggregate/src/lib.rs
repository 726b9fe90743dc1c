//! Aggregation over parsed customer records.
//!
//! Produces the `AnalysisResult`: equipment code counts, territory counts and
//! the partition of records into problem categories.

use std::collections::BTreeMap;

use triage_classify::Classifier;
use triage_model::{AnalysisResult, Category, CustomerRecord};
use triage_parser::{parse_with_summary, ParseSummary};

/// Count equipment codes across all records.
///
/// A record listing several codes increments each of them once.
pub fn collect_equipment_stats(records: &[CustomerRecord]) -> BTreeMap<String, usize> {
    let mut stats = BTreeMap::new();
    for code in records.iter().flat_map(|record| record.equipment_codes()) {
        *stats.entry(code.to_string()).or_insert(0) += 1;
    }
    stats
}

/// Count records per first territory segment.
pub fn collect_territory_stats(records: &[CustomerRecord]) -> BTreeMap<String, usize> {
    let mut stats = BTreeMap::new();
    for record in records {
        *stats
            .entry(record.territory_segment().to_string())
            .or_insert(0) += 1;
    }
    stats
}

/// Partition records by category, keeping input order within each list.
///
/// Records without problem text are left out. Every category key is present.
pub fn categorize(
    records: &[CustomerRecord],
    classifier: &Classifier,
) -> BTreeMap<Category, Vec<CustomerRecord>> {
    let mut categories: BTreeMap<Category, Vec<CustomerRecord>> =
        Category::ALL.iter().map(|c| (*c, Vec::new())).collect();

    for record in records {
        let Some(classification) = classifier.classify_detailed(record) else {
            continue;
        };
        tracing::debug!(
            customer = %record.name,
            category = %classification.category,
            reason = ?classification.reason,
            "Categorized ticket"
        );
        categories
            .entry(classification.category)
            .or_default()
            .push(record.clone());
    }

    categories
}

/// Build the full analysis for a record collection.
pub fn analyze(records: &[CustomerRecord], classifier: &Classifier) -> AnalysisResult {
    AnalysisResult {
        equipment_stats: collect_equipment_stats(records),
        territory_stats: collect_territory_stats(records),
        categories: categorize(records, classifier),
    }
}

/// Parse raw ticket text and analyze the valid records.
pub fn analyze_text(text: &str, classifier: &Classifier) -> (AnalysisResult, ParseSummary) {
    let (records, summary) = parse_with_summary(text);
    let result = analyze(&records, classifier);

    tracing::info!(
        blocks = summary.blocks,
        records = summary.records,
        dropped = summary.dropped,
        categorized = result.categorized_count(),
        "Analyzed ticket text"
    );

    (result, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use triage_parser::parse_records;
    use triage_terms::TermDictionaries;

    fn classifier() -> Classifier {
        Classifier::new(TermDictionaries::default()).unwrap()
    }

    fn stats(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    const TICKETS: &str = "Выгрузка за 12.03\n\
        Клиент: Ivan\n\
        Договор: Cable TV\n\
        Адрес: Main St 1\n\
        МКУ: A; B ;C\n\
        Территория (участок): North, Zone 2\n\
        Нет сигнала на тв\n\
        Клиент: Olga\n\
        Договор: Интернет 100\n\
        Адрес: Lenina 5\n\
        МКУ: A\n\
        Территория (участок): South\n\
        нет интернет\n\
        Клиент: Petr\n\
        Договор: Интернет 300\n\
        Адрес: Mira 7\n\
        Территория (участок): North, Zone 9\n\
        играю в dota, большой пинг\n\
        Клиент: Anna\n\
        Договор: Интернет 100\n\
        Адрес: Sadovaya 3\n\
        Территория (участок): East\n\
        Клиент: Oleg\n\
        Договор: Интернет 100\n\
        Территория (участок): West\n\
        просьба перезвонить\n";

    #[test]
    fn test_scenario_single_tv_record() {
        let text = "Клиент: Ivan\nДоговор: Cable TV\nАдрес: Main St 1\n\
                    Территория (участок): North, Zone 2\nНет сигнала на тв";
        let (result, summary) = analyze_text(text, &classifier());

        assert_eq!(summary.records, 1);
        assert_eq!(result.records_in(Category::Tv).len(), 1);
        assert_eq!(result.territory_stats, stats(&[("North", 1)]));
        assert_eq!(result.categorized_count(), 1);
    }

    #[test]
    fn test_equipment_codes_trimmed() {
        let records = vec![CustomerRecord::new("Ivan", "c", "a", "t").with_equipment_codes("A; B ;C")];
        assert_eq!(
            collect_equipment_stats(&records),
            stats(&[("A", 1), ("B", 1), ("C", 1)])
        );
    }

    #[test]
    fn test_full_analysis() {
        let (result, summary) = analyze_text(TICKETS, &classifier());

        // Oleg has no address and is dropped.
        assert_eq!(summary.blocks, 5);
        assert_eq!(summary.dropped, 1);

        assert_eq!(
            result.equipment_stats,
            stats(&[("A", 2), ("B", 1), ("C", 1)])
        );
        assert_eq!(
            result.territory_stats,
            stats(&[("East", 1), ("North", 2), ("South", 1)])
        );

        let names = |category| {
            result
                .records_in(category)
                .iter()
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(Category::Tv), vec!["Ivan"]);
        assert_eq!(names(Category::Internet), vec!["Olga"]);
        assert_eq!(names(Category::Gaming), vec!["Petr"]);
        assert!(names(Category::Speed).is_empty());
        assert!(names(Category::Other).is_empty());
    }

    #[test]
    fn test_category_partition() {
        let records = parse_records(TICKETS);
        let result = analyze(&records, &classifier());

        let with_problem = records.iter().filter(|r| r.problem_text().is_some()).count();
        assert_eq!(result.categorized_count(), with_problem);

        for record in records.iter().filter(|r| r.problem_text().is_some()) {
            let hits = Category::ALL
                .iter()
                .filter(|c| result.records_in(**c).contains(record))
                .count();
            assert_eq!(hits, 1, "{} should be in exactly one category", record.name);
        }

        // Anna has no problem text and is in no category.
        assert!(result
            .categories
            .values()
            .flatten()
            .all(|r| r.name != "Anna"));
    }

    #[test]
    fn test_stats_sum_checks() {
        let records = parse_records(TICKETS);
        let result = analyze(&records, &classifier());

        let tokens: usize = records.iter().map(|r| r.equipment_codes().count()).sum();
        assert_eq!(result.equipment_stats.values().sum::<usize>(), tokens);
        assert_eq!(result.territory_stats.values().sum::<usize>(), records.len());
    }

    #[test]
    fn test_empty_input() {
        let (result, summary) = analyze_text("", &classifier());
        assert_eq!(summary, ParseSummary::default());
        assert_eq!(result, AnalysisResult::default());
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let classifier = classifier();
        assert_eq!(
            analyze_text(TICKETS, &classifier).0,
            analyze_text(TICKETS, &classifier).0
        );
    }
}
