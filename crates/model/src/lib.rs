//! Core domain model for support-ticket triage.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `CustomerRecord`: One parsed customer ticket
//! - `Login`: A login value that may be explicitly marked as absent
//! - `Category`: The closed set of problem categories
//! - `AnalysisResult`: Equipment, territory and category aggregates

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Problem category assigned to a ticket.
///
/// Declaration order is the output order of `AnalysisResult::categories`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Internet outage or session failure
    #[serde(rename = "No internet")]
    Internet,
    /// Television service problem
    #[serde(rename = "TV issues")]
    Tv,
    /// Game or gaming platform complaint
    #[serde(rename = "Gaming issues")]
    Gaming,
    /// Slow or stalling connection
    #[serde(rename = "Speed issues")]
    Speed,
    /// Anything with problem text that no rule claimed
    #[serde(rename = "Other issues")]
    Other,
}

impl Category {
    /// Every category, in output order.
    pub const ALL: [Category; 5] = [
        Category::Internet,
        Category::Tv,
        Category::Gaming,
        Category::Speed,
        Category::Other,
    ];

    /// Get the human-readable label for this category.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Internet => "No internet",
            Self::Tv => "TV issues",
            Self::Gaming => "Gaming issues",
            Self::Speed => "Speed issues",
            Self::Other => "Other issues",
        }
    }

    /// Look up a category by label or short name, case-insensitively.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "no internet" | "internet" => Some(Self::Internet),
            "tv issues" | "tv" => Some(Self::Tv),
            "gaming issues" | "gaming" => Some(Self::Gaming),
            "speed issues" | "speed" => Some(Self::Speed),
            "other issues" | "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Login field value.
///
/// The literal `null` in a ticket means the customer explicitly has no login,
/// which is different from the field not appearing at all (`None` on the record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Login {
    Value(String),
    Null,
}

impl Login {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(value) => Some(value),
            Self::Null => None,
        }
    }
}

/// `null` becomes `Some(Login::Null)`; a missing field stays `None` via `#[serde(default)]`.
fn deserialize_login<'de, D>(deserializer: D) -> Result<Option<Login>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(Some(value.map_or(Login::Null, Login::Value)))
}

/// A parsed customer ticket.
///
/// Produced by `triage-parser` only when `name`, `contract`, `address` and
/// `territory` are all non-empty. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Customer identity line
    pub name: String,

    /// Contract identifier or type
    pub contract: String,

    /// Contact phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Service address
    pub address: String,

    /// Account login
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_login"
    )]
    pub login: Option<Login>,

    /// Raw `;`-separated equipment codes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_codes: Option<String>,

    /// Raw territory; only the first `,` segment is significant
    pub territory: String,

    /// Free-text complaint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

impl CustomerRecord {
    /// Create a record with only the required fields set.
    pub fn new(
        name: impl Into<String>,
        contract: impl Into<String>,
        address: impl Into<String>,
        territory: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            contract: contract.into(),
            phone: None,
            address: address.into(),
            login: None,
            equipment_codes: None,
            territory: territory.into(),
            problem: None,
        }
    }

    pub fn with_problem(mut self, problem: impl Into<String>) -> Self {
        self.problem = Some(problem.into());
        self
    }

    pub fn with_equipment_codes(mut self, codes: impl Into<String>) -> Self {
        self.equipment_codes = Some(codes.into());
        self
    }

    /// The first comma-separated territory segment, trimmed.
    pub fn territory_segment(&self) -> &str {
        self.territory.split(',').next().unwrap_or_default().trim()
    }

    /// Equipment codes split on `;` and trimmed. Empty tokens are skipped.
    pub fn equipment_codes(&self) -> impl Iterator<Item = &str> {
        self.equipment_codes
            .as_deref()
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    /// Problem text if present and not blank.
    pub fn problem_text(&self) -> Option<&str> {
        self.problem.as_deref().filter(|p| !p.trim().is_empty())
    }
}

/// Aggregate analysis over a record collection.
///
/// Recomputed from scratch on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Equipment code -> occurrences across all records
    pub equipment_stats: BTreeMap<String, usize>,

    /// First territory segment -> number of records
    pub territory_stats: BTreeMap<String, usize>,

    /// Category -> records assigned to it; always holds all five categories
    pub categories: BTreeMap<Category, Vec<CustomerRecord>>,
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            equipment_stats: BTreeMap::new(),
            territory_stats: BTreeMap::new(),
            categories: Category::ALL.iter().map(|c| (*c, Vec::new())).collect(),
        }
    }
}

impl AnalysisResult {
    /// Records assigned to `category`.
    pub fn records_in(&self, category: Category) -> &[CustomerRecord] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of records that received a category.
    pub fn categorized_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_category_labels() {
        assert_eq!(Category::Internet.label(), "No internet");
        assert_eq!(Category::Tv.to_string(), "TV issues");
        assert_eq!(Category::from_label("gaming issues"), Some(Category::Gaming));
        assert_eq!(Category::from_label(" Speed "), Some(Category::Speed));
        assert_eq!(Category::from_label("weather"), None);
    }

    #[test]
    fn test_category_short_names() {
        let short = ["internet", "tv", "gaming", "speed", "other"];
        for (name, category) in short.into_iter().zip(Category::ALL) {
            assert_eq!(Category::from_label(name), Some(category));
        }
        assert_eq!(Category::from_label("TV"), Some(Category::Tv));
    }

    #[test]
    fn test_territory_segment() {
        let record = CustomerRecord::new("Ivan", "Cable TV", "Main St 1", " North , Zone 2");
        assert_eq!(record.territory_segment(), "North");
    }

    #[test]
    fn test_equipment_codes_trimmed() {
        let record = CustomerRecord::new("Ivan", "c", "a", "t").with_equipment_codes("A; B ;C;");
        assert_eq!(record.equipment_codes().collect::<Vec<_>>(), vec!["A", "B", "C"]);

        let bare = CustomerRecord::new("Ivan", "c", "a", "t");
        assert_eq!(bare.equipment_codes().count(), 0);
    }

    #[test]
    fn test_problem_text_blank() {
        let record = CustomerRecord::new("Ivan", "c", "a", "t").with_problem("   ");
        assert_eq!(record.problem_text(), None);
    }

    #[test]
    fn test_login_null_distinct_from_missing() {
        let json = r#"{"name":"Ivan","contract":"c","address":"a","territory":"t","login":null}"#;
        let record: CustomerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.login, Some(Login::Null));

        let json = r#"{"name":"Ivan","contract":"c","address":"a","territory":"t"}"#;
        let record: CustomerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.login, None);

        let mut record = CustomerRecord::new("Ivan", "c", "a", "t");
        record.login = Some(Login::Null);
        let value = serde_json::to_value(&record).unwrap();
        assert!(value["login"].is_null());
        assert!(value.get("phone").is_none());
    }

    #[test]
    fn test_default_analysis_has_all_categories() {
        let result = AnalysisResult::default();
        assert_eq!(result.categories.len(), 5);
        assert!(result.records_in(Category::Other).is_empty());

        let json = serde_json::to_value(&result).unwrap();
        assert!(json["categories"]["TV issues"].is_array());
    }
}
