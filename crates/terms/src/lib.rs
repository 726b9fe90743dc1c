//! Term dictionaries for problem classification.
//!
//! Provides the static keyword data the classifier consults and the pure
//! helpers used to match it:
//! - Per-category term lists (internet, TV, gaming, speed)
//! - Structured combination rules (negation + domain term, word pairs)
//! - Text normalization and substring lookup
//!
//! Terms are stored lowercase and trimmed. Matching is plain substring
//! search, not tokenized or stemmed, so partial stems like `скорост`
//! match every inflection.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TermsError {
    #[error("Failed to read dictionaries from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid dictionaries JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Empty term in {section}")]
    EmptyTerm { section: &'static str },
    #[error("Term {term:?} in {section} is not lowercase and trimmed")]
    NotNormalized { section: &'static str, term: String },
    #[error("Invalid numbered TV pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Two words that must both appear somewhere in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermPair {
    pub first: String,
    pub second: String,
}

impl TermPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Check whether both words occur in `text`.
    pub fn matches(&self, text: &str) -> bool {
        text.contains(self.first.as_str()) && text.contains(self.second.as_str())
    }
}

/// Internet outage vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternetTerms {
    /// Whole phrases that on their own mean "no internet"
    pub patterns: Vec<String>,
    /// Negation words for the negation + domain term combination
    pub negation_words: Vec<String>,
    /// Internet-domain words for the negation + domain term combination
    pub domain_terms: Vec<String>,
}

impl Default for InternetTerms {
    fn default() -> Self {
        Self {
            patterns: owned(&[
                "нет инет",
                "нет интернет",
                "нет сессии",
                "не работает инт",
                "отсутствует интернет",
                "пропал интернет",
                "отключился интернет",
                "нет оптического линка",
                "не устанавливает сессию",
                "отсутствует подключение",
                "нет инт",
                "нет нет",
                "не раб инт",
                "по eqm",
                "проверка терминала",
                "нет подключения",
                "нет соединения",
            ]),
            negation_words: owned(&["нет", "не работает", "отсутствует"]),
            domain_terms: owned(&["интернет", "инт", "инет", "сессии"]),
        }
    }
}

/// Television vocabulary and signal-loss context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TvTerms {
    /// Direct TV words and brand names
    pub terms: Vec<String>,
    /// Signal phrasings that only ever refer to TV
    pub signal_patterns: Vec<String>,
    /// Generic "signal lost" phrases that need a TV cue to count
    pub signal_loss_phrases: Vec<String>,
    /// Words that put a generic signal phrase in TV context
    pub context_cues: Vec<String>,
    /// Regex for numbered-set cues such as "на 2 тв"
    pub numbered_cue: String,
    /// Contract types that are TV subscriptions
    pub contract_types: Vec<String>,
}

impl Default for TvTerms {
    fn default() -> Self {
        Self {
            terms: owned(&[
                "тв",
                "tv",
                "телевизор",
                "телевидение",
                "приставк",
                "ресивер",
                "stb",
                "канал",
                "вещание",
                "трансляция",
                "смарт",
                "smart tv",
                "ктв",
                "цктв",
                "смотрешка",
                "вещани",
                "movix",
                "мувикс",
                "мувих",
                "кабельное",
                "dom.ru tv",
                "дом.ru tv",
            ]),
            signal_patterns: owned(&[
                "нет сигнала на тв",
                "нет сигнала на всех каналах",
                "нет сигнала на канал",
                "пропал сигнал тв",
                "нет сигнала на телевизор",
            ]),
            signal_loss_phrases: owned(&["нет сигнала", "пропал сигнал"]),
            context_cues: owned(&["тв", "канал", "ктв"]),
            numbered_cue: r"на \d+ тв".to_string(),
            contract_types: owned(&["кабельное телевидение", "dom.ru tv", "дом.ru tv", "цктв"]),
        }
    }
}

/// Game titles, platforms and generic gaming words, with Cyrillic spellings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GamingTerms {
    pub titles: Vec<String>,
    pub platforms: Vec<String>,
    pub generic_terms: Vec<String>,
}

impl Default for GamingTerms {
    fn default() -> Self {
        Self {
            titles: owned(&[
                "warzone",
                "варзон",
                "cod",
                "код",
                "fortnite",
                "фортнайт",
                "pubg",
                "пубг",
                "apex",
                "апекс",
                "apex legends",
                "valorant",
                "валорант",
                "cs",
                "кс",
                "counter",
                "strike",
                "counter-strike",
                "cs:go",
                "cs2",
                "dota",
                "дота",
                "дота2",
                "dota2",
                "lol",
                "лол",
                "league of legends",
                "wow",
                "вов",
                "world of warcraft",
                "lost ark",
                "лост арк",
                "gta",
                "гта",
                "minecraft",
                "майнкрафт",
            ]),
            platforms: owned(&[
                "battle.net",
                "баттлнет",
                "steam",
                "стим",
                "epic games",
                "епик",
                "origin",
                "ориджин",
            ]),
            generic_terms: owned(&["игр", "пинг", "game"]),
        }
    }
}

/// Speed complaint vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedTerms {
    pub terms: Vec<String>,
    pub combinations: Vec<TermPair>,
}

impl Default for SpeedTerms {
    fn default() -> Self {
        Self {
            terms: owned(&["скорост", "медленн", "тормоз"]),
            combinations: vec![TermPair::new("не", "грузит")],
        }
    }
}

/// All classifier vocabulary, grouped by category.
///
/// `Default` is the built-in Russian dictionary. Overrides can be loaded from
/// JSON; any section left out keeps its default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermDictionaries {
    pub internet: InternetTerms,
    pub tv: TvTerms,
    pub gaming: GamingTerms,
    pub speed: SpeedTerms,
}

impl TermDictionaries {
    /// Parse dictionaries from JSON and validate them.
    pub fn from_json_str(json: &str) -> Result<Self, TermsError> {
        let dictionaries: Self = serde_json::from_str(json)?;
        dictionaries.validate()?;
        Ok(dictionaries)
    }

    /// Read dictionaries from a JSON file and validate them.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TermsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| TermsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check that every term is non-empty and pre-normalized, and that the
    /// numbered TV cue compiles.
    pub fn validate(&self) -> Result<(), TermsError> {
        for (section, terms) in self.sections() {
            for term in terms {
                check_term(section, term)?;
            }
        }
        for pair in &self.speed.combinations {
            check_term("speed.combinations", &pair.first)?;
            check_term("speed.combinations", &pair.second)?;
        }
        self.numbered_cue_regex().map(|_| ())
    }

    /// Compile the numbered TV cue pattern.
    pub fn numbered_cue_regex(&self) -> Result<Regex, TermsError> {
        Regex::new(&self.tv.numbered_cue).map_err(|source| TermsError::InvalidPattern {
            pattern: self.tv.numbered_cue.clone(),
            source,
        })
    }

    fn sections(&self) -> [(&'static str, &[String]); 12] {
        [
            ("internet.patterns", self.internet.patterns.as_slice()),
            ("internet.negation_words", self.internet.negation_words.as_slice()),
            ("internet.domain_terms", self.internet.domain_terms.as_slice()),
            ("tv.terms", self.tv.terms.as_slice()),
            ("tv.signal_patterns", self.tv.signal_patterns.as_slice()),
            ("tv.signal_loss_phrases", self.tv.signal_loss_phrases.as_slice()),
            ("tv.context_cues", self.tv.context_cues.as_slice()),
            ("tv.contract_types", self.tv.contract_types.as_slice()),
            ("gaming.titles", self.gaming.titles.as_slice()),
            ("gaming.platforms", self.gaming.platforms.as_slice()),
            ("gaming.generic_terms", self.gaming.generic_terms.as_slice()),
            ("speed.terms", self.speed.terms.as_slice()),
        ]
    }
}

fn check_term(section: &'static str, term: &str) -> Result<(), TermsError> {
    if term.trim().is_empty() {
        return Err(TermsError::EmptyTerm { section });
    }
    if normalize_text(term) != term {
        return Err(TermsError::NotNormalized {
            section,
            term: term.to_string(),
        });
    }
    Ok(())
}

fn owned(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

/// Normalize text for matching: lowercase and trim.
pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Find the first term (in list order) that occurs in `text`.
pub fn find_term<'a>(text: &str, terms: &'a [String]) -> Option<&'a str> {
    terms
        .iter()
        .map(String::as_str)
        .find(|term| text.contains(term))
}

/// Find the first pair whose words both occur in `text`.
pub fn find_pair<'a>(text: &str, pairs: &'a [TermPair]) -> Option<&'a TermPair> {
    pairs.iter().find(|pair| pair.matches(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Нет Сигнала на ТВ  "), "нет сигнала на тв");
        assert_eq!(normalize_text("NO Internet"), "no internet");
    }

    #[test]
    fn test_find_term_first_in_list_order() {
        let terms = owned(&["пинг", "игр"]);
        assert_eq!(find_term("играю, большой пинг", &terms), Some("пинг"));
        assert_eq!(find_term("всё хорошо", &terms), None);
    }

    #[test]
    fn test_substring_not_tokenized() {
        let speed = SpeedTerms::default();
        assert_eq!(find_term("очень медленно", &speed.terms), Some("медленн"));
        assert_eq!(find_term("скорость упала", &speed.terms), Some("скорост"));
    }

    #[test]
    fn test_pair_matches_anywhere() {
        let pair = TermPair::new("не", "грузит");
        assert!(pair.matches("сайты грузит еле-еле, не понимаю"));
        assert!(!pair.matches("грузит"));
        assert_eq!(find_pair("не грузит", &[pair.clone()]), Some(&pair));
    }

    #[test]
    fn test_defaults_validate() {
        TermDictionaries::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_uppercase_term() {
        let mut dictionaries = TermDictionaries::default();
        dictionaries.gaming.titles.push("Dota".to_string());
        assert!(matches!(
            dictionaries.validate(),
            Err(TermsError::NotNormalized { section: "gaming.titles", .. })
        ));
    }

    #[test]
    fn test_rejects_empty_term() {
        let mut dictionaries = TermDictionaries::default();
        dictionaries.speed.combinations.push(TermPair::new("не", " "));
        assert!(matches!(
            dictionaries.validate(),
            Err(TermsError::EmptyTerm { section: "speed.combinations" })
        ));
    }

    #[test]
    fn test_rejects_bad_pattern() {
        let mut dictionaries = TermDictionaries::default();
        dictionaries.tv.numbered_cue = "на (\\d+ тв".to_string();
        assert!(matches!(
            dictionaries.validate(),
            Err(TermsError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{"speed": {"terms": ["лаг"]}}"#;
        let dictionaries = TermDictionaries::from_json_str(json).unwrap();
        assert_eq!(dictionaries.speed.terms, vec!["лаг".to_string()]);
        assert_eq!(dictionaries.speed.combinations, SpeedTerms::default().combinations);
        assert_eq!(dictionaries.tv, TvTerms::default());
    }

    #[test]
    fn test_numbered_cue_regex() {
        let regex = TermDictionaries::default().numbered_cue_regex().unwrap();
        assert!(regex.is_match("нет сигнала на 2 тв"));
        assert!(!regex.is_match("нет сигнала на тв"));
    }
}
