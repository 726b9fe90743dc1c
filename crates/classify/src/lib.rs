//! Problem classification for customer tickets.
//!
//! A record's problem text (plus its contract type) is run through an ordered
//! cascade of category rules. The first rule that matches decides the
//! category; later rules are never consulted. Text with no matching rule
//! falls back to `Category::Other`, and a record without problem text gets no
//! category at all.
//!
//! The cascade order is TV, Internet, Gaming, Speed. TV comes first because
//! TV signal complaints share wording with internet outages ("нет сигнала"),
//! and a TV customer reporting lost signal must not be filed as an outage.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use triage_model::CustomerRecord;
use triage_terms::{
    find_pair, find_term, normalize_text, GamingTerms, InternetTerms, SpeedTerms, TermDictionaries,
    TermsError, TvTerms,
};

pub use triage_model::Category;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Invalid term dictionaries: {0}")]
    Terms(#[from] TermsError),
}

/// Why a rule matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum MatchReason {
    /// Contract type is a known TV subscription
    ContractType { contract_type: String },

    /// A category term occurs in the problem text
    Term { term: String },

    /// A whole phrase that on its own identifies the category
    Phrase { phrase: String },

    /// A generic signal-loss phrase with a TV cue nearby
    SignalWithCue { phrase: String, cue: String },

    /// A negation word together with an internet-domain word
    NegatedTerm { negation: String, term: String },

    /// Both words of a configured pair occur
    WordPair { first: String, second: String },

    /// No rule matched; the text still describes some problem
    Fallback,
}

/// A category plus the evidence for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub reason: MatchReason,
}

/// The normalized inputs a rule looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Lowercased, trimmed problem text; never empty
    pub problem: String,
    /// Lowercased, trimmed contract
    pub contract: String,
}

impl Subject {
    /// Returns `None` when the problem text is blank.
    pub fn new(problem: &str, contract: &str) -> Option<Self> {
        let problem = normalize_text(problem);
        if problem.is_empty() {
            return None;
        }
        Some(Self {
            problem,
            contract: normalize_text(contract),
        })
    }

    pub fn from_record(record: &CustomerRecord) -> Option<Self> {
        Self::new(record.problem.as_deref().unwrap_or_default(), &record.contract)
    }
}

/// One step of the classification cascade.
///
/// Rules must be pure functions of the subject so records can be classified
/// from any thread.
pub trait CategoryRule: fmt::Debug + Send + Sync {
    /// The category this rule assigns
    fn category(&self) -> Category;

    /// Return the evidence if the rule matches
    fn evaluate(&self, subject: &Subject) -> Option<MatchReason>;
}

/// TV rule: contract type, direct term, TV-only signal phrase, or generic
/// signal loss with a TV cue.
#[derive(Debug, Clone)]
pub struct TvRule {
    terms: TvTerms,
    numbered_cue: Regex,
}

impl TvRule {
    pub fn new(terms: TvTerms, numbered_cue: Regex) -> Self {
        Self {
            terms,
            numbered_cue,
        }
    }

    fn contract_type(&self, contract: &str) -> Option<String> {
        find_term(contract, &self.terms.contract_types).map(str::to_string)
    }

    fn tv_cue(&self, problem: &str) -> Option<String> {
        if let Some(cue) = find_term(problem, &self.terms.context_cues) {
            return Some(cue.to_string());
        }
        self.numbered_cue
            .find(problem)
            .map(|found| found.as_str().to_string())
    }
}

impl CategoryRule for TvRule {
    fn category(&self) -> Category {
        Category::Tv
    }

    fn evaluate(&self, subject: &Subject) -> Option<MatchReason> {
        // A TV contract also counts as signal-loss context, so it is checked first.
        if let Some(contract_type) = self.contract_type(&subject.contract) {
            return Some(MatchReason::ContractType { contract_type });
        }
        if let Some(term) = find_term(&subject.problem, &self.terms.terms) {
            return Some(MatchReason::Term {
                term: term.to_string(),
            });
        }
        if let Some(phrase) = find_term(&subject.problem, &self.terms.signal_patterns) {
            return Some(MatchReason::Phrase {
                phrase: phrase.to_string(),
            });
        }

        let phrase = find_term(&subject.problem, &self.terms.signal_loss_phrases)?;
        let cue = self.tv_cue(&subject.problem)?;
        Some(MatchReason::SignalWithCue {
            phrase: phrase.to_string(),
            cue,
        })
    }
}

/// Internet rule: outage phrase, or a negation word with an internet word.
#[derive(Debug, Clone)]
pub struct InternetRule {
    terms: InternetTerms,
}

impl InternetRule {
    pub fn new(terms: InternetTerms) -> Self {
        Self { terms }
    }
}

impl CategoryRule for InternetRule {
    fn category(&self) -> Category {
        Category::Internet
    }

    fn evaluate(&self, subject: &Subject) -> Option<MatchReason> {
        if let Some(phrase) = find_term(&subject.problem, &self.terms.patterns) {
            return Some(MatchReason::Phrase {
                phrase: phrase.to_string(),
            });
        }

        let negation = find_term(&subject.problem, &self.terms.negation_words)?;
        let term = find_term(&subject.problem, &self.terms.domain_terms)?;
        Some(MatchReason::NegatedTerm {
            negation: negation.to_string(),
            term: term.to_string(),
        })
    }
}

/// Gaming rule: game title, platform, or generic gaming word.
#[derive(Debug, Clone)]
pub struct GamingRule {
    terms: GamingTerms,
}

impl GamingRule {
    pub fn new(terms: GamingTerms) -> Self {
        Self { terms }
    }
}

impl CategoryRule for GamingRule {
    fn category(&self) -> Category {
        Category::Gaming
    }

    fn evaluate(&self, subject: &Subject) -> Option<MatchReason> {
        [
            &self.terms.titles,
            &self.terms.platforms,
            &self.terms.generic_terms,
        ]
        .into_iter()
        .find_map(|terms| find_term(&subject.problem, terms))
        .map(|term| MatchReason::Term {
            term: term.to_string(),
        })
    }
}

/// Speed rule: speed word, or a configured word pair.
#[derive(Debug, Clone)]
pub struct SpeedRule {
    terms: SpeedTerms,
}

impl SpeedRule {
    pub fn new(terms: SpeedTerms) -> Self {
        Self { terms }
    }
}

impl CategoryRule for SpeedRule {
    fn category(&self) -> Category {
        Category::Speed
    }

    fn evaluate(&self, subject: &Subject) -> Option<MatchReason> {
        if let Some(term) = find_term(&subject.problem, &self.terms.terms) {
            return Some(MatchReason::Term {
                term: term.to_string(),
            });
        }

        find_pair(&subject.problem, &self.terms.combinations).map(|pair| MatchReason::WordPair {
            first: pair.first.clone(),
            second: pair.second.clone(),
        })
    }
}

/// Ordered rule cascade.
#[derive(Debug)]
pub struct Classifier {
    rules: Vec<Box<dyn CategoryRule>>,
}

impl Classifier {
    /// Build the standard TV, Internet, Gaming, Speed cascade.
    pub fn new(dictionaries: TermDictionaries) -> Result<Self, ClassifyError> {
        dictionaries.validate()?;
        let numbered_cue = dictionaries.numbered_cue_regex()?;

        let TermDictionaries {
            internet,
            tv,
            gaming,
            speed,
        } = dictionaries;

        let rules: Vec<Box<dyn CategoryRule>> = vec![
            Box::new(TvRule::new(tv, numbered_cue)),
            Box::new(InternetRule::new(internet)),
            Box::new(GamingRule::new(gaming)),
            Box::new(SpeedRule::new(speed)),
        ];
        Ok(Self::from_rules(rules))
    }

    /// Build a cascade from explicit rules, evaluated in the given order.
    pub fn from_rules(rules: Vec<Box<dyn CategoryRule>>) -> Self {
        Self { rules }
    }

    /// Categories in evaluation order, excluding the `Other` fallback.
    pub fn rule_order(&self) -> Vec<Category> {
        self.rules.iter().map(|rule| rule.category()).collect()
    }

    /// Classify a subject. The first matching rule wins.
    pub fn classify_subject(&self, subject: &Subject) -> Classification {
        self.rules
            .iter()
            .find_map(|rule| {
                rule.evaluate(subject).map(|reason| Classification {
                    category: rule.category(),
                    reason,
                })
            })
            .unwrap_or(Classification {
                category: Category::Other,
                reason: MatchReason::Fallback,
            })
    }

    /// Classify free text with a contract type.
    ///
    /// Returns `None` when `problem` is blank.
    pub fn classify_text(&self, problem: &str, contract: &str) -> Option<Classification> {
        Subject::new(problem, contract).map(|subject| self.classify_subject(&subject))
    }

    /// Classify a record, keeping the evidence.
    pub fn classify_detailed(&self, record: &CustomerRecord) -> Option<Classification> {
        Subject::from_record(record).map(|subject| self.classify_subject(&subject))
    }

    /// Category for a record, or `None` if it has no problem text.
    pub fn classify(&self, record: &CustomerRecord) -> Option<Category> {
        self.classify_detailed(record).map(|c| c.category)
    }
}
