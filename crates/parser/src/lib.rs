//! Record parser for loosely formatted support-ticket text.
//!
//! Turns raw text into `CustomerRecord`s:
//! - Blocks start at every `Клиент:` marker; anything before the first is ignored
//! - `Key: value` lines with a known key set a field and move the field cursor
//! - `Key: value` lines with an unknown key extend the field under the cursor
//! - Lines without `:` are appended to the free-text problem
//!
//! Blocks missing a required field are dropped silently. Callers that need a
//! drop count compare `count_blocks` against the number of records returned.

use std::fmt;

use thiserror::Error;
use triage_model::{CustomerRecord, Login};

/// Marker that opens every customer block.
pub const BLOCK_MARKER: &str = "Клиент:";

/// Login value meaning "explicitly no login".
pub const NULL_MARKER: &str = "null";

const FIELD_SEPARATOR: char = ':';

/// Why a block did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Missing required field {0}")]
    MissingField(RecordField),
    #[error("Required field {0} is empty")]
    EmptyField(RecordField),
}

/// A recognized field name in ticket text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Name,
    Contract,
    Phone,
    Address,
    Login,
    EquipmentCodes,
    Territory,
}

impl RecordField {
    /// Fields every valid record must carry with a non-empty value.
    pub const REQUIRED: [RecordField; 4] = [
        RecordField::Name,
        RecordField::Contract,
        RecordField::Address,
        RecordField::Territory,
    ];

    /// Map the text before the first `:` to a field.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "Клиент" => Some(Self::Name),
            "Договор" => Some(Self::Contract),
            "Тел" | "Тел." => Some(Self::Phone),
            "Адрес" => Some(Self::Address),
            "Логин" => Some(Self::Login),
            "МКУ" => Some(Self::EquipmentCodes),
            "Территория (участок)" => Some(Self::Territory),
            _ => None,
        }
    }

    /// The canonical key as it appears in ticket text.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name => "Клиент",
            Self::Contract => "Договор",
            Self::Phone => "Тел",
            Self::Address => "Адрес",
            Self::Login => "Логин",
            Self::EquipmentCodes => "МКУ",
            Self::Territory => "Территория (участок)",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A record under construction; any field may still be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDraft {
    pub name: Option<String>,
    pub contract: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub login: Option<Login>,
    pub equipment_codes: Option<String>,
    pub territory: Option<String>,
    pub problem: Option<String>,
}

impl RecordDraft {
    /// Assign a field, replacing any earlier value.
    ///
    /// For `Login`, the `null` marker becomes `Login::Null`.
    pub fn set(&mut self, field: RecordField, value: String) {
        match field {
            RecordField::Name => self.name = Some(value),
            RecordField::Contract => self.contract = Some(value),
            RecordField::Phone => self.phone = Some(value),
            RecordField::Address => self.address = Some(value),
            RecordField::Login => {
                self.login = Some(if value == NULL_MARKER {
                    Login::Null
                } else {
                    Login::Value(value)
                });
            }
            RecordField::EquipmentCodes => self.equipment_codes = Some(value),
            RecordField::Territory => self.territory = Some(value),
        }
    }

    /// Current string value of a field, if any.
    pub fn get(&self, field: RecordField) -> Option<&str> {
        match field {
            RecordField::Name => self.name.as_deref(),
            RecordField::Contract => self.contract.as_deref(),
            RecordField::Phone => self.phone.as_deref(),
            RecordField::Address => self.address.as_deref(),
            RecordField::Login => self.login.as_ref().and_then(Login::as_str),
            RecordField::EquipmentCodes => self.equipment_codes.as_deref(),
            RecordField::Territory => self.territory.as_deref(),
        }
    }

    /// Append a continuation line to a field.
    ///
    /// Only a field holding a non-empty string is extended; returns whether
    /// the line was kept.
    pub fn extend(&mut self, field: RecordField, line: &str) -> bool {
        let Some(current) = self.get(field).filter(|value| !value.is_empty()) else {
            return false;
        };
        let joined = format!("{current} {line}");
        self.set(field, joined);
        true
    }

    /// Append a free-text line to the problem description.
    pub fn push_problem(&mut self, line: &str) {
        match self.problem.as_mut() {
            Some(problem) => {
                problem.push(' ');
                problem.push_str(line);
            }
            None => self.problem = Some(line.to_string()),
        }
    }

    /// Validate and convert into a `CustomerRecord`.
    pub fn finish(self) -> Result<CustomerRecord, RecordError> {
        validate_record(&self)?;

        let RecordDraft {
            name,
            contract,
            phone,
            address,
            login,
            equipment_codes,
            territory,
            problem,
        } = self;

        Ok(CustomerRecord {
            name: name.unwrap_or_default(),
            contract: contract.unwrap_or_default(),
            phone,
            address: address.unwrap_or_default(),
            login,
            equipment_codes,
            territory: territory.unwrap_or_default(),
            problem,
        })
    }
}

/// Check that every required field is present and non-empty.
pub fn validate_record(draft: &RecordDraft) -> Result<(), RecordError> {
    for field in RecordField::REQUIRED {
        match draft.get(field) {
            None => return Err(RecordError::MissingField(field)),
            Some(value) if value.trim().is_empty() => return Err(RecordError::EmptyField(field)),
            Some(_) => {}
        }
    }
    Ok(())
}

/// Convert `\r\n` and lone `\r` line endings to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split text into customer blocks, each starting at a `Клиент:` marker.
///
/// The marker is matched anywhere, not only at the start of a line.
pub fn split_blocks(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = text.match_indices(BLOCK_MARKER).map(|(i, _)| i).collect();

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .filter(|block| !block.trim().is_empty())
        .collect()
}

/// Count block markers in `text`.
pub fn count_blocks(text: &str) -> usize {
    text.matches(BLOCK_MARKER).count()
}

/// Parse one block into a draft without validating it.
pub fn parse_block(block: &str) -> RecordDraft {
    let mut draft = RecordDraft::default();
    let mut current: Option<RecordField> = None;

    for line in block.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match line.split_once(FIELD_SEPARATOR) {
            Some((key, value)) => match RecordField::from_key(key) {
                Some(field) => {
                    current = Some(field);
                    draft.set(field, value.trim().to_string());
                }
                None => {
                    // Unknown key: the whole line continues the current field.
                    if let Some(field) = current {
                        draft.extend(field, line);
                    }
                }
            },
            None => draft.push_problem(line),
        }
    }

    draft
}

/// Parse all valid customer records from raw text, in input order.
pub fn parse_records(text: &str) -> Vec<CustomerRecord> {
    parse_with_summary(text).0
}

/// Block and record totals for one parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    /// Non-blank blocks found
    pub blocks: usize,
    /// Blocks that produced a record
    pub records: usize,
    /// Blocks dropped for a missing or empty required field
    pub dropped: usize,
}

/// Parse records and report how many blocks were dropped.
pub fn parse_with_summary(text: &str) -> (Vec<CustomerRecord>, ParseSummary) {
    let text = normalize_line_endings(text);
    let blocks = split_blocks(&text);
    let mut records = Vec::with_capacity(blocks.len());

    for (index, block) in blocks.iter().enumerate() {
        match parse_block(block).finish() {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::debug!(block = index, error = %e, "Dropping invalid customer block");
            }
        }
    }

    let summary = ParseSummary {
        blocks: blocks.len(),
        records: records.len(),
        dropped: blocks.len() - records.len(),
    };

    (records, summary)
}
