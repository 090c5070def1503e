// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Service type tag that marks a terminal, retrievable address.
pub const ADDRESS_TAG: &str = "ADD";

const COUNT_CAP: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Collection,
    Address,
}

impl SuggestionKind {
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().eq_ignore_ascii_case(ADDRESS_TAG) {
            Self::Address
        } else {
            Self::Collection
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Address => "address",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub label: String,
    pub value: String,
    pub location: String,
    pub kind: SuggestionKind,
    pub count: u64,
}

impl Suggestion {
    pub fn is_address(&self) -> bool {
        self.kind == SuggestionKind::Address
    }

    /// Count text for list rows. Counts above 100 collapse to `100+` unless
    /// full counts are requested.
    pub fn count_display(&self, show_full_counts: bool) -> String {
        if self.count > COUNT_CAP && !show_full_counts {
            return format!("{COUNT_CAP}+");
        }
        group_thousands(self.count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid suggestion data: {reason}")]
pub struct InvalidSuggestionData {
    reason: &'static str,
}

impl InvalidSuggestionData {
    pub const fn reason(&self) -> &'static str {
        self.reason
    }
}

/// Suggestion input before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSuggestion {
    Pair(String, String),
    Record {
        label: Option<String>,
        value: Option<String>,
        location: Option<String>,
        tag: Option<String>,
        count: Option<u64>,
    },
    Scalar(String),
}

pub fn normalize(raw: RawSuggestion) -> Result<Suggestion, InvalidSuggestionData> {
    let (label, value, location, kind, count) = match raw {
        RawSuggestion::Pair(label, value) => {
            (label, value, String::new(), SuggestionKind::Collection, None)
        }
        RawSuggestion::Record {
            label,
            value,
            location,
            tag,
            count,
        } => (
            label.unwrap_or_default(),
            value.unwrap_or_default(),
            location.unwrap_or_default(),
            SuggestionKind::from_tag(tag.as_deref().unwrap_or_default()),
            count,
        ),
        RawSuggestion::Scalar(text) => (
            text.clone(),
            text.clone(),
            text,
            SuggestionKind::Collection,
            None,
        ),
    };

    if label.is_empty() && value.is_empty() {
        return Err(InvalidSuggestionData {
            reason: "entry has neither a label nor a value",
        });
    }

    let label = if label.is_empty() {
        value.clone()
    } else {
        label
    };
    let count = match kind {
        SuggestionKind::Address => 1,
        SuggestionKind::Collection => count.filter(|count| *count > 0).unwrap_or(1),
    };

    Ok(Suggestion {
        label,
        value,
        location,
        kind,
        count,
    })
}

/// Normalizes every entry, failing on the first malformed one, and keeps at
/// most `max_items`.
pub fn normalize_all<I>(raw: I, max_items: usize) -> Result<Vec<Suggestion>, InvalidSuggestionData>
where
    I: IntoIterator<Item = RawSuggestion>,
{
    let mut suggestions = raw
        .into_iter()
        .map(normalize)
        .collect::<Result<Vec<_>, _>>()?;
    suggestions.truncate(max_items);
    Ok(suggestions)
}

/// One row of a lookup response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LookupRow {
    #[serde(default)]
    pub summaryline: String,
    #[serde(default, deserialize_with = "text_or_flag")]
    pub locationsummary: Option<String>,
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type", deserialize_with = "text_or_flag")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "count_or_flag")]
    pub count: Option<u64>,
}

impl LookupRow {
    /// Rows without a type tag, or tagged `ADD`, resolve to a single address.
    pub fn is_terminal(&self) -> bool {
        self.kind
            .as_deref()
            .map(str::trim)
            .is_none_or(|kind| kind.is_empty() || kind.eq_ignore_ascii_case(ADDRESS_TAG))
    }

    pub fn into_raw(self) -> RawSuggestion {
        let terminal = self.is_terminal();
        let location_summary = self.locationsummary.unwrap_or_default();
        let (label, location) = if self.summaryline.is_empty() {
            (location_summary, String::new())
        } else {
            (self.summaryline, location_summary)
        };

        RawSuggestion::Record {
            label: Some(label),
            value: Some(self.id),
            location: Some(location),
            tag: Some(if terminal {
                ADDRESS_TAG.to_owned()
            } else {
                self.kind.unwrap_or_default()
            }),
            count: if terminal { None } else { self.count },
        }
    }
}

pub fn from_lookup_row(row: LookupRow) -> Result<Suggestion, InvalidSuggestionData> {
    normalize(row.into_raw())
}

/// A host-supplied list used instead of the lookup service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSource {
    Entries(Vec<RawSuggestion>),
    /// Comma separated text; a string without commas is a single entry.
    Delimited(String),
    Options(Vec<OptionEntry>),
}

/// A `<option>`-like element: text plus optional value and label overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionEntry {
    pub text: String,
    pub value: Option<String>,
    pub label: Option<String>,
    pub disabled: bool,
}

impl ListSource {
    pub fn into_raw(self) -> Vec<RawSuggestion> {
        match self {
            Self::Entries(entries) => entries,
            Self::Delimited(text) => text
                .split(',')
                .map(|part| RawSuggestion::Scalar(part.trim().to_owned()))
                .collect(),
            Self::Options(options) => options
                .into_iter()
                .filter(|option| !option.disabled)
                .filter_map(|option| {
                    let text = option.text.trim().to_owned();
                    let value = option
                        .value
                        .filter(|value| !value.is_empty())
                        .unwrap_or_else(|| text.clone());
                    if value.is_empty() {
                        return None;
                    }
                    let label = option
                        .label
                        .filter(|label| !label.is_empty())
                        .unwrap_or(text);
                    Some(RawSuggestion::Pair(label, value))
                })
                .collect(),
        }
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// The service sends `false` in place of absent text fields.
fn text_or_flag<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrFlag {
        Text(String),
        Flag(bool),
    }

    Ok(match Option::<TextOrFlag>::deserialize(deserializer)? {
        Some(TextOrFlag::Text(text)) => Some(text),
        Some(TextOrFlag::Flag(_)) | None => None,
    })
}

fn count_or_flag<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CountOrFlag {
        Count(u64),
        Flag(bool),
    }

    Ok(match Option::<CountOrFlag>::deserialize(deserializer)? {
        Some(CountOrFlag::Count(count)) => Some(count),
        Some(CountOrFlag::Flag(_)) | None => None,
    })
}
