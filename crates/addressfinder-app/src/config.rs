// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::LabelMode;

/// Minimum trimmed input length before a lookup is issued.
pub const MIN_CHARS: usize = 3;

pub const DEFAULT_API_KEY: &str = "PCW45-12345-12345-1234X";
pub const DEFAULT_COUNTRY: &str = "GB";
pub const DEFAULT_FIND_ENDPOINT: &str = "autocomplete/find";
pub const DEFAULT_RETRIEVE_ENDPOINT: &str = "autocomplete/retrieve";
pub const DEFAULT_IDENTIFIER: &str = "Autocomplete Address Finder";
const DEFAULT_ADDRESS_LINES: u32 = 2;
const DEFAULT_EXCLUDE_FIELDS: &str = "organisation";
const DEFAULT_MAX_ITEMS: usize = 100;
const DEFAULT_VISIBLE_ROWS: usize = 8;

/// Announced strings. `address_status_init` may contain `[minChars]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Language {
    pub connection_error: String,
    pub error: String,
    pub filter: String,
    pub filter_remove: String,
    pub result_found: String,
    pub result_found_plural: String,
    pub address: String,
    pub address_plural: String,
    pub address_status_init: String,
    pub address_selected: String,
    pub address_api_error: String,
    pub address_collection: String,
    pub address_not_found: String,
}

impl Default for Language {
    fn default() -> Self {
        Self {
            connection_error: "Connection error".to_owned(),
            error: "Error".to_owned(),
            filter: "Filter".to_owned(),
            filter_remove: "Click to remove filter".to_owned(),
            result_found: "result found".to_owned(),
            result_found_plural: "results found".to_owned(),
            address: "Address".to_owned(),
            address_plural: "Addresses".to_owned(),
            address_status_init: "Type [minChars] or more characters for results".to_owned(),
            address_selected: "Address selected and address fields have been populated"
                .to_owned(),
            address_api_error: "Error from address API".to_owned(),
            address_collection: "Collection of addresses".to_owned(),
            address_not_found: "No address results found".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Icons {
    pub back: String,
    pub address: String,
    pub collection: String,
    pub error: String,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            back: "<".to_owned(),
            address: "@".to_owned(),
            collection: "+".to_owned(),
            error: "!".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub api_key: String,
    pub find_endpoint: String,
    pub retrieve_endpoint: String,
    pub country: String,
    pub address_lines: u32,
    pub exclude_fields: String,
    pub max_items: usize,
    pub show_full_counts: bool,
    pub icons: Icons,
    pub language: Language,
    pub min_chars: usize,
    pub identifier: String,
    pub label_mode: LabelMode,
    pub visible_rows: usize,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_key: DEFAULT_API_KEY.to_owned(),
            find_endpoint: DEFAULT_FIND_ENDPOINT.to_owned(),
            retrieve_endpoint: DEFAULT_RETRIEVE_ENDPOINT.to_owned(),
            country: DEFAULT_COUNTRY.to_owned(),
            address_lines: DEFAULT_ADDRESS_LINES,
            exclude_fields: DEFAULT_EXCLUDE_FIELDS.to_owned(),
            max_items: DEFAULT_MAX_ITEMS,
            show_full_counts: false,
            icons: Icons::default(),
            language: Language::default(),
            min_chars: MIN_CHARS,
            identifier: DEFAULT_IDENTIFIER.to_owned(),
            label_mode: LabelMode::Both,
            visible_rows: DEFAULT_VISIBLE_ROWS,
        }
    }
}

/// Explicit per-instance options. These win over declared attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WidgetOptions {
    pub api_key: Option<String>,
    pub find_endpoint: Option<String>,
    pub retrieve_endpoint: Option<String>,
    pub country: Option<String>,
    pub address_lines: Option<u32>,
    pub exclude_fields: Option<String>,
    pub max_items: Option<usize>,
    pub show_full_counts: Option<bool>,
    pub icons: Option<Icons>,
    pub language: Option<Language>,
    pub identifier: Option<String>,
    pub label_mode: Option<String>,
    pub visible_rows: Option<usize>,
}

/// Declarative `data-*` attributes bound to an input. Names are matched
/// case-insensitively with or without the `data-` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: BTreeMap<String, String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut attributes = Self::new();
        for (name, value) in pairs {
            attributes.set(name.as_ref(), value);
        }
        attributes
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(attribute_key(name), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&attribute_key(name)).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn text(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    }

    fn number<T: FromStr>(&self, name: &str) -> Result<Option<T>> {
        let Some(raw) = self.get(name).map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(None);
        };
        raw.parse()
            .map(Some)
            .map_err(|_| anyhow!("attribute data-{name} must be a whole number, got {raw:?}"))
    }

    // A present attribute with no value counts as `true`.
    fn flag(&self, name: &str) -> Result<Option<bool>> {
        let Some(raw) = self.get(name) else {
            return Ok(None);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            other => bail!("attribute data-{name} must be true or false, got {other:?}"),
        }
    }
}

fn attribute_key(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    match lower.strip_prefix("data-") {
        Some(rest) => rest.replace(['-', '_'], ""),
        None => lower.replace(['-', '_'], ""),
    }
}

impl WidgetConfig {
    /// Merges defaults, then declared attributes, then explicit options.
    pub fn resolve(attributes: &Attributes, options: &WidgetOptions) -> Result<Self> {
        let defaults = Self::default();

        let label_mode_raw = options
            .label_mode
            .clone()
            .or_else(|| attributes.text("labelmode"));
        let label_mode = match label_mode_raw {
            Some(raw) => LabelMode::parse(&raw)
                .ok_or_else(|| anyhow!("label mode must be one of both, left, right; got {raw:?}"))?,
            None => defaults.label_mode,
        };

        let config = Self {
            api_key: options
                .api_key
                .clone()
                .or_else(|| attributes.text("apikey"))
                .unwrap_or(defaults.api_key),
            find_endpoint: options
                .find_endpoint
                .clone()
                .or_else(|| attributes.text("findendpoint"))
                .unwrap_or(defaults.find_endpoint),
            retrieve_endpoint: options
                .retrieve_endpoint
                .clone()
                .or_else(|| attributes.text("retrieveendpoint"))
                .unwrap_or(defaults.retrieve_endpoint),
            country: options
                .country
                .clone()
                .or_else(|| attributes.text("country"))
                .unwrap_or(defaults.country),
            address_lines: match options.address_lines {
                Some(lines) => lines,
                None => attributes
                    .number("addresslines")?
                    .unwrap_or(defaults.address_lines),
            },
            exclude_fields: options
                .exclude_fields
                .clone()
                .or_else(|| attributes.text("excludefields"))
                .unwrap_or(defaults.exclude_fields),
            max_items: match options.max_items {
                Some(max) => max,
                None => attributes.number("maxitems")?.unwrap_or(defaults.max_items),
            },
            show_full_counts: match options.show_full_counts {
                Some(show) => show,
                None => attributes
                    .flag("showfullcounts")?
                    .unwrap_or(defaults.show_full_counts),
            },
            icons: options.icons.clone().unwrap_or(defaults.icons),
            language: options.language.clone().unwrap_or(defaults.language),
            min_chars: MIN_CHARS,
            identifier: options
                .identifier
                .clone()
                .or_else(|| attributes.text("identifier"))
                .unwrap_or(defaults.identifier),
            label_mode,
            visible_rows: match options.visible_rows {
                Some(rows) => rows,
                None => attributes
                    .number("visiblerows")?
                    .unwrap_or(defaults.visible_rows),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            bail!("api key must not be empty");
        }
        if self.country.trim().is_empty() {
            bail!("country must not be empty; use an ISO 3166 code such as GB");
        }
        if self.find_endpoint.trim().is_empty() || self.retrieve_endpoint.trim().is_empty() {
            bail!("find and retrieve endpoints must not be empty");
        }
        if self.address_lines == 0 {
            bail!("address lines must be positive, got 0");
        }
        if self.max_items == 0 {
            bail!("max items must be positive, got 0");
        }
        if self.visible_rows == 0 {
            bail!("visible rows must be positive, got 0");
        }
        Ok(())
    }

    pub fn status_init(&self) -> String {
        self.language
            .address_status_init
            .replace("[minChars]", &self.min_chars.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{Attributes, Language, MIN_CHARS, WidgetConfig, WidgetOptions};
    use crate::LabelMode;
    use anyhow::Result;

    #[test]
    fn defaults_resolve_without_layers() -> Result<()> {
        let config = WidgetConfig::resolve(&Attributes::new(), &WidgetOptions::default())?;
        assert_eq!(config, WidgetConfig::default());
        assert_eq!(config.country, "GB");
        assert_eq!(config.address_lines, 2);
        assert_eq!(config.exclude_fields, "organisation");
        assert_eq!(config.max_items, 100);
        assert!(!config.show_full_counts);
        assert_eq!(config.min_chars, MIN_CHARS);
        Ok(())
    }

    #[test]
    fn attributes_override_defaults() -> Result<()> {
        let attributes = Attributes::from_pairs([
            ("data-country", "IE"),
            ("data-maxitems", "20"),
            ("data-showfullcounts", ""),
            ("DATA-APIKEY", "KEY-FROM-ATTR"),
        ]);
        let config = WidgetConfig::resolve(&attributes, &WidgetOptions::default())?;
        assert_eq!(config.country, "IE");
        assert_eq!(config.max_items, 20);
        assert!(config.show_full_counts);
        assert_eq!(config.api_key, "KEY-FROM-ATTR");
        Ok(())
    }

    #[test]
    fn explicit_options_win_over_attributes() -> Result<()> {
        let attributes = Attributes::from_pairs([
            ("data-country", "IE"),
            ("data-addresslines", "4"),
            ("data-labelmode", "left"),
        ]);
        let options = WidgetOptions {
            country: Some("GB".to_owned()),
            address_lines: Some(3),
            ..WidgetOptions::default()
        };
        let config = WidgetConfig::resolve(&attributes, &options)?;
        assert_eq!(config.country, "GB");
        assert_eq!(config.address_lines, 3);
        assert_eq!(config.label_mode, LabelMode::Left);
        Ok(())
    }

    #[test]
    fn attribute_names_ignore_prefix_case_and_separators() {
        let attributes = Attributes::from_pairs([("data-exclude-fields", "postcode")]);
        assert_eq!(attributes.get("excludefields"), Some("postcode"));
        assert_eq!(attributes.get("data-ExcludeFields"), Some("postcode"));
    }

    #[test]
    fn invalid_numeric_attribute_is_rejected() {
        let attributes = Attributes::from_pairs([("data-maxitems", "lots")]);
        let error = WidgetConfig::resolve(&attributes, &WidgetOptions::default())
            .expect_err("non-numeric max items should fail");
        assert!(error.to_string().contains("data-maxitems"));
    }

    #[test]
    fn zero_limits_are_rejected() {
        let options = WidgetOptions {
            max_items: Some(0),
            ..WidgetOptions::default()
        };
        let error = WidgetConfig::resolve(&Attributes::new(), &options)
            .expect_err("zero max items should fail");
        assert!(error.to_string().contains("must be positive"));
    }

    #[test]
    fn unknown_label_mode_is_rejected() {
        let options = WidgetOptions {
            label_mode: Some("middle".to_owned()),
            ..WidgetOptions::default()
        };
        let error = WidgetConfig::resolve(&Attributes::new(), &options)
            .expect_err("bad label mode should fail");
        assert!(error.to_string().contains("both, left, right"));
    }

    #[test]
    fn partial_language_table_keeps_defaults() -> Result<()> {
        let language: Language = serde_json::from_str(r#"{"address_not_found":"Nothing here"}"#)?;
        assert_eq!(language.address_not_found, "Nothing here");
        assert_eq!(language.connection_error, "Connection error");
        Ok(())
    }

    #[test]
    fn status_init_substitutes_min_chars() {
        assert_eq!(
            WidgetConfig::default().status_init(),
            "Type 3 or more characters for results"
        );
    }
}
