// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use addressfinder_app::{Attributes, Icons, Language, WidgetConfig, WidgetOptions};
use addressfinder_client::DEFAULT_BASE_URL;
use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "addressfinder";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "5s";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub service: Service,
    /// Declarative widget attributes, as they would appear on the input.
    #[serde(default)]
    pub widget: BTreeMap<String, toml::Value>,
    pub language: Option<Language>,
    pub icons: Option<Icons>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            service: Service::default(),
            widget: BTreeMap::new(),
            language: None,
            icons: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Service {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("ADDRESSFINDER_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!(
                "cannot resolve config directory; set ADDRESSFINDER_CONFIG_PATH to the config file"
            )
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [service], [widget], and [language]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.service.base_url
            && base_url.trim().is_empty()
        {
            bail!("service.base_url in {} must not be empty", path.display());
        }

        if let Some(timeout) = &self.service.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "service.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        for (name, value) in &self.widget {
            if attribute_text(value).is_none() {
                bail!(
                    "widget.{name} in {} must be a string, number, or boolean",
                    path.display()
                );
            }
        }
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.service
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.service.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn attributes(&self) -> Attributes {
        Attributes::from_pairs(
            self.widget
                .iter()
                .filter_map(|(name, value)| Some((name, attribute_text(value)?))),
        )
    }

    /// Resolves the widget configuration. `options` are the explicit layer;
    /// language and icon tables from the file fill in when it leaves them
    /// unset.
    pub fn widget_config(&self, mut options: WidgetOptions) -> Result<WidgetConfig> {
        if options.language.is_none() {
            options.language = self.language.clone();
        }
        if options.icons.is_none() {
            options.icons = self.icons.clone();
        }
        WidgetConfig::resolve(&self.attributes(), &options)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# addressfinder config\n# Place this file at: {}\n\nversion = 1\n\n[service]\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[widget]\n# Same names as the data-* attributes on the input.\n# apikey = \"YOUR-API-KEY\"\ncountry = \"GB\"\naddresslines = 2\nexcludefields = \"organisation\"\nmaxitems = 100\nshowfullcounts = false\nlabelmode = \"both\"\n\n[language]\n# address_not_found = \"No address results found\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
        )
    }
}

fn attribute_text(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(text) => Some(text.clone()),
        toml::Value::Integer(number) => Some(number.to_string()),
        toml::Value::Boolean(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
