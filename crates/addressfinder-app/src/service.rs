// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::LookupRow;

/// Tags one outbound request so its completion can be matched to the query it
/// answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    pub country: String,
    pub query: String,
    pub path_filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieveQuery {
    pub country: String,
    pub query: String,
    pub id: String,
    pub lines: u32,
    pub exclude: String,
}

/// Retrieved address. The schema belongs to the service; fields are kept as
/// they arrive.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct AddressRecord(Map<String, Value>);

impl AddressRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// No response reached us.
    #[error("cannot reach address service at {endpoint}: {detail}")]
    Connection { endpoint: String, detail: String },
    /// The service answered, but not with a usable payload.
    #[error("address service error: {0}")]
    Api(String),
}

impl ServiceError {
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

pub trait AddressService {
    fn find(&self, query: &LookupQuery) -> Result<Vec<LookupRow>, ServiceError>;
    fn retrieve(&self, query: &RetrieveQuery) -> Result<Vec<AddressRecord>, ServiceError>;
}
