// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use addressfinder_app::{
    AddressRecord, AddressService, CloseReason, LookupQuery, LookupRow, Observer, RetrieveQuery,
    Selection, ServiceError, Suggestion,
};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

const STREET_NAMES: [&str; 12] = [
    "High Street",
    "Station Road",
    "Church Lane",
    "Victoria Road",
    "Mill Lane",
    "Park Avenue",
    "Queens Road",
    "The Green",
    "Manor Way",
    "Kings Road",
    "Otley Road",
    "Woodland Close",
];

const TOWNS: [(&str, &str, &str); 8] = [
    ("Leeds", "West Yorkshire", "LS"),
    ("York", "North Yorkshire", "YO"),
    ("Hull", "East Riding of Yorkshire", "HU"),
    ("Bath", "Somerset", "BA"),
    ("Exeter", "Devon", "EX"),
    ("Norwich", "Norfolk", "NR"),
    ("Durham", "County Durham", "DH"),
    ("Chester", "Cheshire", "CH"),
];

const POSTCODE_LETTERS: &[u8] = b"ABDEFGHJLNPQRSTUWXYZ";

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Generates plausible lookup rows and retrieved addresses from a seed.
#[derive(Debug, Clone)]
pub struct AddressFaker {
    rng: DeterministicRng,
    next_id: u64,
}

impl AddressFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 0,
        }
    }

    pub fn postcode(&mut self, area: &str) -> String {
        let district = 1 + self.rng.int_n(20);
        let sector = self.rng.int_n(10);
        let first = POSTCODE_LETTERS[self.rng.int_n(POSTCODE_LETTERS.len())] as char;
        let second = POSTCODE_LETTERS[self.rng.int_n(POSTCODE_LETTERS.len())] as char;
        format!("{area}{district} {sector}{first}{second}")
    }

    /// A terminal row for one premise.
    pub fn address_row(&mut self) -> LookupRow {
        let number = 1 + self.rng.int_n(200);
        let street = STREET_NAMES[self.rng.int_n(STREET_NAMES.len())];
        let (town, _, area) = TOWNS[self.rng.int_n(TOWNS.len())];
        let postcode = self.postcode(area);
        address_row(
            &format!("{number} {street}, {town}, {postcode}"),
            &self.id("ADD"),
        )
    }

    /// A town-level collection row.
    pub fn collection_row(&mut self) -> LookupRow {
        let (town, county, _) = TOWNS[self.rng.int_n(TOWNS.len())];
        let count = 2 + self.rng.int_n(20_000) as u64;
        collection_row(&format!("{town}, {county}"), &self.id("LOC"), count)
    }

    pub fn rows(&mut self, addresses: usize, collections: usize) -> Vec<LookupRow> {
        let mut rows: Vec<LookupRow> = (0..collections).map(|_| self.collection_row()).collect();
        rows.extend((0..addresses).map(|_| self.address_row()));
        rows
    }

    pub fn address_record(&mut self) -> AddressRecord {
        let number = 1 + self.rng.int_n(200);
        let street = STREET_NAMES[self.rng.int_n(STREET_NAMES.len())];
        let (town, county, area) = TOWNS[self.rng.int_n(TOWNS.len())];
        let postcode = self.postcode(area);
        address_record(&[
            ("addressline1", &format!("{number} {street}")),
            ("posttown", town),
            ("county", county),
            ("postcode", &postcode),
        ])
    }

    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}|{}", self.next_id)
    }
}

pub fn address_row(summary: &str, id: &str) -> LookupRow {
    LookupRow {
        summaryline: summary.to_owned(),
        locationsummary: None,
        id: id.to_owned(),
        kind: Some("ADD".to_owned()),
        count: None,
    }
}

pub fn collection_row(location: &str, id: &str, count: u64) -> LookupRow {
    LookupRow {
        summaryline: String::new(),
        locationsummary: Some(location.to_owned()),
        id: id.to_owned(),
        kind: Some("LOCALITY".to_owned()),
        count: Some(count),
    }
}

pub fn address_record(fields: &[(&str, &str)]) -> AddressRecord {
    let fields: Map<String, Value> = fields
        .iter()
        .map(|(name, value)| ((*name).to_owned(), Value::String((*value).to_owned())))
        .collect();
    AddressRecord::new(fields)
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

/// An [`AddressService`] that replays queued responses and records what it
/// was asked. An empty queue answers lookups with no rows and retrievals with
/// no records.
#[derive(Debug, Default)]
pub struct ScriptedService {
    lookups: Mutex<VecDeque<Result<Vec<LookupRow>, ServiceError>>>,
    retrievals: Mutex<VecDeque<Result<Vec<AddressRecord>, ServiceError>>>,
    lookup_log: Mutex<Vec<LookupQuery>>,
    retrieve_log: Mutex<Vec<RetrieveQuery>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_lookup(&self, result: Result<Vec<LookupRow>, ServiceError>) {
        lock(&self.lookups).push_back(result);
    }

    pub fn push_retrieve(&self, result: Result<Vec<AddressRecord>, ServiceError>) {
        lock(&self.retrievals).push_back(result);
    }

    pub fn lookups(&self) -> Vec<LookupQuery> {
        lock(&self.lookup_log).clone()
    }

    pub fn retrievals(&self) -> Vec<RetrieveQuery> {
        lock(&self.retrieve_log).clone()
    }
}

impl AddressService for ScriptedService {
    fn find(&self, query: &LookupQuery) -> Result<Vec<LookupRow>, ServiceError> {
        lock(&self.lookup_log).push(query.clone());
        lock(&self.lookups).pop_front().unwrap_or(Ok(Vec::new()))
    }

    fn retrieve(&self, query: &RetrieveQuery) -> Result<Vec<AddressRecord>, ServiceError> {
        lock(&self.retrieve_log).push(query.clone());
        lock(&self.retrievals).pop_front().unwrap_or(Ok(Vec::new()))
    }
}

// Poisoning is ignored; the recorded queues stay valid after a test panic.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Opened,
    Closed(CloseReason),
    Highlighted(String),
    BeforeSelect(String),
    SelectComplete(Selection),
}

/// Observer that records every notification and can veto selections.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    pub notifications: Vec<Notification>,
    pub veto: bool,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vetoing() -> Self {
        Self {
            veto: true,
            ..Self::default()
        }
    }

    pub fn selections(&self) -> Vec<&Selection> {
        self.notifications
            .iter()
            .filter_map(|notification| match notification {
                Notification::SelectComplete(selection) => Some(selection),
                _ => None,
            })
            .collect()
    }

    pub fn close_reasons(&self) -> Vec<CloseReason> {
        self.notifications
            .iter()
            .filter_map(|notification| match notification {
                Notification::Closed(reason) => Some(*reason),
                _ => None,
            })
            .collect()
    }
}

impl Observer for RecordingObserver {
    fn opened(&mut self) {
        self.notifications.push(Notification::Opened);
    }

    fn closed(&mut self, reason: CloseReason) {
        self.notifications.push(Notification::Closed(reason));
    }

    fn highlighted(&mut self, suggestion: &Suggestion) {
        self.notifications
            .push(Notification::Highlighted(suggestion.label.clone()));
    }

    fn before_select(&mut self, suggestion: &Suggestion) -> bool {
        self.notifications
            .push(Notification::BeforeSelect(suggestion.value.clone()));
        !self.veto
    }

    fn select_complete(&mut self, selection: &Selection) {
        self.notifications
            .push(Notification::SelectComplete(selection.clone()));
    }
}
