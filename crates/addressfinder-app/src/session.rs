// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{debug, warn};

use crate::{
    AddressRecord, CloseReason, FilterStack, Header, InvalidSuggestionData, ListSource,
    LookupQuery, LookupRow, Phase, PopOutcome, RequestId, RetrieveQuery, ServiceError, Suggestion,
    SuggestionKind, SuggestionList, WidgetConfig, from_lookup_row, normalize_all, status,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Up,
    Down,
}

/// Host events delivered to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// The field text changed.
    Input(String),
    Key(Key),
    /// Pointer selection of a list row.
    Pick(usize),
    Focus,
    Blur,
    Submit,
    /// The breadcrumb was clicked.
    DismissHeader,
}

/// Work the host must perform and report back through
/// [`Session::complete_lookup`] or [`Session::complete_retrieve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Lookup { id: RequestId, query: LookupQuery },
    Retrieve { id: RequestId, query: RetrieveQuery },
}

impl Request {
    pub const fn id(&self) -> RequestId {
        match self {
            Self::Lookup { id, .. } | Self::Retrieve { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub suggestion: Suggestion,
    pub address: AddressRecord,
    pub country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The response answered a superseded request and was dropped.
    Stale,
}

/// Notifications emitted at the session boundary.
pub trait Observer {
    fn opened(&mut self) {}

    fn closed(&mut self, _reason: CloseReason) {}

    fn highlighted(&mut self, _suggestion: &Suggestion) {}

    /// Return `false` to veto the retrieval of an address.
    fn before_select(&mut self, _suggestion: &Suggestion) -> bool {
        true
    }

    fn select_complete(&mut self, _selection: &Selection) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Service,
    Static(Vec<Suggestion>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InFlightLookup {
    id: RequestId,
    query: String,
    path_filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InFlightRetrieve {
    id: RequestId,
    suggestion: Suggestion,
}

/// State for one bound input field.
#[derive(Debug, Clone)]
pub struct Session {
    config: WidgetConfig,
    input: String,
    list: SuggestionList,
    filters: FilterStack,
    phase: Phase,
    source: Source,
    lookup: Option<InFlightLookup>,
    retrieve: Option<InFlightRetrieve>,
    next_request_id: u64,
}

impl Session {
    pub fn new(config: WidgetConfig) -> Self {
        Self {
            list: SuggestionList::new(config.visible_rows),
            filters: FilterStack::new(config.label_mode),
            config,
            input: String::new(),
            phase: Phase::Idle,
            source: Source::Service,
            lookup: None,
            retrieve: None,
            next_request_id: 0,
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        self.list.items()
    }

    pub fn list(&self) -> &SuggestionList {
        &self.list
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.list.highlighted()
    }

    pub fn is_open(&self) -> bool {
        self.list.is_open()
    }

    pub fn filters(&self) -> &FilterStack {
        &self.filters
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn lookup_pending(&self) -> bool {
        self.lookup.is_some()
    }

    pub fn retrieve_pending(&self) -> bool {
        self.retrieve.is_some()
    }

    pub fn status_text(&self) -> String {
        status::status_text(self.phase, &self.list, &self.config)
    }

    pub fn header(&self) -> Header {
        status::header(self.phase, &self.filters, &self.config)
    }

    /// Replaces the lookup service with a fixed list. Every entry is
    /// normalized up front; one malformed entry rejects the whole list.
    pub fn set_list(
        &mut self,
        source: ListSource,
        observer: &mut dyn Observer,
    ) -> Result<(), InvalidSuggestionData> {
        let suggestions = normalize_all(source.into_raw(), self.config.max_items)?;
        self.source = Source::Static(suggestions);
        self.lookup = None;
        if self.meets_min_chars() {
            self.evaluate_static(observer);
        }
        Ok(())
    }

    /// Re-runs the current query, e.g. after the host swapped the list source.
    pub fn evaluate(&mut self, observer: &mut dyn Observer) -> Vec<Request> {
        self.refresh(observer).into_iter().collect()
    }

    pub fn dispatch(&mut self, command: Command, observer: &mut dyn Observer) -> Vec<Request> {
        match command {
            Command::Input(text) => {
                self.input = text;
                while self.filters.should_abandon(&self.input) {
                    debug!(
                        filter = self.filters.active_filter_value(),
                        "input backtracked past filter"
                    );
                    self.pop_filter();
                }
                self.refresh(observer).into_iter().collect()
            }
            Command::Key(key) => self.handle_key(key, observer),
            Command::Pick(index) => {
                if !self.list.is_open() {
                    return Vec::new();
                }
                self.select(index, observer)
            }
            Command::Focus => {
                if !self.list.is_empty() {
                    self.open(observer);
                }
                Vec::new()
            }
            Command::Blur => {
                self.close(CloseReason::Blur, observer);
                Vec::new()
            }
            Command::Submit => {
                self.close(CloseReason::Submit, observer);
                Vec::new()
            }
            Command::DismissHeader => {
                self.pop_filter();
                if self.phase.is_error() {
                    self.phase = if self.list.is_empty() {
                        Phase::Idle
                    } else {
                        Phase::Results
                    };
                }
                if self.input.trim().is_empty() {
                    return Vec::new();
                }
                self.refresh(observer).into_iter().collect()
            }
        }
    }

    pub fn complete_lookup(
        &mut self,
        id: RequestId,
        result: Result<Vec<LookupRow>, ServiceError>,
        observer: &mut dyn Observer,
    ) -> Completion {
        let Some(in_flight) = self.lookup.take_if(|lookup| lookup.id == id) else {
            debug!(request = id.get(), "dropping response for superseded lookup");
            return Completion::Stale;
        };
        if in_flight.query != self.input.trim()
            || in_flight.path_filter != self.filters.active_filter_value()
        {
            debug!(
                request = id.get(),
                "dropping lookup response for query no longer shown"
            );
            return Completion::Stale;
        }

        match result {
            Ok(rows) => {
                let normalized = rows
                    .into_iter()
                    .map(from_lookup_row)
                    .collect::<Result<Vec<_>, _>>();
                match normalized {
                    Ok(mut suggestions) => {
                        suggestions.truncate(self.config.max_items);
                        self.show_results(suggestions, observer);
                    }
                    Err(error) => {
                        warn!(%error, "lookup response contained a malformed row");
                        self.phase = Phase::ApiError;
                        self.list.goto(None);
                    }
                }
            }
            Err(error) => {
                warn!(%error, "lookup failed");
                self.phase = Phase::from_service_error(&error);
                // The error is announced until the highlight moves again.
                self.list.goto(None);
            }
        }
        Completion::Applied
    }

    pub fn complete_retrieve(
        &mut self,
        id: RequestId,
        result: Result<Vec<AddressRecord>, ServiceError>,
        observer: &mut dyn Observer,
    ) -> Completion {
        let Some(in_flight) = self.retrieve.take_if(|retrieve| retrieve.id == id) else {
            debug!(request = id.get(), "dropping response for superseded retrieval");
            return Completion::Stale;
        };

        match result.map(|records| records.into_iter().next()) {
            Ok(Some(address)) => {
                let selection = Selection {
                    suggestion: in_flight.suggestion,
                    address,
                    country: self.config.country.clone(),
                };
                observer.select_complete(&selection);

                self.filters.clear();
                self.trim_input_end();
                self.list.clear();
                self.lookup = None;
                self.phase = Phase::AddressSelected;
            }
            Ok(None) => {
                warn!(request = id.get(), "retrieval returned no address records");
                self.phase = Phase::ApiError;
            }
            Err(error) => {
                warn!(%error, "retrieval failed");
                self.phase = Phase::from_service_error(&error);
            }
        }
        Completion::Applied
    }

    fn handle_key(&mut self, key: Key, observer: &mut dyn Observer) -> Vec<Request> {
        if !self.list.is_open() {
            return Vec::new();
        }
        match key {
            Key::Enter => match self.list.highlighted() {
                Some(index) => self.select(index, observer),
                None => Vec::new(),
            },
            Key::Escape => {
                self.close(CloseReason::Escape, observer);
                Vec::new()
            }
            Key::Up => {
                if let Some(suggestion) = self.list.highlight_previous() {
                    observer.highlighted(suggestion);
                }
                Vec::new()
            }
            Key::Down => {
                if let Some(suggestion) = self.list.highlight_next() {
                    observer.highlighted(suggestion);
                }
                Vec::new()
            }
        }
    }

    fn select(&mut self, index: usize, observer: &mut dyn Observer) -> Vec<Request> {
        let Some(suggestion) = self.list.get(index).cloned() else {
            return Vec::new();
        };

        match suggestion.kind {
            SuggestionKind::Collection => {
                let trimmed = self.input.trim().to_owned();
                self.filters
                    .push(&suggestion.value, &suggestion.label, &format!("{trimmed} "));
                self.input = trimmed;
                debug!(
                    filter = suggestion.value.as_str(),
                    depth = self.filters.len(),
                    "drilling into collection"
                );
                self.refresh(observer).into_iter().collect()
            }
            SuggestionKind::Address => {
                if !observer.before_select(&suggestion) {
                    debug!(id = suggestion.value.as_str(), "selection vetoed");
                    return Vec::new();
                }
                self.close(CloseReason::Selected, observer);

                let id = self.next_request_id();
                let query = RetrieveQuery {
                    country: self.config.country.clone(),
                    query: self.input.trim().to_owned(),
                    id: suggestion.value.clone(),
                    lines: self.config.address_lines,
                    exclude: self.config.exclude_fields.clone(),
                };
                if let Some(previous) = self.retrieve.replace(InFlightRetrieve { id, suggestion }) {
                    debug!(superseded = previous.id.get(), "retrieval superseded");
                }
                vec![Request::Retrieve { id, query }]
            }
        }
    }

    /// Re-runs the current query against whichever source backs the session.
    fn refresh(&mut self, observer: &mut dyn Observer) -> Option<Request> {
        if !self.meets_min_chars() {
            return None;
        }
        match self.source {
            Source::Service => Some(self.issue_lookup()),
            Source::Static(_) => {
                self.evaluate_static(observer);
                None
            }
        }
    }

    fn issue_lookup(&mut self) -> Request {
        let id = self.next_request_id();
        let query = self.input.trim().to_owned();
        let path_filter = self.filters.active_filter_value().to_owned();
        let previous = self.lookup.replace(InFlightLookup {
            id,
            query: query.clone(),
            path_filter: path_filter.clone(),
        });
        if let Some(previous) = previous {
            debug!(superseded = previous.id.get(), "lookup superseded");
        }

        Request::Lookup {
            id,
            query: LookupQuery {
                country: self.config.country.clone(),
                query,
                path_filter: (!path_filter.is_empty()).then_some(path_filter),
            },
        }
    }

    fn evaluate_static(&mut self, observer: &mut dyn Observer) {
        let Source::Static(entries) = &self.source else {
            return;
        };
        let suggestions = entries.clone();
        self.show_results(suggestions, observer);
    }

    fn show_results(&mut self, suggestions: Vec<Suggestion>, observer: &mut dyn Observer) {
        if suggestions.is_empty() {
            self.list.clear();
            self.phase = Phase::NoResults;
            self.close(CloseReason::NoMatches, observer);
            return;
        }
        self.list.replace(suggestions);
        self.phase = Phase::Results;
        self.open(observer);
    }

    fn open(&mut self, observer: &mut dyn Observer) {
        self.list.open();
        observer.opened();
    }

    fn close(&mut self, reason: CloseReason, observer: &mut dyn Observer) {
        if self.list.close() {
            observer.closed(reason);
        }
    }

    fn pop_filter(&mut self) -> PopOutcome {
        let outcome = self.filters.pop_or_clear();
        if outcome == PopOutcome::Cleared {
            self.trim_input_end();
        }
        outcome
    }

    fn trim_input_end(&mut self) {
        let trimmed = self.input.trim_end().len();
        self.input.truncate(trimmed);
    }

    fn meets_min_chars(&self) -> bool {
        self.input.trim().chars().count() >= self.config.min_chars
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_request_id = self.next_request_id.saturating_add(1);
        if self.next_request_id == 0 {
            self.next_request_id = 1;
        }
        RequestId::new(self.next_request_id)
    }
}
