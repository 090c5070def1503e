// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FilterStack, ServiceError, SuggestionList, WidgetConfig};

/// Outcome of the last lookup or retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Results,
    NoResults,
    ConnectionError,
    ApiError,
    AddressSelected,
}

impl Phase {
    pub fn from_service_error(error: &ServiceError) -> Self {
        if error.is_connection() {
            Self::ConnectionError
        } else {
            Self::ApiError
        }
    }

    pub const fn is_error(self) -> bool {
        matches!(self, Self::NoResults | Self::ConnectionError | Self::ApiError)
    }
}

/// Breadcrumb region above the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    Hidden,
    Filter { label: String, hint: String },
    Error { message: String },
}

/// Screen-reader text for the widget. A highlighted row is announced in any
/// phase, so moving through a list kept open after a failed lookup still
/// reports position.
///
/// The result count is the number of rows shown, not the sum of their
/// address counts: one collection of 40 addresses reads "1 result found".
pub fn status_text(phase: Phase, list: &SuggestionList, config: &WidgetConfig) -> String {
    if let Some(index) = list.highlighted()
        && let Some(item) = list.get(index)
    {
        return format!("{}, list item {} of {}", item.label, index + 1, list.len());
    }

    let language = &config.language;
    match phase {
        Phase::Idle => config.status_init(),
        Phase::Results => {
            if list.len() == 1 {
                format!("1 {}", language.result_found)
            } else {
                format!("{} {}", list.len(), language.result_found_plural)
            }
        }
        Phase::NoResults => language.address_not_found.clone(),
        Phase::ConnectionError => language.connection_error.clone(),
        Phase::ApiError => language.address_api_error.clone(),
        Phase::AddressSelected => language.address_selected.clone(),
    }
}

pub fn header(phase: Phase, filters: &FilterStack, config: &WidgetConfig) -> Header {
    let language = &config.language;
    let error = match phase {
        Phase::NoResults => Some(&language.address_not_found),
        Phase::ConnectionError => Some(&language.connection_error),
        Phase::ApiError => Some(&language.address_api_error),
        Phase::Idle | Phase::Results | Phase::AddressSelected => None,
    };
    if let Some(message) = error {
        return Header::Error {
            message: message.clone(),
        };
    }

    match filters.active_label() {
        Some(label) => Header::Filter {
            label: label.to_owned(),
            hint: language.filter_remove.clone(),
        },
        None => Header::Hidden,
    }
}
