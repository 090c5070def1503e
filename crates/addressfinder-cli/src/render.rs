// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use addressfinder_app::{Header, Selection, Session, SuggestionKind};
use std::io::{self, Write};

/// Draws the header, the visible window of the list, and the live status
/// line.
pub fn render_session<W: Write>(session: &Session, out: &mut W) -> io::Result<()> {
    let config = session.config();
    match session.header() {
        Header::Hidden => {}
        Header::Filter { label, hint } => {
            writeln!(out, "{} {label}  ({hint})", config.icons.back)?;
        }
        Header::Error { message } => {
            writeln!(out, "{} {message}", config.icons.error)?;
        }
    }

    if session.is_open() {
        let list = session.list();
        let range = list.viewport().visible_range(list.len());
        if range.start > 0 {
            writeln!(out, "    ...")?;
        }
        for index in range.clone() {
            let Some(item) = list.get(index) else {
                continue;
            };
            let marker = if list.highlighted() == Some(index) {
                '>'
            } else {
                ' '
            };
            let icon = match item.kind {
                SuggestionKind::Address => &config.icons.address,
                SuggestionKind::Collection => &config.icons.collection,
            };
            write!(out, "{marker} {index:>2} {icon} {}", item.label)?;
            if !item.location.is_empty() {
                write!(out, "  {}", item.location)?;
            }
            if item.kind == SuggestionKind::Collection {
                let noun = if item.count == 1 {
                    &config.language.address
                } else {
                    &config.language.address_plural
                };
                write!(
                    out,
                    "  ({} {})",
                    item.count_display(config.show_full_counts),
                    noun.to_lowercase()
                )?;
            }
            writeln!(out)?;
        }
        if range.end < list.len() {
            writeln!(out, "    ...")?;
        }
    }

    writeln!(out, "[status] {}", session.status_text())?;
    out.flush()
}

pub fn render_selection<W: Write>(selection: &Selection, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "selected {} ({})",
        selection.suggestion.label, selection.country
    )?;
    for (name, value) in selection.address.fields() {
        match value.as_str() {
            Some(text) => writeln!(out, "  {name}: {text}")?,
            None => writeln!(out, "  {name}: {value}")?,
        }
    }
    out.flush()
}
