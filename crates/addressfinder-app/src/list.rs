// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::ops::Range;

use crate::Suggestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Blur,
    Escape,
    Submit,
    Selected,
    NoMatches,
}

impl CloseReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blur => "blur",
            Self::Escape => "esc",
            Self::Submit => "submit",
            Self::Selected => "select",
            Self::NoMatches => "nomatches",
        }
    }
}

/// Fixed-height window over the list, in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListViewport {
    first_row: usize,
    rows: usize,
}

impl ListViewport {
    pub fn new(rows: usize) -> Self {
        Self {
            first_row: 0,
            rows: rows.max(1),
        }
    }

    pub const fn first_row(&self) -> usize {
        self.first_row
    }

    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Moves just enough to make `index` visible.
    pub fn scroll_to(&mut self, index: usize) {
        if index < self.first_row {
            self.first_row = index;
        } else if index >= self.first_row + self.rows {
            self.first_row = index + 1 - self.rows;
        }
    }

    pub fn visible_range(&self, len: usize) -> Range<usize> {
        let start = self.first_row.min(len);
        start..(start + self.rows).min(len)
    }

    fn reset(&mut self) {
        self.first_row = 0;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionList {
    items: Vec<Suggestion>,
    highlighted: Option<usize>,
    open: bool,
    viewport: ListViewport,
}

impl SuggestionList {
    pub fn new(visible_rows: usize) -> Self {
        Self {
            items: Vec::new(),
            highlighted: None,
            open: false,
            viewport: ListViewport::new(visible_rows),
        }
    }

    pub fn replace(&mut self, items: Vec<Suggestion>) {
        self.items = items;
        self.highlighted = None;
        self.viewport.reset();
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    pub fn items(&self) -> &[Suggestion] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&Suggestion> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub const fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn highlighted_item(&self) -> Option<&Suggestion> {
        self.highlighted.and_then(|index| self.items.get(index))
    }

    pub const fn is_open(&self) -> bool {
        self.open
    }

    pub const fn viewport(&self) -> ListViewport {
        self.viewport
    }

    pub fn next_index(&self) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }
        match self.highlighted {
            Some(index) if index + 1 < self.items.len() => Some(index + 1),
            _ => Some(0),
        }
    }

    pub fn previous_index(&self) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }
        match self.highlighted {
            Some(index) if index > 0 => Some(index - 1),
            _ => Some(self.items.len() - 1),
        }
    }

    /// Highlights `index` and scrolls it into view. Out-of-range indices clear
    /// the highlight.
    pub fn goto(&mut self, index: Option<usize>) -> Option<&Suggestion> {
        self.highlighted = index.filter(|index| *index < self.items.len());
        let index = self.highlighted?;
        self.viewport.scroll_to(index);
        self.items.get(index)
    }

    /// Moves the highlight forward, wrapping to the first row.
    pub fn highlight_next(&mut self) -> Option<&Suggestion> {
        let index = self.next_index();
        self.goto(index)
    }

    /// Moves the highlight back, wrapping to the last row.
    pub fn highlight_previous(&mut self) -> Option<&Suggestion> {
        let index = self.previous_index();
        self.goto(index)
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Returns `false` when the list was already closed.
    pub fn close(&mut self) -> bool {
        if !self.open {
            return false;
        }
        self.open = false;
        self.highlighted = None;
        true
    }
}
