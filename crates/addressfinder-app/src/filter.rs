// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// Which comma-separated parts of a long label survive shortening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelMode {
    /// First and last part.
    #[default]
    Both,
    /// First two parts.
    Left,
    /// Last two parts.
    Right,
}

impl LabelMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "both" => Some(Self::Both),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

pub fn shorten_label(label: &str, mode: LabelMode) -> String {
    let parts: Vec<&str> = label.split(',').map(str::trim).collect();
    match (mode, parts.as_slice()) {
        (LabelMode::Both, [first, .., last]) => format!("{first}, {last}"),
        (LabelMode::Left, [first, second, _, ..]) => format!("{first}, {second}"),
        (LabelMode::Right, [_, .., penultimate, last]) => format!("{penultimate}, {last}"),
        (_, parts) => parts.first().copied().unwrap_or_default().to_owned(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEntry {
    pub filter_value: String,
    pub label_text: String,
    /// Input text when the filter was applied. Deleting back past it drops
    /// the filter.
    pub search_term_at_apply: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopOutcome {
    Popped,
    Cleared,
    AlreadyEmpty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStack {
    entries: Vec<FilterEntry>,
    label_mode: LabelMode,
}

impl FilterStack {
    pub fn new(label_mode: LabelMode) -> Self {
        Self {
            entries: Vec::new(),
            label_mode,
        }
    }

    pub fn push(&mut self, filter_value: &str, label_raw: &str, search_term_at_apply: &str) {
        self.entries.push(FilterEntry {
            filter_value: filter_value.to_owned(),
            label_text: shorten_label(label_raw, self.label_mode),
            search_term_at_apply: search_term_at_apply.to_owned(),
        });
    }

    pub fn pop_or_clear(&mut self) -> PopOutcome {
        match self.entries.len() {
            0 => PopOutcome::AlreadyEmpty,
            1 => {
                self.entries.clear();
                PopOutcome::Cleared
            }
            _ => {
                self.entries.pop();
                PopOutcome::Popped
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn active(&self) -> Option<&FilterEntry> {
        self.entries.last()
    }

    pub fn active_filter_value(&self) -> &str {
        self.active()
            .map(|entry| entry.filter_value.as_str())
            .unwrap_or_default()
    }

    pub fn active_label(&self) -> Option<&str> {
        self.active().map(|entry| entry.label_text.as_str())
    }

    pub fn should_abandon(&self, current_input: &str) -> bool {
        self.active().is_some_and(|entry| {
            current_input.trim().chars().count() < entry.search_term_at_apply.trim().chars().count()
        })
    }

    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterStack, LabelMode, PopOutcome, shorten_label};

    #[test]
    fn shorten_keeps_first_and_last_by_default() {
        assert_eq!(
            shorten_label(
                "10 Downing Street, Westminster, London, SW1A 2AA",
                LabelMode::Both
            ),
            "10 Downing Street, SW1A 2AA"
        );
        assert_eq!(
            shorten_label("Leeds, West Yorkshire", LabelMode::Both),
            "Leeds, West Yorkshire"
        );
        assert_eq!(shorten_label("  Leeds ", LabelMode::Both), "Leeds");
    }

    #[test]
    fn shorten_left_and_right_modes() {
        let label = "10 Downing Street, Westminster, London, SW1A 2AA";
        assert_eq!(
            shorten_label(label, LabelMode::Left),
            "10 Downing Street, Westminster"
        );
        assert_eq!(shorten_label(label, LabelMode::Right), "London, SW1A 2AA");
    }

    #[test]
    fn short_labels_keep_first_part_outside_both_mode() {
        for mode in [LabelMode::Left, LabelMode::Right] {
            assert_eq!(shorten_label("Leeds, West Yorkshire", mode), "Leeds");
            assert_eq!(shorten_label("Leeds,West Yorkshire", mode), "Leeds");
            assert_eq!(shorten_label(" Leeds ", mode), "Leeds");
        }
    }

    #[test]
    fn label_mode_parses_case_insensitively() {
        assert_eq!(LabelMode::parse("LEFT"), Some(LabelMode::Left));
        assert_eq!(LabelMode::parse(" right "), Some(LabelMode::Right));
        assert_eq!(LabelMode::parse("middle"), None);
    }

    #[test]
    fn active_filter_tracks_last_push() {
        let mut stack = FilterStack::default();
        assert_eq!(stack.active_filter_value(), "");
        assert_eq!(stack.active_label(), None);

        stack.push("county", "West Yorkshire", "leeds ");
        stack.push("town", "Leeds, West Yorkshire", "leeds high ");
        assert_eq!(stack.active_filter_value(), "town");
        assert_eq!(stack.active_filter_value(), "town");
        assert_eq!(stack.active_label(), Some("Leeds, West Yorkshire"));
    }

    #[test]
    fn push_then_pop_returns_to_empty() {
        let mut stack = FilterStack::default();
        for level in 0..4 {
            stack.push(&format!("f{level}"), "label", "abc ");
        }

        assert_eq!(stack.pop_or_clear(), PopOutcome::Popped);
        assert_eq!(stack.active_filter_value(), "f2");
        assert_eq!(stack.pop_or_clear(), PopOutcome::Popped);
        assert_eq!(stack.pop_or_clear(), PopOutcome::Popped);
        assert_eq!(stack.pop_or_clear(), PopOutcome::Cleared);
        assert!(stack.is_empty());
        assert_eq!(stack.pop_or_clear(), PopOutcome::AlreadyEmpty);
    }

    #[test]
    fn abandon_boundary_is_strictly_shorter() {
        let mut stack = FilterStack::default();
        assert!(!stack.should_abandon(""));

        stack.push("town", "Leeds", "leeds ");
        assert!(!stack.should_abandon("leeds"));
        assert!(!stack.should_abandon("leeds  "));
        assert!(stack.should_abandon("leed"));
        assert!(stack.should_abandon("  leed "));
    }
}
