//! Sheet naming
//!
//! Worksheet names are at most 31 characters, must not contain `[]:*?/\`
//! and are unique ignoring case.

use std::collections::HashSet;

/// Longest legal worksheet name, in characters
pub const MAX_SHEET_NAME_LEN: usize = 31;

const ILLEGAL_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Replace illegal characters and truncate to the length limit
///
/// A leading or trailing apostrophe is illegal too and is replaced.
pub fn sanitize_sheet_name(name: &str) -> String {
    let mut chars: Vec<char> = name
        .trim()
        .chars()
        .map(|c| if ILLEGAL_CHARS.contains(&c) { '_' } else { c })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    for idx in [0, chars.len().saturating_sub(1)] {
        if chars.get(idx) == Some(&'\'') {
            chars[idx] = '_';
        }
    }
    chars.into_iter().collect()
}

/// Assigns sheet names in output order
///
/// The n-th name requested (1-based) falls back to `Sheet{n}` when it is
/// empty and gets a `~{n}` suffix when it collides with an earlier name.
#[derive(Debug, Clone, Default)]
pub struct SheetNamer {
    used: HashSet<String>,
    assigned: usize,
}

impl SheetNamer {
    /// Create a namer with no names taken
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for the next sheet
    pub fn assign(&mut self, name: &str) -> String {
        self.assigned += 1;
        let position = self.assigned;

        let mut candidate = sanitize_sheet_name(name);
        if candidate.is_empty() {
            candidate = format!("Sheet{position}");
        }

        let mut attempt = position;
        while self.used.contains(&candidate.to_lowercase()) {
            let suffix = format!("~{attempt}");
            let base: String = sanitize_sheet_name(name)
                .chars()
                .take(MAX_SHEET_NAME_LEN - suffix.chars().count())
                .collect();
            candidate = format!("{base}{suffix}");
            attempt += 1;
        }

        self.used.insert(candidate.to_lowercase());
        candidate
    }

    /// Number of names handed out
    pub fn len(&self) -> usize {
        self.assigned
    }

    /// Whether no name has been handed out
    pub fn is_empty(&self) -> bool {
        self.assigned == 0
    }
}
