//! The fixed genre list and the picker that walks it.

use serde::{Serialize, Serializer};
use std::fmt;

/// A genre label from the fixed list.
///
/// `Copy` on purpose: a selection handed to the next screen is a value, never
/// a reference the next screen could change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Genre {
    Unknown,
    Blues,
    Classical,
    Electronic,
    Jazz,
    Metal,
    Pop,
    Reggae,
    RnB,
    Rock,
    Soul,
}

impl Genre {
    /// All genres in display order.
    pub const ALL: [Genre; 11] = [
        Genre::Unknown,
        Genre::Blues,
        Genre::Classical,
        Genre::Electronic,
        Genre::Jazz,
        Genre::Metal,
        Genre::Pop,
        Genre::Reggae,
        Genre::RnB,
        Genre::Rock,
        Genre::Soul,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Genre::Unknown => "Unknown",
            Genre::Blues => "Blues",
            Genre::Classical => "Classical",
            Genre::Electronic => "Electronic",
            Genre::Jazz => "Jazz",
            Genre::Metal => "Metal",
            Genre::Pop => "Pop",
            Genre::Reggae => "Reggae",
            Genre::RnB => "RnB",
            Genre::Rock => "Rock",
            Genre::Soul => "Soul",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Genre {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Cursor over [`Genre::ALL`]; one row per genre, single selection.
#[derive(Debug, Default)]
pub struct GenrePicker {
    cursor: usize,
}

impl GenrePicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows in display order.
    pub fn rows(&self) -> &'static [Genre] {
        &Genre::ALL
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn previous(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn next(&mut self) {
        self.cursor = (self.cursor + 1).min(Genre::ALL.len() - 1);
    }

    /// Genre at `row`, or `None` past the end of the list.
    pub fn choose(&mut self, row: usize) -> Option<Genre> {
        let genre = *Genre::ALL.get(row)?;
        self.cursor = row;
        Some(genre)
    }
}
