//! Typed payloads carried from one screen to the next.
//!
//! Each forward transition moves exactly one of these by value:
//! Record → Genre ([`RecordedWhistle`]), Genre → Comments ([`GenreChosen`]),
//! Comments → submission ([`Submission`]).

use super::genre::Genre;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A finished take on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedWhistle {
    path: PathBuf,
    recorded_at: DateTime<Local>,
}

impl RecordedWhistle {
    pub fn new(path: PathBuf, recorded_at: DateTime<Local>) -> Self {
        Self { path, recorded_at }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn recorded_at(&self) -> DateTime<Local> {
        self.recorded_at
    }

    /// Attaches the chosen genre.
    pub fn with_genre(self, genre: Genre) -> GenreChosen {
        GenreChosen {
            whistle: self,
            genre,
        }
    }
}

/// A take together with its genre.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreChosen {
    whistle: RecordedWhistle,
    genre: Genre,
}

impl GenreChosen {
    pub fn genre(&self) -> Genre {
        self.genre
    }

    pub fn whistle(&self) -> &RecordedWhistle {
        &self.whistle
    }

    /// Attaches the comment text and completes the flow.
    pub fn with_comments(self, comments: String) -> Submission {
        Submission {
            genre: self.genre,
            comments,
            whistle: self.whistle,
        }
    }
}

/// Everything the flow collected, handed to whoever consumes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub genre: Genre,
    pub comments: String,
    pub whistle: RecordedWhistle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_is_forwarded_unchanged() {
        let whistle = RecordedWhistle::new(PathBuf::from("/tmp/whistle.m4a"), Local::now());
        let chosen = whistle.clone().with_genre(Genre::Jazz);
        assert_eq!(chosen.genre().label(), "Jazz");

        let submission = chosen.with_comments(String::new());
        assert_eq!(submission.genre, Genre::Jazz);
        assert_eq!(submission.whistle, whistle);
        assert_eq!(submission.comments, "");
    }

    #[test]
    fn test_submission_serializes_genre_label() {
        let whistle = RecordedWhistle::new(PathBuf::from("/tmp/whistle.m4a"), Local::now());
        let submission = whistle.with_genre(Genre::RnB).with_comments("hummed".into());
        let rendered = toml::to_string(&submission).unwrap();
        assert!(rendered.contains("genre = \"RnB\""));
        assert!(rendered.contains("comments = \"hummed\""));
        assert!(rendered.contains("path = \"/tmp/whistle.m4a\""));
    }
}
