//! Match history and read-only snapshots.
//!
//! The history is append-only: one entry per accepted ply, carrying the move
//! text exactly as the player sent it plus board and hand snapshots taken
//! after the move. Games without pieces in hand leave the hands out. Snapshots are what an external viewer polls; both types
//! serialize to JSON.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::board::Color;

/// Pieces each color still holds off the board.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Hands {
    pub blue: u8,
    pub orange: u8,
}

impl Hands {
    /// Both colors holding `n` pieces.
    pub fn full(n: u8) -> Self {
        Self { blue: n, orange: n }
    }

    pub fn get(&self, color: Color) -> u8 {
        match color {
            Color::Blue => self.blue,
            Color::Orange => self.orange,
        }
    }

    pub fn get_mut(&mut self, color: Color) -> &mut u8 {
        match color {
            Color::Blue => &mut self.blue,
            Color::Orange => &mut self.orange,
        }
    }
}

/// One accepted ply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// 1-based ply number
    pub ply: usize,
    pub mover: Color,
    /// Move text as received
    pub text: String,
    pub board: BTreeMap<String, Option<Color>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hands: Option<Hands>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MatchHistory {
    entries: Vec<HistoryEntry>,
}

impl MatchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next ply. Ply numbers are assigned here.
    pub fn record(
        &mut self,
        mover: Color,
        text: &str,
        board: BTreeMap<String, Option<Color>>,
        hands: Option<Hands>,
    ) -> &HistoryEntry {
        let ply = self.entries.len() + 1;
        self.entries.push(HistoryEntry {
            ply,
            mover,
            text: text.to_string(),
            board,
            hands,
        });
        &self.entries[ply - 1]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Move texts in ply order.
    pub fn moves(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.text.as_str())
    }

    /// Write the history as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), crate::error::RefereeError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// Everything an external viewer needs to render the match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MatchSnapshot {
    pub board: BTreeMap<String, Option<Color>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hands: Option<Hands>,
    pub turn: Option<Color>,
    pub game_over: bool,
    pub history: MatchHistory,
    /// Terminal line, once the match has ended
    pub message: Option<String>,
}

impl MatchSnapshot {
    /// Write the snapshot as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), crate::error::RefereeError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
