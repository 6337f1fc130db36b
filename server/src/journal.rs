//! JSONL journal of observable game events, one JSON object per line.
//! Written serially by the session coordinator, flushed after every event so
//! the file is replayable even after an aborted session.

use chrono::Utc;
use game_core::card::{format_cards, Card};
use game_core::game::SEATS;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct PlayerEntry {
    pub id: usize,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ExchangeEntry {
    pub from: usize,
    pub to: usize,
    pub cards: String,
}

#[derive(Debug, Serialize)]
pub struct StateFlags {
    pub revolution: bool,
    pub eleven_back: bool,
    pub locked: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStart {
        timestamp: String,
        players: Vec<PlayerEntry>,
    },
    GameStart {
        game: u32,
        hands: BTreeMap<String, String>,
        ranks: BTreeMap<String, String>,
        first_player: usize,
    },
    Exchange {
        game: u32,
        exchanges: Vec<ExchangeEntry>,
        hands_after: BTreeMap<String, String>,
    },
    Turn {
        game: u32,
        turn: u32,
        player: usize,
        action: &'static str,
        cards: String,
        card_type: &'static str,
        field: String,
        hands: BTreeMap<String, String>,
        state: StateFlags,
    },
    Special {
        game: u32,
        turn: u32,
        event: &'static str,
        player: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<Value>,
    },
    GameEnd {
        game: u32,
        finish_order: Vec<usize>,
        new_ranks: BTreeMap<String, String>,
    },
    SessionEnd {
        total_games: u32,
        final_points: BTreeMap<String, u32>,
        ranking: Vec<usize>,
    },
}

pub fn hands_map(hands: &[Vec<Card>; SEATS]) -> BTreeMap<String, String> {
    hands
        .iter()
        .enumerate()
        .map(|(seat, hand)| (seat.to_string(), format_cards(hand)))
        .collect()
}

pub struct Journal {
    sink: Option<BufWriter<File>>,
}

impl Journal {
    pub fn disabled() -> Self {
        Journal { sink: None }
    }

    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Journal {
            sink: Some(BufWriter::new(file)),
        })
    }

    pub fn write(&mut self, event: &Event) -> io::Result<()> {
        let Some(sink) = &mut self.sink else {
            return Ok(());
        };
        serde_json::to_writer(&mut *sink, event)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        sink.write_all(b"\n")?;
        sink.flush()
    }
}

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// A directory argument gets an auto-generated file name from the UTC
/// timestamp and the sorted player names; a file path is used as given.
pub fn journal_path(arg: &Path, names: &[String]) -> PathBuf {
    if !arg.is_dir() {
        return arg.to_path_buf();
    }
    let timestamp = Utc::now().format("%Y%m%dT%H%M%S");
    let mut sorted = names.to_vec();
    sorted.sort();
    arg.join(format!("{}_{}.jsonl", timestamp, sorted.join("_")))
}
