//! The 8x15 integer table exchanged with clients, 480 bytes big-endian on
//! the wire. Row 0 carries turn metadata, rows 1-4 the four suits (columns
//! 0-12 are ranks 3 through 2, Joker sits at row 1 column 14), row 5 the
//! per-seat finished flags and card counts, row 6 classes, row 7 points.

use crate::card::{Card, SuitSet, SUITS};

pub const PROTOCOL_VERSION: i32 = 20070;
pub const ROWS: usize = 8;
pub const COLS: usize = 15;
pub const FRAME_BYTES: usize = ROWS * COLS * 4;

pub const MARK_PRESENT: i32 = 1;
pub const MARK_PLAYED: i32 = 2;

const JOKER_CELL: (usize, usize) = (1, 14);
const NAME_ROW: usize = 1;
const NAME_LEN: usize = 14;

/// Row 0 column assignments.
pub mod meta {
    /// Protocol version in the handshake, turn number during play.
    pub const VERSION: usize = 0;
    pub const ACTIVE_SEAT: usize = 1;
    pub const YOUR_TURN: usize = 2;
    pub const START_OF_TRICK: usize = 3;
    pub const REVOLUTION: usize = 4;
    pub const ELEVEN_BACK: usize = 5;
    pub const EIGHT_CUT: usize = 6;
    pub const LOCK_ACTIVE: usize = 7;
    /// Columns 8-11: one flag per suit, Spade first.
    pub const LOCK_SUITS: usize = 8;
    pub const GAME_NUMBER: usize = 12;
    pub const TOTAL_GAMES: usize = 13;
    pub const SESSION_END: usize = 14;
}

const SEAT_ROW_STATUS: usize = 5;
const SEAT_ROW_CLASS: usize = 6;
const SEAT_ROW_POINTS: usize = 7;
const SEAT_COUNT_COL: usize = 5;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    cells: [[i32; COLS]; ROWS],
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.cells[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: i32) {
        self.cells[row][col] = value;
    }

    pub fn card_cell(card: &Card) -> (usize, usize) {
        match card {
            Card::Joker => JOKER_CELL,
            Card::Suited { suit, rank } => (suit.index() + 1, rank.index()),
        }
    }

    pub fn mark_cards(&mut self, cards: &[Card], mark: i32) {
        for card in cards {
            let (row, col) = Table::card_cell(card);
            self.cells[row][col] = mark;
        }
    }

    pub fn cards_with_mark(&self, mark: i32) -> Vec<Card> {
        let mut cards = Vec::new();
        for suit in SUITS {
            for rank in crate::card::RANKS {
                if self.cells[suit.index() + 1][rank.index()] == mark {
                    cards.push(Card::suited(suit, rank));
                }
            }
        }
        if self.cells[JOKER_CELL.0][JOKER_CELL.1] == mark {
            cards.push(Card::Joker);
        }
        cards
    }

    pub fn set_turn(&mut self, turn: u32) {
        self.cells[0][meta::VERSION] = turn as i32;
    }

    pub fn set_active_seat(&mut self, seat: usize) {
        self.cells[0][meta::ACTIVE_SEAT] = seat as i32;
    }

    pub fn set_your_turn(&mut self, yours: bool) {
        self.cells[0][meta::YOUR_TURN] = yours as i32;
    }

    pub fn set_start_of_trick(&mut self, start: bool) {
        self.cells[0][meta::START_OF_TRICK] = start as i32;
    }

    pub fn set_revolution(&mut self, active: bool) {
        self.cells[0][meta::REVOLUTION] = active as i32;
    }

    pub fn set_eleven_back(&mut self, active: bool) {
        self.cells[0][meta::ELEVEN_BACK] = active as i32;
    }

    pub fn set_eight_cut_notice(&mut self, active: bool) {
        self.cells[0][meta::EIGHT_CUT] = active as i32;
    }

    pub fn set_suit_lock(&mut self, lock: Option<SuitSet>) {
        self.cells[0][meta::LOCK_ACTIVE] = lock.is_some() as i32;
        let set = lock.unwrap_or(SuitSet::EMPTY);
        for suit in SUITS {
            self.cells[0][meta::LOCK_SUITS + suit.index()] = set.contains(suit) as i32;
        }
    }

    pub fn set_game_counters(&mut self, game_number: u32, total_games: u32) {
        self.cells[0][meta::GAME_NUMBER] = game_number as i32;
        self.cells[0][meta::TOTAL_GAMES] = total_games as i32;
    }

    pub fn set_session_end(&mut self, end: bool) {
        self.cells[0][meta::SESSION_END] = end as i32;
    }

    pub fn set_seat_status(&mut self, seat: usize, finished: bool, card_count: usize) {
        self.cells[SEAT_ROW_STATUS][seat] = finished as i32;
        self.cells[SEAT_ROW_STATUS][SEAT_COUNT_COL + seat] = card_count as i32;
    }

    pub fn set_seat_class(&mut self, seat: usize, class: usize) {
        self.cells[SEAT_ROW_CLASS][seat] = class as i32;
    }

    pub fn set_seat_points(&mut self, seat: usize, points: u32) {
        self.cells[SEAT_ROW_POINTS][seat] = points as i32;
    }

    /// Server half of the handshake: protocol version plus assigned seat.
    pub fn greeting(seat: usize) -> Table {
        let mut table = Table::new();
        table.cells[0][meta::VERSION] = PROTOCOL_VERSION;
        table.cells[0][meta::ACTIVE_SEAT] = seat as i32;
        table
    }

    /// Client half of the handshake: version echo plus an ASCII name in
    /// row 1, one byte per column, NUL-terminated.
    pub fn profile(version: i32, name: &str) -> Table {
        let mut table = Table::new();
        table.cells[0][meta::VERSION] = version;
        for (i, byte) in name.bytes().take(NAME_LEN).enumerate() {
            table.cells[NAME_ROW][i] = byte as i32;
        }
        table
    }

    pub fn profile_version(&self) -> i32 {
        self.cells[0][meta::VERSION]
    }

    pub fn profile_name(&self) -> Option<String> {
        let mut name = String::new();
        for col in 0..NAME_LEN {
            let value = self.cells[NAME_ROW][col];
            if value == 0 {
                break;
            }
            let byte = u8::try_from(value).ok()?;
            if !byte.is_ascii_graphic() {
                return None;
            }
            name.push(byte as char);
        }
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    pub fn to_bytes(&self) -> [u8; FRAME_BYTES] {
        let mut bytes = [0u8; FRAME_BYTES];
        for row in 0..ROWS {
            for col in 0..COLS {
                let offset = (row * COLS + col) * 4;
                bytes[offset..offset + 4].copy_from_slice(&self.cells[row][col].to_be_bytes());
            }
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8; FRAME_BYTES]) -> Table {
        let mut table = Table::new();
        for row in 0..ROWS {
            for col in 0..COLS {
                let offset = (row * COLS + col) * 4;
                let mut word = [0u8; 4];
                word.copy_from_slice(&bytes[offset..offset + 4]);
                table.cells[row][col] = i32::from_be_bytes(word);
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Suit;

    fn cards(codes: &[&str]) -> Vec<Card> {
        codes.iter().map(|c| Card::parse(c).unwrap()).collect()
    }

    #[test]
    fn frame_is_480_bytes() {
        assert_eq!(FRAME_BYTES, 480);
        assert_eq!(Table::new().to_bytes().len(), 480);
    }

    #[test]
    fn bytes_round_trip() {
        let mut table = Table::new();
        table.set_turn(42);
        table.set_active_seat(3);
        table.mark_cards(&cards(&["S3", "H10", "Jo"]), MARK_PRESENT);
        let decoded = Table::from_bytes(&table.to_bytes());
        assert_eq!(decoded, table);
    }

    #[test]
    fn card_marks_round_trip() {
        let hand = cards(&["S3", "S4", "HQ", "D2", "C7", "Jo"]);
        let mut table = Table::new();
        table.mark_cards(&hand, MARK_PRESENT);
        let mut decoded = table.cards_with_mark(MARK_PRESENT);
        let mut expected = hand.clone();
        crate::card::sort_display(&mut decoded);
        crate::card::sort_display(&mut expected);
        assert_eq!(decoded, expected);
    }

    #[test]
    fn played_marks_are_separate_from_hand_marks() {
        let mut table = Table::new();
        table.mark_cards(&cards(&["S5", "S6", "S7"]), MARK_PRESENT);
        table.mark_cards(&cards(&["S6"]), MARK_PLAYED);
        assert_eq!(table.cards_with_mark(MARK_PLAYED), cards(&["S6"]));
        assert_eq!(table.cards_with_mark(MARK_PRESENT), cards(&["S5", "S7"]));
    }

    #[test]
    fn joker_occupies_reserved_cell() {
        assert_eq!(Table::card_cell(&Card::Joker), (1, 14));
        let mut table = Table::new();
        table.mark_cards(&[Card::Joker], MARK_PLAYED);
        assert_eq!(table.get(1, 14), MARK_PLAYED);
    }

    #[test]
    fn suit_lock_mask_sets_flag_and_columns() {
        let mut table = Table::new();
        table.set_suit_lock(Some(SuitSet::single(Suit::Spade)));
        assert_eq!(table.get(0, meta::LOCK_ACTIVE), 1);
        assert_eq!(table.get(0, meta::LOCK_SUITS), 1);
        assert_eq!(table.get(0, meta::LOCK_SUITS + 1), 0);

        table.set_suit_lock(None);
        assert_eq!(table.get(0, meta::LOCK_ACTIVE), 0);
        assert_eq!(table.get(0, meta::LOCK_SUITS), 0);
    }

    #[test]
    fn profile_round_trip() {
        let table = Table::profile(PROTOCOL_VERSION, "default");
        assert_eq!(table.profile_version(), PROTOCOL_VERSION);
        assert_eq!(table.profile_name().as_deref(), Some("default"));
    }

    #[test]
    fn profile_name_is_cropped_to_14_bytes() {
        let table = Table::profile(PROTOCOL_VERSION, "a-very-long-client-name");
        assert_eq!(table.profile_name().as_deref(), Some("a-very-long-cl"));
    }

    #[test]
    fn profile_name_rejects_non_ascii() {
        let mut table = Table::new();
        table.set(1, 0, 300);
        assert_eq!(table.profile_name(), None);
    }
}
