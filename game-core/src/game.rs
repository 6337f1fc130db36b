use crate::card::{self, Card, Rank, Suit};
use crate::config::Rules;
use crate::play::{classify, Play};
use crate::rules::{apply, validate, Effects, Field, RuleError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

pub const SEATS: usize = 5;
pub const THOUSAND_DAY_THRESHOLD: u32 = 20;

/// Points for finishing places 1st through 5th.
pub const PLACE_POINTS: [u32; SEATS] = [5, 4, 3, 2, 1];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClassRank {
    Daifugo,
    Fugo,
    Heimin,
    Hinmin,
    Daihinmin,
}

impl ClassRank {
    pub fn from_place(place: usize) -> ClassRank {
        match place {
            0 => ClassRank::Daifugo,
            1 => ClassRank::Fugo,
            2 => ClassRank::Heimin,
            3 => ClassRank::Hinmin,
            _ => ClassRank::Daihinmin,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ClassRank::Daifugo => 0,
            ClassRank::Fugo => 1,
            ClassRank::Heimin => 2,
            ClassRank::Hinmin => 3,
            ClassRank::Daihinmin => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassRank::Daifugo => "daifugo",
            ClassRank::Fugo => "fugo",
            ClassRank::Heimin => "heimin",
            ClassRank::Hinmin => "hinmin",
            ClassRank::Daihinmin => "daihinmin",
        }
    }
}

/// Per-session standing: classes carried between games and cumulative points.
#[derive(Clone, Debug)]
pub struct SessionState {
    pub classes: [ClassRank; SEATS],
    pub points: [u32; SEATS],
    pub games_played: u32,
    pub total_games: u32,
}

impl SessionState {
    pub fn new(total_games: u32) -> Self {
        SessionState {
            classes: [ClassRank::Heimin; SEATS],
            points: [0; SEATS],
            games_played: 0,
            total_games,
        }
    }

    pub fn seat_with_class(&self, class: ClassRank) -> Option<usize> {
        self.classes.iter().position(|c| *c == class)
    }

    pub fn apply_result(&mut self, finish_order: &[usize]) {
        for (place, seat) in finish_order.iter().enumerate() {
            self.points[*seat] += PLACE_POINTS[place];
            self.classes[*seat] = ClassRank::from_place(place);
        }
        self.games_played += 1;
    }

    /// Seats best first, points descending with seat index as tie-break.
    pub fn ranking(&self) -> Vec<usize> {
        let mut seats: Vec<usize> = (0..SEATS).collect();
        seats.sort_by_key(|s| (std::cmp::Reverse(self.points[*s]), *s));
        seats
    }
}

#[derive(Clone, Debug)]
pub struct TurnRecord {
    pub play: Play,
    pub effects: Effects,
    pub finished: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct PassRecord {
    pub thousand_day: bool,
}

#[derive(Clone, Debug)]
pub struct MatchState {
    pub game_number: u32,
    pub hands: [Vec<Card>; SEATS],
    pub field: Field,
    pub active_seat: usize,
    pub turn_counter: u32,
    pub finish_order: Vec<usize>,
    pub consecutive_passes: u32,
    pub discards: Vec<Card>,
}

impl MatchState {
    /// Shuffles and deals a fresh 53-card deck round-robin from seat 0, so
    /// seats 0-2 hold 11 cards and seats 3-4 hold 10. Game 1 leads with the
    /// holder of Spade 3; later games lead with the previous daihinmin.
    pub fn deal(rng: &mut StdRng, game_number: u32, session: &SessionState) -> Self {
        let mut deck = card::deck();
        deck.shuffle(rng);

        let mut hands: [Vec<Card>; SEATS] = Default::default();
        for (i, card) in deck.into_iter().enumerate() {
            hands[i % SEATS].push(card);
        }
        for hand in hands.iter_mut() {
            card::sort_display(hand);
        }

        let spade3 = Card::suited(Suit::Spade, Rank::Three);
        let spade3_holder = hands
            .iter()
            .position(|h| h.contains(&spade3))
            .unwrap_or(0);
        let active_seat = if game_number <= 1 {
            spade3_holder
        } else {
            session
                .seat_with_class(ClassRank::Daihinmin)
                .unwrap_or(spade3_holder)
        };

        MatchState {
            game_number,
            hands,
            field: Field::default(),
            active_seat,
            turn_counter: 0,
            finish_order: Vec::new(),
            consecutive_passes: 0,
            discards: Vec::new(),
        }
    }

    pub fn begin_turn(&mut self) -> u32 {
        self.turn_counter += 1;
        self.turn_counter
    }

    pub fn is_game_over(&self) -> bool {
        self.finish_order.len() >= SEATS - 1
    }

    /// Appends the one seat still holding cards and returns the full order.
    pub fn finalize(&mut self) -> Vec<usize> {
        for seat in 0..SEATS {
            if !self.finish_order.contains(&seat) {
                self.finish_order.push(seat);
                break;
            }
        }
        self.finish_order.clone()
    }

    pub fn play_turn(
        &mut self,
        seat: usize,
        cards: Vec<Card>,
        rules: &Rules,
    ) -> Result<TurnRecord, RuleError> {
        let play = classify(&cards).ok_or(RuleError::MalformedPlay)?;
        if play.is_pass() {
            return Err(RuleError::MalformedPlay);
        }
        validate(&self.field, &play, &cards, &self.hands[seat], rules)?;

        for card in &cards {
            if let Some(pos) = self.hands[seat].iter().position(|c| c == card) {
                self.hands[seat].remove(pos);
            }
        }

        let (effects, discards) = apply(&mut self.field, play.clone(), cards, seat, rules);
        self.discards.extend(discards);
        self.consecutive_passes = 0;

        let finished = self.hands[seat].is_empty();
        if finished {
            self.finish_order.push(seat);
        }
        debug_assert_eq!(self.card_census(), 53);

        Ok(TurnRecord {
            play,
            effects,
            finished,
        })
    }

    pub fn pass_turn(&mut self, seat: usize, rules: &Rules) -> PassRecord {
        self.field.note_pass(seat);
        self.consecutive_passes += 1;

        if rules.thousand_day && self.consecutive_passes >= THOUSAND_DAY_THRESHOLD {
            let discards = self.field.clear();
            self.discards.extend(discards);
            self.consecutive_passes = 0;
            self.active_seat = self.next_active_from(seat);
            return PassRecord { thousand_day: true };
        }
        PassRecord {
            thousand_day: false,
        }
    }

    /// Moves to the next seat after a play. A play that cleared the field
    /// leaves the lead with its player; otherwise the turn walks clockwise.
    pub fn advance_after_play(&mut self, seat: usize, effects: &Effects) -> bool {
        if effects.cleared {
            self.active_seat = if self.hands[seat].is_empty() {
                self.next_active_from(seat)
            } else {
                seat
            };
            return false;
        }
        self.advance()
    }

    /// Moves the turn along after a pass. Once `pass_mask` shows every other
    /// seat still holding cards has passed since the last play, the field
    /// clears and its owner leads again (or the next live seat when the
    /// owner already finished). Returns whether the field cleared.
    pub fn advance(&mut self) -> bool {
        if let Some(last) = self.field.last_player {
            if self.everyone_else_passed(last) {
                let discards = self.field.clear();
                self.discards.extend(discards);
                self.consecutive_passes = 0;
                self.active_seat = if self.hands[last].is_empty() {
                    self.next_active_from(last)
                } else {
                    last
                };
                return true;
            }
        }
        self.active_seat = self.next_active_from(self.active_seat);
        false
    }

    fn everyone_else_passed(&self, last: usize) -> bool {
        (0..SEATS)
            .filter(|s| *s != last && !self.hands[*s].is_empty())
            .all(|s| self.field.pass_mask & (1 << s) != 0)
    }

    pub fn next_active_from(&self, seat: usize) -> usize {
        let mut next = seat;
        for _ in 0..SEATS {
            next = (next + 1) % SEATS;
            if !self.hands[next].is_empty() {
                return next;
            }
        }
        seat
    }

    /// Engine pick for the forced half of the exchange: the weakest cards by
    /// Normal-direction strength. The Joker and 2s stay home while enough
    /// other cards remain.
    pub fn auto_give(&self, seat: usize, count: usize) -> Vec<Card> {
        let mut ordered = self.hands[seat].clone();
        card::sort_strongest_first(&mut ordered);
        let weakest_first: Vec<Card> = ordered.into_iter().rev().collect();

        let mut picked: Vec<Card> = weakest_first
            .iter()
            .copied()
            .filter(|c| !c.is_joker() && c.rank() != Some(Rank::Two))
            .take(count)
            .collect();
        if picked.len() < count {
            for card in &weakest_first {
                if picked.len() == count {
                    break;
                }
                if !picked.contains(card) {
                    picked.push(*card);
                }
            }
        }
        picked
    }

    /// All-or-nothing transfer between hands; false when `from` lacks a card.
    pub fn transfer(&mut self, from: usize, to: usize, cards: &[Card]) -> bool {
        for card in cards {
            if !self.hands[from].contains(card) {
                return false;
            }
        }
        for card in cards {
            if let Some(pos) = self.hands[from].iter().position(|c| c == card) {
                self.hands[from].remove(pos);
            }
            self.hands[to].push(*card);
        }
        card::sort_display(&mut self.hands[from]);
        card::sort_display(&mut self.hands[to]);
        debug_assert_eq!(self.card_census(), 53);
        true
    }

    pub fn card_census(&self) -> usize {
        self.hands.iter().map(|h| h.len()).sum::<usize>()
            + self.field.cards.len()
            + self.discards.len()
    }
}
