use crate::card::{Card, Rank, SuitSet};
use crate::config::Rules;
use crate::play::{can_beat, Play, PlayKind};

/// The trick state the next play must beat. Revolution lives here but
/// survives field clears; everything else is per-trick.
#[derive(Clone, Debug, Default)]
pub struct Field {
    pub cards: Vec<Card>,
    pub play: Option<Play>,
    pub suit_lock: Option<SuitSet>,
    pub revolution: bool,
    pub eleven_back: bool,
    pub last_player: Option<usize>,
    pub pass_mask: u8,
}

impl Field {
    pub fn is_empty(&self) -> bool {
        self.play.is_none()
    }

    pub fn inverted(&self) -> bool {
        self.revolution != self.eleven_back
    }

    pub fn note_pass(&mut self, seat: usize) {
        self.pass_mask |= 1 << seat;
    }

    /// Clears the trick. Returns the cards that were on the field so the
    /// caller can keep them accounted for.
    pub fn clear(&mut self) -> Vec<Card> {
        let cards = std::mem::take(&mut self.cards);
        self.play = None;
        self.suit_lock = None;
        self.eleven_back = false;
        self.last_player = None;
        self.pass_mask = 0;
        cards
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleError {
    NotOwned,
    MalformedPlay,
    ShapeMismatch,
    SuitLockViolation,
    NotStrongEnough,
    JokerUnbeatable,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Effects {
    pub revolution: bool,
    pub eight_cut: bool,
    pub eleven_back: bool,
    pub lock_armed: bool,
    pub spade3_return: bool,
    pub cleared: bool,
}

/// Legality predicates in order: ownership, shape, suit-lock, strength.
/// The lone Spade 3 answers a lone Joker regardless of strength; nothing
/// else does.
pub fn validate(
    field: &Field,
    play: &Play,
    cards: &[Card],
    hand: &[Card],
    rules: &Rules,
) -> Result<(), RuleError> {
    for card in cards {
        if !hand.contains(card) {
            return Err(RuleError::NotOwned);
        }
    }

    let Some(prev) = &field.play else {
        return Ok(());
    };

    let spade3_return =
        rules.spade3_return && prev.kind == PlayKind::JokerSingle && play.is_spade3_single();
    if prev.kind == PlayKind::JokerSingle && !spade3_return {
        return Err(RuleError::JokerUnbeatable);
    }

    let joker_on_single = play.kind == PlayKind::JokerSingle && prev.kind == PlayKind::Single;
    if !spade3_return
        && !joker_on_single
        && (play.kind != prev.kind || play.size != prev.size)
    {
        return Err(RuleError::ShapeMismatch);
    }

    if let Some(lock) = field.suit_lock {
        if !play.suits.is_subset_of(lock) {
            return Err(RuleError::SuitLockViolation);
        }
    }

    if !spade3_return && !can_beat(prev, play, field.inverted()) {
        return Err(RuleError::NotStrongEnough);
    }

    Ok(())
}

/// Puts a validated play on the field and computes its effects. Returns the
/// cards displaced to the discard pile (the previous field cards, plus the
/// new ones whenever the play itself clears the field).
pub fn apply(
    field: &mut Field,
    play: Play,
    cards: Vec<Card>,
    seat: usize,
    rules: &Rules,
) -> (Effects, Vec<Card>) {
    let mut fx = Effects::default();

    fx.spade3_return = rules.spade3_return
        && matches!(&field.play, Some(p) if p.kind == PlayKind::JokerSingle)
        && play.is_spade3_single();

    if rules.suit_lock && field.suit_lock.is_none() {
        if let Some(prev) = &field.play {
            if !prev.suits.is_empty()
                && !play.suits.is_empty()
                && play.suits.is_subset_of(prev.suits)
            {
                field.suit_lock = Some(play.suits.intersection(prev.suits));
                fx.lock_armed = true;
            }
        }
    }

    let mut discards = std::mem::take(&mut field.cards);
    field.cards = cards;
    field.play = Some(play.clone());
    field.last_player = Some(seat);
    field.pass_mask = 0;

    let is_revolution_play = (play.kind == PlayKind::Group && play.size == 4)
        || (play.kind == PlayKind::Sequence && play.size >= 5);
    if rules.revolution && is_revolution_play {
        field.revolution = !field.revolution;
        fx.revolution = true;
    }

    if rules.eleven_back && play.covers_rank(Rank::Jack) {
        field.eleven_back = true;
        fx.eleven_back = true;
    }

    if rules.eight_cut && play.covers_rank(Rank::Eight) {
        fx.eight_cut = true;
    }

    if fx.eight_cut || fx.spade3_return {
        discards.extend(field.clear());
        fx.cleared = true;
    }

    (fx, discards)
}
