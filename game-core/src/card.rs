use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Spade,
    Heart,
    Diamond,
    Club,
}

pub const SUITS: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club];

impl Suit {
    pub fn index(&self) -> usize {
        match self {
            Suit::Spade => 0,
            Suit::Heart => 1,
            Suit::Diamond => 2,
            Suit::Club => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        SUITS.get(index).copied()
    }

    fn from_char(ch: char) -> Option<Self> {
        match ch {
            'S' => Some(Suit::Spade),
            'H' => Some(Suit::Heart),
            'D' => Some(Suit::Diamond),
            'C' => Some(Suit::Club),
            _ => None,
        }
    }

    fn to_char(&self) -> char {
        match self {
            Suit::Spade => 'S',
            Suit::Heart => 'H',
            Suit::Diamond => 'D',
            Suit::Club => 'C',
        }
    }
}

/// Set of suits as a 4-bit mask, used for suit-lock state and the per-suit
/// lock columns of the wire matrix.
#[derive(Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuitSet(u8);

impl SuitSet {
    pub const EMPTY: SuitSet = SuitSet(0);

    pub fn single(suit: Suit) -> Self {
        SuitSet(1 << suit.index())
    }

    pub fn insert(&mut self, suit: Suit) {
        self.0 |= 1 << suit.index();
    }

    pub fn contains(&self, suit: Suit) -> bool {
        self.0 & (1 << suit.index()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_subset_of(&self, other: SuitSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn intersection(&self, other: SuitSet) -> SuitSet {
        SuitSet(self.0 & other.0)
    }

    pub fn suits(&self) -> Vec<Suit> {
        SUITS.iter().copied().filter(|s| self.contains(*s)).collect()
    }
}

impl FromIterator<Suit> for SuitSet {
    fn from_iter<I: IntoIterator<Item = Suit>>(iter: I) -> Self {
        let mut set = SuitSet::EMPTY;
        for suit in iter {
            set.insert(suit);
        }
        set
    }
}

impl fmt::Debug for SuitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.suits()).finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
    Two,
}

pub const RANKS: [Rank; 13] = [
    Rank::Three,
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Seven,
    Rank::Eight,
    Rank::Nine,
    Rank::Ten,
    Rank::Jack,
    Rank::Queen,
    Rank::King,
    Rank::Ace,
    Rank::Two,
];

impl Rank {
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        RANKS.get(index).copied()
    }

    /// Strength under the effective direction. Normal: 3 weakest, 2 strongest.
    pub fn strength(&self, inverted: bool) -> u8 {
        if inverted {
            12 - self.index() as u8
        } else {
            self.index() as u8
        }
    }

    pub fn succ(&self) -> Option<Rank> {
        Rank::from_index(self.index() + 1)
    }

    pub fn pred(&self) -> Option<Rank> {
        self.index().checked_sub(1).and_then(Rank::from_index)
    }

    fn from_literal(value: &str) -> Option<Self> {
        match value {
            "3" => Some(Rank::Three),
            "4" => Some(Rank::Four),
            "5" => Some(Rank::Five),
            "6" => Some(Rank::Six),
            "7" => Some(Rank::Seven),
            "8" => Some(Rank::Eight),
            "9" => Some(Rank::Nine),
            "10" => Some(Rank::Ten),
            "J" => Some(Rank::Jack),
            "Q" => Some(Rank::Queen),
            "K" => Some(Rank::King),
            "A" => Some(Rank::Ace),
            "2" => Some(Rank::Two),
            _ => None,
        }
    }

    fn to_literal(&self) -> &'static str {
        match self {
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
            Rank::Two => "2",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Card {
    Suited { suit: Suit, rank: Rank },
    Joker,
}

impl Card {
    pub fn suited(suit: Suit, rank: Rank) -> Self {
        Card::Suited { suit, rank }
    }

    pub fn is_joker(&self) -> bool {
        matches!(self, Card::Joker)
    }

    pub fn suit(&self) -> Option<Suit> {
        match self {
            Card::Suited { suit, .. } => Some(*suit),
            Card::Joker => None,
        }
    }

    pub fn rank(&self) -> Option<Rank> {
        match self {
            Card::Suited { rank, .. } => Some(*rank),
            Card::Joker => None,
        }
    }

    /// Joker outranks everything in both directions.
    pub fn strength(&self, inverted: bool) -> u8 {
        match self {
            Card::Joker => 13,
            Card::Suited { rank, .. } => rank.strength(inverted),
        }
    }

    pub fn code(&self) -> String {
        match self {
            Card::Joker => "Jo".to_string(),
            Card::Suited { suit, rank } => format!("{}{}", suit.to_char(), rank.to_literal()),
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        if code == "Jo" {
            return Some(Card::Joker);
        }
        let mut chars = code.chars();
        let suit = Suit::from_char(chars.next()?)?;
        let rank = Rank::from_literal(chars.as_str())?;
        Some(Card::Suited { suit, rank })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

pub fn deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(53);
    for suit in SUITS {
        for rank in RANKS {
            cards.push(Card::Suited { suit, rank });
        }
    }
    cards.push(Card::Joker);
    cards
}

/// Display order for journal output: Spades ascending, then Hearts, Diamonds,
/// Clubs, Joker last.
pub fn sort_display(cards: &mut [Card]) {
    cards.sort_by_key(|card| match card {
        Card::Suited { suit, rank } => (suit.index(), rank.index()),
        Card::Joker => (4, 0),
    });
}

/// Strongest first under Normal direction; equal ranks break Spade, Heart,
/// Diamond, Club. Used for the forced exchange picks.
pub fn sort_strongest_first(cards: &mut [Card]) {
    cards.sort_by(|a, b| {
        b.strength(false)
            .cmp(&a.strength(false))
            .then_with(|| suit_order(a).cmp(&suit_order(b)))
    });
}

fn suit_order(card: &Card) -> usize {
    card.suit().map(|s| s.index()).unwrap_or(4)
}

pub fn format_cards(cards: &[Card]) -> String {
    let mut sorted = cards.to_vec();
    sort_display(&mut sorted);
    sorted
        .iter()
        .map(|c| c.code())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deck_has_53_cards() {
        let deck = deck();
        assert_eq!(deck.len(), 53);
        assert_eq!(deck.iter().filter(|c| c.is_joker()).count(), 1);
    }

    #[test]
    fn card_code_round_trip() {
        for card in deck() {
            let parsed = Card::parse(&card.code()).unwrap();
            assert_eq!(parsed, card);
        }
    }

    #[test]
    fn parse_symbolic_forms() {
        assert_eq!(
            Card::parse("S3"),
            Some(Card::suited(Suit::Spade, Rank::Three))
        );
        assert_eq!(
            Card::parse("H10"),
            Some(Card::suited(Suit::Heart, Rank::Ten))
        );
        assert_eq!(
            Card::parse("DJ"),
            Some(Card::suited(Suit::Diamond, Rank::Jack))
        );
        assert_eq!(Card::parse("Jo"), Some(Card::Joker));
        assert_eq!(Card::parse("X5"), None);
        assert_eq!(Card::parse("S15"), None);
        assert_eq!(Card::parse(""), None);
    }

    #[test]
    fn strength_normal_order() {
        let three = Card::parse("S3").unwrap();
        let two = Card::parse("H2").unwrap();
        assert!(two.strength(false) > three.strength(false));
        assert!(Card::Joker.strength(false) > two.strength(false));
    }

    #[test]
    fn strength_inverts_under_revolution() {
        let three = Card::parse("S3").unwrap();
        let two = Card::parse("H2").unwrap();
        assert!(three.strength(true) > two.strength(true));
        assert!(Card::Joker.strength(true) > three.strength(true));
    }

    #[test]
    fn suit_set_subset_and_intersection() {
        let mut spades = SuitSet::EMPTY;
        spades.insert(Suit::Spade);
        let mut both = spades;
        both.insert(Suit::Heart);
        assert!(spades.is_subset_of(both));
        assert!(!both.is_subset_of(spades));
        assert_eq!(both.intersection(spades), spades);
    }

    #[test]
    fn format_cards_sorts_for_display() {
        let cards = vec![
            Card::Joker,
            Card::parse("C3").unwrap(),
            Card::parse("S8").unwrap(),
            Card::parse("S4").unwrap(),
        ];
        assert_eq!(format_cards(&cards), "S4,S8,C3,Jo");
    }
}
