use crate::card::{Card, Rank, SuitSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayKind {
    Pass,
    Single,
    JokerSingle,
    Group,
    Sequence,
}

impl PlayKind {
    /// Name used by the journal's `card_type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayKind::Pass => "empty",
            PlayKind::Single => "single",
            PlayKind::JokerSingle => "joker_single",
            PlayKind::Group => "pair",
            PlayKind::Sequence => "sequence",
        }
    }
}

/// A classified play. `rank` is the comparison key's representative rank: the
/// shared rank for a Group, the top rank for a Sequence. `low` is the lowest
/// covered rank, Joker slot included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Play {
    pub kind: PlayKind,
    pub size: usize,
    pub rank: Option<Rank>,
    pub low: Option<Rank>,
    pub suits: SuitSet,
    pub joker: bool,
}

impl Play {
    pub fn pass() -> Self {
        Play {
            kind: PlayKind::Pass,
            size: 0,
            rank: None,
            low: None,
            suits: SuitSet::EMPTY,
            joker: false,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.kind == PlayKind::Pass
    }

    /// Whether the play covers the given rank, resolving the Joker to the
    /// slot it substitutes. Drives eight-cut and eleven-back detection.
    pub fn covers_rank(&self, rank: Rank) -> bool {
        match self.kind {
            PlayKind::Single | PlayKind::Group => self.rank == Some(rank),
            PlayKind::Sequence => match (self.low, self.rank) {
                (Some(low), Some(top)) => low <= rank && rank <= top,
                _ => false,
            },
            _ => false,
        }
    }

    /// The lone Spade 3, the only card that answers a lone Joker.
    pub fn is_spade3_single(&self) -> bool {
        self.kind == PlayKind::Single
            && self.rank == Some(Rank::Three)
            && self.suits == SuitSet::single(crate::card::Suit::Spade)
    }
}

/// Classify a set of cards into a play shape. Returns `None` for sets that
/// form no legal shape.
pub fn classify(cards: &[Card]) -> Option<Play> {
    if cards.is_empty() {
        return Some(Play::pass());
    }
    for (i, card) in cards.iter().enumerate() {
        if cards[..i].contains(card) {
            return None;
        }
    }

    let joker = cards.iter().any(|c| c.is_joker());
    let naturals: Vec<Card> = cards.iter().copied().filter(|c| !c.is_joker()).collect();

    if cards.len() == 1 {
        return Some(if joker {
            Play {
                kind: PlayKind::JokerSingle,
                size: 1,
                rank: None,
                low: None,
                suits: SuitSet::EMPTY,
                joker: true,
            }
        } else {
            let card = naturals[0];
            Play {
                kind: PlayKind::Single,
                size: 1,
                rank: card.rank(),
                low: card.rank(),
                suits: card.suit().map(SuitSet::single).unwrap_or(SuitSet::EMPTY),
                joker: false,
            }
        });
    }

    classify_group(cards, &naturals, joker).or_else(|| classify_sequence(cards, &naturals, joker))
}

fn classify_group(cards: &[Card], naturals: &[Card], joker: bool) -> Option<Play> {
    if cards.len() < 2 || cards.len() > 4 || naturals.is_empty() {
        return None;
    }
    let rank = naturals[0].rank()?;
    if !naturals.iter().all(|c| c.rank() == Some(rank)) {
        return None;
    }
    Some(Play {
        kind: PlayKind::Group,
        size: cards.len(),
        rank: Some(rank),
        low: Some(rank),
        suits: naturals.iter().filter_map(|c| c.suit()).collect(),
        joker,
    })
}

fn classify_sequence(cards: &[Card], naturals: &[Card], joker: bool) -> Option<Play> {
    if cards.len() < 3 || naturals.is_empty() {
        return None;
    }
    let suit = naturals[0].suit()?;
    if !naturals.iter().all(|c| c.suit() == Some(suit)) {
        return None;
    }
    let mut ranks: Vec<Rank> = naturals.iter().filter_map(|c| c.rank()).collect();
    ranks.sort();

    let gap_total: usize = ranks
        .windows(2)
        .map(|pair| pair[1].index() - pair[0].index() - 1)
        .sum();

    let (low, top) = if !joker {
        if gap_total != 0 {
            return None;
        }
        (ranks[0], *ranks.last().unwrap())
    } else if gap_total == 1 {
        // Joker fills the single missing slot.
        (ranks[0], *ranks.last().unwrap())
    } else if gap_total == 0 {
        // Widest range either way; tie broken toward the lower rank.
        if let Some(below) = ranks[0].pred() {
            (below, *ranks.last().unwrap())
        } else if let Some(above) = ranks.last().unwrap().succ() {
            (ranks[0], above)
        } else {
            return None;
        }
    } else {
        return None;
    };

    Some(Play {
        kind: PlayKind::Sequence,
        size: cards.len(),
        rank: Some(top),
        low: Some(low),
        suits: SuitSet::single(suit),
        joker,
    })
}

/// Strict comparison under the effective direction. The Spade-3 answer to a
/// lone Joker is a rule-engine exception, not handled here.
pub fn can_beat(prev: &Play, next: &Play, inverted: bool) -> bool {
    if prev.kind == PlayKind::JokerSingle {
        return false;
    }
    if next.kind == PlayKind::JokerSingle {
        return prev.kind == PlayKind::Single;
    }
    if prev.kind != next.kind || prev.size != next.size {
        return false;
    }
    match (next.rank, prev.rank) {
        (Some(next_rank), Some(prev_rank)) => {
            next_rank.strength(inverted) > prev_rank.strength(inverted)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{deck, Suit};

    fn cards(codes: &[&str]) -> Vec<Card> {
        codes.iter().map(|c| Card::parse(c).unwrap()).collect()
    }

    #[test]
    fn classify_empty_is_pass() {
        let play = classify(&[]).unwrap();
        assert!(play.is_pass());
    }

    #[test]
    fn classify_single() {
        let play = classify(&cards(&["H7"])).unwrap();
        assert_eq!(play.kind, PlayKind::Single);
        assert_eq!(play.rank, Some(Rank::Seven));
        assert!(play.suits.contains(Suit::Heart));
    }

    #[test]
    fn classify_joker_single() {
        let play = classify(&cards(&["Jo"])).unwrap();
        assert_eq!(play.kind, PlayKind::JokerSingle);
    }

    #[test]
    fn classify_group() {
        let play = classify(&cards(&["S5", "H5", "D5"])).unwrap();
        assert_eq!(play.kind, PlayKind::Group);
        assert_eq!(play.size, 3);
        assert_eq!(play.rank, Some(Rank::Five));
    }

    #[test]
    fn classify_group_with_joker_substitute() {
        let play = classify(&cards(&["S5", "Jo"])).unwrap();
        assert_eq!(play.kind, PlayKind::Group);
        assert_eq!(play.size, 2);
        assert_eq!(play.rank, Some(Rank::Five));
        assert!(play.joker);
    }

    #[test]
    fn classify_rejects_five_card_group() {
        assert!(classify(&cards(&["S5", "H5", "D5", "C5", "Jo"])).is_none());
    }

    #[test]
    fn classify_sequence() {
        let play = classify(&cards(&["S5", "S6", "S7"])).unwrap();
        assert_eq!(play.kind, PlayKind::Sequence);
        assert_eq!(play.low, Some(Rank::Five));
        assert_eq!(play.rank, Some(Rank::Seven));
    }

    #[test]
    fn joker_fills_sequence_gap() {
        let play = classify(&cards(&["H5", "H7", "Jo"])).unwrap();
        assert_eq!(play.kind, PlayKind::Sequence);
        assert_eq!(play.low, Some(Rank::Five));
        assert_eq!(play.rank, Some(Rank::Seven));
        assert!(play.covers_rank(Rank::Six));
    }

    #[test]
    fn joker_extends_low_end_on_tie() {
        let play = classify(&cards(&["H5", "H6", "H7", "Jo"])).unwrap();
        assert_eq!(play.low, Some(Rank::Four));
        assert_eq!(play.rank, Some(Rank::Seven));
    }

    #[test]
    fn joker_extends_high_end_when_low_is_three() {
        let play = classify(&cards(&["D3", "D4", "Jo"])).unwrap();
        assert_eq!(play.low, Some(Rank::Three));
        assert_eq!(play.rank, Some(Rank::Five));
    }

    #[test]
    fn classify_rejects_mixed_sets() {
        assert!(classify(&cards(&["S5", "H6"])).is_none());
        assert!(classify(&cards(&["S5", "S6"])).is_none());
        assert!(classify(&cards(&["S5", "S7", "S9", "Jo"])).is_none());
        assert!(classify(&cards(&["S5", "H5", "S6"])).is_none());
    }

    #[test]
    fn classifier_is_total_over_small_sets() {
        let deck = deck();
        for a in 0..deck.len() {
            for b in (a + 1)..deck.len() {
                let _ = classify(&[deck[a], deck[b]]);
            }
        }
    }

    #[test]
    fn can_beat_compares_singles() {
        let low = classify(&cards(&["S5"])).unwrap();
        let high = classify(&cards(&["H9"])).unwrap();
        assert!(can_beat(&low, &high, false));
        assert!(!can_beat(&high, &low, false));
        assert!(can_beat(&high, &low, true));
    }

    #[test]
    fn can_beat_requires_matching_shape() {
        let single = classify(&cards(&["S5"])).unwrap();
        let pair = classify(&cards(&["H9", "D9"])).unwrap();
        assert!(!can_beat(&single, &pair, false));
    }

    #[test]
    fn sequences_compare_by_top_rank() {
        let low = classify(&cards(&["S4", "S5", "S6"])).unwrap();
        let high = classify(&cards(&["H5", "H6", "H7"])).unwrap();
        assert!(can_beat(&low, &high, false));
        assert!(!can_beat(&low, &high, true));
    }

    #[test]
    fn joker_single_beats_any_single() {
        let two = classify(&cards(&["S2"])).unwrap();
        let joker = classify(&cards(&["Jo"])).unwrap();
        assert!(can_beat(&two, &joker, false));
        assert!(!can_beat(&joker, &two, false));
    }
}
