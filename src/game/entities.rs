//! Card, deck, and player primitives shared by every game type.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fmt};

/// Identifier unique to a card within one deck build.
pub type CardId = u32;

/// Type alias for whole chips. All bets and stacks are whole chips
/// (there's no point arguing over fractions of a chip).
pub type Chips = u32;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    // None is used for suitless numeric decks and jokers.
    None,
    Club,
    Spade,
    Diamond,
    Heart,
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::None => "-",
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// A playing card. Rank runs 1–13 with 1 = Ace; suitless decks use
/// [`Suit::None`]. Immutable once drawn; ownership moves between the deck
/// and hand collections, never duplicated.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Card {
    pub id: CardId,
    pub rank: u8,
    pub suit: Suit,
}

impl Card {
    #[must_use]
    pub const fn new(id: CardId, rank: u8, suit: Suit) -> Self {
        Self { id, rank, suit }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rank = match self.rank {
            1 => "A".to_string(),
            11 => "J".to_string(),
            12 => "Q".to_string(),
            13 => "K".to_string(),
            r => r.to_string(),
        };
        write!(f, "{rank}/{}", self.suit)
    }
}

/// An ordered stack of cards. Cards are drawn from the front and can be
/// returned to the front, so the first card of `add_top` is the next card
/// dealt.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Deck {
    cards: VecDeque<Card>,
}

impl Deck {
    #[must_use]
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self {
            cards: cards.into(),
        }
    }

    /// Draws the next card, or `None` when the deck is depleted. Callers
    /// must handle depletion; it is never an error.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    /// Returns cards to the draw end. The given order is preserved as the
    /// order in which they will next be dealt.
    pub fn add_top(&mut self, cards: Vec<Card>) {
        for card in cards.into_iter().rev() {
            self.cards.push_front(card);
        }
    }

    pub fn shuffle(&mut self, rng: &mut StdRng) {
        self.cards.make_contiguous().shuffle(rng);
    }

    /// Removes the card at `index` in draw order. Used by effects that
    /// fish for a specific card rather than the next one.
    pub fn remove(&mut self, index: usize) -> Option<Card> {
        self.cards.remove(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Deck construction. Ids are assigned sequentially from `id_base` so every
/// card is unique within the build.
pub struct DeckFactory;

impl DeckFactory {
    /// A standard 52-card deck repeated `num_decks` times.
    #[must_use]
    pub fn standard_deck(num_decks: u32) -> Deck {
        let num_decks = num_decks.max(1);
        let mut cards = Vec::with_capacity(52 * num_decks as usize);
        let mut id: CardId = 0;
        for _ in 0..num_decks {
            for rank in 1..=13u8 {
                for suit in [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart] {
                    cards.push(Card::new(id, rank, suit));
                    id += 1;
                }
            }
        }
        Deck::from_cards(cards)
    }

    /// A suitless run of ranks `1..=max_rank` repeated `num_decks` times,
    /// with ids starting at `id_base`.
    #[must_use]
    pub fn numeric_deck(max_rank: u8, num_decks: u32, id_base: CardId) -> Deck {
        let num_decks = num_decks.max(1);
        let mut cards = Vec::with_capacity(max_rank as usize * num_decks as usize);
        let mut id = id_base;
        for _ in 0..num_decks {
            for rank in 1..=max_rank {
                cards.push(Card::new(id, rank, Suit::None));
                id += 1;
            }
        }
        Deck::from_cards(cards)
    }
}

/// Opaque player identifier supplied by the hosting session.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    #[must_use]
    pub fn new(s: &str) -> Self {
        Self(s.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Seat-level identity embedded in every game's player record. Created once
/// at seat-join time and carried across rounds within a session.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerIdentity {
    pub id: PlayerId,
    pub name: String,
    pub is_bot: bool,
    pub is_spectator: bool,
}

impl PlayerIdentity {
    #[must_use]
    pub fn new(id: impl Into<PlayerId>, name: &str, is_bot: bool) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            is_bot,
            is_spectator: false,
        }
    }
}

/// Fallback RNG for instances restored from a snapshot; the persisted
/// generator state is intentionally not round-tripped.
#[must_use]
pub fn runtime_rng() -> StdRng {
    StdRng::from_os_rng()
}
