use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ProtocolError;

pub type PlayerId = String;
pub type TableId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
    Joker,
}

impl Suit {
    pub const STANDARD: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn color(self) -> CardColor {
        match self {
            Suit::Diamonds | Suit::Hearts => CardColor::Red,
            Suit::Clubs | Suit::Spades => CardColor::Black,
            Suit::Joker => CardColor::None,
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            'c' | 'C' | '♣' => Some(Suit::Clubs),
            'd' | 'D' | '♦' => Some(Suit::Diamonds),
            'h' | 'H' | '♥' => Some(Suit::Hearts),
            's' | 'S' | '♠' => Some(Suit::Spades),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Suit::Clubs => write!(f, "♣"),
            Suit::Diamonds => write!(f, "♦"),
            Suit::Hearts => write!(f, "♥"),
            Suit::Spades => write!(f, "♠"),
            Suit::Joker => write!(f, "★"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    Red,
    Black,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Joker = 0,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

impl Rank {
    pub const STANDARD: [Rank; 13] = [
        Rank::Two,
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
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Rank::Joker),
            2 => Some(Rank::Two),
            3 => Some(Rank::Three),
            4 => Some(Rank::Four),
            5 => Some(Rank::Five),
            6 => Some(Rank::Six),
            7 => Some(Rank::Seven),
            8 => Some(Rank::Eight),
            9 => Some(Rank::Nine),
            10 => Some(Rank::Ten),
            11 => Some(Rank::Jack),
            12 => Some(Rank::Queen),
            13 => Some(Rank::King),
            14 => Some(Rank::Ace),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn is_face(self) -> bool {
        matches!(self, Rank::Jack | Rank::Queen | Rank::King)
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "2" => Some(Rank::Two),
            "3" => Some(Rank::Three),
            "4" => Some(Rank::Four),
            "5" => Some(Rank::Five),
            "6" => Some(Rank::Six),
            "7" => Some(Rank::Seven),
            "8" => Some(Rank::Eight),
            "9" => Some(Rank::Nine),
            "T" | "t" | "10" => Some(Rank::Ten),
            "J" | "j" => Some(Rank::Jack),
            "Q" | "q" => Some(Rank::Queen),
            "K" | "k" => Some(Rank::King),
            "A" | "a" => Some(Rank::Ace),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rank::Joker => write!(f, "Joker"),
            Rank::Two => write!(f, "2"),
            Rank::Three => write!(f, "3"),
            Rank::Four => write!(f, "4"),
            Rank::Five => write!(f, "5"),
            Rank::Six => write!(f, "6"),
            Rank::Seven => write!(f, "7"),
            Rank::Eight => write!(f, "8"),
            Rank::Nine => write!(f, "9"),
            Rank::Ten => write!(f, "10"),
            Rank::Jack => write!(f, "J"),
            Rank::Queen => write!(f, "Q"),
            Rank::King => write!(f, "K"),
            Rank::Ace => write!(f, "A"),
        }
    }
}

/// A physical card. `face_up` records whether the card was dealt exposed,
/// which some wild-card and hand-selection rules depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
    #[serde(default)]
    pub face_up: bool,
}

impl Card {
    pub fn new(suit: Suit, rank: Rank) -> Self {
        Self {
            suit,
            rank,
            face_up: false,
        }
    }

    pub fn joker() -> Self {
        Self::new(Suit::Joker, Rank::Joker)
    }

    pub fn is_joker(&self) -> bool {
        self.rank == Rank::Joker
    }

    pub fn with_face_up(mut self, face_up: bool) -> Self {
        self.face_up = face_up;
        self
    }

    /// Identity of the card ignoring how it was dealt.
    pub fn same_card(&self, other: &Card) -> bool {
        self.rank == other.rank && self.suit == other.suit
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_joker() {
            return write!(f, "Joker");
        }
        write!(f, "{}{}", self.rank, self.suit)
    }
}

impl FromStr for Card {
    type Err = ProtocolError;

    /// Parses `"As"`, `"Td"`, `"10h"`, `"Q♠"` and `"Jk"` (joker).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("jk") || s.eq_ignore_ascii_case("joker") {
            return Ok(Card::joker());
        }
        let mut chars = s.chars();
        let suit_char = chars
            .next_back()
            .ok_or_else(|| ProtocolError::InvalidCard(s.to_string()))?;
        let suit =
            Suit::from_char(suit_char).ok_or_else(|| ProtocolError::InvalidCard(s.to_string()))?;
        let rank = Rank::from_token(chars.as_str())
            .ok_or_else(|| ProtocolError::InvalidCard(s.to_string()))?;
        Ok(Card::new(suit, rank))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WildRole {
    /// Substitutes for any card.
    #[default]
    Wild,
    /// Counts as an ace, or completes a straight or flush.
    Bug,
}

/// A card prepared for evaluation: the original card plus its wildness for
/// this particular evaluation. Community cards are shared between players, so
/// wildness lives here rather than on `Card`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalCard {
    pub card: Card,
    pub wild: Option<WildRole>,
}

impl EvalCard {
    pub fn natural(card: Card) -> Self {
        Self { card, wild: None }
    }

    pub fn is_wild(&self) -> bool {
        self.wild.is_some()
    }
}

impl From<Card> for EvalCard {
    fn from(card: Card) -> Self {
        EvalCard::natural(card)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    FaceUp,
    FaceDown,
}

impl Visibility {
    pub fn matches(self, card: &Card) -> bool {
        match self {
            Visibility::FaceUp => card.face_up,
            Visibility::FaceDown => !card.face_up,
        }
    }
}

/// The cards a player holds, with optional named subsets (e.g. the two
/// halves of a split hand).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerHand {
    cards: Vec<Card>,
    subsets: Vec<(String, Vec<Card>)>,
}

impl PlayerHand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self {
            cards,
            subsets: Vec::new(),
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn subset(&self, name: &str) -> Option<&[Card]> {
        self.subsets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, cards)| cards.as_slice())
    }

    pub fn add_card(&mut self, card: Card, subset: Option<&str>) {
        self.cards.push(card);
        if let Some(name) = subset {
            match self.subsets.iter_mut().find(|(n, _)| n == name) {
                Some((_, cards)) => cards.push(card),
                None => self.subsets.push((name.to_string(), vec![card])),
            }
        }
    }

    /// Removes the given cards from the hand and all subsets. Returns the
    /// number of cards actually removed.
    pub fn remove_cards(&mut self, cards: &[Card]) -> usize {
        let mut removed = 0;
        for card in cards {
            if let Some(pos) = self.cards.iter().position(|c| c.same_card(card)) {
                self.cards.remove(pos);
                removed += 1;
                for (_, subset) in self.subsets.iter_mut() {
                    if let Some(pos) = subset.iter().position(|c| c.same_card(card)) {
                        subset.remove(pos);
                    }
                }
            }
        }
        removed
    }

    pub fn clear(&mut self) {
        self.cards.clear();
        self.subsets.clear();
    }
}

pub const DEFAULT_COMMUNITY_SUBSET: &str = "default";

/// Community cards grouped by named subset, in deal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityCards {
    subsets: Vec<(String, Vec<Card>)>,
}

impl CommunityCards {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subset: &str, card: Card) {
        match self.subsets.iter_mut().find(|(n, _)| n == subset) {
            Some((_, cards)) => cards.push(card),
            None => self.subsets.push((subset.to_string(), vec![card])),
        }
    }

    pub fn subset(&self, name: &str) -> Option<&[Card]> {
        self.subsets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, cards)| cards.as_slice())
    }

    /// Cards of `name`, or every community card when `name` is `None`.
    pub fn select(&self, name: Option<&str>) -> Vec<Card> {
        match name {
            Some(name) => self.subset(name).map(<[Card]>::to_vec).unwrap_or_default(),
            None => self.all(),
        }
    }

    pub fn all(&self) -> Vec<Card> {
        self.subsets
            .iter()
            .flat_map(|(_, cards)| cards.iter().copied())
            .collect()
    }

    pub fn subset_names(&self) -> impl Iterator<Item = &str> {
        self.subsets.iter().map(|(n, _)| n.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.subsets.iter().all(|(_, cards)| cards.is_empty())
    }

    pub fn clear(&mut self) {
        self.subsets.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvaluationType {
    #[serde(rename = "high")]
    High,
    #[serde(rename = "a5_low")]
    A5Low,
    #[serde(rename = "a6_low")]
    A6Low,
    #[serde(rename = "27_low")]
    TwoSevenLow,
}

impl EvaluationType {
    pub fn is_low(self) -> bool {
        matches!(
            self,
            EvaluationType::A5Low | EvaluationType::A6Low | EvaluationType::TwoSevenLow
        )
    }

    /// Number of cards a complete hand has under this evaluation.
    pub fn hand_size(self) -> usize {
        5
    }
}

impl fmt::Display for EvaluationType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EvaluationType::High => write!(f, "high"),
            EvaluationType::A5Low => write!(f, "a5_low"),
            EvaluationType::A6Low => write!(f, "a6_low"),
            EvaluationType::TwoSevenLow => write!(f, "27_low"),
        }
    }
}

/// Evaluator output. Lower `rank` is better; ties on `rank` are broken by
/// `ordered_rank`, compared lexicographically, again lower is better.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandRanking {
    pub rank: u32,
    pub ordered_rank: Vec<u32>,
    pub name: String,
    pub description: String,
}

impl HandRanking {
    /// `Ordering::Less` means `self` is the stronger hand.
    pub fn strength_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.ordered_rank.cmp(&other.ordered_rank))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Declaration {
    High,
    Low,
    HighLow,
}

impl Declaration {
    pub fn contests_high(self) -> bool {
        matches!(self, Declaration::High | Declaration::HighLow)
    }

    pub fn contests_low(self) -> bool {
        matches!(self, Declaration::Low | Declaration::HighLow)
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Declaration::High => write!(f, "high"),
            Declaration::Low => write!(f, "low"),
            Declaration::HighLow => write!(f, "high_low"),
        }
    }
}

/// State of a seated player in the running hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    pub seat: usize,
    /// Chips behind, not counting chips already committed this hand
    pub stack: i64,
    /// Chips committed in the current betting round
    pub current_bet: i64,
    /// Chips committed over the whole hand
    pub total_bet: i64,
    pub hand: PlayerHand,
    pub has_acted: bool,
    pub is_all_in: bool,
    /// In the current hand and not folded
    pub is_active: bool,
    pub is_sitting_out: bool,
}

impl PlayerState {
    pub fn new(id: PlayerId, name: String, stack: i64, seat: usize) -> Self {
        Self {
            id,
            name,
            seat,
            stack,
            current_bet: 0,
            total_bet: 0,
            hand: PlayerHand::new(),
            has_acted: false,
            is_all_in: false,
            is_active: false,
            is_sitting_out: false,
        }
    }

    pub fn can_act(&self) -> bool {
        self.is_active && !self.is_all_in
    }
}
