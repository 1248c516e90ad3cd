use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::types::{Card, Declaration, EvaluationType, PlayerId};

/// One player's evaluated hand for one named hand configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandResult {
    pub player_id: PlayerId,
    pub cards: Vec<Card>,
    pub rank: u32,
    pub ordered_rank: Vec<u32>,
    pub hand_name: String,
    pub hand_description: String,
    pub hand_type: String,
    pub evaluation_type: Option<EvaluationType>,
    pub used_hole_cards: Vec<Card>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classifications: Vec<String>,
}

impl HandResult {
    /// The result recorded when everybody else folded.
    pub fn uncontested(player_id: PlayerId) -> Self {
        Self {
            player_id,
            cards: Vec::new(),
            rank: 0,
            ordered_rank: Vec::new(),
            hand_name: "Uncontested".to_string(),
            hand_description: "Uncontested".to_string(),
            hand_type: "Uncontested".to_string(),
            evaluation_type: None,
            used_hole_cards: Vec::new(),
            classifications: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PotType {
    Main,
    Side,
}

impl fmt::Display for PotType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PotType::Main => write!(f, "main"),
            PotType::Side => write!(f, "side"),
        }
    }
}

/// The award of one pot (or one configuration's share of it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotResult {
    pub amount: i64,
    pub winners: Vec<PlayerId>,
    pub pot_type: PotType,
    pub hand_type: String,
    pub side_pot_index: Option<usize>,
    pub eligible_players: BTreeSet<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub best_hands: Vec<HandResult>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub declarations: BTreeMap<PlayerId, Declaration>,
}

impl PotResult {
    /// Per-player credits for this award, see [`split_amount`].
    pub fn payouts(&self) -> Vec<(PlayerId, i64)> {
        split_amount(self.amount, &self.winners)
    }
}

/// Splits `amount` evenly between `winners`; the indivisible remainder is
/// paid one chip at a time to the earliest winners in the given order.
pub fn split_amount(amount: i64, winners: &[PlayerId]) -> Vec<(PlayerId, i64)> {
    if winners.is_empty() || amount <= 0 {
        return Vec::new();
    }
    let count = winners.len() as i64;
    let share = amount / count;
    let remainder = amount % count;
    winners
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let extra = if (i as i64) < remainder { 1 } else { 0 };
            (id.clone(), share + extra)
        })
        .collect()
}

/// The complete outcome of one finished hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub pots: Vec<PotResult>,
    pub hands: BTreeMap<PlayerId, Vec<HandResult>>,
    pub winning_hands: Vec<HandResult>,
    pub is_complete: bool,
}

impl GameResult {
    pub fn empty_complete() -> Self {
        Self {
            is_complete: true,
            ..Self::default()
        }
    }

    pub fn total_awarded(&self) -> i64 {
        self.pots.iter().map(|p| p.amount).sum()
    }

    /// Total chips credited to each player over every pot award.
    pub fn winnings(&self) -> BTreeMap<PlayerId, i64> {
        let mut totals = BTreeMap::new();
        for pot in &self.pots {
            for (id, amount) in pot.payouts() {
                *totals.entry(id).or_insert(0) += amount;
            }
        }
        totals
    }

    pub fn winnings_for(&self, player_id: &str) -> i64 {
        self.winnings().get(player_id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<PlayerId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_amount_remainder_goes_first() {
        let payouts = split_amount(10, &ids(&["a", "b", "c"]));
        assert_eq!(
            payouts,
            vec![
                ("a".to_string(), 4),
                ("b".to_string(), 3),
                ("c".to_string(), 3)
            ]
        );
        let total: i64 = payouts.iter().map(|(_, a)| a).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_split_amount_no_winners() {
        assert!(split_amount(10, &[]).is_empty());
        assert!(split_amount(0, &ids(&["a"])).is_empty());
    }

    #[test]
    fn test_winnings_aggregate_over_pots() {
        let pot = |amount, winners: &[&str]| PotResult {
            amount,
            winners: ids(winners),
            pot_type: PotType::Main,
            hand_type: "High Hand".to_string(),
            side_pot_index: None,
            eligible_players: BTreeSet::new(),
            reason: None,
            best_hands: Vec::new(),
            declarations: BTreeMap::new(),
        };
        let result = GameResult {
            pots: vec![pot(51, &["a"]), pot(50, &["a", "b"])],
            ..GameResult::empty_complete()
        };
        assert_eq!(result.total_awarded(), 101);
        assert_eq!(result.winnings_for("a"), 76);
        assert_eq!(result.winnings_for("b"), 25);
    }

    #[test]
    fn test_serialized_field_names() {
        let result = GameResult::empty_complete();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("pots").is_some());
        assert!(json.get("hands").is_some());
        assert_eq!(json["is_complete"], true);
    }
}
