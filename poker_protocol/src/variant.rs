use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::RulesError;
use crate::rules::ShowdownRules;
use crate::types::TableId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BettingStructure {
    #[serde(rename = "Limit")]
    Limit,
    #[serde(rename = "Pot Limit")]
    PotLimit,
    #[serde(rename = "No Limit")]
    NoLimit,
}

impl fmt::Display for BettingStructure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BettingStructure::Limit => write!(f, "Limit"),
            BettingStructure::PotLimit => write!(f, "Pot Limit"),
            BettingStructure::NoLimit => write!(f, "No Limit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcedBets {
    Blinds,
    Antes,
    None,
}

impl Default for ForcedBets {
    fn default() -> Self {
        ForcedBets::Blinds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealTarget {
    Hole,
    Community,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetSize {
    Small,
    Big,
}

/// One entry of a variant's play sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameStep {
    PostBlinds,
    PostAntes,
    Deal {
        target: DealTarget,
        #[serde(default)]
        subset: Option<String>,
        count: usize,
        #[serde(default)]
        face_up: bool,
    },
    Bet {
        size: BetSize,
    },
    Draw {
        max_cards: usize,
    },
    Declare,
    Showdown,
}

impl GameStep {
    pub fn name(&self) -> &'static str {
        match self {
            GameStep::PostBlinds => "Post Blinds",
            GameStep::PostAntes => "Post Antes",
            GameStep::Deal { .. } => "Deal",
            GameStep::Bet { .. } => "Bet",
            GameStep::Draw { .. } => "Draw",
            GameStep::Declare => "Declare",
            GameStep::Showdown => "Showdown",
        }
    }
}

/// Complete rules of one poker variant, as loaded from its JSON file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRules {
    pub game: String,
    pub min_players: usize,
    pub max_players: usize,
    #[serde(default)]
    pub jokers: u8,
    #[serde(default)]
    pub forced_bets: ForcedBets,
    pub betting_structures: Vec<BettingStructure>,
    pub steps: Vec<GameStep>,
    pub showdown: ShowdownRules,
}

impl GameRules {
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let rules: GameRules =
            serde_json::from_str(json).map_err(|e| RulesError::Parse(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        if self.min_players < 2 || self.min_players > self.max_players {
            return Err(RulesError::InvalidField {
                config: self.game.clone(),
                field: "minPlayers".to_string(),
                reason: format!(
                    "must be between 2 and maxPlayers ({})",
                    self.max_players
                ),
            });
        }
        if self.betting_structures.is_empty() {
            return Err(RulesError::MissingField("bettingStructures".to_string()));
        }
        if !self.steps.iter().any(|s| matches!(s, GameStep::Showdown)) {
            return Err(RulesError::MissingField("showdown step".to_string()));
        }
        if self.showdown.best_hand.is_empty() && self.showdown.default_best_hand.is_none() {
            return Err(RulesError::MissingField("showdown.bestHand".to_string()));
        }
        Ok(())
    }

    pub fn supports(&self, structure: BettingStructure) -> bool {
        self.betting_structures.contains(&structure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stakes {
    pub small_blind: i64,
    pub big_blind: i64,
    #[serde(default)]
    pub ante: i64,
}

impl Stakes {
    pub fn new(small_blind: i64, big_blind: i64) -> Self {
        Self {
            small_blind,
            big_blind,
            ante: 0,
        }
    }

    /// Limit bet size for early streets.
    pub fn small_bet(&self) -> i64 {
        self.big_blind
    }

    /// Limit bet size for late streets.
    pub fn big_bet(&self) -> i64 {
        self.big_blind.saturating_mul(2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationEntry {
    pub variant: String,
    pub betting_structure: BettingStructure,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A mixed game: variants played in order, one orbit each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixedGameRotation {
    pub name: String,
    pub entries: Vec<RotationEntry>,
}

/// Persisted table settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub id: TableId,
    pub name: String,
    pub variant: String,
    pub betting_structure: BettingStructure,
    pub stakes: Stakes,
    pub max_players: usize,
    pub min_buy_in: i64,
    pub max_buy_in: i64,
    #[serde(default)]
    pub mixed_game: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLDEM: &str = r#"{
        "game": "Hold'em",
        "minPlayers": 2,
        "maxPlayers": 9,
        "bettingStructures": ["Limit", "No Limit", "Pot Limit"],
        "steps": [
            {"type": "post_blinds"},
            {"type": "deal", "target": "hole", "count": 2},
            {"type": "bet", "size": "small"},
            {"type": "deal", "target": "community", "subset": "default", "count": 3, "face_up": true},
            {"type": "bet", "size": "small"},
            {"type": "showdown"}
        ],
        "showdown": {
            "bestHand": [{"name": "High Hand", "evaluationType": "high", "holeCards": "all"}]
        }
    }"#;

    #[test]
    fn test_parse_variant() {
        let rules = GameRules::from_json(HOLDEM).unwrap();
        assert_eq!(rules.game, "Hold'em");
        assert_eq!(rules.forced_bets, ForcedBets::Blinds);
        assert_eq!(rules.steps.len(), 6);
        assert!(rules.supports(BettingStructure::NoLimit));
        assert_eq!(
            rules.steps[3],
            GameStep::Deal {
                target: DealTarget::Community,
                subset: Some("default".to_string()),
                count: 3,
                face_up: true
            }
        );
    }

    #[test]
    fn test_variant_without_showdown_step_is_rejected() {
        let json = HOLDEM.replace(r#",
            {"type": "showdown"}"#, "");
        assert!(matches!(
            GameRules::from_json(&json),
            Err(RulesError::MissingField(_))
        ));
    }

    #[test]
    fn test_limit_bet_sizes() {
        let stakes = Stakes::new(5, 10);
        assert_eq!(stakes.small_bet(), 10);
        assert_eq!(stakes.big_bet(), 20);
    }
}
