use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

mod errors;
pub mod results;
pub mod rules;
pub mod types;
pub mod variant;

pub use errors::{
    GameError, OrchestratorError, ProtocolError, RulesError, SessionError, StoreError,
};
pub use results::{split_amount, GameResult, HandResult, PotResult, PotType};
pub use rules::{
    CardSelection, DeclarationMode, HandConfig, HoleCount, Qualifier, ShowdownRules,
    WildCardRule,
};
pub use types::{
    Card, CardColor, CommunityCards, Declaration, EvalCard, EvaluationType, HandRanking,
    PlayerHand, PlayerId, PlayerState, Rank, Suit, TableId, Visibility, WildRole,
    DEFAULT_COMMUNITY_SUBSET,
};
pub use variant::{
    BettingStructure, GameRules, GameStep, MixedGameRotation, RotationEntry, Stakes, TableInfo,
};

pub type EngineResult<T> = std::result::Result<T, GameError>;
pub type SessionResult<T> = std::result::Result<T, SessionError>;
pub type OrchestratorResult<T> = std::result::Result<T, OrchestratorError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    Fold,
    Check,
    Call,
    /// Opening bet of the given size
    Bet(i64),
    /// Raise by the given amount over the current bet
    Raise(i64),
    AllIn,
    Discard(Vec<Card>),
    Declare(Declaration),
    Choose { subject: String, value: String },
}

impl PlayerAction {
    /// Builds an action from the loose shape a request layer receives:
    /// an action name plus optional amount, cards and declaration.
    pub fn from_parts(
        name: &str,
        amount: Option<i64>,
        cards: Option<Vec<Card>>,
        declaration: Option<Declaration>,
    ) -> Result<Self, ProtocolError> {
        let positive = |amount: Option<i64>| match amount {
            Some(a) if a > 0 => Ok(a),
            Some(a) => Err(ProtocolError::InvalidAmount(a.to_string())),
            None => Err(ProtocolError::InvalidAmount(format!(
                "{} requires an amount",
                name
            ))),
        };
        match name.to_ascii_lowercase().as_str() {
            "fold" => Ok(PlayerAction::Fold),
            "check" => Ok(PlayerAction::Check),
            "call" => Ok(PlayerAction::Call),
            "bet" => Ok(PlayerAction::Bet(positive(amount)?)),
            "raise" => Ok(PlayerAction::Raise(positive(amount)?)),
            "allin" | "all_in" => Ok(PlayerAction::AllIn),
            "discard" | "draw" => Ok(PlayerAction::Discard(cards.unwrap_or_default())),
            "declare" => declaration
                .map(PlayerAction::Declare)
                .ok_or_else(|| ProtocolError::InvalidAction("declare without declaration".into())),
            _ => Err(ProtocolError::InvalidAction(name.to_string())),
        }
    }

    pub fn is_fold(&self) -> bool {
        matches!(self, PlayerAction::Fold)
    }
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlayerAction::Fold => write!(f, "Fold"),
            PlayerAction::Check => write!(f, "Check"),
            PlayerAction::Call => write!(f, "Call"),
            PlayerAction::Bet(amount) => write!(f, "Bet({})", amount),
            PlayerAction::Raise(amount) => write!(f, "Raise({})", amount),
            PlayerAction::AllIn => write!(f, "AllIn"),
            PlayerAction::Discard(cards) => write!(f, "Discard({})", cards.len()),
            PlayerAction::Declare(d) => write!(f, "Declare({})", d),
            PlayerAction::Choose { subject, value } => write!(f, "Choose({}={})", subject, value),
        }
    }
}

/// Broadcast to everyone watching a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TableEvent {
    PlayerJoined {
        player_id: PlayerId,
        name: String,
        stack: i64,
        seat: usize,
    },
    PlayerLeft {
        player_id: PlayerId,
        reason: String,
    },
    PlayerDisconnected {
        player_id: PlayerId,
    },
    PlayerReconnected {
        player_id: PlayerId,
    },
    Paused {
        reason: String,
    },
    Resumed,
    HandStarted {
        hand_id: String,
        hand_number: u64,
        variant: String,
    },
    HandComplete {
        hand_id: Option<String>,
        result: GameResult,
    },
    VariantRotated {
        variant: String,
        betting_structure: BettingStructure,
    },
}

/// Serializable view of one table session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub table_id: TableId,
    pub table_name: String,
    pub variant: String,
    pub betting_structure: BettingStructure,
    pub is_active: bool,
    pub is_paused: bool,
    pub pause_reason: Option<String>,
    pub connected_players: Vec<PlayerId>,
    pub disconnected_players: Vec<PlayerId>,
    pub spectators: Vec<PlayerId>,
    pub pending_leaves: Vec<PlayerId>,
    pub hands_played: u64,
    pub current_hand_id: Option<String>,
    pub mixed_game: Option<String>,
    pub hands_in_current_variant: usize,
    pub orbit_size: usize,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorStats {
    pub total_sessions: usize,
    pub active_sessions: usize,
    pub paused_sessions: usize,
    pub total_connected_players: usize,
    pub total_spectators: usize,
    pub average_players_per_session: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_from_parts() {
        assert_eq!(
            PlayerAction::from_parts("bet", Some(40), None, None).unwrap(),
            PlayerAction::Bet(40)
        );
        assert_eq!(
            PlayerAction::from_parts("FOLD", None, None, None).unwrap(),
            PlayerAction::Fold
        );
        assert!(PlayerAction::from_parts("raise", None, None, None).is_err());
        assert!(PlayerAction::from_parts("raise", Some(-5), None, None).is_err());
        assert!(PlayerAction::from_parts("declare", None, None, None).is_err());
        assert!(PlayerAction::from_parts("shove", None, None, None).is_err());
    }

    #[test]
    fn test_action_display() {
        assert_eq!(PlayerAction::Raise(20).to_string(), "Raise(20)");
        assert_eq!(
            PlayerAction::Declare(Declaration::HighLow).to_string(),
            "Declare(high_low)"
        );
    }

    #[test]
    fn test_stats_serialize() {
        let stats = OrchestratorStats::default();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_sessions"], 0);
    }
}
