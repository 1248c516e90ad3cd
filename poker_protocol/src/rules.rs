//! Showdown configuration.
//!
//! Variant files describe their showdown as camelCase JSON. Each best-hand
//! entry is resolved once, at load time, into a [`HandConfig`] whose
//! [`CardSelection`] says exactly how a player's hand is assembled; nothing
//! downstream inspects raw keys.

use serde::{Deserialize, Serialize};

use crate::errors::RulesError;
use crate::types::{CardColor, EvaluationType, Rank, Suit, Visibility, WildRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationMode {
    #[default]
    CardsSpeak,
    Declare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoleCount {
    Exactly(usize),
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsetRequirement {
    pub subset: String,
    pub count: usize,
    /// Optional subsets may contribute anywhere from zero to `count` cards
    #[serde(default = "default_true")]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combination {
    pub hole_cards: usize,
    pub community_cards: usize,
    #[serde(default, alias = "community_subset")]
    pub community_subset: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsetSelection {
    pub subset: String,
    #[serde(default)]
    pub min: usize,
    pub max: usize,
}

/// How hole and community cards may be combined into a hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardSelection {
    /// Hole cards the `source` configuration did not use, plus optional
    /// fresh community cards.
    UsesUnusedFrom {
        source: String,
        community: usize,
        community_subset: Option<String>,
    },
    SubsetRequirements {
        hole: HoleCount,
        requirements: Vec<SubsetRequirement>,
    },
    Combinations(Vec<Combination>),
    SelectCombinations {
        hole: usize,
        community: usize,
        groups: Vec<Vec<SubsetSelection>>,
    },
    AnyCards {
        total: usize,
        hole_subsets: Vec<Vec<String>>,
        padding: bool,
    },
    HoleCommunityChoices {
        pairs: Vec<(usize, usize)>,
        community_subset: Option<String>,
    },
    CommunityCombinations {
        hole: usize,
        groups: Vec<Vec<String>>,
        total: usize,
    },
    /// `HoleCount::All` derives the community count from the hand size.
    FixedHoleCommunity {
        hole: HoleCount,
        community: usize,
        community_subset: Option<String>,
    },
    AllHole,
}

impl CardSelection {
    /// Cards a complete hand needs under this selection, when the rule fixes
    /// it. Used for odd-chip precedence.
    pub fn required_cards(&self, hand_size: usize) -> usize {
        match self {
            CardSelection::FixedHoleCommunity {
                hole: HoleCount::Exactly(h),
                community,
                ..
            } => h + community,
            CardSelection::Combinations(combos) => combos
                .iter()
                .map(|c| c.hole_cards + c.community_cards)
                .max()
                .unwrap_or(hand_size),
            CardSelection::SelectCombinations {
                hole, community, ..
            } => hole + community,
            CardSelection::AnyCards { total, .. } => *total,
            CardSelection::HoleCommunityChoices { pairs, .. } => pairs
                .iter()
                .map(|(h, c)| h + c)
                .max()
                .unwrap_or(hand_size),
            CardSelection::CommunityCombinations { total, .. } => *total,
            CardSelection::SubsetRequirements {
                hole: HoleCount::Exactly(h),
                requirements,
            } => h + requirements.iter().map(|r| r.count).sum::<usize>(),
            _ => hand_size,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoleFilter {
    pub subset: Option<String>,
    pub visibility: Option<Visibility>,
}

/// A hand qualifies when it ranks at or better than this cutoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Qualifier {
    pub rank: u32,
    #[serde(default)]
    pub ordered_rank: Vec<u32>,
}

impl Qualifier {
    pub fn admits(&self, rank: u32, ordered_rank: &[u32]) -> bool {
        match rank.cmp(&self.rank) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => {
                self.ordered_rank.is_empty() || ordered_rank <= self.ordered_rank.as_slice()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WildCardRule {
    Joker {
        #[serde(default)]
        role: WildRole,
    },
    Rank {
        rank: Rank,
        #[serde(default)]
        role: WildRole,
    },
    LowestCommunity {
        #[serde(default)]
        subset: Option<String>,
        #[serde(default)]
        role: WildRole,
    },
    LowestHole {
        #[serde(default)]
        visibility: Option<Visibility>,
        #[serde(default)]
        role: WildRole,
    },
    ConditionalJoker {
        face_up: WildRole,
        face_down: WildRole,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationRule {
    /// "face" when the hand holds a jack, queen or king, otherwise "butt"
    FaceButt,
}

/// A fully resolved best-hand configuration.
///
/// Serializes back to the variant-file shape it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBestHand", into = "RawBestHand")]
pub struct HandConfig {
    pub name: String,
    pub evaluation_type: EvaluationType,
    pub selection: CardSelection,
    pub hole_filter: HoleFilter,
    pub qualifier: Option<Qualifier>,
    pub wild_cards: Vec<WildCardRule>,
    pub minimum_cards: Option<usize>,
    pub zero_cards_pip_value: Option<u32>,
    pub classification: Option<ClassificationRule>,
}

impl HandConfig {
    /// A plain configuration: fixed hole and community counts.
    pub fn simple(name: &str, evaluation_type: EvaluationType, hole: usize, community: usize) -> Self {
        Self {
            name: name.to_string(),
            evaluation_type,
            selection: CardSelection::FixedHoleCommunity {
                hole: HoleCount::Exactly(hole),
                community,
                community_subset: None,
            },
            hole_filter: HoleFilter::default(),
            qualifier: None,
            wild_cards: Vec::new(),
            minimum_cards: None,
            zero_cards_pip_value: None,
            classification: None,
        }
    }

    pub fn with_qualifier(mut self, rank: u32, ordered_rank: Vec<u32>) -> Self {
        self.qualifier = Some(Qualifier { rank, ordered_rank });
        self
    }

    pub fn required_cards(&self) -> usize {
        self.selection
            .required_cards(self.evaluation_type.hand_size())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum RawCount {
    Number(usize),
    List(Vec<usize>),
    Text(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawBestHand {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    evaluation_type: Option<EvaluationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hole_cards: Option<RawCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    community_cards: Option<RawCount>,
    #[serde(alias = "community_subset", skip_serializing_if = "Option::is_none")]
    community_subset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hole_subset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hole_visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    community_subset_requirements: Option<Vec<SubsetRequirement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    combinations: Option<Vec<Combination>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    community_card_select_combinations: Option<Vec<Vec<SubsetSelection>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    any_cards: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hole_subset_combinations: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    padding: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    community_card_combinations: Option<Vec<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_cards: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uses_unused_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    qualifier: Option<Qualifier>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    wild_cards: Vec<WildCardRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minimum_cards: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    zero_cards_pip_value: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    classification: Option<ClassificationRule>,
}

impl From<HoleCount> for RawCount {
    fn from(count: HoleCount) -> Self {
        match count {
            HoleCount::Exactly(n) => RawCount::Number(n),
            HoleCount::All => RawCount::Text("all".to_string()),
        }
    }
}

impl From<HandConfig> for RawBestHand {
    fn from(config: HandConfig) -> Self {
        let mut raw = RawBestHand {
            name: config.name,
            evaluation_type: Some(config.evaluation_type),
            hole_subset: config.hole_filter.subset,
            hole_visibility: config.hole_filter.visibility,
            qualifier: config.qualifier,
            wild_cards: config.wild_cards,
            minimum_cards: config.minimum_cards,
            zero_cards_pip_value: config.zero_cards_pip_value,
            classification: config.classification,
            ..RawBestHand::default()
        };
        match config.selection {
            CardSelection::UsesUnusedFrom {
                source,
                community,
                community_subset,
            } => {
                raw.uses_unused_from = Some(source);
                raw.community_cards = Some(RawCount::Number(community));
                raw.community_subset = community_subset;
            }
            CardSelection::SubsetRequirements { hole, requirements } => {
                raw.hole_cards = Some(hole.into());
                raw.community_subset_requirements = Some(requirements);
            }
            CardSelection::Combinations(combinations) => {
                raw.combinations = Some(combinations);
            }
            CardSelection::SelectCombinations {
                hole,
                community,
                groups,
            } => {
                raw.hole_cards = Some(RawCount::Number(hole));
                raw.community_cards = Some(RawCount::Number(community));
                raw.community_card_select_combinations = Some(groups);
            }
            CardSelection::AnyCards {
                total,
                hole_subsets,
                padding,
            } => {
                raw.any_cards = Some(total);
                raw.hole_subset_combinations = hole_subsets;
                raw.padding = padding;
            }
            CardSelection::HoleCommunityChoices {
                pairs,
                community_subset,
            } => {
                let (holes, communities) = pairs.into_iter().unzip();
                raw.hole_cards = Some(RawCount::List(holes));
                raw.community_cards = Some(RawCount::List(communities));
                raw.community_subset = community_subset;
            }
            CardSelection::CommunityCombinations { hole, groups, total } => {
                raw.hole_cards = Some(RawCount::Number(hole));
                raw.community_card_combinations = Some(groups);
                raw.total_cards = Some(total);
            }
            CardSelection::FixedHoleCommunity {
                hole,
                community,
                community_subset,
            } => {
                raw.hole_cards = Some(hole.into());
                raw.community_cards = Some(RawCount::Number(community));
                raw.community_subset = community_subset;
            }
            CardSelection::AllHole => {}
        }
        raw
    }
}

fn default_true() -> bool {
    true
}

fn invalid(config: &str, field: &str, reason: &str) -> RulesError {
    RulesError::InvalidField {
        config: config.to_string(),
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn fixed_count(config: &str, field: &str, raw: Option<&RawCount>) -> Result<usize, RulesError> {
    match raw {
        None => Ok(0),
        Some(RawCount::Number(n)) => Ok(*n),
        Some(_) => Err(invalid(config, field, "expected a single number")),
    }
}

fn hole_count(config: &str, raw: Option<&RawCount>) -> Result<HoleCount, RulesError> {
    match raw {
        None => Ok(HoleCount::Exactly(0)),
        Some(RawCount::Number(n)) => Ok(HoleCount::Exactly(*n)),
        Some(RawCount::Text(t)) if t == "all" => Ok(HoleCount::All),
        Some(_) => Err(invalid(config, "holeCards", "expected a number or \"all\"")),
    }
}

fn resolve_selection(raw: &RawBestHand, hand_size: usize) -> Result<CardSelection, RulesError> {
    let name = raw.name.as_str();

    if let Some(source) = &raw.uses_unused_from {
        return Ok(CardSelection::UsesUnusedFrom {
            source: source.clone(),
            community: fixed_count(name, "communityCards", raw.community_cards.as_ref())?,
            community_subset: raw.community_subset.clone(),
        });
    }

    if let Some(requirements) = &raw.community_subset_requirements {
        return Ok(CardSelection::SubsetRequirements {
            hole: hole_count(name, raw.hole_cards.as_ref())?,
            requirements: requirements.clone(),
        });
    }

    if let Some(combinations) = &raw.combinations {
        if combinations.is_empty() {
            return Err(invalid(name, "combinations", "must not be empty"));
        }
        return Ok(CardSelection::Combinations(combinations.clone()));
    }

    if let Some(groups) = &raw.community_card_select_combinations {
        for selection in groups.iter().flatten() {
            if selection.min > selection.max {
                return Err(invalid(
                    name,
                    "communityCardSelectCombinations",
                    "min exceeds max",
                ));
            }
        }
        return Ok(CardSelection::SelectCombinations {
            hole: fixed_count(name, "holeCards", raw.hole_cards.as_ref())?,
            community: fixed_count(name, "communityCards", raw.community_cards.as_ref())?,
            groups: groups.clone(),
        });
    }

    if let Some(total) = raw.any_cards {
        return Ok(CardSelection::AnyCards {
            total,
            hole_subsets: raw.hole_subset_combinations.clone(),
            padding: raw.padding,
        });
    }

    match &raw.hole_cards {
        Some(RawCount::List(holes)) => {
            let communities = match &raw.community_cards {
                Some(RawCount::List(c)) => c.clone(),
                _ => {
                    return Err(invalid(
                        name,
                        "communityCards",
                        "a list is required when holeCards is a list",
                    ))
                }
            };
            if communities.len() != holes.len() {
                return Err(invalid(
                    name,
                    "communityCards",
                    "must have the same length as holeCards",
                ));
            }
            Ok(CardSelection::HoleCommunityChoices {
                pairs: holes.iter().copied().zip(communities).collect(),
                community_subset: raw.community_subset.clone(),
            })
        }
        Some(_) if raw.community_card_combinations.is_some() => {
            let hole = fixed_count(name, "holeCards", raw.hole_cards.as_ref())?;
            Ok(CardSelection::CommunityCombinations {
                hole,
                groups: raw.community_card_combinations.clone().unwrap_or_default(),
                total: raw.total_cards.unwrap_or(hand_size),
            })
        }
        Some(_) => Ok(CardSelection::FixedHoleCommunity {
            hole: hole_count(name, raw.hole_cards.as_ref())?,
            community: fixed_count(name, "communityCards", raw.community_cards.as_ref())?,
            community_subset: raw.community_subset.clone(),
        }),
        None => Ok(CardSelection::AllHole),
    }
}

impl TryFrom<RawBestHand> for HandConfig {
    type Error = RulesError;

    fn try_from(raw: RawBestHand) -> Result<Self, Self::Error> {
        if raw.name.is_empty() {
            return Err(RulesError::MissingField("name".to_string()));
        }
        let evaluation_type = raw.evaluation_type.unwrap_or(EvaluationType::High);
        let selection = resolve_selection(&raw, evaluation_type.hand_size())?;
        Ok(Self {
            name: raw.name,
            evaluation_type,
            selection,
            hole_filter: HoleFilter {
                subset: raw.hole_subset,
                visibility: raw.hole_visibility,
            },
            qualifier: raw.qualifier,
            wild_cards: raw.wild_cards,
            minimum_cards: raw.minimum_cards,
            zero_cards_pip_value: raw.zero_cards_pip_value,
            classification: raw.classification,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandCondition {
    PlayerChoice {
        subject: String,
        value: String,
    },
    /// Every active player holds between `min` and `max` cards.
    HandSize {
        min: usize,
        max: usize,
    },
    CommunityCardRank {
        #[serde(default)]
        subset: Option<String>,
        #[serde(default)]
        index: Option<usize>,
        ranks: Vec<Rank>,
    },
    CommunityCardSuit {
        #[serde(default)]
        subset: Option<String>,
        #[serde(default)]
        index: Option<usize>,
        suits: Vec<Suit>,
    },
    BoardColor {
        #[serde(default)]
        subset: Option<String>,
        color: CardColor,
        min_count: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalBestHand {
    pub condition: HandCondition,
    pub best_hand: Vec<HandConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCondition {
    NoQualifierMet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuitSource {
    Fixed {
        suit: Suit,
    },
    /// Suit of a community card; a missing `index` means the last card dealt
    /// to the subset (e.g. the river).
    CommunityCard {
        #[serde(default)]
        subset: Option<String>,
        #[serde(default)]
        index: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardPool {
    HoleCards,
    AllCards,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    HighestOfSuit,
    LowestOfSuit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialCriterion {
    pub kind: CriterionKind,
    pub suit: SuitSource,
    #[serde(default = "default_pool")]
    pub from: CardPool,
}

fn default_pool() -> CardPool {
    CardPool::HoleCards
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DefaultActionKind {
    EvaluateSpecial { criterion: SpecialCriterion },
    LeaveUnawarded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultAction {
    pub condition: ActionCondition,
    /// Configuration names this action covers; empty covers all
    #[serde(default)]
    pub applies_to: Vec<String>,
    pub action: DefaultActionKind,
}

impl DefaultAction {
    pub fn applies_to(&self, config_name: &str) -> bool {
        self.applies_to.is_empty() || self.applies_to.iter().any(|n| n == config_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GlobalAction {
    SplitPot,
    BestHand {
        #[serde(rename = "bestHand")]
        best_hand: Vec<HandConfig>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalDefaultAction {
    pub condition: ActionCondition,
    pub action: GlobalAction,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowdownRules {
    #[serde(default, alias = "declaration_mode")]
    pub declaration_mode: DeclarationMode,
    #[serde(default)]
    pub best_hand: Vec<HandConfig>,
    #[serde(default)]
    pub default_best_hand: Option<Vec<HandConfig>>,
    #[serde(default)]
    pub conditional_best_hands: Vec<ConditionalBestHand>,
    #[serde(default)]
    pub default_actions: Vec<DefaultAction>,
    #[serde(default)]
    pub global_default_action: Option<GlobalDefaultAction>,
    #[serde(default, alias = "classification_priority")]
    pub classification_priority: Vec<String>,
}

impl ShowdownRules {
    pub fn single(config: HandConfig) -> Self {
        Self {
            best_hand: vec![config],
            ..Self::default()
        }
    }

    pub fn hi_lo(high: HandConfig, low: HandConfig) -> Self {
        Self {
            best_hand: vec![high, low],
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<HandConfig, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_fixed_hole_community() {
        let config = parse(
            r#"{"name": "High Hand", "evaluationType": "high", "holeCards": 2, "communityCards": 3}"#,
        )
        .unwrap();
        assert_eq!(
            config.selection,
            CardSelection::FixedHoleCommunity {
                hole: HoleCount::Exactly(2),
                community: 3,
                community_subset: None
            }
        );
        assert_eq!(config.required_cards(), 5);
    }

    #[test]
    fn test_hole_all() {
        let config = parse(r#"{"name": "Hand", "holeCards": "all"}"#).unwrap();
        assert!(matches!(
            config.selection,
            CardSelection::FixedHoleCommunity {
                hole: HoleCount::All,
                ..
            }
        ));
        assert!(parse(r#"{"name": "Hand", "holeCards": "some"}"#).is_err());
    }

    #[test]
    fn test_precedence_requirements_over_combinations() {
        let config = parse(
            r#"{
                "name": "Hand",
                "holeCards": 2,
                "communitySubsetRequirements": [{"subset": "Row 1", "count": 3}],
                "combinations": [{"holeCards": 2, "communityCards": 3}]
            }"#,
        )
        .unwrap();
        assert!(matches!(
            config.selection,
            CardSelection::SubsetRequirements { .. }
        ));
    }

    #[test]
    fn test_hole_list_requires_parallel_community_list() {
        let ok = parse(r#"{"name": "H", "holeCards": [2, 3], "communityCards": [3, 2]}"#).unwrap();
        assert_eq!(
            ok.selection,
            CardSelection::HoleCommunityChoices {
                pairs: vec![(2, 3), (3, 2)],
                community_subset: None
            }
        );
        assert!(parse(r#"{"name": "H", "holeCards": [2, 3], "communityCards": [3]}"#).is_err());
        assert!(parse(r#"{"name": "H", "holeCards": [2, 3], "communityCards": 3}"#).is_err());
    }

    #[test]
    fn test_any_cards_and_unused() {
        let any = parse(r#"{"name": "H", "anyCards": 5, "padding": true}"#).unwrap();
        assert!(matches!(
            any.selection,
            CardSelection::AnyCards {
                total: 5,
                padding: true,
                ..
            }
        ));
        let unused =
            parse(r#"{"name": "Second", "usesUnusedFrom": "First", "communityCards": 1}"#).unwrap();
        assert!(matches!(
            unused.selection,
            CardSelection::UsesUnusedFrom { community: 1, .. }
        ));
    }

    #[test]
    fn test_default_all_hole_and_missing_name() {
        let config = parse(r#"{"name": "Stud", "evaluationType": "a5_low"}"#).unwrap();
        assert_eq!(config.selection, CardSelection::AllHole);
        assert_eq!(config.evaluation_type, EvaluationType::A5Low);
        assert!(parse(r#"{"holeCards": 2}"#).is_err());
    }

    #[test]
    fn test_qualifier_admits() {
        let eight_or_better = Qualifier {
            rank: 1,
            ordered_rank: vec![8, 7, 6, 5, 4],
        };
        assert!(eight_or_better.admits(1, &[8, 7, 6, 5, 4]));
        assert!(eight_or_better.admits(1, &[7, 5, 4, 3, 2]));
        assert!(!eight_or_better.admits(1, &[9, 4, 3, 2, 1]));
        assert!(!eight_or_better.admits(2, &[2, 2, 3, 4, 5]));
    }

    #[test]
    fn test_full_showdown_rules() {
        let rules: ShowdownRules = serde_json::from_str(
            r#"{
                "declaration_mode": "cards_speak",
                "bestHand": [
                    {"name": "High Hand", "evaluationType": "high", "holeCards": 2, "communityCards": 3},
                    {"name": "Low Hand", "evaluationType": "a5_low", "holeCards": 2, "communityCards": 3,
                     "qualifier": {"rank": 1, "orderedRank": [8, 7, 6, 5, 4]}}
                ],
                "conditionalBestHands": [
                    {"condition": {"type": "board_color", "color": "red", "min_count": 3},
                     "bestHand": [{"name": "Red Hand", "holeCards": 2, "communityCards": 3}]}
                ],
                "defaultActions": [
                    {"condition": "no_qualifier_met", "appliesTo": ["Low Hand"],
                     "action": {"type": "evaluate_special",
                                "criterion": {"kind": "highest_of_suit",
                                              "suit": {"type": "community_card"}}}}
                ],
                "globalDefaultAction": {"condition": "no_qualifier_met", "action": {"type": "split_pot"}},
                "classificationPriority": ["face", "butt"]
            }"#,
        )
        .unwrap();
        assert_eq!(rules.best_hand.len(), 2);
        assert!(rules.best_hand[1].qualifier.is_some());
        assert_eq!(rules.conditional_best_hands.len(), 1);
        assert!(rules.default_actions[0].applies_to("Low Hand"));
        assert!(!rules.default_actions[0].applies_to("High Hand"));
        assert_eq!(
            rules.global_default_action.map(|g| g.action),
            Some(GlobalAction::SplitPot)
        );
        assert_eq!(rules.classification_priority, vec!["face", "butt"]);
    }

    #[test]
    fn test_hand_config_writes_variant_file_shape() {
        let config = HandConfig::simple("High Hand", EvaluationType::High, 2, 3);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["holeCards"], 2);
        assert_eq!(json["communityCards"], 3);
        assert!(json.get("selection").is_none());
        assert_eq!(serde_json::from_value::<HandConfig>(json).unwrap(), config);
    }

    #[test]
    fn test_saved_configs_load_back_unchanged() {
        let sources = [
            r#"{"name": "Hand", "holeCards": "all", "holeVisibility": "face_down"}"#,
            r#"{"name": "Choice", "holeCards": [2, 3], "communityCards": [3, 2], "communitySubset": "Row"}"#,
            r#"{"name": "Any", "anyCards": 5, "holeSubsetCombinations": [["A", "B"]], "padding": true}"#,
            r#"{"name": "Second", "usesUnusedFrom": "First", "communityCards": 1}"#,
            r#"{"name": "Rows", "holeCards": 2, "communityCardCombinations": [["R1"], ["R2"]], "totalCards": 4}"#,
            r#"{"name": "Combos", "combinations": [{"holeCards": 2, "communityCards": 3}]}"#,
            r#"{"name": "Reqs", "holeCards": 1, "communitySubsetRequirements": [{"subset": "X", "count": 2}]}"#,
            r#"{"name": "Low Hand", "evaluationType": "a5_low", "holeCards": 2, "communityCards": 3,
                "qualifier": {"rank": 1, "orderedRank": [8, 7, 6, 5, 4]}}"#,
            r#"{"name": "Hole Only"}"#,
        ];
        for source in sources {
            let config = parse(source).unwrap();
            let saved = serde_json::to_string(&config).unwrap();
            assert_eq!(parse(&saved).unwrap(), config, "{}", saved);
        }
    }
}
