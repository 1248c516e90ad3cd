//! Best-hand search: enumerate every legal hole/community combination a
//! [`HandConfig`] allows and keep the best one under the evaluator.

use itertools::Itertools;
use log::{debug, warn};
use poker_protocol::rules::ClassificationRule;
use poker_protocol::{
    Card, CardSelection, CommunityCards, EvalCard, HandConfig, HandRanking, HoleCount, PlayerHand,
};
use std::cmp::Ordering;

use crate::evaluator::HandEvaluator;
use crate::wild::{apply_wild_cards, WildAssignment};

/// The winning combination for one player under one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestHand {
    pub cards: Vec<Card>,
    pub marked: Vec<EvalCard>,
    pub used_hole_cards: Vec<Card>,
    pub ranking: HandRanking,
}

impl BestHand {
    fn empty(pip_value: u32) -> Self {
        Self {
            cards: Vec::new(),
            marked: Vec::new(),
            used_hole_cards: Vec::new(),
            ranking: HandRanking {
                rank: 1,
                ordered_rank: vec![pip_value],
                name: "No Cards".to_string(),
                description: "No Cards".to_string(),
            },
        }
    }
}

struct Search<'a> {
    evaluator: &'a dyn HandEvaluator,
    config: &'a HandConfig,
    wild: WildAssignment,
    best: Option<(Vec<Card>, Vec<Card>, Vec<EvalCard>)>,
}

impl<'a> Search<'a> {
    fn consider(&mut self, hole: &[Card], community: &[Card]) {
        let mut cards = hole.to_vec();
        cards.extend_from_slice(community);
        let marked = self.wild.mark_all(&cards);
        let better = match &self.best {
            None => true,
            Some((_, _, best)) => {
                self.evaluator
                    .compare_hands(&marked, best, self.config.evaluation_type)
                    == Ordering::Greater
            }
        };
        if better {
            self.best = Some((cards, hole.to_vec(), marked));
        }
    }

    fn consider_split(&mut self, hole: &[Card], hole_count: usize, community: &[Card], count: usize) {
        for hole_combo in combos(hole, hole_count) {
            for community_combo in combos(community, count) {
                self.consider(&hole_combo, &community_combo);
            }
        }
    }

    fn finish(self) -> Option<BestHand> {
        let (cards, used_hole_cards, marked) = self.best?;
        let ranking = self
            .evaluator
            .evaluate_hand(&marked, self.config.evaluation_type);
        Some(BestHand {
            cards,
            marked,
            used_hole_cards,
            ranking,
        })
    }
}

fn combos(cards: &[Card], k: usize) -> Vec<Vec<Card>> {
    if k > cards.len() {
        return Vec::new();
    }
    cards.iter().copied().combinations(k).collect()
}

fn subset_cards(community: &CommunityCards, name: Option<&str>, config: &str) -> Vec<Card> {
    if let Some(name) = name {
        if community.subset(name).is_none() {
            warn!("{}: community subset {} not found", config, name);
        }
    }
    community.select(name)
}

/// Hole cards a configuration may draw from, after subset and visibility
/// filters.
pub fn filtered_hole_cards(hand: &PlayerHand, config: &HandConfig) -> Vec<Card> {
    let source: Vec<Card> = match config.hole_filter.subset.as_deref() {
        Some(name) => match hand.subset(name) {
            Some(cards) => cards.to_vec(),
            None => {
                debug!("{}: player has no hole subset {}", config.name, name);
                Vec::new()
            }
        },
        None => hand.cards().to_vec(),
    };
    match config.hole_filter.visibility {
        Some(v) => source.into_iter().filter(|c| v.matches(c)).collect(),
        None => source,
    }
}

/// Finds the best hand `hand` can make under `config`.
///
/// `used_by_source` carries the hole cards the referenced configuration
/// already used, for configurations built from unused cards.
pub fn find_best_hand(
    evaluator: &dyn HandEvaluator,
    hand: &PlayerHand,
    community: &CommunityCards,
    config: &HandConfig,
    used_by_source: Option<&[Card]>,
) -> Option<BestHand> {
    let hand_size = config.evaluation_type.hand_size();
    let mut hole = filtered_hole_cards(hand, config);

    if let CardSelection::UsesUnusedFrom { source, .. } = &config.selection {
        let Some(used) = used_by_source else {
            warn!("{}: no result from {} to take unused cards from", config.name, source);
            return None;
        };
        hole.retain(|c| !used.iter().any(|u| u.same_card(c)));
    }

    if let Some(minimum) = config.minimum_cards {
        if hole.len() < minimum {
            return None;
        }
    }
    if hole.is_empty() {
        if let Some(pip) = config.zero_cards_pip_value {
            return Some(BestHand::empty(pip));
        }
    }

    let mut search = Search {
        evaluator,
        config,
        wild: apply_wild_cards(&config.wild_cards, &hole, community),
        best: None,
    };
    let name = config.name.as_str();

    match &config.selection {
        CardSelection::UsesUnusedFrom {
            community: count,
            community_subset,
            ..
        } => {
            let board = subset_cards(community, community_subset.as_deref(), name);
            search.consider_split(&hole, hole.len(), &board, *count);
        }
        CardSelection::SubsetRequirements { hole: hole_count, requirements } => {
            let hole_count = match hole_count {
                HoleCount::Exactly(n) => *n,
                HoleCount::All => hole.len(),
            };
            let needed = hand_size.saturating_sub(hole_count);
            let pools: Vec<Vec<Card>> = requirements
                .iter()
                .map(|r| subset_cards(community, Some(&r.subset), name))
                .collect();
            let ranges: Vec<Vec<usize>> = requirements
                .iter()
                .zip(&pools)
                .map(|(r, pool)| {
                    let max = r.count.min(pool.len());
                    if r.required {
                        if pool.len() < r.count {
                            Vec::new()
                        } else {
                            vec![r.count]
                        }
                    } else {
                        (0..=max).collect()
                    }
                })
                .collect();
            for counts in cartesian(&ranges) {
                if counts.iter().sum::<usize>() != needed {
                    continue;
                }
                for board in cross_subsets(&pools, &counts) {
                    for hole_combo in combos(&hole, hole_count) {
                        search.consider(&hole_combo, &board);
                    }
                }
            }
        }
        CardSelection::Combinations(list) => {
            for combo in list {
                let board = subset_cards(community, combo.community_subset.as_deref(), name);
                search.consider_split(&hole, combo.hole_cards, &board, combo.community_cards);
            }
        }
        CardSelection::SelectCombinations {
            hole: hole_count,
            community: needed,
            groups,
        } => {
            for group in groups {
                let pools: Vec<Vec<Card>> = group
                    .iter()
                    .map(|s| subset_cards(community, Some(&s.subset), name))
                    .collect();
                let ranges: Vec<Vec<usize>> = group
                    .iter()
                    .zip(&pools)
                    .map(|(s, pool)| (s.min..=s.max.min(pool.len())).collect())
                    .collect();
                for counts in cartesian(&ranges) {
                    if counts.iter().sum::<usize>() != *needed {
                        continue;
                    }
                    for board in cross_subsets(&pools, &counts) {
                        for hole_combo in combos(&hole, *hole_count) {
                            search.consider(&hole_combo, &board);
                        }
                    }
                }
            }
        }
        CardSelection::AnyCards {
            total,
            hole_subsets,
            padding,
        } => {
            let board = community.all();
            if board.is_empty() {
                let take = (*total).min(hole.len());
                for hole_combo in combos(&hole, take) {
                    search.consider(&hole_combo, &[]);
                }
            } else {
                let hole_pools: Vec<Vec<Card>> = if hole_subsets.is_empty() {
                    vec![hole.clone()]
                } else {
                    hole_subsets
                        .iter()
                        .map(|names| {
                            names
                                .iter()
                                .filter_map(|n| hand.subset(n))
                                .flatten()
                                .copied()
                                .collect()
                        })
                        .collect()
                };
                for hole_pool in hole_pools {
                    let mut pool = hole_pool.clone();
                    pool.extend_from_slice(&board);
                    let take = if pool.len() < *total && *padding {
                        pool.len()
                    } else {
                        *total
                    };
                    for combo in combos(&pool, take) {
                        let (from_hole, from_board): (Vec<Card>, Vec<Card>) = combo
                            .into_iter()
                            .partition(|c| hole_pool.iter().any(|h| h == c));
                        search.consider(&from_hole, &from_board);
                    }
                }
            }
        }
        CardSelection::HoleCommunityChoices {
            pairs,
            community_subset,
        } => {
            let board = subset_cards(community, community_subset.as_deref(), name);
            for &(hole_count, count) in pairs {
                search.consider_split(&hole, hole_count, &board, count);
            }
        }
        CardSelection::CommunityCombinations {
            hole: hole_count,
            groups,
            total,
        } => {
            let needed = total.saturating_sub(*hole_count);
            for group in groups {
                let board: Vec<Card> = group
                    .iter()
                    .flat_map(|n| subset_cards(community, Some(n), name))
                    .collect();
                search.consider_split(&hole, *hole_count, &board, needed);
            }
        }
        CardSelection::FixedHoleCommunity {
            hole: hole_count,
            community: count,
            community_subset,
        } => {
            let board = subset_cards(community, community_subset.as_deref(), name);
            match hole_count {
                HoleCount::Exactly(n) => search.consider_split(&hole, *n, &board, *count),
                HoleCount::All => {
                    let count = hand_size.saturating_sub(hole.len()).min(board.len());
                    search.consider_split(&hole, hole.len(), &board, count);
                }
            }
        }
        CardSelection::AllHole => search.consider(&hole, &[]),
    }

    let best = search.finish();
    if best.is_none() {
        debug!("{}: no valid hand from {} hole cards", name, hole.len());
    }
    best
}

/// Every way to take `counts[i]` cards from `pools[i]`, flattened.
fn cross_subsets(pools: &[Vec<Card>], counts: &[usize]) -> Vec<Vec<Card>> {
    let per_pool: Vec<Vec<Vec<Card>>> = pools
        .iter()
        .zip(counts)
        .map(|(pool, &k)| combos(pool, k))
        .collect();
    cartesian(&per_pool)
        .into_iter()
        .map(|parts| parts.into_iter().flatten().collect())
        .collect()
}

/// Cartesian product; zero factors give one empty tuple.
fn cartesian<T: Clone>(factors: &[Vec<T>]) -> Vec<Vec<T>> {
    factors.iter().fold(vec![Vec::new()], |acc, factor| {
        acc.iter()
            .flat_map(|prefix| {
                factor.iter().map(move |item| {
                    let mut next = prefix.clone();
                    next.push(item.clone());
                    next
                })
            })
            .collect()
    })
}

/// Classification tags for a finished hand, e.g. "face" or "butt".
pub fn classify(config: &HandConfig, cards: &[Card]) -> Vec<String> {
    match config.classification {
        Some(ClassificationRule::FaceButt) => {
            let tag = if cards.iter().any(|c| c.rank.is_face()) {
                "face"
            } else {
                "butt"
            };
            vec![tag.to_string()]
        }
        None => Vec::new(),
    }
}
