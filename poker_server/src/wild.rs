//! Wild-card marking.
//!
//! Cards are never modified. A [`WildAssignment`] is resolved per player
//! from the configured rules and then used to produce [`EvalCard`]s, so the
//! same community card can be wild for one configuration and natural for
//! another.

use log::warn;
use poker_protocol::{Card, CommunityCards, EvalCard, Visibility, WildCardRule, WildRole};

#[derive(Debug, Clone, Default)]
pub struct WildAssignment {
    rules: Vec<WildCardRule>,
    /// Specific cards picked by the "lowest card" rules
    chosen: Vec<(Card, WildRole)>,
}

impl WildAssignment {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn mark(&self, card: Card) -> EvalCard {
        for rule in &self.rules {
            let role = match rule {
                WildCardRule::Joker { role } if card.is_joker() => Some(*role),
                WildCardRule::Rank { rank, role } if card.rank == *rank => Some(*role),
                WildCardRule::ConditionalJoker { face_up, face_down } if card.is_joker() => {
                    Some(if card.face_up { *face_up } else { *face_down })
                }
                WildCardRule::LowestCommunity { .. } | WildCardRule::LowestHole { .. } => self
                    .chosen
                    .iter()
                    .find(|(c, _)| c.same_card(&card) && c.face_up == card.face_up)
                    .map(|(_, role)| *role),
                _ => None,
            };
            if role.is_some() {
                return EvalCard { card, wild: role };
            }
        }
        EvalCard::natural(card)
    }

    pub fn mark_all(&self, cards: &[Card]) -> Vec<EvalCard> {
        cards.iter().map(|&c| self.mark(c)).collect()
    }
}

/// Resolves `rules` for one player's hole cards against the shared board.
pub fn apply_wild_cards(
    rules: &[WildCardRule],
    hole: &[Card],
    community: &CommunityCards,
) -> WildAssignment {
    let mut chosen = Vec::new();
    for rule in rules {
        match rule {
            WildCardRule::LowestCommunity { subset, role } => {
                let cards = community.select(subset.as_deref());
                if cards.is_empty() {
                    warn!(
                        "Wild rule lowest_community found no cards in subset {:?}",
                        subset
                    );
                }
                if let Some(card) = lowest(&cards, None) {
                    chosen.push((card, *role));
                }
            }
            WildCardRule::LowestHole { visibility, role } => {
                if let Some(card) = lowest(hole, *visibility) {
                    chosen.push((card, *role));
                }
            }
            _ => {}
        }
    }
    WildAssignment {
        rules: rules.to_vec(),
        chosen,
    }
}

/// First dealt card among the lowest rank. Jokers are never "lowest".
fn lowest(cards: &[Card], visibility: Option<Visibility>) -> Option<Card> {
    cards
        .iter()
        .filter(|c| !c.is_joker())
        .filter(|c| visibility.map_or(true, |v| v.matches(c)))
        .fold(None, |low: Option<Card>, c| match low {
            Some(l) if l.rank <= c.rank => Some(l),
            _ => Some(*c),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use poker_protocol::Rank;

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    #[test]
    fn test_joker_and_rank_rules() {
        let rules = vec![
            WildCardRule::Joker {
                role: WildRole::Wild,
            },
            WildCardRule::Rank {
                rank: Rank::Two,
                role: WildRole::Wild,
            },
        ];
        let wild = apply_wild_cards(&rules, &[], &CommunityCards::new());
        assert!(wild.mark(Card::joker()).is_wild());
        assert!(wild.mark(card("2d")).is_wild());
        assert!(!wild.mark(card("3d")).is_wild());
    }

    #[test]
    fn test_lowest_community_marks_single_card() {
        let mut board = CommunityCards::new();
        board.push("default", card("9h"));
        board.push("default", card("4c"));
        board.push("default", card("4d"));
        let rules = vec![WildCardRule::LowestCommunity {
            subset: None,
            role: WildRole::Wild,
        }];
        let wild = apply_wild_cards(&rules, &[], &board);
        let marked = wild.mark_all(&board.all());
        assert_eq!(marked.iter().filter(|c| c.is_wild()).count(), 1);
        assert!(marked[1].is_wild());
    }

    #[test]
    fn test_lowest_hole_respects_visibility() {
        let hole = vec![
            card("2c"),
            card("5h").with_face_up(true),
            card("9s").with_face_up(true),
        ];
        let rules = vec![WildCardRule::LowestHole {
            visibility: Some(Visibility::FaceUp),
            role: WildRole::Wild,
        }];
        let wild = apply_wild_cards(&rules, &hole, &CommunityCards::new());
        let marked = wild.mark_all(&hole);
        assert!(!marked[0].is_wild());
        assert!(marked[1].is_wild());
        assert!(!marked[2].is_wild());
    }

    #[test]
    fn test_conditional_joker() {
        let rules = vec![WildCardRule::ConditionalJoker {
            face_up: WildRole::Bug,
            face_down: WildRole::Wild,
        }];
        let wild = apply_wild_cards(&rules, &[], &CommunityCards::new());
        assert_eq!(
            wild.mark(Card::joker().with_face_up(true)).wild,
            Some(WildRole::Bug)
        );
        assert_eq!(wild.mark(Card::joker()).wild, Some(WildRole::Wild));
    }

    #[test]
    fn test_marking_leaves_source_cards_untouched() {
        let board_card = card("2h");
        let rules = vec![WildCardRule::Rank {
            rank: Rank::Two,
            role: WildRole::Wild,
        }];
        let marked = apply_wild_cards(&rules, &[], &CommunityCards::new()).mark(board_card);
        assert!(marked.is_wild());
        assert_eq!(marked.card, board_card);
        assert!(WildAssignment::none().mark(board_card).wild.is_none());
    }
}
