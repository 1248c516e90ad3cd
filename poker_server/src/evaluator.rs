//! Hand evaluation.
//!
//! The showdown code only sees the [`HandEvaluator`] trait. Rankings follow
//! one convention everywhere: a lower `rank` is a better hand, and ties on
//! `rank` are broken by `ordered_rank`, compared element by element, lower
//! again being better.

use itertools::Itertools;
use poker_protocol::{Card, EvalCard, EvaluationType, HandRanking, Rank, Suit, WildRole};
use std::cmp::Ordering;
use std::fmt;

pub trait HandEvaluator: Send + Sync + fmt::Debug {
    fn evaluate_hand(&self, cards: &[EvalCard], evaluation_type: EvaluationType) -> HandRanking;

    /// `Ordering::Greater` means `a` is the better hand.
    fn compare_hands(
        &self,
        a: &[EvalCard],
        b: &[EvalCard],
        evaluation_type: EvaluationType,
    ) -> Ordering {
        let rank_a = self.evaluate_hand(a, evaluation_type);
        let rank_b = self.evaluate_hand(b, evaluation_type);
        rank_b.strength_cmp(&rank_a)
    }
}

const HAND_SIZE: usize = 5;
/// Filler for missing cards in `ordered_rank`; worse than any real card.
const PAD: u32 = 15;

const FIVE_OF_A_KIND: u32 = 1;
const STRAIGHT_FLUSH: u32 = 2;
const FOUR_OF_A_KIND: u32 = 3;
const FULL_HOUSE: u32 = 4;
const FLUSH: u32 = 5;
const STRAIGHT: u32 = 6;
const THREE_OF_A_KIND: u32 = 7;
const TWO_PAIR: u32 = 8;
const ONE_PAIR: u32 = 9;
const HIGH_CARD: u32 = 10;

/// Evaluator for standard 5-card high and the three common low schemes.
/// Accepts 0 to 5 cards; larger sets are reduced to their best 5-card
/// subset. Wild cards are resolved by trying every substitution.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardEvaluator;

impl StandardEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_natural(&self, cards: &[Card], evaluation_type: EvaluationType) -> HandRanking {
        match evaluation_type {
            EvaluationType::High => self.evaluate_high(cards),
            EvaluationType::A5Low => self.evaluate_low(cards, true, false),
            EvaluationType::A6Low => self.evaluate_low(cards, true, true),
            EvaluationType::TwoSevenLow => self.evaluate_low(cards, false, true),
        }
    }

    fn evaluate_high(&self, cards: &[Card]) -> HandRanking {
        let values: Vec<u8> = cards.iter().map(|c| c.rank.value()).collect();
        let groups = group_values(&values);
        let flush = is_flush(cards);
        let straight = straight_high(&values, true);

        let high_order = |vals: Vec<u8>| -> Vec<u32> {
            let mut order: Vec<u32> = vals.iter().map(|&v| PAD - v as u32).collect();
            order.resize(HAND_SIZE, PAD);
            order
        };
        let group_order = || high_order(groups.iter().map(|&(_, v)| v).collect());

        if let Some(eval) = self.check_straight_flush(straight, flush) {
            return eval;
        }
        match groups.first().map(|&(count, _)| count).unwrap_or(0) {
            5 => ranking(
                FIVE_OF_A_KIND,
                group_order(),
                "Five of a Kind",
                format!("Five {}", plural(groups[0].1)),
            ),
            4 => ranking(
                FOUR_OF_A_KIND,
                group_order(),
                "Four of a Kind",
                format!("Four {}", plural(groups[0].1)),
            ),
            3 if groups.get(1).map(|g| g.0) == Some(2) => ranking(
                FULL_HOUSE,
                group_order(),
                "Full House",
                format!("{} full of {}", plural(groups[0].1), plural(groups[1].1)),
            ),
            _ if flush => ranking(
                FLUSH,
                high_order(sorted_desc(&values)),
                "Flush",
                format!("{}-high Flush", word(values_max(&values))),
            ),
            _ if straight.is_some() => {
                let top = straight.unwrap_or(5);
                ranking(
                    STRAIGHT,
                    high_order(vec![top]),
                    "Straight",
                    format!("{}-high Straight", word(top)),
                )
            }
            3 => ranking(
                THREE_OF_A_KIND,
                group_order(),
                "Three of a Kind",
                format!("Three {}", plural(groups[0].1)),
            ),
            2 if groups.get(1).map(|g| g.0) == Some(2) => ranking(
                TWO_PAIR,
                group_order(),
                "Two Pair",
                format!("{} and {}", plural(groups[0].1), plural(groups[1].1)),
            ),
            2 => ranking(
                ONE_PAIR,
                group_order(),
                "One Pair",
                format!("Pair of {}", plural(groups[0].1)),
            ),
            0 => ranking(HIGH_CARD, high_order(Vec::new()), "No Cards", "No Cards".into()),
            _ => ranking(
                HIGH_CARD,
                high_order(sorted_desc(&values)),
                "High Card",
                format!("{} High", word(values_max(&values))),
            ),
        }
    }

    fn check_straight_flush(&self, straight: Option<u8>, flush: bool) -> Option<HandRanking> {
        let top = straight.filter(|_| flush)?;
        let description = if top == 14 {
            "Royal Flush".to_string()
        } else {
            format!("{}-high Straight Flush", word(top))
        };
        Some(ranking(
            STRAIGHT_FLUSH,
            vec![PAD - top as u32, PAD, PAD, PAD, PAD],
            "Straight Flush",
            description,
        ))
    }

    /// Low schemes. `ace_low` counts aces as 1; `straights_count` makes
    /// straights and flushes bad hands instead of ignoring them.
    fn evaluate_low(&self, cards: &[Card], ace_low: bool, straights_count: bool) -> HandRanking {
        let values: Vec<u8> = cards
            .iter()
            .map(|c| match c.rank {
                Rank::Ace if ace_low => 1,
                r => r.value(),
            })
            .collect();
        let groups = group_values(&values);
        let flush = straights_count && is_flush(cards);
        let straight = if straights_count {
            straight_high(&values, false)
        } else {
            None
        };

        let mut order: Vec<u32> = Vec::with_capacity(HAND_SIZE);
        if cards.len() < HAND_SIZE {
            order.resize(HAND_SIZE - cards.len(), PAD);
        }
        let pattern: Vec<usize> = groups.iter().map(|&(count, _)| count).collect();

        let (rank, name) = match (pattern.as_slice(), straight, flush) {
            (_, Some(_), true) => (9, "Straight Flush"),
            ([5, ..], _, _) => (8, "Five of a Kind"),
            ([4, ..], _, _) => (8, "Four of a Kind"),
            ([3, 2], _, _) => (7, "Full House"),
            (_, _, true) => (6, "Flush"),
            (_, Some(_), _) => (5, "Straight"),
            ([3, ..], _, _) => (4, "Three of a Kind"),
            ([2, 2, ..], _, _) => (3, "Two Pair"),
            ([2, ..], _, _) => (2, "One Pair"),
            _ => (1, "Low"),
        };
        order.extend(groups.iter().map(|&(_, v)| v as u32));

        if cards.is_empty() {
            return ranking(10, order, "No Cards", "No Cards".into());
        }
        let listing = groups
            .iter()
            .flat_map(|&(count, v)| std::iter::repeat(v).take(count))
            .map(short)
            .join("-");
        if rank == 1 {
            let name = format!("{} Low", word(groups[0].1));
            return ranking(1, order, &name, listing);
        }
        ranking(rank, order, name, listing)
    }

    fn substitute(
        &self,
        fixed: &mut Vec<Card>,
        wilds: &[WildRole],
        bug_restricted: bool,
        evaluation_type: EvaluationType,
        best: &mut Option<HandRanking>,
    ) {
        let Some((role, rest)) = wilds.split_first() else {
            let candidate = self.evaluate_natural(fixed, evaluation_type);
            if bug_restricted && !matches!(candidate.rank, STRAIGHT_FLUSH | FLUSH | STRAIGHT) {
                return;
            }
            let better = best
                .as_ref()
                .map_or(true, |b| candidate.strength_cmp(b) == Ordering::Less);
            if better {
                *best = Some(candidate);
            }
            return;
        };

        let mut suits: Vec<Suit> = fixed
            .iter()
            .map(|c| c.suit)
            .filter(|s| *s != Suit::Joker)
            .collect();
        suits.push(Suit::Spades);
        suits.sort();
        suits.dedup();

        for suit in suits {
            for rank in Rank::STANDARD {
                // A bug is an ace unless it completes a straight or flush.
                let restricted = bug_restricted
                    || (*role == WildRole::Bug
                        && evaluation_type == EvaluationType::High
                        && rank != Rank::Ace);
                fixed.push(Card::new(suit, rank));
                self.substitute(fixed, rest, restricted, evaluation_type, best);
                fixed.pop();
            }
        }
    }
}

impl HandEvaluator for StandardEvaluator {
    fn evaluate_hand(&self, cards: &[EvalCard], evaluation_type: EvaluationType) -> HandRanking {
        // Jokers that no rule made wild are dead.
        let live: Vec<EvalCard> = cards
            .iter()
            .filter(|c| c.is_wild() || !c.card.is_joker())
            .copied()
            .collect();

        if live.len() > HAND_SIZE {
            return live
                .iter()
                .copied()
                .combinations(HAND_SIZE)
                .map(|combo| self.evaluate_hand(&combo, evaluation_type))
                .min_by(|a, b| a.strength_cmp(b))
                .unwrap_or_else(|| self.evaluate_natural(&[], evaluation_type));
        }

        let mut naturals: Vec<Card> = live.iter().filter(|c| !c.is_wild()).map(|c| c.card).collect();
        let wilds: Vec<WildRole> = live.iter().filter_map(|c| c.wild).collect();
        if wilds.is_empty() {
            return self.evaluate_natural(&naturals, evaluation_type);
        }

        let mut best = None;
        self.substitute(&mut naturals, &wilds, false, evaluation_type, &mut best);
        best.unwrap_or_else(|| self.evaluate_natural(&naturals, evaluation_type))
    }
}

fn ranking(rank: u32, ordered_rank: Vec<u32>, name: &str, description: String) -> HandRanking {
    HandRanking {
        rank,
        ordered_rank,
        name: name.to_string(),
        description,
    }
}

/// `(count, value)` pairs, largest groups first, then highest value.
fn group_values(values: &[u8]) -> Vec<(usize, u8)> {
    let mut groups: Vec<(usize, u8)> = values
        .iter()
        .copied()
        .sorted()
        .dedup_with_count()
        .collect();
    groups.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
    groups
}

fn sorted_desc(values: &[u8]) -> Vec<u8> {
    values.iter().copied().sorted_by(|a, b| b.cmp(a)).collect()
}

fn values_max(values: &[u8]) -> u8 {
    values.iter().copied().max().unwrap_or(0)
}

fn is_flush(cards: &[Card]) -> bool {
    cards.len() == HAND_SIZE && cards.iter().map(|c| c.suit).all_equal()
}

/// Top card of a five-card straight. `ace_high` also allows the ace to play
/// above the king; an ace valued 1 always plays low.
fn straight_high(values: &[u8], ace_high: bool) -> Option<u8> {
    if values.len() != HAND_SIZE {
        return None;
    }
    let mut ranks: Vec<u8> = values.to_vec();
    ranks.sort_unstable();
    ranks.dedup();
    if ranks.len() != HAND_SIZE {
        return None;
    }
    if ranks[4] - ranks[0] == 4 {
        return Some(ranks[4]);
    }
    // A-2-3-4-5 with the ace counted as 14
    if ace_high && ranks == [2, 3, 4, 5, 14] {
        return Some(5);
    }
    None
}

fn word(value: u8) -> &'static str {
    match value {
        1 | 14 => "Ace",
        2 => "Two",
        3 => "Three",
        4 => "Four",
        5 => "Five",
        6 => "Six",
        7 => "Seven",
        8 => "Eight",
        9 => "Nine",
        10 => "Ten",
        11 => "Jack",
        12 => "Queen",
        13 => "King",
        _ => "Nothing",
    }
}

fn plural(value: u8) -> String {
    match value {
        6 => "Sixes".to_string(),
        v => format!("{}s", word(v)),
    }
}

fn short(value: u8) -> String {
    match value {
        1 | 14 => "A".to_string(),
        11 => "J".to_string(),
        12 => "Q".to_string(),
        13 => "K".to_string(),
        v => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cards(list: &str) -> Vec<EvalCard> {
        list.split_whitespace()
            .map(|s| EvalCard::natural(s.parse().unwrap()))
            .collect()
    }

    fn eval(list: &str, t: EvaluationType) -> HandRanking {
        StandardEvaluator::new().evaluate_hand(&cards(list), t)
    }

    #[test]
    fn test_high_categories() {
        assert_eq!(eval("Ah Kh Qh Jh Th", EvaluationType::High).rank, STRAIGHT_FLUSH);
        assert_eq!(eval("Ah Ad Ac As Kh", EvaluationType::High).rank, FOUR_OF_A_KIND);
        assert_eq!(eval("Kh Kd Kc Qh Qd", EvaluationType::High).rank, FULL_HOUSE);
        assert_eq!(eval("Ah Kh Qh Jh 9h", EvaluationType::High).rank, FLUSH);
        assert_eq!(eval("Th Jd Qc Ks Ah", EvaluationType::High).rank, STRAIGHT);
        assert_eq!(eval("7h 7d 7c Ks 2h", EvaluationType::High).rank, THREE_OF_A_KIND);
        assert_eq!(eval("Ah Ad Kc Ks Qh", EvaluationType::High).rank, TWO_PAIR);
        assert_eq!(eval("Jh Jd Ac Ks Qh", EvaluationType::High).rank, ONE_PAIR);
        assert_eq!(eval("Ah Kd Qc Js 9h", EvaluationType::High).rank, HIGH_CARD);
    }

    #[test]
    fn test_wheel_is_five_high() {
        let wheel = eval("Ah 2d 3c 4s 5h", EvaluationType::High);
        let six_high = eval("2h 3d 4c 5s 6h", EvaluationType::High);
        assert_eq!(wheel.rank, STRAIGHT);
        assert_eq!(six_high.strength_cmp(&wheel), Ordering::Less);
    }

    #[test]
    fn test_compare_hands_greater_means_first_better() {
        let evaluator = StandardEvaluator::new();
        let aces = cards("Ah Ad 7c 4s 2h");
        let kings = cards("Kh Kd 7c 4s 2h");
        assert_eq!(
            evaluator.compare_hands(&aces, &kings, EvaluationType::High),
            Ordering::Greater
        );
        assert_eq!(
            evaluator.compare_hands(&kings, &kings, EvaluationType::High),
            Ordering::Equal
        );
    }

    #[test]
    fn test_short_high_hands() {
        let empty = eval("", EvaluationType::High);
        let one = eval("2c", EvaluationType::High);
        assert_eq!(one.strength_cmp(&empty), Ordering::Less);
        let three = eval("Ah Kd Qc", EvaluationType::High);
        let five = eval("Ah Kd Qc Js 9h", EvaluationType::High);
        assert_eq!(five.strength_cmp(&three), Ordering::Less);
        assert_eq!(eval("9h 9d", EvaluationType::High).rank, ONE_PAIR);
    }

    #[test]
    fn test_a5_low() {
        let wheel = eval("Ah 2d 3c 4s 5h", EvaluationType::A5Low);
        assert_eq!(wheel.rank, 1);
        assert_eq!(wheel.ordered_rank, vec![5, 4, 3, 2, 1]);
        let eight = eval("8h 7d 6c 5s 4h", EvaluationType::A5Low);
        assert_eq!(eight.ordered_rank, vec![8, 7, 6, 5, 4]);
        assert_eq!(wheel.strength_cmp(&eight), Ordering::Less);
        let paired = eval("2h 2d 3c 4s 5h", EvaluationType::A5Low);
        assert_eq!(eight.strength_cmp(&paired), Ordering::Less);
    }

    #[test]
    fn test_deuce_seven_counts_straights_and_aces_high() {
        let seven = eval("7h 5d 4c 3s 2h", EvaluationType::TwoSevenLow);
        let wheel = eval("Ah 2d 3c 4s 5h", EvaluationType::TwoSevenLow);
        let straight = eval("3h 4d 5c 6s 7h", EvaluationType::TwoSevenLow);
        assert_eq!(seven.rank, 1);
        assert_eq!(straight.rank, 5);
        assert_eq!(seven.strength_cmp(&wheel), Ordering::Less);
        assert_eq!(wheel.strength_cmp(&straight), Ordering::Less);
    }

    #[test]
    fn test_a6_low_counts_flushes() {
        let flush = eval("Ah 2h 3h 4h 6h", EvaluationType::A6Low);
        let six = eval("Ah 2d 3c 4s 6h", EvaluationType::A6Low);
        assert_eq!(flush.rank, 6);
        assert_eq!(six.strength_cmp(&flush), Ordering::Less);
    }

    #[test]
    fn test_wild_card_makes_best_hand() {
        let evaluator = StandardEvaluator::new();
        let mut hand = cards("Ah Ad Ac Ks");
        hand.push(EvalCard {
            card: Card::joker(),
            wild: Some(WildRole::Wild),
        });
        let result = evaluator.evaluate_hand(&hand, EvaluationType::High);
        assert_eq!(result.rank, FOUR_OF_A_KIND);
    }

    #[test]
    fn test_bug_is_ace_or_completes_straight() {
        let evaluator = StandardEvaluator::new();
        let bug = EvalCard {
            card: Card::joker(),
            wild: Some(WildRole::Bug),
        };

        let mut pair = cards("Kh Kd 7c 4s");
        pair.push(bug);
        let result = evaluator.evaluate_hand(&pair, EvaluationType::High);
        assert_eq!(result.rank, ONE_PAIR);
        assert_eq!(result.ordered_rank[0], PAD - 13);

        let mut draw = cards("9h Td Jc Qs");
        draw.push(bug);
        assert_eq!(
            evaluator.evaluate_hand(&draw, EvaluationType::High).rank,
            STRAIGHT
        );
    }

    #[test]
    fn test_unmarked_joker_is_dead() {
        let evaluator = StandardEvaluator::new();
        let mut hand = cards("Ah Kd Qc Js");
        hand.push(EvalCard::natural(Card::joker()));
        let result = evaluator.evaluate_hand(&hand, EvaluationType::High);
        assert_eq!(result.rank, HIGH_CARD);
    }

    #[test]
    fn test_more_than_five_cards_uses_best_five() {
        let result = eval("2c 7d Ah Kh Qh Jh Th", EvaluationType::High);
        assert_eq!(result.rank, STRAIGHT_FLUSH);
        assert_eq!(result.description, "Royal Flush");
    }
}
