//! Showdown resolution: turns a finished hand into a [`GameResult`].
//!
//! Every hand configuration owns an equal share of every pot. Shares are
//! awarded per pot, side pots before the main pot, to the best qualifying
//! eligible hands; shares nobody wins are reallocated so the full pot is
//! always paid out.

use log::{debug, error, info, warn};
use poker_protocol::rules::{
    ActionCondition, CardPool, CriterionKind, DefaultActionKind, GlobalAction, HandCondition,
    SpecialCriterion, SuitSource,
};
use poker_protocol::{
    Card, CommunityCards, Declaration, DeclarationMode, GameResult, HandConfig, HandResult,
    PlayerHand, PlayerId, PlayerState, PotResult, PotType, ShowdownRules, Suit,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::evaluator::HandEvaluator;
use crate::hand_search::{classify, find_best_hand, BestHand};
use crate::pot::PotLedger;

/// Key used for the main pot in declaration maps.
pub const MAIN_POT_KEY: i32 = -1;

pub type PotDeclarations = HashMap<i32, HashMap<PlayerId, Declaration>>;

/// A seated player as the showdown sees them.
#[derive(Debug, Clone)]
pub struct ShowdownPlayer {
    pub id: PlayerId,
    pub name: String,
    pub stack: i64,
    pub is_active: bool,
    pub hand: PlayerHand,
}

impl From<&PlayerState> for ShowdownPlayer {
    fn from(player: &PlayerState) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            stack: player.stack,
            is_active: player.is_active,
            hand: player.hand.clone(),
        }
    }
}

/// Table state at showdown. Players are listed in seat order, which is also
/// the order odd chips are handed out within a split.
pub struct ShowdownTable<'a> {
    pub players: Vec<ShowdownPlayer>,
    pub community: &'a CommunityCards,
    pub pots: &'a dyn PotLedger,
    /// Table-wide choices made earlier in the hand, subject -> value
    pub choices: &'a BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
struct PotSlot {
    pot_type: PotType,
    side_pot_index: Option<usize>,
    amount: i64,
    eligible: BTreeSet<PlayerId>,
}

impl PotSlot {
    fn declaration_key(&self) -> i32 {
        self.side_pot_index.map_or(MAIN_POT_KEY, |i| i as i32)
    }

    fn award(&self, amount: i64, winners: Vec<PlayerId>, hand_type: &str) -> PotResult {
        PotResult {
            amount,
            winners,
            pot_type: self.pot_type,
            hand_type: hand_type.to_string(),
            side_pot_index: self.side_pot_index,
            eligible_players: self.eligible.clone(),
            reason: None,
            best_hands: Vec::new(),
            declarations: BTreeMap::new(),
        }
    }
}

/// One player's best hand under one configuration.
struct Candidate {
    player_id: PlayerId,
    best: BestHand,
    result: HandResult,
}

/// Pot shares a configuration won or left open.
#[derive(Default)]
struct SlotAwards {
    /// Indices into `GameResult::pots`
    awarded: Vec<usize>,
    unawarded: Vec<(String, i64)>,
}

#[derive(Debug)]
pub struct ShowdownManager {
    rules: ShowdownRules,
    evaluator: Arc<dyn HandEvaluator>,
    declarations: PotDeclarations,
}

impl ShowdownManager {
    pub fn new(rules: ShowdownRules, evaluator: Arc<dyn HandEvaluator>) -> Self {
        Self {
            rules,
            evaluator,
            declarations: HashMap::new(),
        }
    }

    pub fn rules(&self) -> &ShowdownRules {
        &self.rules
    }

    /// Declarations per pot (`MAIN_POT_KEY` for the main pot), consumed by
    /// the declare path.
    pub fn set_declarations(&mut self, declarations: PotDeclarations) {
        self.declarations = declarations;
    }

    pub fn clear_declarations(&mut self) {
        self.declarations.clear();
    }

    pub fn handle_showdown(&self, table: &ShowdownTable) -> GameResult {
        let active: Vec<&ShowdownPlayer> = table.players.iter().filter(|p| p.is_active).collect();
        if active.is_empty() {
            debug!("Showdown with no active players");
            return GameResult::empty_complete();
        }

        let mut result = if self.rules.declaration_mode == DeclarationMode::Declare {
            match self.handle_declare(table, &active) {
                Some(result) => result,
                None => return GameResult::empty_complete(),
            }
        } else {
            self.handle_cards_speak(table, &active)
        };

        result.is_complete = true;
        check_conservation(&result, table.pots.total_pot());
        result
    }

    /// Awards the whole pot to the only player left in the hand.
    pub fn handle_fold_win(&self, table: &ShowdownTable) -> GameResult {
        let active: Vec<&ShowdownPlayer> = table.players.iter().filter(|p| p.is_active).collect();
        let [winner] = active.as_slice() else {
            warn!(
                "Fold win requested with {} active players, running full showdown",
                active.len()
            );
            return self.handle_showdown(table);
        };

        let uncontested = HandResult::uncontested(winner.id.clone());
        let total = table.pots.total_pot();
        let mut result = GameResult::empty_complete();
        result.pots.push(PotResult {
            amount: total,
            winners: vec![winner.id.clone()],
            pot_type: PotType::Main,
            hand_type: uncontested.hand_type.clone(),
            side_pot_index: None,
            eligible_players: BTreeSet::from([winner.id.clone()]),
            reason: Some("All other players folded".to_string()),
            best_hands: vec![uncontested.clone()],
            declarations: BTreeMap::new(),
        });
        result
            .hands
            .insert(winner.id.clone(), vec![uncontested.clone()]);
        result.winning_hands.push(uncontested);
        info!("{} wins {} uncontested", winner.name, total);
        result
    }

    fn handle_cards_speak(&self, table: &ShowdownTable, active: &[&ShowdownPlayer]) -> GameResult {
        let slots = pot_slots(table.pots, active, false);
        let configs = self.select_configs(table, active);
        let mut result = GameResult::default();

        if self.award_configs(table, active, configs, &slots, &mut result) {
            return result;
        }

        let global = self
            .rules
            .global_default_action
            .as_ref()
            .filter(|g| g.condition == ActionCondition::NoQualifierMet);
        match global.map(|g| &g.action) {
            Some(GlobalAction::SplitPot) => {
                info!("No qualifying hands, splitting every pot");
                split_slots(&slots, active, "Split Pot", "no qualifying hands", &mut result);
            }
            Some(GlobalAction::BestHand { best_hand }) => {
                info!("No qualifying hands, re-evaluating with fallback hands");
                result.pots.clear();
                if !self.award_configs(table, active, best_hand, &slots, &mut result) {
                    warn!("Fallback hands produced no winner, splitting every pot");
                    split_slots(&slots, active, "Split Pot", "no qualifying hands", &mut result);
                }
            }
            None => {
                warn!("No configuration produced a winner and no global default is set");
                split_slots(&slots, active, "Split Pot", "no qualifying hands", &mut result);
            }
        }
        result
    }

    fn select_configs<'a>(
        &'a self,
        table: &ShowdownTable,
        active: &[&ShowdownPlayer],
    ) -> &'a [HandConfig] {
        for conditional in &self.rules.conditional_best_hands {
            if condition_matches(&conditional.condition, table, active) {
                debug!("Using conditional hands for {:?}", conditional.condition);
                return &conditional.best_hand;
            }
        }
        match &self.rules.default_best_hand {
            Some(default) => default,
            None => &self.rules.best_hand,
        }
    }

    /// Runs every configuration against every pot. Returns whether any
    /// share found a winner; unawarded shares are already reallocated.
    fn award_configs(
        &self,
        table: &ShowdownTable,
        active: &[&ShowdownPlayer],
        configs: &[HandConfig],
        slots: &[PotSlot],
        result: &mut GameResult,
    ) -> bool {
        if configs.is_empty() {
            warn!("Showdown rules have no hand configurations");
            return false;
        }

        let shares: Vec<Vec<i64>> = slots
            .iter()
            .map(|slot| split_shares(slot.amount, configs))
            .collect();
        let mut awards: Vec<SlotAwards> = slots.iter().map(|_| SlotAwards::default()).collect();
        let mut used: HashMap<(String, PlayerId), Vec<Card>> = HashMap::new();

        for (ci, config) in configs.iter().enumerate() {
            let candidates = self.evaluate_config(table, active, config, &mut used, result);
            let qualified: Vec<&Candidate> = candidates
                .iter()
                .filter(|c| {
                    config
                        .qualifier
                        .as_ref()
                        .map_or(true, |q| q.admits(c.best.ranking.rank, &c.best.ranking.ordered_rank))
                })
                .collect();

            for (si, slot) in slots.iter().enumerate() {
                let share = shares[si][ci];
                if share == 0 {
                    continue;
                }
                let contenders: Vec<&Candidate> = qualified
                    .iter()
                    .copied()
                    .filter(|c| slot.eligible.contains(&c.player_id))
                    .collect();
                let winners = self.find_winners(&contenders, config);

                let pot = if !winners.is_empty() {
                    let mut pot = slot.award(
                        share,
                        winners.iter().map(|c| c.player_id.clone()).collect(),
                        &config.name,
                    );
                    pot.best_hands = winners.iter().map(|c| c.result.clone()).collect();
                    for winner in &winners {
                        if !result.winning_hands.contains(&winner.result) {
                            result.winning_hands.push(winner.result.clone());
                        }
                    }
                    Some(pot)
                } else {
                    self.apply_default_action(table, active, config, slot, share)
                };

                match pot {
                    Some(pot) => {
                        awards[si].awarded.push(result.pots.len());
                        result.pots.push(pot);
                    }
                    None => {
                        debug!("{}: {} share of {} pot unawarded", config.name, share, slot.pot_type);
                        awards[si].unawarded.push((config.name.clone(), share));
                    }
                }
            }
        }

        if awards.iter().all(|a| a.awarded.is_empty()) {
            return false;
        }
        for (slot, award) in slots.iter().zip(&awards) {
            reallocate(slot, award, active, result);
        }
        true
    }

    /// Best hand of every active player under `config`, recorded into the
    /// result's per-player hands.
    fn evaluate_config(
        &self,
        table: &ShowdownTable,
        active: &[&ShowdownPlayer],
        config: &HandConfig,
        used: &mut HashMap<(String, PlayerId), Vec<Card>>,
        result: &mut GameResult,
    ) -> Vec<Candidate> {
        let source = match &config.selection {
            poker_protocol::CardSelection::UsesUnusedFrom { source, .. } => Some(source.as_str()),
            _ => None,
        };

        let mut candidates = Vec::new();
        for player in active {
            let used_by_source = source
                .and_then(|s| used.get(&(s.to_string(), player.id.clone())))
                .map(Vec::as_slice);
            let Some(best) = find_best_hand(
                self.evaluator.as_ref(),
                &player.hand,
                table.community,
                config,
                used_by_source,
            ) else {
                debug!("{} has no valid {}", player.name, config.name);
                continue;
            };
            used.insert(
                (config.name.clone(), player.id.clone()),
                best.used_hole_cards.clone(),
            );
            let hand_result = HandResult {
                player_id: player.id.clone(),
                cards: best.cards.clone(),
                rank: best.ranking.rank,
                ordered_rank: best.ranking.ordered_rank.clone(),
                hand_name: best.ranking.name.clone(),
                hand_description: best.ranking.description.clone(),
                hand_type: config.name.clone(),
                evaluation_type: Some(config.evaluation_type),
                used_hole_cards: best.used_hole_cards.clone(),
                classifications: classify(config, &best.cards),
            };
            result
                .hands
                .entry(player.id.clone())
                .or_default()
                .push(hand_result.clone());
            candidates.push(Candidate {
                player_id: player.id.clone(),
                best,
                result: hand_result,
            });
        }
        candidates
    }

    fn apply_default_action(
        &self,
        table: &ShowdownTable,
        active: &[&ShowdownPlayer],
        config: &HandConfig,
        slot: &PotSlot,
        share: i64,
    ) -> Option<PotResult> {
        let action = self
            .rules
            .default_actions
            .iter()
            .find(|a| a.condition == ActionCondition::NoQualifierMet && a.applies_to(&config.name))?;
        match &action.action {
            DefaultActionKind::LeaveUnawarded => None,
            DefaultActionKind::EvaluateSpecial { criterion } => {
                let eligible: Vec<&ShowdownPlayer> = active
                    .iter()
                    .copied()
                    .filter(|p| slot.eligible.contains(&p.id))
                    .collect();
                let (winners, reason) = special_winners(criterion, &eligible, table.community)?;
                let mut pot = slot.award(share, winners, &config.name);
                pot.reason = Some(format!("no qualifying {}; {}", config.name, reason));
                Some(pot)
            }
        }
    }

    /// Every candidate tied for best. Classification priority decides first,
    /// then the evaluator.
    fn find_winners<'c>(&self, candidates: &[&'c Candidate], config: &HandConfig) -> Vec<&'c Candidate> {
        let mut winners: Vec<&Candidate> = Vec::new();
        for &candidate in candidates {
            let ordering = match winners.first() {
                None => Ordering::Greater,
                Some(best) => self.compare(candidate, best, config),
            };
            match ordering {
                Ordering::Greater => winners = vec![candidate],
                Ordering::Equal => winners.push(candidate),
                Ordering::Less => {}
            }
        }
        winners
    }

    /// `Greater` when `a` beats `b`.
    fn compare(&self, a: &Candidate, b: &Candidate, config: &HandConfig) -> Ordering {
        let (ca, cb) = (self.class_index(a), self.class_index(b));
        if ca != cb {
            return cb.cmp(&ca);
        }
        if a.best.marked.is_empty() || b.best.marked.is_empty() {
            return b.best.ranking.strength_cmp(&a.best.ranking);
        }
        self.evaluator
            .compare_hands(&a.best.marked, &b.best.marked, config.evaluation_type)
    }

    fn class_index(&self, candidate: &Candidate) -> usize {
        let priority = &self.rules.classification_priority;
        candidate
            .result
            .classifications
            .iter()
            .filter_map(|tag| priority.iter().position(|p| p == tag))
            .min()
            .unwrap_or(priority.len())
    }

    /// Hi-lo with declarations. Returns `None` when the rules cannot support
    /// a declare showdown.
    fn handle_declare(&self, table: &ShowdownTable, active: &[&ShowdownPlayer]) -> Option<GameResult> {
        let configs = &self.rules.best_hand;
        if configs.len() != 2 {
            error!(
                "Declare showdown needs exactly two hand configurations, found {}",
                configs.len()
            );
            return None;
        }
        let (high, low) = if configs[0].evaluation_type.is_low() && !configs[1].evaluation_type.is_low() {
            (&configs[1], &configs[0])
        } else {
            (&configs[0], &configs[1])
        };

        let mut result = GameResult::default();
        let mut used = HashMap::new();
        let high_hands = self.evaluate_config(table, active, high, &mut used, &mut result);
        let low_hands = self.evaluate_config(table, active, low, &mut used, &mut result);
        let qualifies = |config: &HandConfig, c: &Candidate| {
            config
                .qualifier
                .as_ref()
                .map_or(true, |q| q.admits(c.best.ranking.rank, &c.best.ranking.ordered_rank))
        };

        for slot in pot_slots(table.pots, active, true) {
            if slot.amount == 0 {
                continue;
            }
            let declared: BTreeMap<PlayerId, Declaration> = self
                .declarations
                .get(&slot.declaration_key())
                .map(|d| {
                    d.iter()
                        .filter(|(id, _)| slot.eligible.contains(*id))
                        .map(|(id, d)| (id.clone(), *d))
                        .collect()
                })
                .unwrap_or_default();
            let declaration = |id: &PlayerId| declared.get(id).copied();

            let high_side: Vec<&Candidate> = high_hands
                .iter()
                .filter(|c| declaration(&c.player_id).is_some_and(Declaration::contests_high))
                .filter(|c| qualifies(high, *c))
                .collect();
            let low_side: Vec<&Candidate> = low_hands
                .iter()
                .filter(|c| declaration(&c.player_id).is_some_and(Declaration::contests_low))
                .filter(|c| qualifies(low, *c))
                .collect();
            let best_high = ids(&self.find_winners(&high_side, high));
            let best_low = ids(&self.find_winners(&low_side, low));

            // A high_low declarer must win (or tie) both ways.
            let scoops: BTreeSet<PlayerId> = best_high
                .iter()
                .filter(|id| declaration(*id) == Some(Declaration::HighLow) && best_low.contains(*id))
                .cloned()
                .collect();
            let side_winners = |best: &[PlayerId], side: &[&Candidate], config: &HandConfig, pure: Declaration| {
                let winners: Vec<PlayerId> = best
                    .iter()
                    .filter(|id| declaration(*id) == Some(pure) || scoops.contains(*id))
                    .cloned()
                    .collect();
                if !winners.is_empty() {
                    return winners;
                }
                let pure_side: Vec<&Candidate> = side
                    .iter()
                    .copied()
                    .filter(|c| declaration(&c.player_id) == Some(pure))
                    .collect();
                ids(&self.find_winners(&pure_side, config))
            };
            let high_winners =
                side_winners(best_high.as_slice(), high_side.as_slice(), high, Declaration::High);
            let low_winners =
                side_winners(best_low.as_slice(), low_side.as_slice(), low, Declaration::Low);

            let high_amount = slot.amount - slot.amount / 2;
            let low_amount = slot.amount / 2;
            let mut awards = Vec::new();
            match (high_winners.is_empty(), low_winners.is_empty()) {
                (false, false) => {
                    awards.push((high_amount, high_winners, high, "high half"));
                    awards.push((low_amount, low_winners, low, "low half"));
                }
                (false, true) => awards.push((
                    slot.amount,
                    high_winners,
                    high,
                    "reallocated: no valid low declaration",
                )),
                (true, false) => awards.push((
                    slot.amount,
                    low_winners,
                    low,
                    "reallocated: no valid high declaration",
                )),
                (true, true) => {
                    let everyone: Vec<PlayerId> = seat_order(active, &slot.eligible);
                    let mut pot = slot.award(slot.amount, everyone, "Split Pot");
                    pot.reason = Some("no valid declarations; split among eligible".to_string());
                    pot.declarations = declared.clone();
                    result.pots.push(pot);
                    continue;
                }
            }

            for (amount, winners, config, reason) in awards {
                let backing: Vec<HandResult> = (if std::ptr::eq(config, high) { &high_hands } else { &low_hands })
                    .iter()
                    .filter(|c| winners.contains(&c.player_id))
                    .map(|c| c.result.clone())
                    .collect();
                for hand in &backing {
                    if !result.winning_hands.contains(hand) {
                        result.winning_hands.push(hand.clone());
                    }
                }
                let mut pot = slot.award(amount, winners, &config.name);
                pot.reason = Some(reason.to_string());
                pot.best_hands = backing;
                pot.declarations = declared.clone();
                result.pots.push(pot);
            }
        }
        Some(result)
    }
}

fn ids(candidates: &[&Candidate]) -> Vec<PlayerId> {
    candidates.iter().map(|c| c.player_id.clone()).collect()
}

/// Eligible ids in seat order.
fn seat_order(active: &[&ShowdownPlayer], eligible: &BTreeSet<PlayerId>) -> Vec<PlayerId> {
    active
        .iter()
        .filter(|p| eligible.contains(&p.id))
        .map(|p| p.id.clone())
        .collect()
}

fn pot_slots(pots: &dyn PotLedger, active: &[&ShowdownPlayer], main_first: bool) -> Vec<PotSlot> {
    let live: BTreeSet<PlayerId> = active.iter().map(|p| p.id.clone()).collect();
    let main = PotSlot {
        pot_type: PotType::Main,
        side_pot_index: None,
        amount: pots.main_pot_amount(),
        eligible: pots
            .main_pot_eligible_players()
            .intersection(&live)
            .cloned()
            .collect(),
    };
    let mut slots: Vec<PotSlot> = (0..pots.side_pot_count())
        .map(|i| PotSlot {
            pot_type: PotType::Side,
            side_pot_index: Some(i),
            amount: pots.side_pot_amount(i),
            eligible: pots
                .side_pot_eligible_players(i)
                .intersection(&live)
                .cloned()
                .collect(),
        })
        .collect();
    if main_first {
        slots.insert(0, main);
    } else {
        slots.push(main);
    }
    slots
}

/// Each configuration's share of `amount`. With two configurations the odd
/// chip follows [`odd_chip_index`]; otherwise remainder chips go one each to
/// configurations in listed order.
fn split_shares(amount: i64, configs: &[HandConfig]) -> Vec<i64> {
    let n = configs.len() as i64;
    let mut shares = vec![amount / n; configs.len()];
    let remainder = (amount % n) as usize;
    if configs.len() == 2 && remainder == 1 {
        shares[odd_chip_index(&configs[0], &configs[1])] += 1;
    } else {
        for share in shares.iter_mut().take(remainder) {
            *share += 1;
        }
    }
    shares
}

/// Which of two configurations takes the odd chip of a split pot.
pub fn odd_chip_index(a: &HandConfig, b: &HandConfig) -> usize {
    match (a.evaluation_type.is_low(), b.evaluation_type.is_low()) {
        (false, true) => return 0,
        (true, false) => return 1,
        _ => {}
    }

    let (cards_a, cards_b) = (a.required_cards(), b.required_cards());
    if cards_a != cards_b {
        if cards_a == 5 {
            return 0;
        }
        if cards_b == 5 {
            return 1;
        }
    }

    let (name_a, name_b) = (name_precedence(&a.name), name_precedence(&b.name));
    if name_a != name_b {
        return if name_a > name_b { 0 } else { 1 };
    }

    if cards_b > cards_a {
        1
    } else {
        0
    }
}

fn name_precedence(name: &str) -> u8 {
    let name = name.to_ascii_lowercase();
    if name.contains("draw") {
        3
    } else if name.contains("omaha") {
        2
    } else if name.contains("hold'em") || name.contains("holdem") {
        1
    } else {
        0
    }
}

/// Pays shares nobody won in a pot to the configurations that did win part
/// of that pot. A pot nobody won at all is split among its eligible players
/// in seat order.
fn reallocate(slot: &PotSlot, award: &SlotAwards, active: &[&ShowdownPlayer], result: &mut GameResult) {
    let open: i64 = award.unawarded.iter().map(|(_, amount)| amount).sum();
    if open == 0 {
        return;
    }
    let missing = award
        .unawarded
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    if award.awarded.is_empty() {
        warn!("{} pot had no winner for any hand, splitting {}", slot.pot_type, open);
        let mut pot = slot.award(open, seat_order(active, &slot.eligible), "Split Pot");
        pot.reason = Some(format!("no qualifying {} for this pot", missing));
        result.pots.push(pot);
        return;
    }

    let count = award.awarded.len() as i64;
    for (i, &index) in award.awarded.iter().enumerate() {
        let amount = open / count + if (i as i64) < open % count { 1 } else { 0 };
        if amount == 0 {
            continue;
        }
        let source = &result.pots[index];
        let mut pot = slot.award(amount, source.winners.clone(), &source.hand_type);
        pot.best_hands = source.best_hands.clone();
        pot.reason = Some(format!("reallocated: no qualifying {}", missing));
        result.pots.push(pot);
    }
}

fn split_slots(
    slots: &[PotSlot],
    active: &[&ShowdownPlayer],
    hand_type: &str,
    reason: &str,
    result: &mut GameResult,
) {
    for slot in slots.iter().filter(|s| s.amount > 0) {
        let mut pot = slot.award(slot.amount, seat_order(active, &slot.eligible), hand_type);
        pot.reason = Some(reason.to_string());
        result.pots.push(pot);
    }
}

fn check_conservation(result: &GameResult, total_pot: i64) {
    let awarded = result.total_awarded();
    if awarded != total_pot {
        error!(
            "Pot mismatch: awarded {} but pot before showdown was {}",
            awarded, total_pot
        );
    }
}

fn community_card(community: &CommunityCards, subset: Option<&str>, index: Option<usize>) -> Option<Card> {
    let cards = community.select(subset);
    let card = match index {
        Some(i) => cards.get(i).copied(),
        None => cards.last().copied(),
    };
    if card.is_none() {
        warn!("No community card at {:?}[{:?}]", subset, index);
    }
    card
}

fn condition_matches(condition: &HandCondition, table: &ShowdownTable, active: &[&ShowdownPlayer]) -> bool {
    match condition {
        HandCondition::PlayerChoice { subject, value } => {
            table.choices.get(subject).is_some_and(|v| v == value)
        }
        HandCondition::HandSize { min, max } => active
            .iter()
            .all(|p| (*min..=*max).contains(&p.hand.len())),
        HandCondition::CommunityCardRank {
            subset,
            index,
            ranks,
        } => community_card(table.community, subset.as_deref(), *index)
            .is_some_and(|c| ranks.contains(&c.rank)),
        HandCondition::CommunityCardSuit {
            subset,
            index,
            suits,
        } => community_card(table.community, subset.as_deref(), *index)
            .is_some_and(|c| suits.contains(&c.suit)),
        HandCondition::BoardColor {
            subset,
            color,
            min_count,
        } => {
            let count = table
                .community
                .select(subset.as_deref())
                .iter()
                .filter(|c| c.suit.color() == *color)
                .count();
            count >= *min_count
        }
    }
}

/// Players holding the best card of the criterion's suit, with a reason
/// string for the award.
fn special_winners(
    criterion: &SpecialCriterion,
    players: &[&ShowdownPlayer],
    community: &CommunityCards,
) -> Option<(Vec<PlayerId>, String)> {
    let suit: Suit = match &criterion.suit {
        SuitSource::Fixed { suit } => *suit,
        SuitSource::CommunityCard { subset, index } => {
            community_card(community, subset.as_deref(), *index)?.suit
        }
    };
    let board = community.all();

    let mut best: Option<u8> = None;
    let mut winners = Vec::new();
    for player in players {
        let mut pool: Vec<Card> = player.hand.cards().to_vec();
        if criterion.from == CardPool::AllCards {
            pool.extend_from_slice(&board);
        }
        let values = pool.iter().filter(|c| c.suit == suit).map(|c| c.rank.value());
        let value = match criterion.kind {
            CriterionKind::HighestOfSuit => values.max(),
            CriterionKind::LowestOfSuit => values.min(),
        };
        let Some(value) = value else { continue };
        let better = match (best, criterion.kind) {
            (None, _) => Ordering::Greater,
            (Some(b), CriterionKind::HighestOfSuit) => value.cmp(&b),
            (Some(b), CriterionKind::LowestOfSuit) => b.cmp(&value),
        };
        match better {
            Ordering::Greater => {
                best = Some(value);
                winners = vec![player.id.clone()];
            }
            Ordering::Equal => winners.push(player.id.clone()),
            Ordering::Less => {}
        }
    }
    if winners.is_empty() {
        debug!("Nobody holds a {:?} for the special award", suit);
        return None;
    }

    let kind = match criterion.kind {
        CriterionKind::HighestOfSuit => "highest",
        CriterionKind::LowestOfSuit => "lowest",
    };
    let pool = match criterion.from {
        CardPool::HoleCards => "hole cards",
        CardPool::AllCards => "all cards",
    };
    let reason = format!("{} {} in {}", kind, format!("{:?}", suit).to_lowercase(), pool);
    Some((winners, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::StandardEvaluator;
    use crate::pot::{Pot, PotSnapshot};
    use poker_protocol::rules::{
        ConditionalBestHand, DefaultAction, GlobalDefaultAction,
    };
    use poker_protocol::{EvalCard, EvaluationType, HandRanking, DEFAULT_COMMUNITY_SUBSET};

    /// Ranks players by a fixed table keyed on their first card.
    #[derive(Debug)]
    struct ScriptedEvaluator {
        ranks: HashMap<Card, u32>,
    }

    impl ScriptedEvaluator {
        fn new(ranks: &[(&str, u32)]) -> Arc<Self> {
            Arc::new(Self {
                ranks: ranks.iter().map(|(c, r)| (card(c), *r)).collect(),
            })
        }
    }

    impl HandEvaluator for ScriptedEvaluator {
        fn evaluate_hand(&self, cards: &[EvalCard], _: EvaluationType) -> HandRanking {
            let rank = cards
                .first()
                .and_then(|c| self.ranks.get(&c.card))
                .copied()
                .unwrap_or(99);
            HandRanking {
                rank,
                ordered_rank: Vec::new(),
                name: format!("rank {}", rank),
                description: String::new(),
            }
        }
    }

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    fn player(id: &str, cards: &str) -> ShowdownPlayer {
        ShowdownPlayer {
            id: id.to_string(),
            name: id.to_uppercase(),
            stack: 0,
            is_active: true,
            hand: PlayerHand::from_cards(cards.split_whitespace().map(card).collect()),
        }
    }

    fn board(cards: &str) -> CommunityCards {
        let mut board = CommunityCards::new();
        for c in cards.split_whitespace() {
            board.push(DEFAULT_COMMUNITY_SUBSET, card(c));
        }
        board
    }

    fn all_hole(name: &str, evaluation_type: EvaluationType) -> HandConfig {
        HandConfig {
            selection: poker_protocol::CardSelection::AllHole,
            ..HandConfig::simple(name, evaluation_type, 0, 0)
        }
    }

    fn run(manager: &ShowdownManager, players: Vec<ShowdownPlayer>, community: &CommunityCards, pots: &PotSnapshot) -> GameResult {
        let choices = BTreeMap::new();
        let table = ShowdownTable {
            players,
            community,
            pots,
            choices: &choices,
        };
        manager.handle_showdown(&table)
    }

    fn won(result: &GameResult, id: &str) -> i64 {
        result.winnings_for(id)
    }

    #[test]
    fn test_simple_pot_to_better_hand() {
        let evaluator = ScriptedEvaluator::new(&[("Ah", 1), ("Kh", 2)]);
        let manager = ShowdownManager::new(
            ShowdownRules::single(all_hole("High Hand", EvaluationType::High)),
            evaluator,
        );
        let pots = PotSnapshot::new(Pot::new(100, &["a", "b"]), Vec::new());
        let result = run(&manager, vec![player("a", "Ah"), player("b", "Kh")], &CommunityCards::new(), &pots);

        assert!(result.is_complete);
        assert_eq!(result.pots.len(), 1);
        assert_eq!(result.pots[0].amount, 100);
        assert_eq!(result.pots[0].winners, vec!["a".to_string()]);
        assert_eq!(result.pots[0].pot_type, PotType::Main);
        assert_eq!(result.hands["b"].len(), 1);
        assert_eq!(result.winning_hands.len(), 1);
    }

    /// a makes aces and kings with no eight-low; b makes 8-4-3-2-A and only
    /// ace-high.
    const HI_LO_BOARD: &str = "Ah Kd Qc 3s 8h";

    fn hi_lo_players() -> Vec<ShowdownPlayer> {
        vec![player("a", "As Kc 9d 9h"), player("b", "2c 4d 7h 9s")]
    }

    #[test]
    fn test_hi_lo_odd_chip_to_high() {
        let evaluator = Arc::new(StandardEvaluator::new());
        let high = HandConfig::simple("High Hand", EvaluationType::High, 2, 3);
        let low = HandConfig::simple("Low Hand", EvaluationType::A5Low, 2, 3)
            .with_qualifier(1, vec![8, 7, 6, 5, 4]);
        let manager = ShowdownManager::new(ShowdownRules::hi_lo(high, low), evaluator);
        let community = board(HI_LO_BOARD);
        let pots = PotSnapshot::new(Pot::new(101, &["a", "b"]), Vec::new());

        let result = run(&manager, hi_lo_players(), &community, &pots);
        assert_eq!(won(&result, "a"), 51);
        assert_eq!(won(&result, "b"), 50);
        assert_eq!(result.total_awarded(), 101);
        let high = result.pots.iter().find(|p| p.hand_type == "High Hand").unwrap();
        assert_eq!(high.winners, vec!["a".to_string()]);
        let low = result.pots.iter().find(|p| p.hand_type == "Low Hand").unwrap();
        assert_eq!(low.winners, vec!["b".to_string()]);
    }

    #[test]
    fn test_hi_lo_without_qualifying_low() {
        let evaluator = Arc::new(StandardEvaluator::new());
        let high = HandConfig::simple("High Hand", EvaluationType::High, 2, 3);
        let low = HandConfig::simple("Low Hand", EvaluationType::A5Low, 2, 3)
            .with_qualifier(1, vec![8, 7, 6, 5, 4]);
        let manager = ShowdownManager::new(ShowdownRules::hi_lo(high, low), evaluator);
        let community = board("Ah Kd Qc Ts 9h");
        let pots = PotSnapshot::new(Pot::new(101, &["a", "b"]), Vec::new());

        let result = run(&manager, vec![player("a", "As Kc 2d 3h"), player("b", "Jc 7d 6h 5s")], &community, &pots);
        assert_eq!(won(&result, "a"), 101);
        assert_eq!(won(&result, "b"), 0);
        assert_eq!(result.total_awarded(), 101);
        assert!(result
            .pots
            .iter()
            .any(|p| p.reason.as_deref() == Some("reallocated: no qualifying Low Hand")));
    }

    #[test]
    fn test_side_pot_awarded_separately() {
        let evaluator = ScriptedEvaluator::new(&[("Ah", 1), ("Kh", 2), ("Qh", 3)]);
        let manager = ShowdownManager::new(
            ShowdownRules::single(all_hole("High Hand", EvaluationType::High)),
            evaluator,
        );
        let pots = PotSnapshot::new(
            Pot::new(150, &["short", "b", "c"]),
            vec![Pot::new(100, &["b", "c"])],
        );
        let result = run(
            &manager,
            vec![player("short", "Ah"), player("b", "Kh"), player("c", "Qh")],
            &CommunityCards::new(),
            &pots,
        );
        assert_eq!(result.pots[0].pot_type, PotType::Side);
        assert_eq!(won(&result, "short"), 150);
        assert_eq!(won(&result, "b"), 100);
        assert_eq!(won(&result, "c"), 0);
    }

    #[test]
    fn test_unqualified_side_pot_share_goes_to_side_pot_winner() {
        let evaluator = ScriptedEvaluator::new(&[("Ah", 1), ("Kh", 2), ("Qh", 3)]);
        let high = all_hole("High Hand", EvaluationType::High);
        let low = all_hole("Low Hand", EvaluationType::A5Low).with_qualifier(1, Vec::new());
        let manager = ShowdownManager::new(ShowdownRules::hi_lo(high, low), evaluator);
        let pots = PotSnapshot::new(
            Pot::new(150, &["short", "b", "c"]),
            vec![Pot::new(100, &["b", "c"])],
        );
        let result = run(
            &manager,
            vec![player("short", "Ah"), player("b", "Kh"), player("c", "Qh")],
            &CommunityCards::new(),
            &pots,
        );

        // Only the short stack qualifies low, and it cannot win the side pot.
        assert_eq!(won(&result, "short"), 150);
        assert_eq!(won(&result, "b"), 100);
        assert_eq!(won(&result, "c"), 0);
        let moved = result
            .pots
            .iter()
            .find(|p| p.side_pot_index == Some(0) && p.reason.is_some())
            .unwrap();
        assert_eq!(moved.amount, 50);
        assert_eq!(moved.winners, vec!["b".to_string()]);
        assert_eq!(moved.reason.as_deref(), Some("reallocated: no qualifying Low Hand"));
    }

    #[test]
    fn test_split_pot_odd_chip_follows_seat_order() {
        let evaluator = ScriptedEvaluator::new(&[("Ah", 50), ("Kh", 60)]);
        let config = all_hole("High Hand", EvaluationType::High).with_qualifier(10, Vec::new());
        let mut rules = ShowdownRules::single(config);
        rules.global_default_action = Some(GlobalDefaultAction {
            condition: ActionCondition::NoQualifierMet,
            action: GlobalAction::SplitPot,
        });
        let manager = ShowdownManager::new(rules, evaluator);
        let pots = PotSnapshot::new(Pot::new(31, &["a", "z"]), Vec::new());
        let result = run(&manager, vec![player("z", "Ah"), player("a", "Kh")], &CommunityCards::new(), &pots);
        assert_eq!(result.pots[0].winners, vec!["z".to_string(), "a".to_string()]);
        assert_eq!(won(&result, "z"), 16);
        assert_eq!(won(&result, "a"), 15);
    }

    #[test]
    fn test_tied_hands_share_with_odd_chip_in_seat_order() {
        let evaluator = ScriptedEvaluator::new(&[("Ah", 1), ("Ad", 1), ("2c", 5)]);
        let manager = ShowdownManager::new(
            ShowdownRules::single(all_hole("High Hand", EvaluationType::High)),
            evaluator,
        );
        let pots = PotSnapshot::new(Pot::new(25, &["a", "b", "c"]), Vec::new());
        let result = run(
            &manager,
            vec![player("a", "Ah"), player("b", "Ad"), player("c", "2c")],
            &CommunityCards::new(),
            &pots,
        );
        assert_eq!(won(&result, "a"), 13);
        assert_eq!(won(&result, "b"), 12);
    }

    #[test]
    fn test_odd_chip_precedence() {
        let high = HandConfig::simple("Low Hand", EvaluationType::A5Low, 2, 3);
        let low = HandConfig::simple("High Hand", EvaluationType::High, 2, 3);
        assert_eq!(odd_chip_index(&high, &low), 1);

        let five = HandConfig::simple("Board", EvaluationType::High, 2, 3);
        let four = HandConfig::simple("Small", EvaluationType::High, 2, 2);
        assert_eq!(odd_chip_index(&four, &five), 1);

        let draw = HandConfig::simple("Draw Hand", EvaluationType::High, 2, 2);
        let omaha = HandConfig::simple("Omaha Hand", EvaluationType::High, 2, 2);
        let holdem = HandConfig::simple("Hold'em Hand", EvaluationType::High, 2, 2);
        assert_eq!(odd_chip_index(&omaha, &draw), 1);
        assert_eq!(odd_chip_index(&omaha, &holdem), 0);

        let three = HandConfig::simple("Three", EvaluationType::High, 1, 2);
        assert_eq!(odd_chip_index(&three, &four), 1);
        assert_eq!(odd_chip_index(&four, &four), 0);

        let shares = split_shares(7, &[four.clone(), four.clone(), four]);
        assert_eq!(shares, vec![3, 2, 2]);
    }

    #[test]
    fn test_global_split_when_nobody_qualifies() {
        let evaluator = ScriptedEvaluator::new(&[("Ah", 50), ("Kh", 60)]);
        let config = all_hole("High Hand", EvaluationType::High).with_qualifier(10, Vec::new());
        let mut rules = ShowdownRules::single(config);
        rules.global_default_action = Some(GlobalDefaultAction {
            condition: ActionCondition::NoQualifierMet,
            action: GlobalAction::SplitPot,
        });
        let manager = ShowdownManager::new(rules, evaluator);
        let pots = PotSnapshot::new(Pot::new(31, &["a", "b"]), Vec::new());
        let result = run(&manager, vec![player("a", "Ah"), player("b", "Kh")], &CommunityCards::new(), &pots);
        assert_eq!(result.total_awarded(), 31);
        assert_eq!(won(&result, "a"), 16);
        assert_eq!(won(&result, "b"), 15);
    }

    #[test]
    fn test_global_best_hand_fallback() {
        let evaluator = ScriptedEvaluator::new(&[("Ah", 50), ("Kh", 40)]);
        let strict = all_hole("Strict", EvaluationType::High).with_qualifier(10, Vec::new());
        let mut rules = ShowdownRules::single(strict);
        rules.global_default_action = Some(GlobalDefaultAction {
            condition: ActionCondition::NoQualifierMet,
            action: GlobalAction::BestHand {
                best_hand: vec![all_hole("Anything", EvaluationType::High)],
            },
        });
        let manager = ShowdownManager::new(rules, evaluator);
        let pots = PotSnapshot::new(Pot::new(80, &["a", "b"]), Vec::new());
        let result = run(&manager, vec![player("a", "Ah"), player("b", "Kh")], &CommunityCards::new(), &pots);
        assert_eq!(won(&result, "b"), 80);
        assert_eq!(result.pots.len(), 1);
        assert_eq!(result.pots[0].hand_type, "Anything");
    }

    #[test]
    fn test_special_criterion_from_river_suit() {
        let evaluator = ScriptedEvaluator::new(&[("Ah", 20), ("9s", 20)]);
        let high = all_hole("High Hand", EvaluationType::High);
        let chance = all_hole("Spade", EvaluationType::High).with_qualifier(1, Vec::new());
        let mut rules = ShowdownRules::hi_lo(high, chance);
        rules.default_actions = vec![DefaultAction {
            condition: ActionCondition::NoQualifierMet,
            applies_to: vec!["Spade".to_string()],
            action: DefaultActionKind::EvaluateSpecial {
                criterion: SpecialCriterion {
                    kind: CriterionKind::HighestOfSuit,
                    suit: SuitSource::CommunityCard {
                        subset: None,
                        index: None,
                    },
                    from: CardPool::HoleCards,
                },
            },
        }];
        let manager = ShowdownManager::new(rules, evaluator);
        let community = board("2h 3c 4s");
        let pots = PotSnapshot::new(Pot::new(40, &["a", "b"]), Vec::new());
        let result = run(&manager, vec![player("a", "Ah 2s"), player("b", "9s 5d")], &community, &pots);
        // High ties 10/10, the spade half goes to b's nine of spades.
        assert_eq!(won(&result, "a"), 10);
        assert_eq!(won(&result, "b"), 30);
        let special = result.pots.iter().find(|p| p.hand_type == "Spade").unwrap();
        assert!(special.reason.as_deref().unwrap().contains("highest spades"));
    }

    #[test]
    fn test_conditional_hands_by_board_color() {
        let evaluator = ScriptedEvaluator::new(&[("Ah", 1), ("Kh", 2)]);
        let mut rules = ShowdownRules::single(all_hole("Normal", EvaluationType::High));
        rules.conditional_best_hands = vec![ConditionalBestHand {
            condition: HandCondition::BoardColor {
                subset: None,
                color: poker_protocol::CardColor::Red,
                min_count: 2,
            },
            best_hand: vec![all_hole("Red Board", EvaluationType::High)],
        }];
        let manager = ShowdownManager::new(rules, evaluator);
        let pots = PotSnapshot::new(Pot::new(10, &["a", "b"]), Vec::new());

        let red = run(&manager, vec![player("a", "Ah"), player("b", "Kh")], &board("2h 3d 4c"), &pots);
        assert_eq!(red.pots[0].hand_type, "Red Board");
        let black = run(&manager, vec![player("a", "Ah"), player("b", "Kh")], &board("2s 3d 4c"), &pots);
        assert_eq!(black.pots[0].hand_type, "Normal");
    }

    #[test]
    fn test_classification_priority_before_rank() {
        let evaluator = ScriptedEvaluator::new(&[("Kh", 9), ("Ah", 1)]);
        let mut config = all_hole("High Hand", EvaluationType::High);
        config.classification = Some(poker_protocol::rules::ClassificationRule::FaceButt);
        let mut rules = ShowdownRules::single(config);
        rules.classification_priority = vec!["face".to_string(), "butt".to_string()];
        let manager = ShowdownManager::new(rules, evaluator);
        let pots = PotSnapshot::new(Pot::new(10, &["a", "b"]), Vec::new());
        let result = run(&manager, vec![player("a", "Ah"), player("b", "Kh")], &CommunityCards::new(), &pots);
        assert_eq!(won(&result, "b"), 10);
    }

    #[test]
    fn test_fold_win_takes_everything() {
        let manager = ShowdownManager::new(
            ShowdownRules::single(all_hole("High Hand", EvaluationType::High)),
            Arc::new(StandardEvaluator::new()),
        );
        let pots = PotSnapshot::new(Pot::new(60, &["a"]), vec![Pot::new(20, &["a"])]);
        let mut folded = player("b", "Kh");
        folded.is_active = false;
        let choices = BTreeMap::new();
        let community = CommunityCards::new();
        let table = ShowdownTable {
            players: vec![player("a", "Ah"), folded],
            community: &community,
            pots: &pots,
            choices: &choices,
        };
        let result = manager.handle_fold_win(&table);
        assert_eq!(result.pots.len(), 1);
        assert_eq!(result.pots[0].amount, 80);
        assert_eq!(result.pots[0].hand_type, "Uncontested");
        assert!(result.hands["a"][0].cards.is_empty());
    }

    #[test]
    fn test_no_active_players() {
        let manager = ShowdownManager::new(ShowdownRules::default(), Arc::new(StandardEvaluator::new()));
        let pots = PotSnapshot::default();
        let mut p = player("a", "Ah");
        p.is_active = false;
        let result = run(&manager, vec![p], &CommunityCards::new(), &pots);
        assert!(result.is_complete);
        assert!(result.pots.is_empty());
    }

    fn declare_manager() -> ShowdownManager {
        let high = HandConfig::simple("High Hand", EvaluationType::High, 2, 3);
        let low = HandConfig::simple("Low Hand", EvaluationType::A5Low, 2, 3);
        let mut rules = ShowdownRules::hi_lo(high, low);
        rules.declaration_mode = DeclarationMode::Declare;
        ShowdownManager::new(rules, Arc::new(StandardEvaluator::new()))
    }

    fn declarations(list: &[(&str, Declaration)]) -> PotDeclarations {
        HashMap::from([(
            MAIN_POT_KEY,
            list.iter().map(|(id, d)| (id.to_string(), *d)).collect(),
        )])
    }

    #[test]
    fn test_declare_split_with_odd_chip_high() {
        let mut manager = declare_manager();
        manager.set_declarations(declarations(&[("a", Declaration::High), ("b", Declaration::Low)]));
        let community = board(HI_LO_BOARD);
        let pots = PotSnapshot::new(Pot::new(45, &["a", "b"]), Vec::new());
        let result = run(&manager, hi_lo_players(), &community, &pots);
        assert_eq!(won(&result, "a"), 23);
        assert_eq!(won(&result, "b"), 22);
        assert_eq!(result.pots[0].declarations.len(), 2);
    }

    #[test]
    fn test_failed_high_low_declarer_loses_both_ways() {
        let mut manager = declare_manager();
        // b has the best low but not the best high, so b's high_low fails.
        manager.set_declarations(declarations(&[("a", Declaration::High), ("b", Declaration::HighLow)]));
        let community = board(HI_LO_BOARD);
        let pots = PotSnapshot::new(Pot::new(40, &["a", "b"]), Vec::new());
        let result = run(&manager, hi_lo_players(), &community, &pots);
        assert_eq!(won(&result, "a"), 40);
        assert_eq!(won(&result, "b"), 0);
        assert_eq!(result.pots.len(), 1);
        assert_eq!(
            result.pots[0].reason.as_deref(),
            Some("reallocated: no valid low declaration")
        );
    }

    #[test]
    fn test_declare_low_side_takes_pot_without_high_declarers() {
        let mut manager = declare_manager();
        manager.set_declarations(declarations(&[("a", Declaration::Low), ("b", Declaration::Low)]));
        let community = board(HI_LO_BOARD);
        let pots = PotSnapshot::new(Pot::new(40, &["a", "b"]), Vec::new());
        let result = run(&manager, hi_lo_players(), &community, &pots);
        assert_eq!(won(&result, "b"), 40);
        assert_eq!(result.pots[0].hand_type, "Low Hand");
        assert_eq!(
            result.pots[0].reason.as_deref(),
            Some("reallocated: no valid high declaration")
        );
    }

    #[test]
    fn test_declarations_are_per_pot() {
        let mut manager = declare_manager();
        let mut per_pot = declarations(&[
            ("a", Declaration::High),
            ("b", Declaration::Low),
            ("c", Declaration::Low),
        ]);
        per_pot.insert(
            0,
            HashMap::from([
                ("b".to_string(), Declaration::High),
                ("c".to_string(), Declaration::Low),
            ]),
        );
        manager.set_declarations(per_pot);
        let community = board(HI_LO_BOARD);
        let pots = PotSnapshot::new(
            Pot::new(61, &["a", "b", "c"]),
            vec![Pot::new(40, &["b", "c"])],
        );
        // c pairs jacks and has only a jack-low.
        let mut players = hi_lo_players();
        players.push(player("c", "Jd Jc 6c 6d"));
        let result = run(&manager, players, &community, &pots);

        // Main: a wins high, b beats c for low. Side: b and c each take a side.
        assert_eq!(won(&result, "a"), 31);
        assert_eq!(won(&result, "b"), 30 + 20);
        assert_eq!(won(&result, "c"), 20);
        assert_eq!(result.total_awarded(), 101);
        let side_low = result
            .pots
            .iter()
            .find(|p| p.side_pot_index == Some(0) && p.hand_type == "Low Hand")
            .unwrap();
        assert_eq!(side_low.winners, vec!["c".to_string()]);
        assert_eq!(side_low.declarations.len(), 2);
    }

    #[test]
    fn test_declare_without_two_configs_is_empty() {
        let mut rules = ShowdownRules::single(HandConfig::simple("High Hand", EvaluationType::High, 2, 3));
        rules.declaration_mode = DeclarationMode::Declare;
        let manager = ShowdownManager::new(rules, Arc::new(StandardEvaluator::new()));
        let pots = PotSnapshot::new(Pot::new(40, &["a", "b"]), Vec::new());
        let result = run(&manager, vec![player("a", "As Kc"), player("b", "2c 5d")], &board("Ah Kd Qc"), &pots);
        assert!(result.is_complete);
        assert!(result.pots.is_empty());
    }

    #[test]
    fn test_declare_nobody_valid_splits_pot() {
        let manager = declare_manager();
        let community = board(HI_LO_BOARD);
        let pots = PotSnapshot::new(Pot::new(41, &["a", "b"]), Vec::new());
        let result = run(&manager, hi_lo_players(), &community, &pots);
        assert_eq!(result.total_awarded(), 41);
        assert_eq!(won(&result, "a"), 21);
        assert_eq!(won(&result, "b"), 20);
    }
}
