use log::{debug, error, info, warn};
use poker_protocol::{
    BettingStructure, Card, CommunityCards, Declaration, EngineResult, GameError, GameResult,
    GameRules, GameStep, PlayerAction, PlayerId, PlayerState, Rank, Stakes, Suit,
    DEFAULT_COMMUNITY_SUBSET,
};
use poker_protocol::variant::{BetSize, DealTarget};
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::evaluator::HandEvaluator;
use crate::pot::{distribute, PotLedger, PotSnapshot};
use crate::showdown::{ShowdownManager, ShowdownPlayer, ShowdownTable, MAIN_POT_KEY};

/// Bets plus raises allowed per limit betting round.
const LIMIT_RAISE_CAP: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    WaitingForPlayers,
    /// Forced bets and deals; no player input needed
    Dealing,
    Betting,
    Drawing,
    Declaring,
    Complete,
}

/// A seated player carried across an engine swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub stack: i64,
    pub seat: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    pub seats: Vec<SeatSnapshot>,
    pub button_seat: Option<usize>,
    pub hand_number: u64,
}

/// Rules-driven engine for one table: seats, deck, step sequence, betting
/// and the hand-ending showdown.
#[derive(Debug)]
pub struct Game {
    rules: GameRules,
    structure: BettingStructure,
    stakes: Stakes,
    max_players: usize,
    seats: BTreeMap<usize, PlayerState>,
    showdown: ShowdownManager,
    community: CommunityCards,
    deck: Vec<Card>,
    step_index: usize,
    state: GameState,
    button_seat: Option<usize>,
    current_player: Option<PlayerId>,
    /// Highest bet of the current round
    current_bet: i64,
    /// Size of the last full bet or raise this round
    last_raise: i64,
    raises: usize,
    bet_size: BetSize,
    hand_number: u64,
    /// Chips left behind by players who departed mid-hand
    dead_money: Vec<(PlayerId, i64)>,
    choices: BTreeMap<String, String>,
    declarations: HashMap<PlayerId, Declaration>,
    last_result: Option<GameResult>,
}

impl Game {
    pub fn new(
        rules: GameRules,
        structure: BettingStructure,
        stakes: Stakes,
        max_players: usize,
        evaluator: Arc<dyn HandEvaluator>,
    ) -> EngineResult<Self> {
        if !rules.supports(structure) {
            return Err(GameError::Internal(format!(
                "{} is not played {}",
                rules.game, structure
            )));
        }
        let showdown = ShowdownManager::new(rules.showdown.clone(), evaluator);
        let max_players = max_players.min(rules.max_players).max(2);
        Ok(Self {
            rules,
            structure,
            stakes,
            max_players,
            seats: BTreeMap::new(),
            showdown,
            community: CommunityCards::new(),
            deck: Vec::new(),
            step_index: 0,
            state: GameState::WaitingForPlayers,
            button_seat: None,
            current_player: None,
            current_bet: 0,
            last_raise: 0,
            raises: 0,
            bet_size: BetSize::Small,
            hand_number: 0,
            dead_money: Vec::new(),
            choices: BTreeMap::new(),
            declarations: HashMap::new(),
            last_result: None,
        })
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn betting_structure(&self) -> BettingStructure {
        self.structure
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn current_step(&self) -> Option<&GameStep> {
        self.rules.steps.get(self.step_index)
    }

    pub fn current_player(&self) -> Option<&str> {
        self.current_player.as_deref()
    }

    pub fn hand_number(&self) -> u64 {
        self.hand_number
    }

    pub fn button_seat(&self) -> Option<usize> {
        self.button_seat
    }

    pub fn community_cards(&self) -> &CommunityCards {
        &self.community
    }

    pub fn last_result(&self) -> Option<&GameResult> {
        self.last_result.as_ref()
    }

    /// Seated players in seat order.
    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.seats.values()
    }

    pub fn player(&self, player_id: &str) -> Option<&PlayerState> {
        self.seats.values().find(|p| p.id == player_id)
    }

    fn player_mut(&mut self, player_id: &str) -> EngineResult<&mut PlayerState> {
        self.seats
            .values_mut()
            .find(|p| p.id == player_id)
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))
    }

    pub fn seated_count(&self) -> usize {
        self.seats.len()
    }

    pub fn active_count(&self) -> usize {
        self.seats.values().filter(|p| p.is_active).count()
    }

    pub fn is_hand_active(&self) -> bool {
        !matches!(
            self.state,
            GameState::WaitingForPlayers | GameState::Complete
        )
    }

    pub fn total_pot(&self) -> i64 {
        self.pots().total_pot()
    }

    fn pots(&self) -> PotSnapshot {
        let mut contributions: Vec<(PlayerId, i64, bool)> = self
            .seats
            .values()
            .map(|p| (p.id.clone(), p.total_bet, p.is_active))
            .collect();
        contributions.extend(
            self.dead_money
                .iter()
                .map(|(id, amount)| (id.clone(), *amount, false)),
        );
        PotSnapshot::from_contributions(&contributions)
    }

    /// Seats a player. With no seat requested the lowest free seat is used.
    pub fn add_player(
        &mut self,
        player_id: PlayerId,
        name: String,
        stack: i64,
        seat: Option<usize>,
    ) -> EngineResult<usize> {
        if self.player(&player_id).is_some() {
            return Err(GameError::AlreadySeated(player_id));
        }
        if self.seats.len() >= self.max_players {
            return Err(GameError::TableFull);
        }
        let seat = match seat {
            Some(s) if s >= self.max_players || self.seats.contains_key(&s) => {
                return Err(GameError::SeatUnavailable(s))
            }
            Some(s) => s,
            None => (0..self.max_players)
                .find(|s| !self.seats.contains_key(s))
                .ok_or(GameError::TableFull)?,
        };
        debug!("Seating {} at seat {} with {}", player_id, seat, stack);
        self.seats
            .insert(seat, PlayerState::new(player_id, name, stack, seat));
        Ok(seat)
    }

    /// Unseats a player. During a hand the player is folded first and their
    /// committed chips stay in the pot.
    pub fn remove_player(&mut self, player_id: &str) -> EngineResult<PlayerState> {
        if self.is_hand_active() && self.player(player_id).is_some_and(|p| p.is_active) {
            self.mark_inactive(player_id)?;
        }
        let seat = self
            .player(player_id)
            .map(|p| p.seat)
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;
        let player = self
            .seats
            .remove(&seat)
            .ok_or_else(|| GameError::Internal(format!("seat {} vanished", seat)))?;
        if self.is_hand_active() && player.total_bet > 0 {
            self.dead_money.push((player.id.clone(), player.total_bet));
        }
        if self.is_hand_active() && self.active_count() == 1 {
            self.complete_fold_win()?;
        }
        Ok(player)
    }

    /// Folds a player outside the normal turn order, recording them as having
    /// acted so the betting round does not wait on them.
    pub fn mark_inactive(&mut self, player_id: &str) -> EngineResult<()> {
        let was_current = self.current_player.as_deref() == Some(player_id);
        let player = self.player_mut(player_id)?;
        player.is_active = false;
        player.has_acted = true;
        debug!("{} marked inactive", player_id);
        if was_current {
            self.advance_turn();
        }
        Ok(())
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            seats: self
                .seats
                .values()
                .map(|p| SeatSnapshot {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    stack: p.stack,
                    seat: p.seat,
                })
                .collect(),
            button_seat: self.button_seat,
            hand_number: self.hand_number,
        }
    }

    /// Seats everyone from `snapshot`. Only valid on an empty engine.
    pub fn restore(&mut self, snapshot: &TableSnapshot) -> EngineResult<()> {
        if !self.seats.is_empty() {
            return Err(GameError::Internal(
                "restore into an occupied table".to_string(),
            ));
        }
        for seat in &snapshot.seats {
            self.add_player(seat.id.clone(), seat.name.clone(), seat.stack, Some(seat.seat))?;
        }
        self.button_seat = snapshot.button_seat;
        self.hand_number = snapshot.hand_number;
        Ok(())
    }

    /// Seats in play order starting after `seat`.
    fn seats_after(&self, seat: Option<usize>) -> Vec<usize> {
        let start = seat.map_or(0, |s| s + 1);
        self.seats
            .range(start..)
            .chain(self.seats.range(..start))
            .map(|(s, _)| *s)
            .collect()
    }

    fn create_deck(&mut self) {
        self.deck = Suit::STANDARD
            .iter()
            .flat_map(|&suit| Rank::STANDARD.iter().map(move |&rank| Card::new(suit, rank)))
            .collect();
        for _ in 0..self.rules.jokers {
            self.deck.push(Card::joker());
        }
        let mut rng = thread_rng();
        self.deck.shuffle(&mut rng);
    }

    fn deal_card(&mut self) -> EngineResult<Card> {
        self.deck
            .pop()
            .ok_or_else(|| GameError::Internal("deck exhausted".to_string()))
    }

    pub fn start_hand(&mut self) -> EngineResult<()> {
        if self.is_hand_active() {
            return Err(GameError::HandInProgress);
        }
        let ready = self
            .seats
            .values()
            .filter(|p| p.stack > 0 && !p.is_sitting_out)
            .count();
        if ready < self.rules.min_players.max(2) {
            return Err(GameError::NotEnoughPlayers);
        }

        self.hand_number += 1;
        self.create_deck();
        self.community.clear();
        self.dead_money.clear();
        self.choices.clear();
        self.declarations.clear();
        self.showdown.clear_declarations();
        self.last_result = None;
        self.current_bet = 0;
        self.last_raise = 0;
        self.raises = 0;
        for player in self.seats.values_mut() {
            player.current_bet = 0;
            player.total_bet = 0;
            player.hand.clear();
            player.has_acted = false;
            player.is_all_in = false;
            player.is_active = player.stack > 0 && !player.is_sitting_out;
        }

        let next_button = self
            .seats_after(self.button_seat)
            .into_iter()
            .find(|s| self.seats.get(s).is_some_and(|p| p.is_active));
        self.button_seat = next_button;
        info!(
            "Starting hand {} of {} ({}), button at seat {:?}",
            self.hand_number, self.rules.game, self.structure, self.button_seat
        );

        self.step_index = 0;
        self.run_step()
    }

    /// Moves past the current step and runs the next one.
    pub fn next_step(&mut self) -> EngineResult<()> {
        if !self.is_hand_active() {
            return Err(GameError::NoHandInProgress);
        }
        if self.current_player.is_some() {
            return Err(GameError::IllegalAction(format!(
                "{} still waiting on {:?}",
                self.current_step().map_or("step", GameStep::name),
                self.current_player
            )));
        }
        if self.state == GameState::Betting {
            self.close_betting_round();
        }
        self.step_index += 1;
        if self.active_count() <= 1 {
            return self.complete_fold_win();
        }
        self.run_step()
    }

    fn run_step(&mut self) -> EngineResult<()> {
        let step = self
            .rules
            .steps
            .get(self.step_index)
            .cloned()
            .ok_or_else(|| GameError::Internal("ran past the last step".to_string()))?;
        debug!("Hand {} step {}: {}", self.hand_number, self.step_index, step.name());
        self.current_player = None;
        match step {
            GameStep::PostBlinds => {
                self.post_blinds();
                self.state = GameState::Dealing;
            }
            GameStep::PostAntes => {
                self.post_antes();
                self.state = GameState::Dealing;
            }
            GameStep::Deal {
                target,
                subset,
                count,
                face_up,
            } => {
                self.deal(target, subset.as_deref(), count, face_up)?;
                self.state = GameState::Dealing;
            }
            GameStep::Bet { size } => self.open_betting_round(size),
            GameStep::Draw { .. } => self.open_turn_round(GameState::Drawing),
            GameStep::Declare => self.open_turn_round(GameState::Declaring),
            GameStep::Showdown => self.run_showdown(),
        }
        Ok(())
    }

    fn commit(player: &mut PlayerState, amount: i64) -> i64 {
        let amount = amount.min(player.stack).max(0);
        player.stack -= amount;
        player.current_bet += amount;
        player.total_bet += amount;
        if player.stack == 0 {
            player.is_all_in = true;
        }
        amount
    }

    fn post_blinds(&mut self) {
        let in_hand: Vec<usize> = self
            .seats_after(self.button_seat)
            .into_iter()
            .filter(|s| self.seats.get(s).is_some_and(|p| p.is_active))
            .collect();
        if in_hand.len() < 2 {
            debug!("Cannot post blinds with {} players", in_hand.len());
            return;
        }
        // Heads up the button posts the small blind.
        let (sb, bb) = if in_hand.len() == 2 {
            (in_hand[1], in_hand[0])
        } else {
            (in_hand[0], in_hand[1])
        };
        let (small, big) = (self.stakes.small_blind, self.stakes.big_blind);
        if let Some(player) = self.seats.get_mut(&sb) {
            Self::commit(player, small);
        }
        if let Some(player) = self.seats.get_mut(&bb) {
            Self::commit(player, big);
        }
        self.current_bet = self
            .seats
            .values()
            .map(|p| p.current_bet)
            .max()
            .unwrap_or(0);
        self.last_raise = big;
        self.raises = 1;
    }

    fn post_antes(&mut self) {
        let ante = self.stakes.ante;
        if ante <= 0 {
            return;
        }
        for player in self.seats.values_mut().filter(|p| p.is_active) {
            let paid = Self::commit(player, ante);
            // Antes are dead money, not part of the round's bet.
            player.current_bet -= paid;
        }
    }

    fn deal(
        &mut self,
        target: DealTarget,
        subset: Option<&str>,
        count: usize,
        face_up: bool,
    ) -> EngineResult<()> {
        match target {
            DealTarget::Hole => {
                let order: Vec<usize> = self
                    .seats_after(self.button_seat)
                    .into_iter()
                    .filter(|s| self.seats.get(s).is_some_and(|p| p.is_active))
                    .collect();
                for _ in 0..count {
                    for seat in &order {
                        let card = self.deal_card()?.with_face_up(face_up);
                        if let Some(player) = self.seats.get_mut(seat) {
                            player.hand.add_card(card, subset);
                        }
                    }
                }
            }
            DealTarget::Community => {
                let subset = subset.unwrap_or(DEFAULT_COMMUNITY_SUBSET);
                for _ in 0..count {
                    let card = self.deal_card()?.with_face_up(true);
                    self.community.push(subset, card);
                }
            }
        }
        Ok(())
    }

    fn open_betting_round(&mut self, size: BetSize) {
        self.state = GameState::Betting;
        self.bet_size = size;
        let blinds_live = self.current_bet > 0;
        if !blinds_live {
            self.last_raise = self.bet_unit();
        }
        let order = self.seats_after(self.button_seat);
        let order: Vec<usize> = if blinds_live {
            // Action starts left of the biggest blind.
            let big = order
                .iter()
                .rev()
                .find(|s| {
                    self.seats
                        .get(*s)
                        .is_some_and(|p| p.current_bet == self.current_bet)
                })
                .copied();
            self.seats_after(big)
        } else {
            order
        };
        self.current_player = self.first_to_act(&order);
    }

    fn open_turn_round(&mut self, state: GameState) {
        self.state = state;
        for player in self.seats.values_mut() {
            player.has_acted = !player.is_active;
        }
        let order = self.seats_after(self.button_seat);
        self.current_player = order
            .iter()
            .filter_map(|s| self.seats.get(s))
            .find(|p| p.is_active && !p.has_acted)
            .map(|p| p.id.clone());
    }

    fn close_betting_round(&mut self) {
        for player in self.seats.values_mut() {
            player.current_bet = 0;
            player.has_acted = false;
        }
        self.current_bet = 0;
        self.raises = 0;
    }

    fn needs_action(&self, player: &PlayerState) -> bool {
        player.can_act() && (!player.has_acted || player.current_bet < self.current_bet)
    }

    fn first_to_act(&self, order: &[usize]) -> Option<PlayerId> {
        // Nobody left to bet against.
        let can_act = self.seats.values().filter(|p| p.can_act()).count();
        if can_act == 0 {
            return None;
        }
        if can_act == 1 {
            let owes = self
                .seats
                .values()
                .any(|p| p.can_act() && p.current_bet < self.current_bet);
            if !owes {
                return None;
            }
        }
        order
            .iter()
            .filter_map(|s| self.seats.get(s))
            .find(|p| self.needs_action(p))
            .map(|p| p.id.clone())
    }

    fn advance_turn(&mut self) {
        let seat = self
            .current_player
            .as_deref()
            .and_then(|id| self.player(id))
            .map(|p| p.seat);
        let order = self.seats_after(seat);
        self.current_player = match self.state {
            GameState::Betting => self.first_to_act(&order),
            GameState::Drawing | GameState::Declaring => order
                .iter()
                .filter_map(|s| self.seats.get(s))
                .find(|p| p.is_active && !p.has_acted)
                .map(|p| p.id.clone()),
            _ => None,
        };
    }

    fn bet_unit(&self) -> i64 {
        match self.bet_size {
            BetSize::Small => self.stakes.small_bet(),
            BetSize::Big => self.stakes.big_bet(),
        }
    }

    fn validate_bet(&self, player: &PlayerState, amount: i64) -> EngineResult<()> {
        if amount <= 0 {
            return Err(GameError::InvalidAmount);
        }
        if self.current_bet > 0 {
            return Err(GameError::CannotBet);
        }
        if amount > player.stack {
            return Err(GameError::BetExceedsChips(amount, player.stack));
        }
        let all_in = amount == player.stack;
        match self.structure {
            BettingStructure::Limit => {
                let unit = self.bet_unit();
                if amount != unit && !(all_in && amount < unit) {
                    return Err(GameError::LimitBet(unit));
                }
            }
            BettingStructure::PotLimit | BettingStructure::NoLimit => {
                let min = self.stakes.big_blind;
                if amount < min && !all_in {
                    return Err(GameError::MinBet(min));
                }
                if self.structure == BettingStructure::PotLimit {
                    let max = self.total_pot();
                    if amount > max {
                        return Err(GameError::MaxBet(max));
                    }
                }
            }
        }
        Ok(())
    }

    /// `by` is the raise over the current bet.
    fn validate_raise(&self, player: &PlayerState, by: i64) -> EngineResult<()> {
        if self.current_bet == 0 {
            return Err(GameError::CannotRaise);
        }
        if by <= 0 {
            return Err(GameError::InvalidAmount);
        }
        let to_call = self.current_bet - player.current_bet;
        let needed = to_call + by;
        if needed > player.stack {
            return Err(GameError::BetExceedsChips(needed, player.stack));
        }
        let all_in = needed == player.stack;
        match self.structure {
            BettingStructure::Limit => {
                if self.raises >= LIMIT_RAISE_CAP {
                    return Err(GameError::BettingCapped);
                }
                let unit = self.bet_unit();
                if by != unit && !(all_in && by < unit) {
                    return Err(GameError::LimitBet(unit));
                }
            }
            BettingStructure::PotLimit | BettingStructure::NoLimit => {
                if by < self.last_raise && !all_in {
                    return Err(GameError::MinRaise(self.current_bet + self.last_raise));
                }
                if self.structure == BettingStructure::PotLimit {
                    let max_by = self.total_pot() + to_call;
                    if by > max_by {
                        return Err(GameError::MaxBet(self.current_bet + max_by));
                    }
                }
            }
        }
        Ok(())
    }

    /// Applies a player's action. Completes the hand when everyone else has
    /// folded.
    pub fn handle_action(&mut self, player_id: &str, action: PlayerAction) -> EngineResult<()> {
        if let PlayerAction::Choose { subject, value } = action {
            self.player(player_id)
                .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;
            debug!("{} chose {} = {}", player_id, subject, value);
            self.choices.insert(subject, value);
            return Ok(());
        }
        if !self.is_hand_active() {
            return Err(GameError::NoHandInProgress);
        }
        if self.current_player.as_deref() != Some(player_id) {
            return Err(GameError::NotYourTurn);
        }
        debug!("{} acts: {}", player_id, action);

        match (self.state, action) {
            (_, PlayerAction::Fold) => {
                let player = self.player_mut(player_id)?;
                player.is_active = false;
                player.has_acted = true;
            }
            (GameState::Betting, action) => self.apply_bet(player_id, action)?,
            (GameState::Drawing, PlayerAction::Discard(cards)) => self.draw(player_id, &cards)?,
            (GameState::Declaring, PlayerAction::Declare(declaration)) => {
                self.declarations.insert(player_id.to_string(), declaration);
                self.player_mut(player_id)?.has_acted = true;
            }
            (GameState::Declaring, _) => return Err(GameError::MissingDeclaration),
            (state, action) => {
                return Err(GameError::IllegalAction(format!("{} during {:?}", action, state)))
            }
        }

        if self.active_count() == 1 {
            return self.complete_fold_win();
        }
        self.advance_turn();
        Ok(())
    }

    fn apply_bet(&mut self, player_id: &str, action: PlayerAction) -> EngineResult<()> {
        let player = self
            .player(player_id)
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;
        let to_call = self.current_bet - player.current_bet;

        let target = match action {
            PlayerAction::Check => {
                if to_call > 0 {
                    return Err(GameError::CannotCheck);
                }
                player.current_bet
            }
            PlayerAction::Call => self.current_bet,
            PlayerAction::Bet(amount) => {
                self.validate_bet(player, amount)?;
                amount
            }
            PlayerAction::Raise(by) => {
                self.validate_raise(player, by)?;
                self.current_bet + by
            }
            PlayerAction::AllIn => {
                if self.structure == BettingStructure::Limit
                    && self.raises >= LIMIT_RAISE_CAP
                    && player.stack > to_call
                {
                    return Err(GameError::BettingCapped);
                }
                player.current_bet + player.stack
            }
            other => return Err(GameError::IllegalAction(other.to_string())),
        };

        let previous_bet = self.current_bet;
        let player = self.player_mut(player_id)?;
        let owed = target - player.current_bet;
        Self::commit(player, owed);
        player.has_acted = true;
        let new_bet = player.current_bet;

        if new_bet > previous_bet {
            let increase = new_bet - previous_bet;
            if increase >= self.last_raise {
                self.last_raise = increase;
            }
            self.current_bet = new_bet;
            self.raises += 1;
            for other in self.seats.values_mut().filter(|p| p.id != player_id) {
                if other.can_act() {
                    other.has_acted = false;
                }
            }
        }
        Ok(())
    }

    fn draw(&mut self, player_id: &str, discards: &[Card]) -> EngineResult<()> {
        let max = match self.current_step() {
            Some(GameStep::Draw { max_cards }) => *max_cards,
            _ => return Err(GameError::Internal("draw outside a draw step".to_string())),
        };
        if discards.len() > max {
            return Err(GameError::TooManyDiscards(max));
        }
        let player = self
            .player(player_id)
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;
        if let Some(missing) = discards
            .iter()
            .find(|d| !player.hand.cards().iter().any(|c| c.same_card(d)))
        {
            return Err(GameError::CardNotInHand(missing.to_string()));
        }

        let mut replacements = Vec::with_capacity(discards.len());
        for _ in discards {
            replacements.push(self.deal_card()?);
        }
        let player = self.player_mut(player_id)?;
        player.hand.remove_cards(discards);
        for card in replacements {
            player.hand.add_card(card, None);
        }
        player.has_acted = true;
        Ok(())
    }

    fn showdown_players(&self) -> Vec<ShowdownPlayer> {
        self.seats.values().map(ShowdownPlayer::from).collect()
    }

    fn run_showdown(&mut self) {
        let pots = self.pots();
        if !self.declarations.is_empty() {
            let per_pot: HashMap<PlayerId, Declaration> = self.declarations.clone();
            let mut map = HashMap::from([(MAIN_POT_KEY, per_pot.clone())]);
            for i in 0..pots.side_pot_count() {
                map.insert(i as i32, per_pot.clone());
            }
            self.showdown.set_declarations(map);
        }
        let table = ShowdownTable {
            players: self.showdown_players(),
            community: &self.community,
            pots: &pots,
            choices: &self.choices,
        };
        let result = self.showdown.handle_showdown(&table);
        self.finish_hand(result);
    }

    /// Ends the hand for the last player standing.
    pub fn complete_fold_win(&mut self) -> EngineResult<()> {
        if !self.is_hand_active() {
            return Err(GameError::NoHandInProgress);
        }
        let pots = self.pots();
        let table = ShowdownTable {
            players: self.showdown_players(),
            community: &self.community,
            pots: &pots,
            choices: &self.choices,
        };
        let result = self.showdown.handle_fold_win(&table);
        self.finish_hand(result);
        Ok(())
    }

    fn finish_hand(&mut self, result: GameResult) {
        let total = self.total_pot();
        let credited = distribute(&result, self.seats.values_mut());
        if credited != total {
            error!(
                "Hand {} credited {} of a {} pot",
                self.hand_number, credited, total
            );
        }
        for player in self.seats.values_mut() {
            player.current_bet = 0;
            player.total_bet = 0;
            player.is_all_in = false;
            player.has_acted = false;
        }
        self.dead_money.clear();
        self.current_player = None;
        self.current_bet = 0;
        self.state = GameState::Complete;
        if result.pots.is_empty() && total > 0 {
            warn!("Hand {} finished without any pot award", self.hand_number);
        }
        info!("Hand {} complete, {} awarded", self.hand_number, credited);
        self.last_result = Some(result);
    }
}
