//! One table's live play: connected players, spectators, pause state,
//! deferred leaves and mixed-game rotation around an embedded [`Game`].

use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};
use poker_protocol::{
    BettingStructure, GameError, GameResult, GameRules, MixedGameRotation, PlayerAction,
    PlayerId, SessionError, SessionInfo, SessionResult, TableEvent, TableId, TableInfo,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::evaluator::HandEvaluator;
use crate::game::{Game, GameState};
use crate::orchestrator::advance_through_non_player_steps;

const WAITING_FOR_PLAYERS: &str = "Waiting for players";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pause {
    /// Fewer than two connected players; lifts on its own
    WaitingForPlayers,
    Manual(String),
}

impl Pause {
    fn reason(&self) -> &str {
        match self {
            Pause::WaitingForPlayers => WAITING_FOR_PLAYERS,
            Pause::Manual(reason) => reason,
        }
    }
}

/// A stack to persist once the session lock is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackUpdate {
    pub player_id: PlayerId,
    pub stack: i64,
}

/// A mixed-game rotation with the rules of every entry, in entry order.
#[derive(Debug, Clone)]
pub struct MixedGame {
    pub rotation: MixedGameRotation,
    pub rules: Vec<GameRules>,
}

#[derive(Debug)]
struct RotationState {
    game: MixedGame,
    index: usize,
    hands_in_current_variant: usize,
    orbit_size: usize,
}

fn engine_error(err: GameError) -> SessionError {
    match err {
        GameError::Internal(msg) => {
            error!("Engine fault: {}", msg);
            SessionError::Processing(msg)
        }
        other => SessionError::Game(other),
    }
}

#[derive(Debug)]
pub struct GameSession {
    session_id: String,
    table: TableInfo,
    game: Game,
    evaluator: Arc<dyn HandEvaluator>,
    disconnect_grace: Duration,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    is_active: bool,
    pause: Option<Pause>,
    connected_players: BTreeSet<PlayerId>,
    disconnected_players: BTreeMap<PlayerId, DateTime<Utc>>,
    spectators: BTreeSet<PlayerId>,
    pending_leaves: BTreeSet<PlayerId>,
    hands_played: u64,
    current_hand_id: Option<String>,
    rotation: Option<RotationState>,
    stack_updates: Vec<StackUpdate>,
    events: broadcast::Sender<TableEvent>,
}

impl GameSession {
    pub fn new(
        table: TableInfo,
        rules: GameRules,
        mixed: Option<MixedGame>,
        evaluator: Arc<dyn HandEvaluator>,
        config: &ServerConfig,
    ) -> SessionResult<Self> {
        let structure = match &mixed {
            Some(m) => {
                if m.rotation.entries.is_empty() || m.rotation.entries.len() != m.rules.len() {
                    return Err(SessionError::Rotation(format!(
                        "{} has {} entries and {} rule sets",
                        m.rotation.name,
                        m.rotation.entries.len(),
                        m.rules.len()
                    )));
                }
                m.rotation.entries[0].betting_structure
            }
            None => table.betting_structure,
        };
        let game = Game::new(
            rules,
            structure,
            table.stakes,
            table.max_players,
            Arc::clone(&evaluator),
        )
        .map_err(engine_error)?;
        let now = Utc::now();
        let (events, _) = broadcast::channel(config.event_channel_capacity);

        Ok(Self {
            session_id: Uuid::new_v4().to_string(),
            table,
            game,
            evaluator,
            disconnect_grace: config.disconnect_grace(),
            created_at: now,
            last_activity: now,
            is_active: true,
            pause: Some(Pause::WaitingForPlayers),
            connected_players: BTreeSet::new(),
            disconnected_players: BTreeMap::new(),
            spectators: BTreeSet::new(),
            pending_leaves: BTreeSet::new(),
            hands_played: 0,
            current_hand_id: None,
            rotation: mixed.map(|game| RotationState {
                game,
                index: 0,
                hands_in_current_variant: 0,
                orbit_size: 0,
            }),
            stack_updates: Vec::new(),
            events,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn table_id(&self) -> &TableId {
        &self.table.id
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn variant(&self) -> &str {
        &self.game.rules().game
    }

    pub fn betting_structure(&self) -> BettingStructure {
        self.game.betting_structure()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_some()
    }

    pub fn pause_reason(&self) -> Option<&str> {
        self.pause.as_ref().map(Pause::reason)
    }

    pub fn is_connected(&self, user_id: &str) -> bool {
        self.connected_players.contains(user_id)
    }

    pub fn connected_count(&self) -> usize {
        self.connected_players.len()
    }

    pub fn spectator_count(&self) -> usize {
        self.spectators.len()
    }

    pub fn is_pending_leave(&self, user_id: &str) -> bool {
        self.pending_leaves.contains(user_id)
    }

    pub fn hands_played(&self) -> u64 {
        self.hands_played
    }

    pub fn current_hand_id(&self) -> Option<&str> {
        self.current_hand_id.as_deref()
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn touch_at(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TableEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: TableEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Stacks queued since the last call, for persistence outside the lock.
    pub fn take_stack_updates(&mut self) -> Vec<StackUpdate> {
        std::mem::take(&mut self.stack_updates)
    }

    fn queue_stack_updates(&mut self) {
        let updates: Vec<StackUpdate> = self
            .game
            .players()
            .map(|p| StackUpdate {
                player_id: p.id.clone(),
                stack: p.stack,
            })
            .collect();
        self.stack_updates.extend(updates);
    }

    fn update_pause(&mut self) {
        let connected = self.connected_players.len();
        match self.pause {
            Some(Pause::WaitingForPlayers) if connected >= 2 => {
                info!("Table {} resumed with {} players", self.table.id, connected);
                self.pause = None;
                self.emit(TableEvent::Resumed);
            }
            None if connected < 2 => {
                info!("Table {} paused: {}", self.table.id, WAITING_FOR_PLAYERS);
                self.pause = Some(Pause::WaitingForPlayers);
                self.emit(TableEvent::Paused {
                    reason: WAITING_FOR_PLAYERS.to_string(),
                });
            }
            _ => {}
        }
    }

    /// Pauses the table until [`GameSession::resume`]; joins are refused
    /// meanwhile.
    pub fn pause(&mut self, reason: &str) {
        self.pause = Some(Pause::Manual(reason.to_string()));
        self.emit(TableEvent::Paused {
            reason: reason.to_string(),
        });
    }

    pub fn resume(&mut self) {
        if matches!(self.pause, Some(Pause::Manual(_))) {
            self.pause = None;
            self.emit(TableEvent::Resumed);
        }
        self.update_pause();
    }

    pub fn add_player(
        &mut self,
        user_id: &str,
        username: &str,
        buy_in: i64,
        seat: Option<usize>,
    ) -> SessionResult<usize> {
        self.add_player_at(user_id, username, buy_in, seat, Utc::now())
    }

    pub fn add_player_at(
        &mut self,
        user_id: &str,
        username: &str,
        buy_in: i64,
        seat: Option<usize>,
        now: DateTime<Utc>,
    ) -> SessionResult<usize> {
        if !self.is_active {
            return Err(SessionError::NotActive);
        }
        if let Some(Pause::Manual(reason)) = &self.pause {
            return Err(SessionError::Paused(reason.clone()));
        }
        if self.connected_players.contains(user_id)
            || self.disconnected_players.contains_key(user_id)
        {
            return Err(SessionError::AlreadyInGame);
        }
        if buy_in < self.table.min_buy_in {
            return Err(SessionError::BuyInTooSmall(self.table.min_buy_in));
        }
        if buy_in > self.table.max_buy_in {
            return Err(SessionError::BuyInTooLarge(self.table.max_buy_in));
        }

        let seat = self
            .game
            .add_player(user_id.to_string(), username.to_string(), buy_in, seat)
            .map_err(engine_error)?;
        self.spectators.remove(user_id);
        self.connected_players.insert(user_id.to_string());
        info!("{} joined table {} at seat {}", username, self.table.id, seat);
        self.emit(TableEvent::PlayerJoined {
            player_id: user_id.to_string(),
            name: username.to_string(),
            stack: buy_in,
            seat,
        });
        self.update_pause();
        self.touch_at(now);
        Ok(seat)
    }

    /// Unseats a player and returns the stack they leave with.
    pub fn remove_player(&mut self, user_id: &str, reason: &str) -> SessionResult<i64> {
        let known = self.connected_players.contains(user_id)
            || self.disconnected_players.contains_key(user_id)
            || self.game.player(user_id).is_some();
        if !known {
            return Err(SessionError::NotInGame);
        }

        let stack = match self.game.remove_player(user_id) {
            Ok(player) => {
                self.stack_updates.push(StackUpdate {
                    player_id: player.id,
                    stack: player.stack,
                });
                player.stack
            }
            Err(GameError::PlayerNotFound(_)) => 0,
            Err(e) => return Err(engine_error(e)),
        };
        self.connected_players.remove(user_id);
        self.disconnected_players.remove(user_id);
        self.pending_leaves.remove(user_id);
        self.spectators.remove(user_id);
        info!("{} left table {}: {}", user_id, self.table.id, reason);
        self.emit(TableEvent::PlayerLeft {
            player_id: user_id.to_string(),
            reason: reason.to_string(),
        });

        self.settle_hand()?;
        self.update_pause();
        if self.game.seated_count() == 0 {
            info!("Table {} has no players left, deactivating", self.table.id);
            self.is_active = false;
        }
        Ok(stack)
    }

    /// Leave now, or at the end of the running hand.
    pub fn mark_player_leaving(&mut self, user_id: &str) -> SessionResult<()> {
        let seated = self.game.player(user_id).is_some();
        if !seated && !self.connected_players.contains(user_id) {
            return Err(SessionError::NotInGame);
        }
        if !self.game.is_hand_active() {
            self.remove_player(user_id, "left table")?;
            return Ok(());
        }

        self.pending_leaves.insert(user_id.to_string());
        let still_in_hand = self.game.player(user_id).is_some_and(|p| p.is_active);
        if !still_in_hand {
            debug!("{} leaves after the hand, already out of it", user_id);
            return Ok(());
        }

        if self.game.current_player() == Some(user_id) {
            self.apply_action(user_id, PlayerAction::Fold)?;
        } else {
            self.game.mark_inactive(user_id).map_err(engine_error)?;
            self.settle_hand()?;
        }
        Ok(())
    }

    /// Moves the hand on after someone left it out of turn: a lone survivor
    /// wins, a round nobody is owed action in closes, and leavers who end up
    /// on the clock are folded.
    fn settle_hand(&mut self) -> SessionResult<()> {
        if self.game.is_hand_active() {
            if self.game.active_count() <= 1 {
                self.game.complete_fold_win().map_err(engine_error)?;
            } else {
                advance_through_non_player_steps(&mut self.game).map_err(engine_error)?;
                while self.auto_fold_pending_player()? {}
            }
        }
        self.check_hand_complete();
        Ok(())
    }

    /// Folds the player to act if they asked to leave. Returns whether a fold
    /// happened.
    pub fn auto_fold_pending_player(&mut self) -> SessionResult<bool> {
        if self.game.state() != GameState::Betting {
            return Ok(false);
        }
        let Some(current) = self.game.current_player().map(str::to_string) else {
            return Ok(false);
        };
        if !self.pending_leaves.contains(&current) {
            return Ok(false);
        }
        debug!("Auto-folding {} who is leaving", current);
        self.game
            .handle_action(&current, PlayerAction::Fold)
            .map_err(engine_error)?;
        advance_through_non_player_steps(&mut self.game).map_err(engine_error)?;
        Ok(true)
    }

    pub fn process_pending_leaves(&mut self) {
        let leaving: Vec<PlayerId> = std::mem::take(&mut self.pending_leaves)
            .into_iter()
            .collect();
        for user_id in leaving {
            if let Err(e) = self.remove_player(&user_id, "left table") {
                warn!("Could not remove leaving player {}: {}", user_id, e);
            }
        }
    }

    pub fn handle_player_disconnect(&mut self, user_id: &str) -> SessionResult<()> {
        self.handle_player_disconnect_at(user_id, Utc::now())
    }

    pub fn handle_player_disconnect_at(
        &mut self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> SessionResult<()> {
        if !self.connected_players.remove(user_id) {
            return Err(SessionError::NotInGame);
        }
        self.disconnected_players.insert(user_id.to_string(), now);
        debug!("{} disconnected from table {}", user_id, self.table.id);
        self.emit(TableEvent::PlayerDisconnected {
            player_id: user_id.to_string(),
        });
        self.update_pause();
        Ok(())
    }

    pub fn handle_player_reconnect(&mut self, user_id: &str) -> SessionResult<()> {
        self.handle_player_reconnect_at(user_id, Utc::now())
    }

    pub fn handle_player_reconnect_at(
        &mut self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> SessionResult<()> {
        let since = self
            .disconnected_players
            .get(user_id)
            .copied()
            .ok_or(SessionError::NotDisconnected)?;
        if now - since >= self.disconnect_grace {
            warn!(
                "{} reconnected after {} minutes, removing",
                user_id,
                (now - since).num_minutes()
            );
            self.remove_player(user_id, "disconnected too long")?;
            return Err(SessionError::DisconnectedTooLong);
        }
        self.disconnected_players.remove(user_id);
        self.connected_players.insert(user_id.to_string());
        self.emit(TableEvent::PlayerReconnected {
            player_id: user_id.to_string(),
        });
        self.update_pause();
        self.touch_at(now);
        Ok(())
    }

    pub fn add_spectator(&mut self, user_id: &str) -> SessionResult<()> {
        if self.connected_players.contains(user_id)
            || self.disconnected_players.contains_key(user_id)
        {
            return Err(SessionError::AlreadyPlayer);
        }
        if !self.spectators.insert(user_id.to_string()) {
            return Err(SessionError::AlreadySpectating);
        }
        Ok(())
    }

    pub fn remove_spectator(&mut self, user_id: &str) -> SessionResult<()> {
        if !self.spectators.remove(user_id) {
            return Err(SessionError::NotSpectating);
        }
        Ok(())
    }

    /// Runs a player action. Returns the hand result when the action ended
    /// the hand.
    pub fn process_player_action(
        &mut self,
        user_id: &str,
        action: PlayerAction,
    ) -> SessionResult<Option<GameResult>> {
        if !self.is_active || self.is_paused() {
            return Err(SessionError::NotActive);
        }
        if !self.connected_players.contains(user_id) {
            return Err(SessionError::NotInGame);
        }
        let result = self.apply_action(user_id, action)?;
        self.touch_at(Utc::now());
        Ok(result)
    }

    fn apply_action(
        &mut self,
        user_id: &str,
        action: PlayerAction,
    ) -> SessionResult<Option<GameResult>> {
        self.game
            .handle_action(user_id, action)
            .map_err(engine_error)?;
        advance_through_non_player_steps(&mut self.game).map_err(engine_error)?;
        while self.auto_fold_pending_player()? {}
        Ok(self.check_hand_complete())
    }

    fn check_hand_complete(&mut self) -> Option<GameResult> {
        if self.current_hand_id.is_some() && self.game.state() == GameState::Complete {
            Some(self.on_hand_complete())
        } else {
            None
        }
    }

    fn on_hand_complete(&mut self) -> GameResult {
        self.hands_played += 1;
        let hand_id = self.current_hand_id.take();
        if let Some(rotation) = self.rotation.as_mut() {
            rotation.hands_in_current_variant += 1;
        }
        self.queue_stack_updates();
        let result = self.game.last_result().cloned().unwrap_or_default();
        info!(
            "Hand {:?} complete at table {}, {} hands played",
            hand_id, self.table.id, self.hands_played
        );
        self.emit(TableEvent::HandComplete {
            hand_id,
            result: result.clone(),
        });
        self.process_pending_leaves();
        result
    }

    /// Deals the next hand, rotating the variant first when an orbit is done.
    pub fn start_hand(&mut self) -> SessionResult<String> {
        if !self.is_active || self.is_paused() {
            return Err(SessionError::NotActive);
        }
        if self.game.is_hand_active() {
            return Err(SessionError::Game(GameError::HandInProgress));
        }
        if self.should_rotate() {
            self.rotate_variant()?;
        }
        let seated = self.game.seated_count();
        if let Some(rotation) = self.rotation.as_mut() {
            if rotation.hands_in_current_variant == 0 {
                rotation.orbit_size = seated;
            }
        }

        self.game.start_hand().map_err(engine_error)?;
        let hand_id = Uuid::new_v4().to_string();
        self.current_hand_id = Some(hand_id.clone());
        self.emit(TableEvent::HandStarted {
            hand_id: hand_id.clone(),
            hand_number: self.game.hand_number(),
            variant: self.variant().to_string(),
        });
        advance_through_non_player_steps(&mut self.game).map_err(engine_error)?;
        while self.auto_fold_pending_player()? {}
        self.check_hand_complete();
        self.touch_at(Utc::now());
        Ok(hand_id)
    }

    pub fn should_rotate(&self) -> bool {
        self.rotation
            .as_ref()
            .is_some_and(|r| r.orbit_size > 0 && r.hands_in_current_variant >= r.orbit_size)
    }

    /// Swaps in the engine for the next rotation entry, keeping every
    /// player's name, stack and seat and the button. The current engine is
    /// untouched if anything fails.
    pub fn rotate_variant(&mut self) -> SessionResult<()> {
        if self.game.is_hand_active() {
            return Err(SessionError::Game(GameError::HandInProgress));
        }
        let rotation = self
            .rotation
            .as_ref()
            .ok_or_else(|| SessionError::Rotation("table has no mixed game".to_string()))?;
        let next = (rotation.index + 1) % rotation.game.rotation.entries.len();
        let entry = &rotation.game.rotation.entries[next];
        let rules = rotation.game.rules.get(next).cloned().ok_or_else(|| {
            SessionError::Rotation(format!("no rules for {}", entry.variant))
        })?;
        let structure = entry.betting_structure;

        let snapshot = self.game.snapshot();
        let mut game = Game::new(
            rules,
            structure,
            self.table.stakes,
            self.table.max_players,
            Arc::clone(&self.evaluator),
        )
        .map_err(|e| SessionError::Rotation(e.to_string()))?;
        game.restore(&snapshot)
            .map_err(|e| SessionError::Rotation(e.to_string()))?;
        if game.snapshot() != snapshot {
            return Err(SessionError::Rotation(
                "seating changed during restore".to_string(),
            ));
        }

        let seated = game.seated_count();
        self.game = game;
        if let Some(rotation) = self.rotation.as_mut() {
            rotation.index = next;
            rotation.hands_in_current_variant = 0;
            rotation.orbit_size = seated;
        }
        info!(
            "Table {} rotated to {} ({})",
            self.table.id,
            self.variant(),
            structure
        );
        self.emit(TableEvent::VariantRotated {
            variant: self.variant().to_string(),
            betting_structure: structure,
        });
        Ok(())
    }

    pub fn get_session_info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.session_id.clone(),
            table_id: self.table.id.clone(),
            table_name: self.table.name.clone(),
            variant: self.variant().to_string(),
            betting_structure: self.betting_structure(),
            is_active: self.is_active,
            is_paused: self.is_paused(),
            pause_reason: self.pause_reason().map(str::to_string),
            connected_players: self.connected_players.iter().cloned().collect(),
            disconnected_players: self.disconnected_players.keys().cloned().collect(),
            spectators: self.spectators.iter().cloned().collect(),
            pending_leaves: self.pending_leaves.iter().cloned().collect(),
            hands_played: self.hands_played,
            current_hand_id: self.current_hand_id.clone(),
            mixed_game: self.rotation.as_ref().map(|r| r.game.rotation.name.clone()),
            hands_in_current_variant: self
                .rotation
                .as_ref()
                .map_or(0, |r| r.hands_in_current_variant),
            orbit_size: self.rotation.as_ref().map_or(0, |r| r.orbit_size),
            created_at: self.created_at,
            last_activity: self.last_activity,
        }
    }

    pub fn is_inactive(&self, timeout_minutes: i64) -> bool {
        self.is_inactive_at(timeout_minutes, Utc::now())
    }

    pub fn is_inactive_at(&self, timeout_minutes: i64, now: DateTime<Utc>) -> bool {
        now - self.last_activity > Duration::minutes(timeout_minutes)
    }

    /// Shuts the session down, queueing every seated stack for persistence.
    pub fn cleanup(&mut self) {
        self.queue_stack_updates();
        self.is_active = false;
        self.connected_players.clear();
        self.disconnected_players.clear();
        self.spectators.clear();
        self.pending_leaves.clear();
        self.current_hand_id = None;
        debug!("Session {} cleaned up", self.session_id);
    }
}
