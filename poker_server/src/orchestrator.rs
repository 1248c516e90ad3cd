//! Process-wide directory of table sessions.
//!
//! The map lock guards structure (create, remove, sweep); each session has
//! its own lock for player-facing mutations. Locks are always taken map
//! first, then session, and stack persistence happens with neither held.
//! The store is a leaf: it may be called under either lock.

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use parking_lot::Mutex;
use poker_protocol::{
    EngineResult, GameResult, GameRules, OrchestratorError, OrchestratorResult,
    OrchestratorStats, PlayerAction, SessionResult, TableId, TableInfo,
};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::evaluator::HandEvaluator;
use crate::game::{Game, GameState};
use crate::session::{GameSession, MixedGame, StackUpdate};
use crate::store::TableStore;

pub type SharedSession = Arc<Mutex<GameSession>>;

/// Runs engine steps that need no player input, stopping once someone has to
/// act or the hand is over.
pub fn advance_through_non_player_steps(game: &mut Game) -> EngineResult<()> {
    loop {
        let waiting = game.current_player().is_some();
        match game.state() {
            GameState::Dealing => game.next_step()?,
            GameState::Betting | GameState::Drawing | GameState::Declaring if !waiting => {
                game.next_step()?
            }
            _ => return Ok(()),
        }
    }
}

pub struct GameOrchestrator {
    sessions: Mutex<HashMap<TableId, SharedSession>>,
    store: Arc<dyn TableStore>,
    evaluator: Arc<dyn HandEvaluator>,
    config: ServerConfig,
}

impl GameOrchestrator {
    pub fn new(
        store: Arc<dyn TableStore>,
        evaluator: Arc<dyn HandEvaluator>,
        config: ServerConfig,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            store,
            evaluator,
            config,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Store lookups run without the map lock; the table is checked again
    /// before the new session is registered.
    pub fn create_session(&self, table_id: &str) -> OrchestratorResult<SharedSession> {
        if self.sessions.lock().contains_key(table_id) {
            return Err(OrchestratorError::SessionExists(table_id.to_string()));
        }

        let table = self
            .store
            .find_table(table_id)?
            .ok_or_else(|| OrchestratorError::TableNotFound(table_id.to_string()))?;
        let (rules, mixed) = self.resolve_rules(&table)?;
        let session = GameSession::new(
            table,
            rules,
            mixed,
            Arc::clone(&self.evaluator),
            &self.config,
        )?;
        let session_id = session.session_id().to_string();
        let variant = session.variant().to_string();
        let session = Arc::new(Mutex::new(session));

        match self.sessions.lock().entry(table_id.to_string()) {
            Entry::Occupied(_) => {
                debug!("Lost race creating session for table {}", table_id);
                return Err(OrchestratorError::SessionExists(table_id.to_string()));
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&session));
            }
        }
        info!(
            "Created session {} for table {} ({})",
            session_id, table_id, variant
        );
        Ok(session)
    }

    fn resolve_rules(
        &self,
        table: &TableInfo,
    ) -> OrchestratorResult<(GameRules, Option<MixedGame>)> {
        let Some(name) = &table.mixed_game else {
            let rules = self
                .store
                .load_rules(&table.variant)?
                .ok_or_else(|| OrchestratorError::RulesNotFound(table.variant.clone()))?;
            return Ok((rules, None));
        };

        let rotation = self
            .store
            .load_rotation(name)?
            .ok_or_else(|| OrchestratorError::RotationNotFound(name.clone()))?;
        let mut all_rules = Vec::with_capacity(rotation.entries.len());
        for entry in &rotation.entries {
            let rules = self
                .store
                .load_rules(&entry.variant)?
                .ok_or_else(|| OrchestratorError::RulesNotFound(entry.variant.clone()))?;
            all_rules.push(rules);
        }
        let first = all_rules
            .first()
            .cloned()
            .ok_or_else(|| OrchestratorError::RotationNotFound(name.clone()))?;
        Ok((
            first,
            Some(MixedGame {
                rotation,
                rules: all_rules,
            }),
        ))
    }

    pub fn get_session(&self, table_id: &str) -> Option<SharedSession> {
        self.sessions.lock().get(table_id).cloned()
    }

    /// Unregisters and cleans up a session. Returns false if there was none.
    pub fn remove_session(&self, table_id: &str) -> bool {
        let removed = self.sessions.lock().remove(table_id);
        match removed {
            Some(session) => {
                self.shut_down(table_id, &session);
                true
            }
            None => false,
        }
    }

    fn shut_down(&self, table_id: &str, session: &SharedSession) {
        let updates = {
            let mut session = session.lock();
            session.cleanup();
            session.take_stack_updates()
        };
        self.persist_stack_updates(table_id, updates);
        if let Err(e) = self.store.clear_session_state(table_id) {
            error!("Failed to clear session state for {}: {}", table_id, e);
        }
        info!("Removed session for table {}", table_id);
    }

    pub fn get_all_sessions(&self) -> Vec<SharedSession> {
        self.sessions.lock().values().cloned().collect()
    }

    pub fn get_session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn cleanup_inactive_sessions(&self, timeout_minutes: i64) -> usize {
        self.cleanup_inactive_sessions_at(timeout_minutes, Utc::now())
    }

    /// Sessions busy with an action are skipped rather than waited on.
    pub fn cleanup_inactive_sessions_at(&self, timeout_minutes: i64, now: DateTime<Utc>) -> usize {
        let removed: Vec<(TableId, SharedSession)> = {
            let mut sessions = self.sessions.lock();
            let idle: Vec<TableId> = sessions
                .iter()
                .filter(|(_, session)| {
                    session
                        .try_lock()
                        .is_some_and(|s| s.is_inactive_at(timeout_minutes, now))
                })
                .map(|(id, _)| id.clone())
                .collect();
            idle.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|s| (id, s)))
                .collect()
        };

        for (table_id, session) in &removed {
            debug!("Session for table {} idle over {} minutes", table_id, timeout_minutes);
            self.shut_down(table_id, session);
        }
        removed.len()
    }

    pub fn get_orchestrator_stats(&self) -> OrchestratorStats {
        let sessions = self.sessions.lock();
        let mut stats = OrchestratorStats {
            total_sessions: sessions.len(),
            ..OrchestratorStats::default()
        };
        let mut players_in_active = 0;
        for session in sessions.values() {
            let session = session.lock();
            if session.is_active() && session.is_paused() {
                stats.paused_sessions += 1;
            } else if session.is_active() {
                stats.active_sessions += 1;
                players_in_active += session.connected_count();
            }
            stats.total_connected_players += session.connected_count();
            stats.total_spectators += session.spectator_count();
        }
        if stats.active_sessions > 0 {
            stats.average_players_per_session =
                players_in_active as f64 / stats.active_sessions as f64;
        }
        stats
    }

    /// Runs `f` under the session lock and refreshes the session row, then
    /// persists any stacks it queued once the lock is released.
    pub fn with_session<T>(
        &self,
        table_id: &str,
        f: impl FnOnce(&mut GameSession) -> SessionResult<T>,
    ) -> OrchestratorResult<T> {
        let session = self
            .get_session(table_id)
            .ok_or_else(|| OrchestratorError::NoSession(table_id.to_string()))?;
        let (result, updates) = {
            let mut session = session.lock();
            let result = f(&mut session);
            // Saved under the lock so a concurrent removal cannot resurrect the row.
            if session.is_active() {
                if let Err(e) = self.store.save_session_state(&session.get_session_info()) {
                    error!("Failed to save session state for {}: {}", table_id, e);
                }
            }
            (result, session.take_stack_updates())
        };
        self.persist_stack_updates(table_id, updates);
        Ok(result?)
    }

    pub fn dispatch_action(
        &self,
        table_id: &str,
        user_id: &str,
        action: PlayerAction,
    ) -> OrchestratorResult<Option<GameResult>> {
        self.with_session(table_id, |session| {
            session.process_player_action(user_id, action)
        })
    }

    fn persist_stack_updates(&self, table_id: &str, updates: Vec<StackUpdate>) {
        for update in updates {
            if let Err(e) = self
                .store
                .update_player_stack(table_id, &update.player_id, update.stack)
            {
                error!(
                    "Failed to persist stack {} for {} at {}: {}",
                    update.stack, update.player_id, table_id, e
                );
            }
        }
    }

    /// Sweeps idle sessions on the configured interval.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let period = Duration::from_secs(orchestrator.config.cleanup_interval_secs.max(1));
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let removed =
                    orchestrator.cleanup_inactive_sessions(orchestrator.config.idle_timeout_minutes);
                if removed > 0 {
                    info!("Cleanup removed {} idle sessions", removed);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::StandardEvaluator;
    use crate::store::{InMemoryTableStore, StoreResult};
    use poker_protocol::{
        BettingStructure, GameRules, MixedGameRotation, RotationEntry, SessionError, SessionInfo,
        Stakes, TableInfo,
    };
    use std::sync::mpsc;
    use std::thread;

    const HOLDEM: &str = r#"{
        "game": "Hold'em",
        "minPlayers": 2,
        "maxPlayers": 9,
        "bettingStructures": ["Limit", "No Limit"],
        "steps": [
            {"type": "post_blinds"},
            {"type": "deal", "target": "hole", "count": 2},
            {"type": "bet", "size": "small"},
            {"type": "deal", "target": "community", "count": 5},
            {"type": "bet", "size": "big"},
            {"type": "showdown"}
        ],
        "showdown": {
            "bestHand": [{"name": "High Hand", "evaluationType": "high", "anyCards": 5}]
        }
    }"#;

    fn table(id: &str) -> TableInfo {
        TableInfo {
            id: id.to_string(),
            name: format!("Table {}", id),
            variant: "Hold'em".to_string(),
            betting_structure: BettingStructure::NoLimit,
            stakes: Stakes::new(5, 10),
            max_players: 9,
            min_buy_in: 100,
            max_buy_in: 1000,
            mixed_game: None,
        }
    }

    fn setup() -> (Arc<InMemoryTableStore>, GameOrchestrator) {
        let store = Arc::new(InMemoryTableStore::new());
        store.insert_rules(GameRules::from_json(HOLDEM).unwrap());
        store.insert_table(table("t1"));
        store.insert_table(table("t2"));
        let orchestrator = GameOrchestrator::new(
            store.clone(),
            Arc::new(StandardEvaluator::new()),
            ServerConfig::default(),
        );
        (store, orchestrator)
    }

    fn seat(orchestrator: &GameOrchestrator, table_id: &str, players: &[&str]) {
        for id in players {
            orchestrator
                .with_session(table_id, |s| s.add_player(id, id, 500, None))
                .unwrap();
        }
    }

    #[test]
    fn test_one_session_per_table() {
        let (_, orchestrator) = setup();
        let first = orchestrator.create_session("t1").unwrap();
        let first_id = first.lock().session_id().to_string();

        let err = orchestrator.create_session("t1").unwrap_err();
        assert!(matches!(err, OrchestratorError::SessionExists(_)));
        assert_eq!(orchestrator.get_session_count(), 1);
        let current = orchestrator.get_session("t1").unwrap();
        assert_eq!(current.lock().session_id(), first_id);
    }

    #[test]
    fn test_missing_table_and_rules_are_distinct() {
        let (store, orchestrator) = setup();
        assert!(matches!(
            orchestrator.create_session("nope"),
            Err(OrchestratorError::TableNotFound(_))
        ));

        store.insert_table(TableInfo {
            variant: "Badugi".to_string(),
            ..table("t3")
        });
        assert!(matches!(
            orchestrator.create_session("t3"),
            Err(OrchestratorError::RulesNotFound(_))
        ));
        assert_eq!(orchestrator.get_session_count(), 0);
    }

    #[test]
    fn test_mixed_table_starts_with_first_entry() {
        let (store, orchestrator) = setup();
        store.insert_rotation(MixedGameRotation {
            name: "Mix".to_string(),
            entries: vec![RotationEntry {
                variant: "Hold'em".to_string(),
                betting_structure: BettingStructure::Limit,
                display_name: None,
            }],
        });
        store.insert_table(TableInfo {
            mixed_game: Some("Mix".to_string()),
            ..table("m1")
        });
        let session = orchestrator.create_session("m1").unwrap();
        let session = session.lock();
        assert_eq!(session.betting_structure(), BettingStructure::Limit);
        assert_eq!(session.get_session_info().mixed_game.as_deref(), Some("Mix"));

        store.insert_table(TableInfo {
            mixed_game: Some("Unknown".to_string()),
            ..table("m2")
        });
        assert!(matches!(
            orchestrator.create_session("m2"),
            Err(OrchestratorError::RotationNotFound(_))
        ));
    }

    /// Blocks inside `find_table` until the test releases it.
    struct GatedStore {
        inner: InMemoryTableStore,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl TableStore for GatedStore {
        fn find_table(&self, table_id: &str) -> StoreResult<Option<TableInfo>> {
            self.entered.lock().send(()).unwrap();
            self.release.lock().recv().unwrap();
            self.inner.find_table(table_id)
        }
        fn load_rules(&self, variant: &str) -> StoreResult<Option<GameRules>> {
            self.inner.load_rules(variant)
        }
        fn load_rotation(&self, name: &str) -> StoreResult<Option<MixedGameRotation>> {
            self.inner.load_rotation(name)
        }
        fn update_player_stack(
            &self,
            table_id: &str,
            player_id: &str,
            stack: i64,
        ) -> StoreResult<()> {
            self.inner.update_player_stack(table_id, player_id, stack)
        }
        fn save_session_state(&self, info: &SessionInfo) -> StoreResult<()> {
            self.inner.save_session_state(info)
        }
        fn clear_session_state(&self, table_id: &str) -> StoreResult<()> {
            self.inner.clear_session_state(table_id)
        }
    }

    #[test]
    fn test_slow_table_lookup_does_not_block_other_tables() {
        let inner = InMemoryTableStore::new();
        inner.insert_rules(GameRules::from_json(HOLDEM).unwrap());
        inner.insert_table(table("t1"));
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let store = GatedStore {
            inner,
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        let orchestrator = Arc::new(GameOrchestrator::new(
            Arc::new(store),
            Arc::new(StandardEvaluator::new()),
            ServerConfig::default(),
        ));

        let creator = {
            let orchestrator = Arc::clone(&orchestrator);
            thread::spawn(move || orchestrator.create_session("t1").map(|_| ()))
        };
        entered_rx.recv().unwrap();
        assert!(orchestrator.sessions.try_lock().is_some());
        assert_eq!(orchestrator.get_session_count(), 0);

        release_tx.send(()).unwrap();
        creator.join().unwrap().unwrap();
        assert!(orchestrator.get_session("t1").is_some());
    }

    #[test]
    fn test_cleanup_removes_only_idle_sessions() {
        let (_, orchestrator) = setup();
        let now = Utc::now();
        orchestrator
            .create_session("t1")
            .unwrap()
            .lock()
            .touch_at(now - chrono::Duration::minutes(45));
        orchestrator
            .create_session("t2")
            .unwrap()
            .lock()
            .touch_at(now - chrono::Duration::minutes(5));

        assert_eq!(orchestrator.cleanup_inactive_sessions_at(30, now), 1);
        assert!(orchestrator.get_session("t1").is_none());
        assert!(orchestrator.get_session("t2").is_some());
    }

    #[test]
    fn test_cleanup_skips_busy_session() {
        let (_, orchestrator) = setup();
        let now = Utc::now();
        let session = orchestrator.create_session("t1").unwrap();
        session.lock().touch_at(now - chrono::Duration::minutes(45));

        let guard = session.lock();
        assert_eq!(orchestrator.cleanup_inactive_sessions_at(30, now), 0);
        drop(guard);
        assert_eq!(orchestrator.cleanup_inactive_sessions_at(30, now), 1);
    }

    #[test]
    fn test_remove_session_persists_and_clears_state() {
        let (store, orchestrator) = setup();
        orchestrator.create_session("t1").unwrap();
        seat(&orchestrator, "t1", &["a", "b"]);
        let saved = store.session_state("t1").unwrap();
        let info: serde_json::Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(info["connected_players"], serde_json::json!(["a", "b"]));
        assert_eq!(info["is_paused"], false);

        assert!(orchestrator.remove_session("t1"));
        assert!(!orchestrator.remove_session("t1"));
        assert!(store.session_state("t1").is_none());
        assert_eq!(store.stack("t1", "a"), Some(500));
    }

    #[test]
    fn test_stats() {
        let (_, orchestrator) = setup();
        orchestrator.create_session("t1").unwrap();
        orchestrator.create_session("t2").unwrap();
        seat(&orchestrator, "t1", &["a", "b", "c"]);
        seat(&orchestrator, "t2", &["d"]);
        orchestrator
            .with_session("t2", |s| s.add_spectator("e"))
            .unwrap();

        let stats = orchestrator.get_orchestrator_stats();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.active_sessions, 1);
        assert_eq!(stats.paused_sessions, 1);
        assert_eq!(stats.total_connected_players, 4);
        assert_eq!(stats.total_spectators, 1);
        assert_eq!(stats.average_players_per_session, 3.0);
    }

    #[test]
    fn test_dispatch_action_persists_stacks_after_hand() {
        let (store, orchestrator) = setup();
        orchestrator.create_session("t1").unwrap();
        seat(&orchestrator, "t1", &["a", "b"]);
        orchestrator.with_session("t1", |s| s.start_hand()).unwrap();

        let current = orchestrator
            .with_session("t1", |s| {
                Ok(s.game().current_player().map(str::to_string))
            })
            .unwrap()
            .unwrap();
        let result = orchestrator
            .dispatch_action("t1", &current, PlayerAction::Fold)
            .unwrap()
            .unwrap();

        assert_eq!(result.total_awarded(), 15);
        let a = store.stack("t1", "a").unwrap();
        let b = store.stack("t1", "b").unwrap();
        assert_eq!(a + b, 1000);
        assert_eq!(store.stack("t1", &current), Some(495));
    }

    #[test]
    fn test_dispatch_errors() {
        let (_, orchestrator) = setup();
        assert!(matches!(
            orchestrator.dispatch_action("t1", "a", PlayerAction::Fold),
            Err(OrchestratorError::NoSession(_))
        ));
        orchestrator.create_session("t1").unwrap();
        assert!(matches!(
            orchestrator.dispatch_action("t1", "a", PlayerAction::Fold),
            Err(OrchestratorError::Session(SessionError::NotActive))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_sweeps_idle_sessions() {
        let (_, orchestrator) = setup();
        let orchestrator = Arc::new(orchestrator);
        orchestrator
            .create_session("t1")
            .unwrap()
            .lock()
            .touch_at(Utc::now() - chrono::Duration::minutes(45));

        let handle = orchestrator.spawn_cleanup_task();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(orchestrator.get_session_count(), 0);
        handle.abort();
    }
}
