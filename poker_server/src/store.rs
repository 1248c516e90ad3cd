//! Storage collaborators: table lookup, variant rules, rotations and stack
//! persistence.

use log::{debug, warn};
use parking_lot::Mutex;
use poker_protocol::{
    GameRules, MixedGameRotation, PlayerId, SessionInfo, StoreError, TableId, TableInfo,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Lookups return `Ok(None)` for a missing record; `Err` means the backend
/// itself failed.
pub trait TableStore: Send + Sync {
    fn find_table(&self, table_id: &str) -> StoreResult<Option<TableInfo>>;
    fn load_rules(&self, variant: &str) -> StoreResult<Option<GameRules>>;
    fn load_rotation(&self, name: &str) -> StoreResult<Option<MixedGameRotation>>;
    fn update_player_stack(&self, table_id: &str, player_id: &str, stack: i64) -> StoreResult<()>;
    fn save_session_state(&self, info: &SessionInfo) -> StoreResult<()>;
    fn clear_session_state(&self, table_id: &str) -> StoreResult<()>;
}

#[derive(Default)]
struct StoreState {
    tables: HashMap<TableId, TableInfo>,
    rules: HashMap<String, GameRules>,
    rotations: HashMap<String, MixedGameRotation>,
    stacks: HashMap<(TableId, PlayerId), i64>,
    session_state: HashMap<TableId, String>,
}

#[derive(Default)]
pub struct InMemoryTableStore {
    state: Mutex<StoreState>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_table(&self, table: TableInfo) {
        self.state.lock().tables.insert(table.id.clone(), table);
    }

    pub fn insert_rules(&self, rules: GameRules) {
        self.state.lock().rules.insert(rules.game.clone(), rules);
    }

    pub fn insert_rotation(&self, rotation: MixedGameRotation) {
        self.state
            .lock()
            .rotations
            .insert(rotation.name.clone(), rotation);
    }

    /// Loads every `*.json` variant file from `dir`.
    pub fn load_rules_dir(&self, dir: &RulesDirectory) -> StoreResult<usize> {
        let rules = dir.load_all()?;
        let count = rules.len();
        for r in rules {
            self.insert_rules(r);
        }
        Ok(count)
    }

    pub fn stack(&self, table_id: &str, player_id: &str) -> Option<i64> {
        self.state
            .lock()
            .stacks
            .get(&(table_id.to_string(), player_id.to_string()))
            .copied()
    }

    /// The last saved session row for a table, as JSON.
    pub fn session_state(&self, table_id: &str) -> Option<String> {
        self.state.lock().session_state.get(table_id).cloned()
    }
}

impl TableStore for InMemoryTableStore {
    fn find_table(&self, table_id: &str) -> StoreResult<Option<TableInfo>> {
        Ok(self.state.lock().tables.get(table_id).cloned())
    }

    fn load_rules(&self, variant: &str) -> StoreResult<Option<GameRules>> {
        Ok(self.state.lock().rules.get(variant).cloned())
    }

    fn load_rotation(&self, name: &str) -> StoreResult<Option<MixedGameRotation>> {
        Ok(self.state.lock().rotations.get(name).cloned())
    }

    fn update_player_stack(&self, table_id: &str, player_id: &str, stack: i64) -> StoreResult<()> {
        debug!("Persisting stack {} for {} at {}", stack, player_id, table_id);
        self.state
            .lock()
            .stacks
            .insert((table_id.to_string(), player_id.to_string()), stack);
        Ok(())
    }

    fn save_session_state(&self, info: &SessionInfo) -> StoreResult<()> {
        let json = serde_json::to_string(info).map_err(|e| StoreError::Backend(e.to_string()))?;
        self.state
            .lock()
            .session_state
            .insert(info.table_id.clone(), json);
        Ok(())
    }

    fn clear_session_state(&self, table_id: &str) -> StoreResult<()> {
        self.state.lock().session_state.remove(table_id);
        Ok(())
    }
}

/// A directory of variant rule files, one JSON document per variant.
#[derive(Debug, Clone)]
pub struct RulesDirectory {
    root: PathBuf,
}

impl RulesDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_file(path: &Path) -> StoreResult<GameRules> {
        let json = fs::read_to_string(path)
            .map_err(|e| StoreError::Backend(format!("{}: {}", path.display(), e)))?;
        GameRules::from_json(&json)
            .map_err(|e| StoreError::Backend(format!("{}: {}", path.display(), e)))
    }

    /// Files that fail to parse are skipped with a warning.
    pub fn load_all(&self) -> StoreResult<Vec<GameRules>> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| StoreError::Backend(format!("{}: {}", self.root.display(), e)))?;
        let mut rules = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::load_file(&path) {
                Ok(r) => rules.push(r),
                Err(e) => warn!("Skipping variant file: {}", e),
            }
        }
        rules.sort_by(|a, b| a.game.cmp(&b.game));
        Ok(rules)
    }
}
