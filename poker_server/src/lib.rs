pub mod config;
pub mod evaluator;
pub mod game;
pub mod hand_search;
pub mod orchestrator;
pub mod pot;
pub mod session;
pub mod showdown;
pub mod store;
pub mod wild;

pub use config::ServerConfig;
pub use evaluator::{HandEvaluator, StandardEvaluator};
pub use game::{Game, GameState};
pub use orchestrator::{advance_through_non_player_steps, GameOrchestrator, SharedSession};
pub use pot::{PotLedger, PotSnapshot};
pub use session::{GameSession, MixedGame, StackUpdate};
pub use showdown::{ShowdownManager, ShowdownPlayer, ShowdownTable};
pub use store::{InMemoryTableStore, RulesDirectory, TableStore};
