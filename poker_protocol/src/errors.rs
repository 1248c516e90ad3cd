use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid card: {0}")]
    InvalidCard(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Invalid action amount: {0}")]
    InvalidAmount(String),
}

/// Problems in a variant or showdown configuration.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Failed to parse rules: {0}")]
    Parse(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid {field} in {config}: {reason}")]
    InvalidField {
        config: String,
        field: String,
        reason: String,
    },
}

/// Errors raised by the rules engine for a single table.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Player already seated: {0}")]
    AlreadySeated(String),

    #[error("Seat {0} is not available")]
    SeatUnavailable(usize),

    #[error("Table is full")]
    TableFull,

    #[error("Not enough players to start a hand")]
    NotEnoughPlayers,

    #[error("A hand is already in progress")]
    HandInProgress,

    #[error("No hand in progress")]
    NoHandInProgress,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Action {0} is not allowed now")]
    IllegalAction(String),

    #[error("Cannot check, must call")]
    CannotCheck,

    #[error("Cannot bet, must call or raise")]
    CannotBet,

    #[error("Cannot raise, must bet first")]
    CannotRaise,

    #[error("Minimum bet is {0}")]
    MinBet(i64),

    #[error("Minimum raise is to {0}")]
    MinRaise(i64),

    #[error("Maximum bet is {0}")]
    MaxBet(i64),

    #[error("Limit bet must be exactly {0}")]
    LimitBet(i64),

    #[error("Betting is capped for this round")]
    BettingCapped,

    #[error("Bet amount {0} exceeds your chips ({1})")]
    BetExceedsChips(i64, i64),

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Cannot discard more than {0} cards")]
    TooManyDiscards(usize),

    #[error("Card not in hand: {0}")]
    CardNotInHand(String),

    #[error("Missing declaration")]
    MissingDeclaration,

    #[error("Internal game error: {0}")]
    Internal(String),
}

/// Player-facing failures of a table session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Game is paused: {0}")]
    Paused(String),

    #[error("Session is not active")]
    NotActive,

    #[error("Player is already in the game")]
    AlreadyInGame,

    #[error("Player is not in the game")]
    NotInGame,

    #[error("Player is not disconnected")]
    NotDisconnected,

    #[error("Disconnected too long, removed from game")]
    DisconnectedTooLong,

    #[error("User is already a player at this table")]
    AlreadyPlayer,

    #[error("User is already spectating")]
    AlreadySpectating,

    #[error("User is not spectating")]
    NotSpectating,

    #[error("Minimum buy-in is ${0}")]
    BuyInTooSmall(i64),

    #[error("Maximum buy-in is ${0}")]
    BuyInTooLarge(i64),

    #[error("{0}")]
    Game(#[from] GameError),

    #[error("Failed to rotate variant: {0}")]
    Rotation(String),

    #[error("processing error: {0}")]
    Processing(String),
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Session already exists for table {0}")]
    SessionExists(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Rules not found for variant {0}")]
    RulesNotFound(String),

    #[error("Mixed game rotation not found: {0}")]
    RotationNotFound(String),

    #[error("No session for table {0}")]
    NoSession(String),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend failure: {0}")]
    Backend(String),
}
