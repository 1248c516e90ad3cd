//! Pot bookkeeping: per-player contributions are split into a main pot and
//! side pots at every all-in level, each with its own eligible players.

use log::warn;
use poker_protocol::{GameResult, PlayerId, PlayerState};
use std::collections::{BTreeMap, BTreeSet};

/// Read side of the betting ledger the showdown consumes.
pub trait PotLedger {
    fn main_pot_amount(&self) -> i64;
    fn main_pot_eligible_players(&self) -> BTreeSet<PlayerId>;
    fn side_pot_count(&self) -> usize;
    fn side_pot_amount(&self, index: usize) -> i64;
    fn side_pot_eligible_players(&self, index: usize) -> BTreeSet<PlayerId>;

    fn total_pot(&self) -> i64 {
        self.main_pot_amount()
            + (0..self.side_pot_count())
                .map(|i| self.side_pot_amount(i))
                .sum::<i64>()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pot {
    pub amount: i64,
    pub eligible: BTreeSet<PlayerId>,
}

impl Pot {
    pub fn new(amount: i64, eligible: &[&str]) -> Self {
        Self {
            amount,
            eligible: eligible.iter().map(|id| id.to_string()).collect(),
        }
    }
}

/// Pots frozen at the end of betting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PotSnapshot {
    main: Pot,
    side: Vec<Pot>,
}

impl PotSnapshot {
    pub fn new(main: Pot, side: Vec<Pot>) -> Self {
        Self { main, side }
    }

    /// Builds the pots from `(player, total committed, still in hand)`.
    ///
    /// Every distinct commitment of a live player opens a new level. Chips
    /// folded players put in above the top live level go to the last pot.
    pub fn from_contributions(contributions: &[(PlayerId, i64, bool)]) -> Self {
        let mut levels: Vec<i64> = contributions
            .iter()
            .filter(|(_, amount, live)| *live && *amount > 0)
            .map(|(_, amount, _)| *amount)
            .collect();
        levels.sort_unstable();
        levels.dedup();

        let mut pots: Vec<Pot> = Vec::new();
        let mut previous = 0;
        for &level in &levels {
            let amount: i64 = contributions
                .iter()
                .map(|(_, c, _)| (*c).min(level) - (*c).min(previous))
                .sum();
            let eligible: BTreeSet<PlayerId> = contributions
                .iter()
                .filter(|(_, c, live)| *live && *c >= level)
                .map(|(id, _, _)| id.clone())
                .collect();
            pots.push(Pot { amount, eligible });
            previous = level;
        }

        let dead: i64 = contributions
            .iter()
            .map(|(_, c, _)| (*c - previous).max(0))
            .sum();
        if dead > 0 {
            match pots.last_mut() {
                Some(last) => last.amount += dead,
                None => warn!("{} chips committed with no live player left", dead),
            }
        }

        let mut pots = pots.into_iter();
        let main = pots.next().unwrap_or_default();
        Self {
            main,
            side: pots.collect(),
        }
    }

    pub fn from_players<'a>(players: impl IntoIterator<Item = &'a PlayerState>) -> Self {
        let contributions: Vec<(PlayerId, i64, bool)> = players
            .into_iter()
            .map(|p| (p.id.clone(), p.total_bet, p.is_active))
            .collect();
        Self::from_contributions(&contributions)
    }

    pub fn main(&self) -> &Pot {
        &self.main
    }

    pub fn side_pots(&self) -> &[Pot] {
        &self.side
    }
}

impl PotLedger for PotSnapshot {
    fn main_pot_amount(&self) -> i64 {
        self.main.amount
    }

    fn main_pot_eligible_players(&self) -> BTreeSet<PlayerId> {
        self.main.eligible.clone()
    }

    fn side_pot_count(&self) -> usize {
        self.side.len()
    }

    fn side_pot_amount(&self, index: usize) -> i64 {
        self.side.get(index).map_or(0, |p| p.amount)
    }

    fn side_pot_eligible_players(&self, index: usize) -> BTreeSet<PlayerId> {
        self.side
            .get(index)
            .map(|p| p.eligible.clone())
            .unwrap_or_default()
    }
}

/// Credits every pot award in `result` to the players' stacks. Returns the
/// total credited.
pub fn distribute<'a>(
    result: &GameResult,
    players: impl IntoIterator<Item = &'a mut PlayerState>,
) -> i64 {
    let mut winnings: BTreeMap<PlayerId, i64> = result.winnings();
    let mut credited = 0;
    for player in players {
        if let Some(amount) = winnings.remove(&player.id) {
            player.stack += amount;
            credited += amount;
        }
    }
    for (id, amount) in winnings {
        warn!("Pot award of {} for {} who is no longer seated", amount, id);
    }
    credited
}
