use crate::sim::UnitKind;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("invalid team index {0} (expected 0 or 1)")]
    InvalidTeam(u8),
    #[error("cannot afford {kind:?}: costs {cost}, have {available}")]
    InsufficientCurrency {
        kind: UnitKind,
        cost: u32,
        available: u32,
    },
    #[error("match is over")]
    MatchOver,
    #[error("match has not started")]
    NotStarted,
    #[error("no peer connected")]
    NotConnected,
}
