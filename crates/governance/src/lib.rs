//! Team and proposal state machine for the Team DAO governance engine.
//!
//! A team is a captained group of players. The captain invites players,
//! players join up to the team's capacity, and the captain raises
//! proposals the roster votes on. A passed prize-distribution proposal
//! lets every recorded recipient withdraw their percentage share of a
//! pooled amount, exactly once.
//!
//! State lives in individually addressed records (`teams/{name}`,
//! `proposals/{title}`) behind the [`RecordStore`] seam from
//! `team-dao-storage`; fund movement goes through the [`FundLedger`]
//! seam from `team-dao-ledger`. Records can be read and written by any
//! caller holding a valid name, so every operation re-validates
//! authorization and invariants before it touches anything.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use team_dao_ledger::LedgerError;
use team_dao_storage::StoreError;

pub mod engine;
pub mod proposal;
pub mod team;

pub use engine::{GovernanceConfig, GovernanceEngine, PrizeClaim};
pub use proposal::{Ballot, ProposalCategory, ProposalKind, ProposalRecord, ProposalStatus};
pub use team::TeamRecord;

// Re-export the collaborator seams so embedders only need this crate.
pub use team_dao_ledger::FundLedger;
pub use team_dao_storage::RecordStore;

/// A verified caller identity.
///
/// Signature verification happens upstream; by the time the engine
/// sees a `PlayerId` it is trusted to name the actual caller.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Error types for governance operations.
///
/// Every failure is a distinguishable kind so callers can branch on
/// cause; no operation surfaces a bare failure.
#[derive(Debug, Error)]
pub enum GovernanceError {
    // Authorization
    #[error("Player {0} is not allowed to {1}")]
    Unauthorized(PlayerId, &'static str),

    #[error("Player {0} has not been invited to the team")]
    NotInvited(PlayerId),

    #[error("Player {0} is not a team member")]
    NotAMember(PlayerId),

    #[error("The captain must transfer ownership before leaving the team")]
    CaptainCannotLeave,

    // Uniqueness and state conflicts
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    #[error("Player {0} is already invited")]
    AlreadyInvited(PlayerId),

    #[error("Player {0} is already a team member")]
    AlreadyMember(PlayerId),

    #[error("Player {0} has already voted on this proposal")]
    AlreadyVoted(PlayerId),

    #[error("Player {0} has already claimed their share")]
    AlreadyClaimed(PlayerId),

    #[error("Player {0} is already the team captain")]
    AlreadyCaptain(PlayerId),

    // Capacity and validation
    #[error("Team is at its capacity of {0}")]
    TeamFull(u32),

    #[error("Team capacity must be at least 1, got {0}")]
    InvalidCapacity(u32),

    #[error("Invalid prize shares: {0}")]
    InvalidShares(String),

    #[error("Invalid ballot: {0:?}")]
    InvalidBallot(String),

    #[error("Invalid proposal category: {0:?}")]
    InvalidCategory(String),

    #[error("Invalid proposal kind: {0:?}")]
    InvalidKind(String),

    #[error("Tournament selection requires a tournament name")]
    InvalidTournament,

    // Proposal state
    #[error("Proposal is closed with status {0:?}")]
    ProposalClosed(ProposalStatus),

    #[error("Proposal has not been approved")]
    NotApproved,

    #[error("Proposal is not a prize distribution")]
    NotDistribution,

    // Resolution failures
    #[error("Team not found: {0}")]
    TeamNotFound(String),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(String),

    // External collaborators
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Fund transfer failed: {0}")]
    TransferFailed(#[from] LedgerError),
}

/// Result type for governance operations
pub type GovernanceResult<T> = Result<T, GovernanceError>;
