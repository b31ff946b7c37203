//! Team DAO — a small-group governance engine.
//!
//! A team of players, led by a captain, raises proposals, collects
//! yes/no votes from the roster, and on a prize-distribution proposal
//! releases pooled funds to members by percentage shares. State is kept
//! in individually addressed records; every operation re-validates
//! authorization and invariants on entry.
//!
//! This crate is a facade over the workspace members:
//! - [`governance`] — the team/proposal state machine and engine
//! - [`storage`] — the record store collaborator
//! - [`ledger`] — the fund custody collaborator
//!
//! ```no_run
//! use std::sync::Arc;
//! use team_dao::governance::{GovernanceConfig, GovernanceEngine, PlayerId};
//! use team_dao::ledger::MemoryLedger;
//! use team_dao::storage::MemoryStore;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = GovernanceEngine::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(MemoryLedger::new()),
//!     GovernanceConfig::default(),
//! );
//!
//! let captain = PlayerId::from("captain");
//! engine.create_team(&captain, "alpha", 5).await?;
//! engine.invite_player(&captain, "alpha", PlayerId::from("p1")).await?;
//! # Ok(())
//! # }
//! ```

pub use team_dao_governance as governance;
pub use team_dao_ledger as ledger;
pub use team_dao_storage as storage;

pub use team_dao_governance::{
    Ballot, GovernanceConfig, GovernanceEngine, GovernanceError, GovernanceResult, PlayerId,
    PrizeClaim, ProposalCategory, ProposalKind, ProposalRecord, ProposalStatus, TeamRecord,
};
