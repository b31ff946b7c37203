//! The governance engine: storage-backed operations over team and
//! proposal records.
//!
//! Every operation is a single atomic transition against the record(s)
//! it addresses. The engine keeps one async mutex per record key and
//! performs each read-modify-write inside that critical section, so
//! concurrent calls against the same record serialize and the
//! capacity, double-vote and double-claim invariants hold. Calls that
//! touch different records never wait on each other.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use team_dao_ledger::FundLedger;
use team_dao_storage::{JsonRecords, RecordStore, StoreError};

use crate::proposal::{Ballot, ProposalCategory, ProposalKind, ProposalRecord, ProposalStatus, PROPOSAL_NAMESPACE};
use crate::team::{TeamRecord, TEAM_NAMESPACE};
use crate::{GovernanceError, GovernanceResult, PlayerId};

/// Storage key for the persisted engine configuration
const CONFIG_KEY: &str = "governance/config";

/// Policy knobs for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Gate `claim_prize` on `yes_count > no_count`.
    ///
    /// Historically claims were registered withdrawals with no passing
    /// check, so the default preserves that behavior; deployments that
    /// consider it a policy gap can switch the gate on.
    pub require_approval_to_claim: bool,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            require_approval_to_claim: false,
        }
    }
}

/// Outcome of a successful prize claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrizeClaim {
    pub player: PlayerId,
    /// Percentage share the payout was computed from
    pub share: u32,
    /// Amount moved from the team pool to the player
    pub payout: u64,
}

/// The governance engine.
///
/// Holds the record store and fund ledger collaborators plus the
/// per-record lock table. Cheap to share behind an `Arc`.
pub struct GovernanceEngine {
    store: Arc<dyn RecordStore>,
    ledger: Arc<dyn FundLedger>,
    config: GovernanceConfig,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl GovernanceEngine {
    /// Create an engine with an explicit configuration.
    pub fn new(
        store: Arc<dyn RecordStore>,
        ledger: Arc<dyn FundLedger>,
        config: GovernanceConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create an engine, loading the configuration from storage.
    ///
    /// A missing configuration record is replaced with the default,
    /// which is persisted for the next start.
    pub async fn open(
        store: Arc<dyn RecordStore>,
        ledger: Arc<dyn FundLedger>,
    ) -> GovernanceResult<Self> {
        let config = match store.get_json::<GovernanceConfig>(CONFIG_KEY).await {
            Ok(config) => config,
            Err(StoreError::KeyNotFound(_)) => {
                let config = GovernanceConfig::default();
                store.put_json(CONFIG_KEY, &config).await?;
                config
            }
            Err(e) => return Err(e.into()),
        };
        debug!(?config, "governance engine opened");
        Ok(Self::new(store, ledger, config))
    }

    /// The active configuration.
    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// Lock guarding the record at `key`.
    async fn record_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load_team(&self, name: &str) -> GovernanceResult<TeamRecord> {
        match self.store.get_json(&TeamRecord::storage_key(name)).await {
            Ok(team) => Ok(team),
            Err(StoreError::KeyNotFound(_)) => Err(GovernanceError::TeamNotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a proposal and check it is scoped to the named team.
    ///
    /// A title that resolves to another team's proposal does not exist
    /// from the caller's point of view.
    async fn load_proposal(&self, team: &str, title: &str) -> GovernanceResult<ProposalRecord> {
        let proposal: ProposalRecord =
            match self.store.get_json(&ProposalRecord::storage_key(title)).await {
                Ok(proposal) => proposal,
                Err(StoreError::KeyNotFound(_)) => {
                    return Err(GovernanceError::ProposalNotFound(title.to_string()))
                }
                Err(e) => return Err(e.into()),
            };
        if proposal.team != team {
            return Err(GovernanceError::ProposalNotFound(title.to_string()));
        }
        Ok(proposal)
    }

    // ---- team lifecycle -------------------------------------------------

    /// Create a team with the caller as captain and sole member.
    pub async fn create_team(
        &self,
        caller: &PlayerId,
        name: &str,
        capacity: u32,
    ) -> GovernanceResult<TeamRecord> {
        let key = TeamRecord::storage_key(name);
        let lock = self.record_lock(&key).await;
        let _guard = lock.lock().await;

        if self.store.exists(&key).await? {
            return Err(GovernanceError::AlreadyExists(name.to_string()));
        }

        let team = TeamRecord::create(name, caller.clone(), capacity)?;
        self.store.put_json(&key, &team).await?;
        info!(team = name, captain = %caller, capacity, "team created");
        Ok(team)
    }

    /// Captain-only: invite a player to the team.
    pub async fn invite_player(
        &self,
        caller: &PlayerId,
        team_name: &str,
        invitee: PlayerId,
    ) -> GovernanceResult<TeamRecord> {
        let team = self
            .mutate_team(team_name, |team| team.invite(caller, invitee.clone()))
            .await?;
        info!(team = team_name, player = %invitee, "player invited");
        Ok(team)
    }

    /// Accept an invitation and join the roster.
    pub async fn join_team(&self, caller: &PlayerId, team_name: &str) -> GovernanceResult<TeamRecord> {
        let team = self.mutate_team(team_name, |team| team.join(caller)).await?;
        info!(team = team_name, player = %caller, "player joined");
        Ok(team)
    }

    /// Leave the roster; the captain must transfer ownership first.
    pub async fn leave_team(&self, caller: &PlayerId, team_name: &str) -> GovernanceResult<TeamRecord> {
        let team = self.mutate_team(team_name, |team| team.leave(caller)).await?;
        info!(team = team_name, player = %caller, "player left");
        Ok(team)
    }

    /// Captain-only: hand the captaincy to another member.
    pub async fn transfer_ownership(
        &self,
        caller: &PlayerId,
        team_name: &str,
        new_captain: PlayerId,
    ) -> GovernanceResult<TeamRecord> {
        let team = self
            .mutate_team(team_name, |team| {
                team.transfer_captaincy(caller, new_captain.clone())
            })
            .await?;
        info!(team = team_name, old = %caller, new = %new_captain, "ownership transferred");
        Ok(team)
    }

    /// Read-modify-write a team record under its lock.
    async fn mutate_team<F>(&self, name: &str, apply: F) -> GovernanceResult<TeamRecord>
    where
        F: FnOnce(&mut TeamRecord) -> GovernanceResult<()>,
    {
        let key = TeamRecord::storage_key(name);
        let lock = self.record_lock(&key).await;
        let _guard = lock.lock().await;

        let mut team = self.load_team(name).await?;
        apply(&mut team)?;
        self.store.put_json(&key, &team).await?;
        Ok(team)
    }

    // ---- proposal lifecycle ---------------------------------------------

    /// Captain-only: raise a proposal scoped to a team.
    ///
    /// The eligible roster (captain first, then join order) is
    /// snapshotted into the record; prize shares are validated against
    /// it here and never re-derived.
    pub async fn create_proposal(
        &self,
        caller: &PlayerId,
        team_name: &str,
        title: &str,
        category: ProposalCategory,
        kind: ProposalKind,
        shares: Vec<u32>,
        detail: String,
    ) -> GovernanceResult<ProposalRecord> {
        let team = self.load_team(team_name).await?;
        if caller != &team.captain {
            return Err(GovernanceError::Unauthorized(
                caller.clone(),
                "create proposals",
            ));
        }

        let key = ProposalRecord::storage_key(title);
        let lock = self.record_lock(&key).await;
        let _guard = lock.lock().await;

        if self.store.exists(&key).await? {
            return Err(GovernanceError::AlreadyExists(title.to_string()));
        }

        let proposal = ProposalRecord::create(title, &team, category, kind, shares, detail)?;
        self.store.put_json(&key, &proposal).await?;
        info!(team = team_name, proposal = title, %kind, "proposal created");
        Ok(proposal)
    }

    /// Cast a ballot on a proposal.
    ///
    /// When the vote completes full participation the status resolves,
    /// and an accepted outcome is applied to the team record.
    pub async fn give_vote(
        &self,
        caller: &PlayerId,
        team_name: &str,
        title: &str,
        ballot: Ballot,
    ) -> GovernanceResult<ProposalRecord> {
        let key = ProposalRecord::storage_key(title);
        let lock = self.record_lock(&key).await;
        let _guard = lock.lock().await;

        let mut proposal = self.load_proposal(team_name, title).await?;
        proposal.record_vote(caller, ballot)?;
        self.store.put_json(&key, &proposal).await?;

        info!(
            team = team_name,
            proposal = title,
            voter = %caller,
            %ballot,
            yes = proposal.yes_count,
            no = proposal.no_count,
            "vote recorded"
        );

        if proposal.status == ProposalStatus::Accepted {
            self.apply_outcome(&proposal).await?;
        }

        Ok(proposal)
    }

    /// Apply an accepted proposal's outcome to its team.
    ///
    /// The team is re-resolved by name; the proposal's lock is still
    /// held, and locks are always taken proposal-then-team.
    async fn apply_outcome(&self, proposal: &ProposalRecord) -> GovernanceResult<()> {
        let key = TeamRecord::storage_key(&proposal.team);
        let lock = self.record_lock(&key).await;
        let _guard = lock.lock().await;

        let mut team = self.load_team(&proposal.team).await?;
        match proposal.kind {
            ProposalKind::PrizeDistribution => {
                team.prize_distribution = proposal.shares.clone();
            }
            ProposalKind::TournamentSelection => {
                team.current_tournament = proposal.detail.clone();
            }
            ProposalKind::General => return Ok(()),
        }
        self.store.put_json(&key, &team).await?;
        info!(team = %proposal.team, proposal = %proposal.title, "accepted outcome applied");
        Ok(())
    }

    /// Withdraw the caller's share of `amount` from the team pool.
    ///
    /// Only valid on prize-distribution proposals, once per recipient.
    /// A failed transfer leaves the claim bookkeeping untouched.
    pub async fn claim_prize(
        &self,
        caller: &PlayerId,
        team_name: &str,
        title: &str,
        amount: u64,
    ) -> GovernanceResult<PrizeClaim> {
        let key = ProposalRecord::storage_key(title);
        let lock = self.record_lock(&key).await;
        let _guard = lock.lock().await;

        let mut proposal = self.load_proposal(team_name, title).await?;
        if proposal.kind != ProposalKind::PrizeDistribution {
            return Err(GovernanceError::NotDistribution);
        }

        // Team context is re-resolved by name on every claim.
        let team = self.load_team(team_name).await?;

        let share = proposal.share_of(caller).ok_or_else(|| {
            GovernanceError::Unauthorized(caller.clone(), "claim from this proposal")
        })?;
        if proposal.claimed.contains(caller) {
            return Err(GovernanceError::AlreadyClaimed(caller.clone()));
        }
        if self.config.require_approval_to_claim && !proposal.is_passing() {
            return Err(GovernanceError::NotApproved);
        }

        let payout = crate::proposal::payout(amount, share);

        self.ledger
            .transfer(&team.fund_account(), &caller.to_string(), payout)
            .await?;

        proposal.claimed.insert(caller.clone());
        self.store.put_json(&key, &proposal).await?;

        info!(
            team = team_name,
            proposal = title,
            player = %caller,
            share,
            payout,
            "prize claimed"
        );
        Ok(PrizeClaim {
            player: caller.clone(),
            share,
            payout,
        })
    }

    // ---- read accessors -------------------------------------------------

    /// Fetch a team by name.
    pub async fn get_team(&self, name: &str) -> GovernanceResult<TeamRecord> {
        self.load_team(name).await
    }

    /// Fetch a proposal by title.
    pub async fn get_proposal(&self, title: &str) -> GovernanceResult<ProposalRecord> {
        match self.store.get_json(&ProposalRecord::storage_key(title)).await {
            Ok(proposal) => Ok(proposal),
            Err(StoreError::KeyNotFound(_)) => {
                Err(GovernanceError::ProposalNotFound(title.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Every team record, for diagnostics and inspection.
    pub async fn list_teams(&self) -> GovernanceResult<Vec<TeamRecord>> {
        self.list_namespace(TEAM_NAMESPACE).await
    }

    /// Every proposal record, for diagnostics and inspection.
    pub async fn list_proposals(&self) -> GovernanceResult<Vec<ProposalRecord>> {
        self.list_namespace(PROPOSAL_NAMESPACE).await
    }

    async fn list_namespace<T>(&self, namespace: &str) -> GovernanceResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned + Send,
    {
        let keys = self.store.list(&format!("{}/", namespace)).await?;
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            records.push(self.store.get_json(&key).await?);
        }
        Ok(records)
    }
}
