//! Proposal records, voting, and the distribution/claim arithmetic.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::team::TeamRecord;
use crate::{GovernanceError, GovernanceResult, PlayerId};

/// Storage namespace for proposal records
pub const PROPOSAL_NAMESPACE: &str = "proposals";

/// A yes/no ballot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ballot {
    Yes,
    No,
}

impl FromStr for Ballot {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yes" => Ok(Ballot::Yes),
            "no" => Ok(Ballot::No),
            other => Err(GovernanceError::InvalidBallot(other.to_string())),
        }
    }
}

impl fmt::Display for Ballot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ballot::Yes => f.write_str("yes"),
            Ballot::No => f.write_str("no"),
        }
    }
}

/// Proposal category.
///
/// A closed set at the core boundary; free-text categories from the
/// transport layer are rejected during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalCategory {
    Voting,
}

impl FromStr for ProposalCategory {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Voting" => Ok(ProposalCategory::Voting),
            other => Err(GovernanceError::InvalidCategory(other.to_string())),
        }
    }
}

impl fmt::Display for ProposalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Voting")
    }
}

/// What a proposal decides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalKind {
    /// Free-form question with no side effect on acceptance
    General,
    /// Split the prize pool by percentage shares
    PrizeDistribution,
    /// Pick the team's next tournament (named in `detail`)
    TournamentSelection,
}

impl FromStr for ProposalKind {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "General" => Ok(ProposalKind::General),
            "Prize Distribution" => Ok(ProposalKind::PrizeDistribution),
            "Tournament Selection" => Ok(ProposalKind::TournamentSelection),
            other => Err(GovernanceError::InvalidKind(other.to_string())),
        }
    }
}

impl fmt::Display for ProposalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalKind::General => f.write_str("General"),
            ProposalKind::PrizeDistribution => f.write_str("Prize Distribution"),
            ProposalKind::TournamentSelection => f.write_str("Tournament Selection"),
        }
    }
}

/// Status of a proposal.
///
/// `Open` accepts votes. The only closing trigger is full
/// participation: once every roster member has voted the status
/// resolves by simple majority. There is no timer, quorum, or explicit
/// close call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Open,
    Accepted,
    Rejected,
    Draw,
}

impl Default for ProposalStatus {
    fn default() -> Self {
        Self::Open
    }
}

/// A single governance question scoped to one team.
///
/// `team` is a name-based back-reference, not a pointer; operations
/// needing team context re-resolve it by name. `roster` is a frozen
/// snapshot of the eligible voters/recipients taken at creation —
/// membership changes after creation never alter who may vote or
/// claim, nor which share belongs to whom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRecord {
    /// Proposal title, also the record identity
    pub title: String,
    /// Name of the team this proposal is scoped to
    pub team: String,
    pub category: ProposalCategory,
    pub kind: ProposalKind,
    /// Free-form detail; for tournament selections, the tournament name
    pub detail: String,
    /// Percentage weights, one per roster entry; empty unless the
    /// proposal is a prize distribution
    pub shares: Vec<u32>,
    /// Eligible voters and recipients at creation time, captain first
    pub roster: Vec<PlayerId>,
    /// Ballot per voter; at most one entry per identity
    pub votes: BTreeMap<PlayerId, Ballot>,
    pub yes_count: u32,
    pub no_count: u32,
    /// Recipients that have already withdrawn their share
    pub claimed: BTreeSet<PlayerId>,
    pub status: ProposalStatus,
}

impl ProposalRecord {
    /// Create a proposal scoped to the given team.
    ///
    /// Prize distributions must carry one share per roster entry,
    /// summing to exactly 100. Tournament selections must name a
    /// tournament in `detail`. No other kind may carry shares.
    pub fn create(
        title: &str,
        team: &TeamRecord,
        category: ProposalCategory,
        kind: ProposalKind,
        shares: Vec<u32>,
        detail: String,
    ) -> GovernanceResult<Self> {
        let roster = team.roster();

        match kind {
            ProposalKind::PrizeDistribution => validate_shares(&shares, roster.len())?,
            ProposalKind::TournamentSelection => {
                if detail.trim().is_empty() {
                    return Err(GovernanceError::InvalidTournament);
                }
                if !shares.is_empty() {
                    return Err(GovernanceError::InvalidShares(
                        "only prize distributions carry shares".to_string(),
                    ));
                }
            }
            ProposalKind::General => {
                if !shares.is_empty() {
                    return Err(GovernanceError::InvalidShares(
                        "only prize distributions carry shares".to_string(),
                    ));
                }
            }
        }

        Ok(Self {
            title: title.to_string(),
            team: team.name.clone(),
            category,
            kind,
            detail,
            shares,
            roster,
            votes: BTreeMap::new(),
            yes_count: 0,
            no_count: 0,
            claimed: BTreeSet::new(),
            status: ProposalStatus::Open,
        })
    }

    /// Storage key for a proposal title.
    pub fn storage_key(title: &str) -> String {
        format!("{}/{}", PROPOSAL_NAMESPACE, title)
    }

    /// Storage key of this record.
    pub fn key(&self) -> String {
        Self::storage_key(&self.title)
    }

    /// Record one ballot and keep the tallies consistent.
    ///
    /// The voter must appear in the creation-time roster. Once the
    /// whole roster has voted the status resolves by simple majority
    /// and further ballots are rejected.
    pub fn record_vote(&mut self, voter: &PlayerId, ballot: Ballot) -> GovernanceResult<()> {
        if self.status != ProposalStatus::Open {
            return Err(GovernanceError::ProposalClosed(self.status));
        }
        if !self.roster.contains(voter) {
            return Err(GovernanceError::Unauthorized(
                voter.clone(),
                "vote on this proposal",
            ));
        }
        if self.votes.contains_key(voter) {
            return Err(GovernanceError::AlreadyVoted(voter.clone()));
        }

        match ballot {
            Ballot::Yes => self.yes_count += 1,
            Ballot::No => self.no_count += 1,
        }
        self.votes.insert(voter.clone(), ballot);

        if self.votes.len() == self.roster.len() {
            self.status = if self.yes_count > self.no_count {
                ProposalStatus::Accepted
            } else if self.yes_count < self.no_count {
                ProposalStatus::Rejected
            } else {
                ProposalStatus::Draw
            };
        }

        Ok(())
    }

    /// Whether yes currently outweighs no.
    pub fn is_passing(&self) -> bool {
        self.yes_count > self.no_count
    }

    /// The percentage share recorded for a recipient, if they are one.
    pub fn share_of(&self, player: &PlayerId) -> Option<u32> {
        self.roster
            .iter()
            .position(|p| p == player)
            .and_then(|i| self.shares.get(i).copied())
    }

    /// `floor(amount * share / 100)` for a recipient.
    pub fn payout_of(&self, player: &PlayerId, amount: u64) -> Option<u64> {
        self.share_of(player).map(|share| payout(amount, share))
    }
}

/// `floor(amount * share / 100)`, widened to u128 internally so no
/// intermediate overflow exists for any u64 amount.
pub fn payout(amount: u64, share: u32) -> u64 {
    ((amount as u128 * share as u128) / 100) as u64
}

/// Validate prize-distribution shares against the roster size.
fn validate_shares(shares: &[u32], roster_len: usize) -> GovernanceResult<()> {
    if shares.is_empty() {
        return Err(GovernanceError::InvalidShares(
            "a prize distribution requires shares".to_string(),
        ));
    }
    if shares.len() != roster_len {
        return Err(GovernanceError::InvalidShares(format!(
            "expected one share per member ({}), got {}",
            roster_len,
            shares.len()
        )));
    }
    let total: u64 = shares.iter().map(|s| *s as u64).sum();
    if total != 100 {
        return Err(GovernanceError::InvalidShares(format!(
            "shares must sum to 100, got {}",
            total
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_player_team() -> TeamRecord {
        let captain = PlayerId::from("captain");
        let mut team = TeamRecord::create("alpha", captain.clone(), 3).unwrap();
        for p in ["p1", "p2"] {
            team.invite(&captain, PlayerId::from(p)).unwrap();
            team.join(&PlayerId::from(p)).unwrap();
        }
        team
    }

    fn prize_proposal(shares: Vec<u32>) -> GovernanceResult<ProposalRecord> {
        ProposalRecord::create(
            "Prize",
            &three_player_team(),
            ProposalCategory::Voting,
            ProposalKind::PrizeDistribution,
            shares,
            String::new(),
        )
    }

    #[test]
    fn parsing_rejects_unknown_strings() {
        assert!(matches!(
            "maybe".parse::<Ballot>(),
            Err(GovernanceError::InvalidBallot(_))
        ));
        assert!(matches!(
            "Gossip".parse::<ProposalCategory>(),
            Err(GovernanceError::InvalidCategory(_))
        ));
        assert!(matches!(
            "Coin Flip".parse::<ProposalKind>(),
            Err(GovernanceError::InvalidKind(_))
        ));
        assert_eq!("YES".parse::<Ballot>().unwrap(), Ballot::Yes);
        assert_eq!(
            "Prize Distribution".parse::<ProposalKind>().unwrap(),
            ProposalKind::PrizeDistribution
        );
    }

    #[test]
    fn shares_must_sum_to_one_hundred() {
        assert!(matches!(
            prize_proposal(vec![10, 20, 30]),
            Err(GovernanceError::InvalidShares(_))
        ));
        assert!(prize_proposal(vec![40, 30, 30]).is_ok());
    }

    #[test]
    fn shares_must_cover_every_member() {
        assert!(matches!(
            prize_proposal(vec![50, 50]),
            Err(GovernanceError::InvalidShares(_))
        ));
        assert!(matches!(
            prize_proposal(vec![]),
            Err(GovernanceError::InvalidShares(_))
        ));
    }

    #[test]
    fn non_distribution_proposals_reject_shares() {
        let result = ProposalRecord::create(
            "Question",
            &three_player_team(),
            ProposalCategory::Voting,
            ProposalKind::General,
            vec![100],
            "free-form".to_string(),
        );
        assert!(matches!(result, Err(GovernanceError::InvalidShares(_))));
    }

    #[test]
    fn tournament_selection_requires_a_name() {
        let result = ProposalRecord::create(
            "Next event",
            &three_player_team(),
            ProposalCategory::Voting,
            ProposalKind::TournamentSelection,
            vec![],
            "  ".to_string(),
        );
        assert!(matches!(result, Err(GovernanceError::InvalidTournament)));
    }

    #[test]
    fn double_vote_is_rejected_and_tallies_unchanged() {
        let mut proposal = prize_proposal(vec![40, 30, 30]).unwrap();
        let captain = PlayerId::from("captain");

        proposal.record_vote(&captain, Ballot::Yes).unwrap();
        assert_eq!(proposal.yes_count, 1);

        let result = proposal.record_vote(&captain, Ballot::No);
        assert!(matches!(result, Err(GovernanceError::AlreadyVoted(_))));
        assert_eq!(proposal.yes_count, 1);
        assert_eq!(proposal.no_count, 0);
        assert_eq!(proposal.votes.len(), 1);
    }

    #[test]
    fn non_roster_voter_is_rejected() {
        let mut proposal = prize_proposal(vec![40, 30, 30]).unwrap();
        let result = proposal.record_vote(&PlayerId::from("outsider"), Ballot::Yes);
        assert!(matches!(result, Err(GovernanceError::Unauthorized(_, _))));
    }

    #[test]
    fn full_participation_resolves_by_majority() {
        let mut proposal = prize_proposal(vec![40, 30, 30]).unwrap();

        proposal.record_vote(&PlayerId::from("captain"), Ballot::Yes).unwrap();
        proposal.record_vote(&PlayerId::from("p1"), Ballot::Yes).unwrap();
        assert_eq!(proposal.status, ProposalStatus::Open);

        proposal.record_vote(&PlayerId::from("p2"), Ballot::No).unwrap();
        assert_eq!(proposal.status, ProposalStatus::Accepted);
        assert_eq!(proposal.yes_count, 2);
        assert_eq!(proposal.no_count, 1);

        // Resolution closes the ballot box.
        let result = proposal.record_vote(&PlayerId::from("captain"), Ballot::Yes);
        assert!(matches!(result, Err(GovernanceError::ProposalClosed(_))));
    }

    #[test]
    fn tie_resolves_to_draw() {
        let captain = PlayerId::from("captain");
        let mut team = TeamRecord::create("duo", captain.clone(), 2).unwrap();
        team.invite(&captain, PlayerId::from("p1")).unwrap();
        team.join(&PlayerId::from("p1")).unwrap();

        let mut proposal = ProposalRecord::create(
            "Tied",
            &team,
            ProposalCategory::Voting,
            ProposalKind::General,
            vec![],
            String::new(),
        )
        .unwrap();

        proposal.record_vote(&captain, Ballot::Yes).unwrap();
        proposal.record_vote(&PlayerId::from("p1"), Ballot::No).unwrap();
        assert_eq!(proposal.status, ProposalStatus::Draw);
        assert!(!proposal.is_passing());
    }

    #[test]
    fn payouts_use_floor_division() {
        let proposal = prize_proposal(vec![40, 30, 30]).unwrap();

        assert_eq!(proposal.payout_of(&PlayerId::from("captain"), 10), Some(4));
        assert_eq!(proposal.payout_of(&PlayerId::from("p1"), 10), Some(3));
        assert_eq!(proposal.payout_of(&PlayerId::from("p2"), 10), Some(3));
        assert_eq!(proposal.payout_of(&PlayerId::from("outsider"), 10), None);

        // Widened arithmetic keeps large pools exact.
        assert_eq!(
            proposal.payout_of(&PlayerId::from("captain"), u64::MAX),
            Some(((u64::MAX as u128 * 40) / 100) as u64)
        );
    }

    #[test]
    fn roster_snapshot_is_frozen_at_creation() {
        let mut team = three_player_team();
        let proposal = prize_proposal(vec![40, 30, 30]).unwrap();

        // Membership changes after creation do not alter eligibility.
        team.leave(&PlayerId::from("p1")).unwrap();
        assert!(proposal.roster.contains(&PlayerId::from("p1")));
        assert_eq!(proposal.share_of(&PlayerId::from("p1")), Some(30));
    }
}
