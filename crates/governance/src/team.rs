//! Team records and membership transitions.

use serde::{Deserialize, Serialize};

use team_dao_ledger::AccountId;

use crate::{GovernanceError, GovernanceResult, PlayerId};

/// Storage namespace for team records
pub const TEAM_NAMESPACE: &str = "teams";

/// A team: captain, roster, pending invitations, and capacity.
///
/// The captain is always a member. `members` keeps insertion order, so
/// together with the captain it defines the deterministic recipient
/// order a proposal snapshots at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    /// Unique team name, also the record identity
    pub name: String,
    /// The member with exclusive invite/propose/transfer authority
    pub captain: PlayerId,
    /// Current members in join order; contains the captain
    pub members: Vec<PlayerId>,
    /// Players invited but not yet joined
    pub invited: Vec<PlayerId>,
    /// Fixed upper bound on the member count
    pub capacity: u32,
    /// Shares applied by the last accepted prize-distribution proposal
    pub prize_distribution: Vec<u32>,
    /// Tournament chosen by the last accepted tournament-selection proposal
    pub current_tournament: String,
}

impl TeamRecord {
    /// Create a team with the caller as captain and sole member.
    pub fn create(name: &str, captain: PlayerId, capacity: u32) -> GovernanceResult<Self> {
        if capacity < 1 {
            return Err(GovernanceError::InvalidCapacity(capacity));
        }
        Ok(Self {
            name: name.to_string(),
            members: vec![captain.clone()],
            captain,
            invited: Vec::new(),
            capacity,
            prize_distribution: Vec::new(),
            current_tournament: String::new(),
        })
    }

    /// Storage key for a team name.
    pub fn storage_key(name: &str) -> String {
        format!("{}/{}", TEAM_NAMESPACE, name)
    }

    /// Storage key of this record.
    pub fn key(&self) -> String {
        Self::storage_key(&self.name)
    }

    /// Ledger account holding this team's pooled funds.
    pub fn fund_account(&self) -> AccountId {
        format!("team-pool:{}", self.name)
    }

    pub fn is_member(&self, player: &PlayerId) -> bool {
        self.members.contains(player)
    }

    pub fn is_invited(&self, player: &PlayerId) -> bool {
        self.invited.contains(player)
    }

    fn is_full(&self) -> bool {
        self.members.len() as u32 >= self.capacity
    }

    /// Captain-only: add a player to the invitation list.
    pub fn invite(&mut self, caller: &PlayerId, invitee: PlayerId) -> GovernanceResult<()> {
        if caller != &self.captain {
            return Err(GovernanceError::Unauthorized(caller.clone(), "invite players"));
        }
        if self.is_full() {
            return Err(GovernanceError::TeamFull(self.capacity));
        }
        if self.is_member(&invitee) {
            return Err(GovernanceError::AlreadyMember(invitee));
        }
        if self.is_invited(&invitee) {
            return Err(GovernanceError::AlreadyInvited(invitee));
        }
        self.invited.push(invitee);
        Ok(())
    }

    /// Move an invited caller onto the roster.
    ///
    /// Capacity is re-checked here: invitations can outnumber the seats
    /// left, and only the joins that still fit may succeed.
    pub fn join(&mut self, caller: &PlayerId) -> GovernanceResult<()> {
        if !self.is_invited(caller) {
            return Err(GovernanceError::NotInvited(caller.clone()));
        }
        if self.is_full() {
            return Err(GovernanceError::TeamFull(self.capacity));
        }
        self.invited.retain(|p| p != caller);
        self.members.push(caller.clone());
        Ok(())
    }

    /// Remove the caller from the roster.
    ///
    /// The captain cannot leave; ownership must be transferred first.
    pub fn leave(&mut self, caller: &PlayerId) -> GovernanceResult<()> {
        if !self.is_member(caller) {
            return Err(GovernanceError::NotAMember(caller.clone()));
        }
        if caller == &self.captain {
            return Err(GovernanceError::CaptainCannotLeave);
        }
        self.members.retain(|p| p != caller);
        Ok(())
    }

    /// Captain-only: hand the captaincy to another member.
    ///
    /// The old captain stays on the roster.
    pub fn transfer_captaincy(&mut self, caller: &PlayerId, new_captain: PlayerId) -> GovernanceResult<()> {
        if caller != &self.captain {
            return Err(GovernanceError::Unauthorized(caller.clone(), "transfer ownership"));
        }
        if new_captain == self.captain {
            return Err(GovernanceError::AlreadyCaptain(new_captain));
        }
        if !self.is_member(&new_captain) {
            return Err(GovernanceError::NotAMember(new_captain));
        }
        self.captain = new_captain;
        Ok(())
    }

    /// Eligible voters and recipients: captain first, then the other
    /// members in join order.
    pub fn roster(&self) -> Vec<PlayerId> {
        let mut roster = vec![self.captain.clone()];
        roster.extend(self.members.iter().filter(|p| **p != self.captain).cloned());
        roster
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team() -> TeamRecord {
        TeamRecord::create("alpha", PlayerId::from("captain"), 3).unwrap()
    }

    #[test]
    fn create_rejects_zero_capacity() {
        let result = TeamRecord::create("alpha", PlayerId::from("captain"), 0);
        assert!(matches!(result, Err(GovernanceError::InvalidCapacity(0))));
    }

    #[test]
    fn creator_is_captain_and_sole_member() {
        let team = team();
        assert_eq!(team.captain, PlayerId::from("captain"));
        assert_eq!(team.members, vec![PlayerId::from("captain")]);
        assert!(team.invited.is_empty());
    }

    #[test]
    fn only_captain_may_invite() {
        let mut team = team();
        let result = team.invite(&PlayerId::from("stranger"), PlayerId::from("p1"));
        assert!(matches!(result, Err(GovernanceError::Unauthorized(_, _))));
    }

    #[test]
    fn invite_join_flow() {
        let mut team = team();
        let captain = PlayerId::from("captain");
        let p1 = PlayerId::from("p1");

        team.invite(&captain, p1.clone()).unwrap();
        assert!(team.is_invited(&p1));

        // A second concurrent invitation is redundant.
        assert!(matches!(
            team.invite(&captain, p1.clone()),
            Err(GovernanceError::AlreadyInvited(_))
        ));

        team.join(&p1).unwrap();
        assert!(team.is_member(&p1));
        assert!(!team.is_invited(&p1));

        assert!(matches!(
            team.invite(&captain, p1.clone()),
            Err(GovernanceError::AlreadyMember(_))
        ));
    }

    #[test]
    fn uninvited_player_cannot_join() {
        let mut team = team();
        let result = team.join(&PlayerId::from("gatecrasher"));
        assert!(matches!(result, Err(GovernanceError::NotInvited(_))));
    }

    #[test]
    fn capacity_is_enforced_at_join_time() {
        let mut team = TeamRecord::create("alpha", PlayerId::from("captain"), 2).unwrap();
        let captain = PlayerId::from("captain");

        // Both invitations fit while only one seat remains.
        team.invite(&captain, PlayerId::from("p1")).unwrap();
        team.invite(&captain, PlayerId::from("p2")).unwrap();

        team.join(&PlayerId::from("p1")).unwrap();
        let result = team.join(&PlayerId::from("p2"));
        assert!(matches!(result, Err(GovernanceError::TeamFull(2))));
        assert_eq!(team.members.len(), 2);
    }

    #[test]
    fn invite_fails_once_team_is_full() {
        let mut team = TeamRecord::create("alpha", PlayerId::from("captain"), 1).unwrap();
        let result = team.invite(&PlayerId::from("captain"), PlayerId::from("p1"));
        assert!(matches!(result, Err(GovernanceError::TeamFull(1))));
    }

    #[test]
    fn captain_cannot_leave_without_transfer() {
        let mut team = team();
        let captain = PlayerId::from("captain");
        let p1 = PlayerId::from("p1");

        team.invite(&captain, p1.clone()).unwrap();
        team.join(&p1).unwrap();

        assert!(matches!(
            team.leave(&captain),
            Err(GovernanceError::CaptainCannotLeave)
        ));

        team.transfer_captaincy(&captain, p1.clone()).unwrap();
        assert_eq!(team.captain, p1);

        // The old captain is still a member and may now leave.
        team.leave(&captain).unwrap();
        assert!(!team.is_member(&captain));

        // The new captain is bound by the same rule.
        assert!(matches!(
            team.leave(&p1),
            Err(GovernanceError::CaptainCannotLeave)
        ));
    }

    #[test]
    fn captaincy_transfer_requires_membership() {
        let mut team = team();
        let captain = PlayerId::from("captain");

        let result = team.transfer_captaincy(&captain, PlayerId::from("outsider"));
        assert!(matches!(result, Err(GovernanceError::NotAMember(_))));

        let result = team.transfer_captaincy(&captain, captain.clone());
        assert!(matches!(result, Err(GovernanceError::AlreadyCaptain(_))));
    }

    #[test]
    fn roster_puts_captain_first() {
        let mut team = team();
        let captain = PlayerId::from("captain");
        for p in ["p1", "p2"] {
            team.invite(&captain, PlayerId::from(p)).unwrap();
            team.join(&PlayerId::from(p)).unwrap();
        }

        team.transfer_captaincy(&captain, PlayerId::from("p2")).unwrap();
        assert_eq!(
            team.roster(),
            vec![
                PlayerId::from("p2"),
                PlayerId::from("captain"),
                PlayerId::from("p1"),
            ]
        );
    }
}
