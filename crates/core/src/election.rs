//! The single-election topology.
//!
//! One global voting round with named candidates, voter registration
//! gated on the election being underway, and ballots grouping candidate
//! indices under a schedule. Same invariants as registry sessions; only
//! the gating differs (votes open on start, approval is absent).

use serde::{Deserialize, Serialize};

use crate::audit::{Digest, Event, Journal, digest_of};
use crate::session::{Candidate, Session, VotingGate};
use crate::{ActorId, Error};

/// A named group of candidate indices with a voting window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    name: String,
    candidate_ids: Vec<usize>,
    start_time: u64,
    end_time: u64,
}

impl Ballot {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Covered candidate indices, in the order given at creation.
    pub fn candidate_ids(&self) -> &[usize] {
        &self.candidate_ids
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn end_time(&self) -> u64 {
        self.end_time
    }
}

/// A single election: one round, one admin, optional ballots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    admin: ActorId,
    round: Session,
    ballots: Vec<Ballot>,
    journal: Journal,
}

/// The single round's id in journal events.
const ROUND: usize = 0;

impl Election {
    /// A fresh election administered by `admin`.
    pub fn new(admin: ActorId) -> Self {
        Self {
            admin,
            round: Session::new(),
            ballots: Vec::new(),
            journal: Journal::new(),
        }
    }

    fn require_admin(&self, caller: ActorId) -> Result<(), Error> {
        if self.admin != caller {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    /// The administering identity.
    pub fn admin(&self) -> ActorId {
        self.admin
    }

    // --- lifecycle ----------------------------------------------------

    /// Open the election. Admin-only; re-starting is rejected.
    pub fn start_election(&mut self, caller: ActorId) -> Result<(), Error> {
        self.require_admin(caller)?;
        self.round.start()?;
        tracing::info!("election started");
        self.journal.record(Event::SessionStarted { session: ROUND });
        Ok(())
    }

    /// Close the election. Admin-only; requires a prior start.
    pub fn end_election(&mut self, caller: ActorId) -> Result<(), Error> {
        self.require_admin(caller)?;
        self.round.end()?;
        tracing::info!("election ended");
        self.journal.record(Event::SessionEnded { session: ROUND });
        Ok(())
    }

    /// `(started, ended)`.
    pub fn status(&self) -> (bool, bool) {
        self.round.status()
    }

    // --- rosters ------------------------------------------------------

    /// Append a named candidate. Duplicate names are allowed; slate
    /// entries are positional.
    pub fn add_candidate(
        &mut self,
        name: impl Into<String>,
        party: Option<String>,
    ) -> Result<usize, Error> {
        let index = self.round.register_candidate(Candidate::listed(name, party))?;
        let name = self.round.candidate(index)?.name().to_string();
        self.journal.record(Event::CandidateRegistered { session: ROUND, index, name });
        Ok(index)
    }

    /// Register `caller` to vote. Only possible while the election is
    /// underway.
    pub fn register_voter(&mut self, caller: ActorId) -> Result<(), Error> {
        let (started, ended) = self.round.status();
        if !started || ended {
            return Err(Error::RegistrationClosed);
        }
        self.round.register_voter(caller)?;
        self.journal.record(Event::VoterRegistered { session: ROUND, voter: caller });
        Ok(())
    }

    // --- voting -------------------------------------------------------

    /// Cast `caller`'s vote for the candidate at `candidate`.
    pub fn vote(&mut self, caller: ActorId, candidate: usize) -> Result<(), Error> {
        self.round.cast_vote(caller, candidate, VotingGate::Started)?;
        self.journal.record(Event::VoteCast {
            session: ROUND,
            voter: caller,
            candidate,
        });
        Ok(())
    }

    // --- ballots ------------------------------------------------------

    /// Create a ballot over existing candidates. The end time must come
    /// after the start time and every index must be in range.
    pub fn create_ballot(
        &mut self,
        name: impl Into<String>,
        candidate_ids: Vec<usize>,
        start_time: u64,
        end_time: u64,
    ) -> Result<usize, Error> {
        if end_time <= start_time {
            return Err(Error::InvalidSchedule { start: start_time, end: end_time });
        }
        for &index in &candidate_ids {
            if index >= self.round.candidate_count() {
                return Err(Error::InvalidCandidate {
                    index,
                    count: self.round.candidate_count(),
                });
            }
        }

        let id = self.ballots.len();
        let ballot = Ballot {
            name: name.into(),
            candidate_ids,
            start_time,
            end_time,
        };
        self.journal.record(Event::BallotCreated {
            session: ROUND,
            ballot: id,
            name: ballot.name.clone(),
        });
        self.ballots.push(ballot);
        Ok(id)
    }

    /// Ballot lookup by id.
    pub fn ballot(&self, id: usize) -> Result<&Ballot, Error> {
        self.ballots.get(id).ok_or(Error::BallotNotFound(id))
    }

    pub fn ballot_count(&self) -> usize {
        self.ballots.len()
    }

    // --- reads --------------------------------------------------------

    /// Candidate lookup by index.
    pub fn candidate(&self, index: usize) -> Result<&Candidate, Error> {
        self.round.candidate(index)
    }

    pub fn candidate_count(&self) -> usize {
        self.round.candidate_count()
    }

    pub fn voter_count(&self) -> usize {
        self.round.voter_count()
    }

    /// Whether `voter` is registered.
    pub fn voter_status(&self, voter: &ActorId) -> bool {
        self.round.is_voter(voter)
    }

    /// Whether `voter` has cast a vote.
    pub fn has_voted(&self, voter: &ActorId) -> bool {
        self.round.has_voted(voter)
    }

    /// The candidate with the most votes (lowest index on ties).
    pub fn winning_candidate(&self) -> Result<&Candidate, Error> {
        self.round.winner()
    }

    // --- audit --------------------------------------------------------

    /// The applied-event journal.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Content digest of the whole election ledger.
    pub fn digest(&self) -> Result<Digest, Error> {
        digest_of(self)
    }

    /// The full public election state as JSON, for external audit.
    pub fn export_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credential;

    fn actor() -> ActorId {
        Credential::generate().actor_id()
    }

    fn started_election() -> (Election, ActorId) {
        let admin = actor();
        let mut election = Election::new(admin);
        election.add_candidate("Candidate 1", Some("Party 1".into())).unwrap();
        election.add_candidate("Candidate 2", Some("Party 2".into())).unwrap();
        election.start_election(admin).unwrap();
        (election, admin)
    }

    #[test]
    fn candidates_carry_name_and_party() {
        let (election, _) = started_election();
        let first = election.candidate(0).unwrap();

        assert_eq!(first.name(), "Candidate 1");
        assert_eq!(first.party(), Some("Party 1"));
        assert_eq!(first.vote_count(), 0);
        assert_eq!(election.candidate_count(), 2);
    }

    #[test]
    fn registration_gated_on_running_election() {
        let admin = actor();
        let voter = actor();
        let mut election = Election::new(admin);
        election.add_candidate("c", None).unwrap();

        assert!(matches!(
            election.register_voter(voter),
            Err(Error::RegistrationClosed)
        ));

        election.start_election(admin).unwrap();
        election.register_voter(voter).unwrap();
        assert!(election.voter_status(&voter));

        election.end_election(admin).unwrap();
        assert!(matches!(
            election.register_voter(actor()),
            Err(Error::RegistrationClosed)
        ));
    }

    #[test]
    fn lifecycle_is_admin_gated() {
        let admin = actor();
        let mut election = Election::new(admin);

        assert!(matches!(
            election.start_election(actor()),
            Err(Error::Unauthorized)
        ));
        election.start_election(admin).unwrap();
        assert!(matches!(
            election.end_election(actor()),
            Err(Error::Unauthorized)
        ));
        election.end_election(admin).unwrap();
        assert_eq!(election.status(), (true, true));
    }

    #[test]
    fn vote_marks_voter_and_counts() {
        let (mut election, _) = started_election();
        let voter = actor();
        election.register_voter(voter).unwrap();

        election.vote(voter, 0).unwrap();

        assert_eq!(election.candidate(0).unwrap().vote_count(), 1);
        assert!(election.has_voted(&voter));
        assert!(matches!(election.vote(voter, 0), Err(Error::AlreadyVoted)));
    }

    #[test]
    fn ballot_roundtrip() {
        let (mut election, _) = started_election();

        let id = election
            .create_ballot("Ballot 1", vec![0, 1], 1_626_182_400, 1_626_186_000)
            .unwrap();
        let ballot = election.ballot(id).unwrap();

        assert_eq!(ballot.name(), "Ballot 1");
        assert_eq!(ballot.candidate_ids(), &[0, 1]);
        assert_eq!(ballot.start_time(), 1_626_182_400);
        assert_eq!(ballot.end_time(), 1_626_186_000);
    }

    #[test]
    fn ballot_schedule_must_be_ordered() {
        let (mut election, _) = started_election();

        assert!(matches!(
            election.create_ballot("b", vec![0], 10, 10),
            Err(Error::InvalidSchedule { start: 10, end: 10 })
        ));
        assert_eq!(election.ballot_count(), 0);
    }

    #[test]
    fn ballot_ids_must_exist() {
        let (mut election, _) = started_election();

        assert!(matches!(
            election.create_ballot("b", vec![0, 9], 1, 2),
            Err(Error::InvalidCandidate { index: 9, count: 2 })
        ));
        assert!(matches!(election.ballot(0), Err(Error::BallotNotFound(0))));
    }
}
