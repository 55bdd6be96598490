//! The per-round voting record.
//!
//! A [`Session`] owns one round's candidate roster, voter roster, and
//! votes. All collections are private; every invariant is enforced at the
//! method layer: candidates are append-only, the voter set is
//! duplicate-free, a voter appears at most once in the vote map, and a
//! candidate's count moves only on the vote path, so the counts always sum
//! to the number of ballots cast.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::{ActorId, Error};

/// How a round decides that voting is open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VotingGate {
    /// Votes require prior approval (multi-session registry rounds).
    Approval,
    /// Votes require the round to have started (single-election rounds).
    Started,
}

/// One entry on the candidate roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    identity: Option<ActorId>,
    name: String,
    party: Option<String>,
    vote_count: u64,
}

impl Candidate {
    /// A candidate that enrolled itself by caller identity. The hex form
    /// of the id doubles as the display name.
    pub fn enrolled(identity: ActorId) -> Self {
        Self {
            identity: Some(identity),
            name: identity.to_hex(),
            party: None,
            vote_count: 0,
        }
    }

    /// A slate-listed candidate with an explicit name and affiliation.
    pub fn listed(name: impl Into<String>, party: Option<String>) -> Self {
        Self {
            identity: None,
            name: name.into(),
            party,
            vote_count: 0,
        }
    }

    /// The enrolled caller identity, if any.
    pub fn identity(&self) -> Option<ActorId> {
        self.identity
    }

    /// Candidate display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Party or affiliation, if declared.
    pub fn party(&self) -> Option<&str> {
        self.party.as_deref()
    }

    /// Votes received so far.
    pub fn vote_count(&self) -> u64 {
        self.vote_count
    }
}

/// One voting round: rosters, votes, and lifecycle flags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    candidates: Vec<Candidate>,
    voters: BTreeSet<ActorId>,
    votes: BTreeMap<ActorId, usize>,
    started: bool,
    ended: bool,
    approved: bool,
}

impl Session {
    /// An empty round: no rosters, all flags false.
    pub fn new() -> Self {
        Self::default()
    }

    // --- roster -------------------------------------------------------

    /// Append a candidate, returning its index.
    ///
    /// Rejects empty names and, for enrolled candidates, a second entry
    /// under the same identity.
    pub fn register_candidate(&mut self, candidate: Candidate) -> Result<usize, Error> {
        if candidate.name.is_empty() {
            return Err(Error::EmptyCandidateName);
        }
        if let Some(id) = candidate.identity {
            if self.candidates.iter().any(|c| c.identity == Some(id)) {
                return Err(Error::DuplicateCandidate);
            }
        }
        self.candidates.push(candidate);
        Ok(self.candidates.len() - 1)
    }

    /// Add a voter to the roster.
    pub fn register_voter(&mut self, voter: ActorId) -> Result<(), Error> {
        if !self.voters.insert(voter) {
            return Err(Error::AlreadyRegistered);
        }
        Ok(())
    }

    // --- lifecycle ----------------------------------------------------

    /// Mark the round approved. Idempotent: re-approving is not an error.
    /// Returns whether the flag actually flipped.
    pub fn approve(&mut self) -> bool {
        let flipped = !self.approved;
        self.approved = true;
        flipped
    }

    /// Start the round. Re-starting a started round is rejected.
    pub fn start(&mut self) -> Result<(), Error> {
        if self.started {
            return Err(Error::InvalidTransition("round already started"));
        }
        self.started = true;
        Ok(())
    }

    /// End the round. Requires a prior start; ending twice is rejected.
    pub fn end(&mut self) -> Result<(), Error> {
        if !self.started {
            return Err(Error::InvalidTransition("round has not started"));
        }
        if self.ended {
            return Err(Error::InvalidTransition("round already ended"));
        }
        self.ended = true;
        Ok(())
    }

    // --- voting -------------------------------------------------------

    /// Whether the round currently accepts votes under `gate`.
    pub fn voting_open(&self, gate: VotingGate) -> bool {
        let opened = match gate {
            VotingGate::Approval => self.approved,
            VotingGate::Started => self.started,
        };
        opened && !self.ended
    }

    /// Record a vote for `candidate` by `voter`.
    ///
    /// Preconditions are checked in order, first failure wins, and no
    /// state moves until all of them pass: the voter must be registered,
    /// must not have voted, the round must be open under `gate`, and the
    /// index must be in range.
    pub fn cast_vote(
        &mut self,
        voter: ActorId,
        candidate: usize,
        gate: VotingGate,
    ) -> Result<(), Error> {
        if !self.voters.contains(&voter) {
            return Err(Error::NotRegistered);
        }
        if self.votes.contains_key(&voter) {
            return Err(Error::AlreadyVoted);
        }
        if !self.voting_open(gate) {
            return Err(Error::VotingClosed);
        }
        if candidate >= self.candidates.len() {
            return Err(Error::InvalidCandidate {
                index: candidate,
                count: self.candidates.len(),
            });
        }

        self.votes.insert(voter, candidate);
        self.candidates[candidate].vote_count += 1;
        Ok(())
    }

    // --- reads --------------------------------------------------------

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn is_approved(&self) -> bool {
        self.approved
    }

    /// `(started, ended)` as one read.
    pub fn status(&self) -> (bool, bool) {
        (self.started, self.ended)
    }

    /// Candidate lookup by index.
    pub fn candidate(&self, index: usize) -> Result<&Candidate, Error> {
        self.candidates
            .get(index)
            .ok_or(Error::CandidateNotFound(index))
    }

    /// All candidates in registration order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    /// Whether `voter` is on the roster.
    pub fn is_voter(&self, voter: &ActorId) -> bool {
        self.voters.contains(voter)
    }

    /// Whether `voter` has cast a vote.
    pub fn has_voted(&self, voter: &ActorId) -> bool {
        self.votes.contains_key(voter)
    }

    /// The candidate index `voter` chose.
    pub fn voter_choice(&self, voter: &ActorId) -> Result<usize, Error> {
        self.votes
            .get(voter)
            .copied()
            .ok_or(Error::VoterNotFound(*voter))
    }

    /// Votes received by the candidate at `index`.
    pub fn vote_count(&self, index: usize) -> Result<u64, Error> {
        self.candidate(index).map(Candidate::vote_count)
    }

    /// Number of ballots cast so far.
    pub fn ballots_cast(&self) -> usize {
        self.votes.len()
    }

    /// The candidate with the most votes.
    ///
    /// Ties resolve to the first-registered (lowest index) candidate; the
    /// scan keeps a strictly-greater comparison so later equal counts
    /// never displace an earlier winner.
    pub fn winner(&self) -> Result<&Candidate, Error> {
        if self.candidates.is_empty() {
            return Err(Error::NoCandidates);
        }
        let mut best = 0;
        for (index, candidate) in self.candidates.iter().enumerate().skip(1) {
            if candidate.vote_count > self.candidates[best].vote_count {
                best = index;
            }
        }
        Ok(&self.candidates[best])
    }
}
