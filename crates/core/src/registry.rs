//! The session registry: many independently-lifecycled voting rounds.
//!
//! Each session carries its own rosters, tally, and admin (the caller
//! that created it). Mutating operations take the caller explicitly and
//! are all-or-nothing: every precondition is checked before any state
//! moves, and each applied mutation lands one event in the journal.

use serde::{Deserialize, Serialize};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::audit::{Digest, Event, Journal, digest_of};
use crate::request::{Operation, Outcome, SignedOperation};
use crate::session::{Candidate, Session, VotingGate};
use crate::{ActorId, Error};

/// One registry entry: the round plus the admin that created it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct SessionRecord {
    admin: ActorId,
    session: Session,
}

/// The registry of voting sessions. Session ids are zero-based indices
/// assigned in creation order; sessions are never deleted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRegistry {
    sessions: Vec<SessionRecord>,
    journal: Journal,
}

impl SessionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, id: usize) -> Result<&SessionRecord, Error> {
        self.sessions.get(id).ok_or(Error::SessionNotFound(id))
    }

    fn record_mut(&mut self, id: usize) -> Result<&mut SessionRecord, Error> {
        self.sessions.get_mut(id).ok_or(Error::SessionNotFound(id))
    }

    fn require_admin(&self, caller: ActorId, id: usize) -> Result<(), Error> {
        if self.record(id)?.admin != caller {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    // --- lifecycle ----------------------------------------------------

    /// Create a new session with `caller` as its admin. Returns the id.
    pub fn create_session(&mut self, caller: ActorId) -> usize {
        let id = self.sessions.len();
        self.sessions.push(SessionRecord {
            admin: caller,
            session: Session::new(),
        });
        tracing::info!(session = id, "session created");
        self.journal.record(Event::SessionCreated { session: id, admin: caller });
        id
    }

    /// Approve a session for voting. Admin-only; idempotent.
    pub fn approve_session(&mut self, caller: ActorId, id: usize) -> Result<(), Error> {
        self.require_admin(caller, id)?;
        if self.record_mut(id)?.session.approve() {
            tracing::info!(session = id, "session approved");
            self.journal.record(Event::SessionApproved { session: id });
        }
        Ok(())
    }

    /// Start a session. Admin-only; re-starting is rejected.
    pub fn start_session(&mut self, caller: ActorId, id: usize) -> Result<(), Error> {
        self.require_admin(caller, id)?;
        self.record_mut(id)?.session.start()?;
        tracing::info!(session = id, "session started");
        self.journal.record(Event::SessionStarted { session: id });
        Ok(())
    }

    /// End a session. Admin-only; requires a prior start.
    pub fn end_session(&mut self, caller: ActorId, id: usize) -> Result<(), Error> {
        self.require_admin(caller, id)?;
        self.record_mut(id)?.session.end()?;
        tracing::info!(session = id, "session ended");
        self.journal.record(Event::SessionEnded { session: id });
        Ok(())
    }

    // --- rosters ------------------------------------------------------

    /// Enroll `caller` as a candidate. Returns the candidate index.
    pub fn register_as_candidate(&mut self, caller: ActorId, id: usize) -> Result<usize, Error> {
        let index = self
            .record_mut(id)?
            .session
            .register_candidate(Candidate::enrolled(caller))?;
        self.journal.record(Event::CandidateRegistered {
            session: id,
            index,
            name: caller.to_hex(),
        });
        Ok(index)
    }

    /// Add `caller` to the session's voter roster.
    pub fn register_as_voter(&mut self, caller: ActorId, id: usize) -> Result<(), Error> {
        self.record_mut(id)?.session.register_voter(caller)?;
        self.journal.record(Event::VoterRegistered { session: id, voter: caller });
        Ok(())
    }

    // --- voting -------------------------------------------------------

    /// Cast `caller`'s vote for `candidate`. Registry sessions open for
    /// voting on approval.
    pub fn vote(&mut self, caller: ActorId, id: usize, candidate: usize) -> Result<(), Error> {
        self.record_mut(id)?
            .session
            .cast_vote(caller, candidate, VotingGate::Approval)?;
        self.journal.record(Event::VoteCast { session: id, voter: caller, candidate });
        Ok(())
    }

    /// Verify a signed envelope and dispatch it as its proven caller.
    pub fn apply(&mut self, signed: &SignedOperation) -> Result<Outcome, Error> {
        let caller = signed.verify()?;
        match signed.operation() {
            Operation::CreateSession => Ok(Outcome::SessionCreated(self.create_session(caller))),
            Operation::RegisterAsCandidate { session } => self
                .register_as_candidate(caller, session)
                .map(Outcome::CandidateRegistered),
            Operation::RegisterAsVoter { session } => self
                .register_as_voter(caller, session)
                .map(|()| Outcome::VoterRegistered),
            Operation::ApproveSession { session } => {
                self.approve_session(caller, session).map(|()| Outcome::Approved)
            }
            Operation::StartSession { session } => {
                self.start_session(caller, session).map(|()| Outcome::Started)
            }
            Operation::EndSession { session } => {
                self.end_session(caller, session).map(|()| Outcome::Ended)
            }
            Operation::Vote { session, candidate } => {
                self.vote(caller, session, candidate).map(|()| Outcome::VoteRecorded)
            }
        }
    }

    // --- reads --------------------------------------------------------

    /// Read access to a session.
    pub fn session(&self, id: usize) -> Result<&Session, Error> {
        Ok(&self.record(id)?.session)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// The admin of a session.
    pub fn admin(&self, id: usize) -> Result<ActorId, Error> {
        Ok(self.record(id)?.admin)
    }

    pub fn session_candidate_count(&self, id: usize) -> Result<usize, Error> {
        Ok(self.session(id)?.candidate_count())
    }

    pub fn session_voter_count(&self, id: usize) -> Result<usize, Error> {
        Ok(self.session(id)?.voter_count())
    }

    /// `(started, ended)` for a session.
    pub fn session_status(&self, id: usize) -> Result<(bool, bool), Error> {
        Ok(self.session(id)?.status())
    }

    pub fn session_approval_status(&self, id: usize) -> Result<bool, Error> {
        Ok(self.session(id)?.is_approved())
    }

    /// Candidate lookup within a session.
    pub fn candidate(&self, id: usize, index: usize) -> Result<&Candidate, Error> {
        self.session(id)?.candidate(index)
    }

    /// Votes received by a candidate.
    pub fn candidate_votes(&self, id: usize, index: usize) -> Result<u64, Error> {
        self.session(id)?.vote_count(index)
    }

    /// The candidate index a voter chose.
    pub fn voter_choice(&self, id: usize, voter: &ActorId) -> Result<usize, Error> {
        self.session(id)?.voter_choice(voter)
    }

    /// The winning candidate's enrolled identity.
    pub fn winner(&self, id: usize) -> Result<ActorId, Error> {
        self.session(id)?
            .winner()?
            .identity()
            .ok_or(Error::NoCandidateIdentity)
    }

    // --- audit --------------------------------------------------------

    /// The applied-event journal.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Content digest of the whole ledger (sessions plus journal).
    pub fn digest(&self) -> Result<Digest, Error> {
        digest_of(self)
    }

    /// The full public ledger state as JSON, for external audit.
    pub fn export_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A registry behind a read-write lock: one critical section per public
/// operation, so the same atomicity holds across threads.
#[derive(Debug, Default)]
pub struct SharedRegistry {
    inner: RwLock<SessionRegistry>,
}

impl SharedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_registry(registry: SessionRegistry) -> Self {
        Self { inner: RwLock::new(registry) }
    }

    // Writes are check-then-mutate, so a panicked writer cannot leave a
    // torn ledger; recover the guard instead of propagating the poison.
    fn read(&self) -> RwLockReadGuard<'_, SessionRegistry> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionRegistry> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn create_session(&self, caller: ActorId) -> usize {
        self.write().create_session(caller)
    }

    pub fn approve_session(&self, caller: ActorId, id: usize) -> Result<(), Error> {
        self.write().approve_session(caller, id)
    }

    pub fn start_session(&self, caller: ActorId, id: usize) -> Result<(), Error> {
        self.write().start_session(caller, id)
    }

    pub fn end_session(&self, caller: ActorId, id: usize) -> Result<(), Error> {
        self.write().end_session(caller, id)
    }

    pub fn register_as_candidate(&self, caller: ActorId, id: usize) -> Result<usize, Error> {
        self.write().register_as_candidate(caller, id)
    }

    pub fn register_as_voter(&self, caller: ActorId, id: usize) -> Result<(), Error> {
        self.write().register_as_voter(caller, id)
    }

    pub fn vote(&self, caller: ActorId, id: usize, candidate: usize) -> Result<(), Error> {
        self.write().vote(caller, id, candidate)
    }

    pub fn apply(&self, signed: &SignedOperation) -> Result<Outcome, Error> {
        self.write().apply(signed)
    }

    pub fn session_count(&self) -> usize {
        self.read().session_count()
    }

    pub fn session_candidate_count(&self, id: usize) -> Result<usize, Error> {
        self.read().session_candidate_count(id)
    }

    pub fn session_voter_count(&self, id: usize) -> Result<usize, Error> {
        self.read().session_voter_count(id)
    }

    pub fn session_status(&self, id: usize) -> Result<(bool, bool), Error> {
        self.read().session_status(id)
    }

    pub fn session_approval_status(&self, id: usize) -> Result<bool, Error> {
        self.read().session_approval_status(id)
    }

    pub fn candidate(&self, id: usize, index: usize) -> Result<Candidate, Error> {
        self.read().candidate(id, index).cloned()
    }

    pub fn candidate_votes(&self, id: usize, index: usize) -> Result<u64, Error> {
        self.read().candidate_votes(id, index)
    }

    pub fn voter_choice(&self, id: usize, voter: &ActorId) -> Result<usize, Error> {
        self.read().voter_choice(id, voter)
    }

    pub fn winner(&self, id: usize) -> Result<ActorId, Error> {
        self.read().winner(id)
    }

    pub fn digest(&self) -> Result<Digest, Error> {
        self.read().digest()
    }

    pub fn export_json(&self) -> Result<String, Error> {
        self.read().export_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credential;

    fn actor() -> ActorId {
        Credential::generate().actor_id()
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let mut registry = SessionRegistry::new();
        let admin = actor();

        assert_eq!(registry.create_session(admin), 0);
        assert_eq!(registry.create_session(admin), 1);
        assert_eq!(registry.session_count(), 2);
        assert_eq!(registry.admin(0).unwrap(), admin);
    }

    #[test]
    fn unknown_session_is_not_found() {
        let registry = SessionRegistry::new();
        assert!(matches!(registry.session(0), Err(Error::SessionNotFound(0))));
        assert!(matches!(
            registry.session_status(3),
            Err(Error::SessionNotFound(3))
        ));
    }

    #[test]
    fn lifecycle_is_admin_gated() {
        let mut registry = SessionRegistry::new();
        let admin = actor();
        let intruder = actor();
        let id = registry.create_session(admin);

        assert!(matches!(
            registry.approve_session(intruder, id),
            Err(Error::Unauthorized)
        ));
        assert!(matches!(
            registry.start_session(intruder, id),
            Err(Error::Unauthorized)
        ));
        assert!(matches!(
            registry.end_session(intruder, id),
            Err(Error::Unauthorized)
        ));

        registry.approve_session(admin, id).unwrap();
        registry.start_session(admin, id).unwrap();
        registry.end_session(admin, id).unwrap();
        assert_eq!(registry.session_status(id).unwrap(), (true, true));
    }

    #[test]
    fn winner_returns_enrolled_identity() {
        let mut registry = SessionRegistry::new();
        let admin = actor();
        let rival = actor();
        let voter = actor();
        let id = registry.create_session(admin);

        registry.register_as_candidate(admin, id).unwrap();
        registry.register_as_candidate(rival, id).unwrap();
        registry.register_as_voter(voter, id).unwrap();
        registry.approve_session(admin, id).unwrap();
        registry.vote(voter, id, 1).unwrap();

        assert_eq!(registry.winner(id).unwrap(), rival);
    }

    #[test]
    fn journal_records_only_applied_operations() {
        let mut registry = SessionRegistry::new();
        let admin = actor();
        let id = registry.create_session(admin);
        let baseline = registry.journal().len();

        // double-approve journals once, failed start-by-stranger not at all
        registry.approve_session(admin, id).unwrap();
        registry.approve_session(admin, id).unwrap();
        let _ = registry.start_session(actor(), id);

        assert_eq!(registry.journal().len(), baseline + 1);
    }

    #[test]
    fn digest_changes_with_state() {
        let mut registry = SessionRegistry::new();
        let before = registry.digest().unwrap();
        registry.create_session(actor());
        assert_ne!(registry.digest().unwrap(), before);
    }

    #[test]
    fn shared_registry_serializes_operations() {
        let shared = SharedRegistry::new();
        let admin = actor();
        let voter = actor();

        let id = shared.create_session(admin);
        shared.register_as_candidate(admin, id).unwrap();
        shared.register_as_voter(voter, id).unwrap();
        shared.approve_session(admin, id).unwrap();
        shared.vote(voter, id, 0).unwrap();

        assert_eq!(shared.candidate_votes(id, 0).unwrap(), 1);
        assert_eq!(shared.winner(id).unwrap(), admin);
    }
}
