//! Document store seam: tournaments, participants and matches keyed by id.
//!
//! Writes are per document; nothing spans documents, so callers order their writes
//! and rely on later recomputation to heal a partial sequence.

use crate::models::{GameMatch, MatchId, Participant, ParticipantId, Tournament, TournamentId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("lock error")]
    Lock,
    #[error("{0}")]
    Backend(String),
}

/// Get/list/put/delete per collection. Deleting a missing document succeeds.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_tournament(&self, id: TournamentId) -> Result<Option<Tournament>, StoreError>;
    async fn put_tournament(&self, tournament: &Tournament) -> Result<(), StoreError>;
    async fn delete_tournament(&self, id: TournamentId) -> Result<(), StoreError>;

    async fn get_participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError>;
    /// Participants of a tournament in registration order.
    async fn list_participants(&self, tournament_id: TournamentId) -> Result<Vec<Participant>, StoreError>;
    async fn put_participant(&self, participant: &Participant) -> Result<(), StoreError>;
    async fn delete_participant(&self, id: ParticipantId) -> Result<(), StoreError>;

    async fn get_match(&self, id: MatchId) -> Result<Option<GameMatch>, StoreError>;
    /// Matches of a tournament ordered by round, then position in the round.
    async fn list_matches(&self, tournament_id: TournamentId) -> Result<Vec<GameMatch>, StoreError>;
    async fn put_match(&self, game: &GameMatch) -> Result<(), StoreError>;
    async fn delete_match(&self, id: MatchId) -> Result<(), StoreError>;
}

/// Process-local store, one map per collection.
#[derive(Default)]
pub struct MemoryStore {
    tournaments: RwLock<HashMap<TournamentId, Tournament>>,
    /// Kept with an insertion counter so listing follows registration order.
    participants: RwLock<HashMap<ParticipantId, (u64, Participant)>>,
    matches: RwLock<HashMap<MatchId, GameMatch>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_tournament(&self, id: TournamentId) -> Result<Option<Tournament>, StoreError> {
        let g = self.tournaments.read().map_err(|_| StoreError::Lock)?;
        Ok(g.get(&id).cloned())
    }

    async fn put_tournament(&self, tournament: &Tournament) -> Result<(), StoreError> {
        let mut g = self.tournaments.write().map_err(|_| StoreError::Lock)?;
        g.insert(tournament.id, tournament.clone());
        Ok(())
    }

    async fn delete_tournament(&self, id: TournamentId) -> Result<(), StoreError> {
        let mut g = self.tournaments.write().map_err(|_| StoreError::Lock)?;
        g.remove(&id);
        Ok(())
    }

    async fn get_participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError> {
        let g = self.participants.read().map_err(|_| StoreError::Lock)?;
        Ok(g.get(&id).map(|(_, p)| p.clone()))
    }

    async fn list_participants(&self, tournament_id: TournamentId) -> Result<Vec<Participant>, StoreError> {
        let g = self.participants.read().map_err(|_| StoreError::Lock)?;
        let mut found: Vec<&(u64, Participant)> = g
            .values()
            .filter(|(_, p)| p.tournament_id == tournament_id)
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        Ok(found.into_iter().map(|(_, p)| p.clone()).collect())
    }

    async fn put_participant(&self, participant: &Participant) -> Result<(), StoreError> {
        let mut g = self.participants.write().map_err(|_| StoreError::Lock)?;
        let seq = match g.get(&participant.id) {
            Some((seq, _)) => *seq,
            None => g.values().map(|(seq, _)| seq + 1).max().unwrap_or(0),
        };
        g.insert(participant.id, (seq, participant.clone()));
        Ok(())
    }

    async fn delete_participant(&self, id: ParticipantId) -> Result<(), StoreError> {
        let mut g = self.participants.write().map_err(|_| StoreError::Lock)?;
        g.remove(&id);
        Ok(())
    }

    async fn get_match(&self, id: MatchId) -> Result<Option<GameMatch>, StoreError> {
        let g = self.matches.read().map_err(|_| StoreError::Lock)?;
        Ok(g.get(&id).cloned())
    }

    async fn list_matches(&self, tournament_id: TournamentId) -> Result<Vec<GameMatch>, StoreError> {
        let g = self.matches.read().map_err(|_| StoreError::Lock)?;
        let mut found: Vec<GameMatch> = g
            .values()
            .filter(|m| m.tournament_id == tournament_id)
            .cloned()
            .collect();
        found.sort_by_key(|m| (m.round, m.match_index));
        Ok(found)
    }

    async fn put_match(&self, game: &GameMatch) -> Result<(), StoreError> {
        let mut g = self.matches.write().map_err(|_| StoreError::Lock)?;
        g.insert(game.id, game.clone());
        Ok(())
    }

    async fn delete_match(&self, id: MatchId) -> Result<(), StoreError> {
        let mut g = self.matches.write().map_err(|_| StoreError::Lock)?;
        g.remove(&id);
        Ok(())
    }
}
