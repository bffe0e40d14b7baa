//! the persistence contract: a transactional relational store with
//! row-level locking, consumed but never implemented here. One `async_trait`
//! sub-trait per aggregate, aggregated into a single supertrait the
//! orchestrator actually takes a `dyn` reference to.

use crate::model::{Assignment, AvoidEdge, Event, Match, ScheduleVersion, Slot, Team, Tournament};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
pub enum DbError {
    #[error("optimistic lock conflict")]
    OptimisticLockConflict,
    #[error("entity not found")]
    NotFound,
    #[error("unique violation: {0:?}")]
    UniqueViolation(Option<String>),
    #[error("foreign key violation: {0:?}")]
    ForeignKeyViolation(Option<String>),
    #[error("check violation: {0:?}")]
    CheckViolation(Option<String>),
    #[error("serialization failure")]
    SerializationFailure,
    #[error("{0}")]
    Other(String),
}

pub type DbResult<T> = Result<T, DbError>;

#[async_trait]
pub trait DbpTournament: Send + Sync {
    async fn get_tournament(&self, id: Uuid) -> DbResult<Tournament>;
    async fn save_tournament(&self, tournament: Tournament) -> DbResult<Tournament>;
}

#[async_trait]
pub trait DbpEvent: Send + Sync {
    async fn get_event(&self, id: Uuid) -> DbResult<Event>;
    async fn list_events_of_tournament(&self, tournament_id: Uuid) -> DbResult<Vec<Event>>;
    async fn save_event(&self, event: Event) -> DbResult<Event>;
}

#[async_trait]
pub trait DbpTeam: Send + Sync {
    async fn list_teams_of_event(&self, event_id: Uuid) -> DbResult<Vec<Team>>;
    async fn save_team(&self, team: Team) -> DbResult<Team>;
    async fn save_teams(&self, teams: Vec<Team>) -> DbResult<Vec<Team>> {
        let mut saved = Vec::with_capacity(teams.len());
        for team in teams {
            saved.push(self.save_team(team).await?);
        }
        Ok(saved)
    }
}

#[async_trait]
pub trait DbpAvoidEdge: Send + Sync {
    async fn list_avoid_edges_of_event(&self, event_id: Uuid) -> DbResult<Vec<AvoidEdge>>;
    async fn save_avoid_edge(&self, edge: AvoidEdge) -> DbResult<AvoidEdge>;
}

#[async_trait]
pub trait DbpScheduleVersion: Send + Sync {
    async fn get_schedule_version(&self, id: Uuid) -> DbResult<ScheduleVersion>;
    async fn list_versions_of_tournament(
        &self,
        tournament_id: Uuid,
    ) -> DbResult<Vec<ScheduleVersion>>;
    async fn save_schedule_version(&self, version: ScheduleVersion) -> DbResult<ScheduleVersion>;
    async fn next_version_number(&self, tournament_id: Uuid) -> DbResult<u32>;
}

#[async_trait]
pub trait DbpSlot: Send + Sync {
    async fn list_slots_of_version(&self, version_id: Uuid) -> DbResult<Vec<Slot>>;
    async fn save_slots(&self, slots: Vec<Slot>) -> DbResult<Vec<Slot>>;
    async fn delete_slots_of_version(&self, version_id: Uuid) -> DbResult<u64>;
}

#[async_trait]
pub trait DbpMatch: Send + Sync {
    async fn list_matches_of_version(&self, version_id: Uuid) -> DbResult<Vec<Match>>;
    async fn list_matches_of_event_and_version(
        &self,
        event_id: Uuid,
        version_id: Uuid,
    ) -> DbResult<Vec<Match>>;
    async fn save_matches(&self, matches: Vec<Match>) -> DbResult<Vec<Match>>;
    async fn delete_matches_of_event_and_version(
        &self,
        event_id: Uuid,
        version_id: Uuid,
    ) -> DbResult<u64>;
}

#[async_trait]
pub trait DbpAssignment: Send + Sync {
    async fn list_assignments_of_version(&self, version_id: Uuid) -> DbResult<Vec<Assignment>>;
    async fn save_assignments(&self, assignments: Vec<Assignment>) -> DbResult<Vec<Assignment>>;
    async fn delete_assignments_of_version(&self, version_id: Uuid) -> DbResult<u64>;
}

/// per-version advisory lock plus the ambient transaction boundary: every
/// mutating operation runs within exactly one transaction; concurrent
/// mutating operations on the same version are serialized by
/// `lock_version_row`.
#[async_trait]
pub trait TransactionPort: Send + Sync {
    async fn begin(&self) -> DbResult<()>;
    async fn commit(&self) -> DbResult<()>;
    async fn rollback(&self) -> DbResult<()>;
    async fn lock_version_row(&self, version_id: Uuid) -> DbResult<()>;
}

/// the full contract the build orchestrator depends on, aggregating every
/// per-entity sub-trait into one object-safe port.
pub trait SchedulePort:
    DbpTournament
    + DbpEvent
    + DbpTeam
    + DbpAvoidEdge
    + DbpScheduleVersion
    + DbpSlot
    + DbpMatch
    + DbpAssignment
    + TransactionPort
    + Send
    + Sync
{
}

impl<T> SchedulePort for T where
    T: DbpTournament
        + DbpEvent
        + DbpTeam
        + DbpAvoidEdge
        + DbpScheduleVersion
        + DbpSlot
        + DbpMatch
        + DbpAssignment
        + TransactionPort
        + Send
        + Sync
{
}
