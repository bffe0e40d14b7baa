//! in-memory `SchedulePort` implementation for component and integration
//! tests: one `Mutex<HashMap<...>>` table per aggregate, optimistic-lock checks on
//! save identical to the real store's contract, and failure injection so
//! callers can exercise the orchestrator's rollback paths without a real
//! database. Feature-gated behind `test-support`, the only implementation of
//! `SchedulePort` this crate ships.

use crate::model::{Assignment, AvoidEdge, Event, Match, ScheduleVersion, Slot, Team, Tournament};
use crate::ports::{
    DbError, DbResult, DbpAssignment, DbpAvoidEdge, DbpEvent, DbpMatch, DbpScheduleVersion, DbpSlot,
    DbpTeam, DbpTournament, TransactionPort,
};
use crate::utils::{IdVersion, ObjectIdVersion};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

/// generic upsert honoring the same optimistic-lock contract every
/// `Dbp*::save_*` method needs: `New` allocates an id, `NewWithId` rejects a
/// collision, `Existing` requires the stored version to match before bumping
/// it. One definition shared by every table instead of duplicating the
/// three-way match per entity.
fn upsert<T: Clone + ObjectIdVersion>(
    table: &Mutex<HashMap<Uuid, T>>,
    mut entity: T,
    set_id_version: impl Fn(&mut T, IdVersion),
) -> DbResult<T> {
    let mut guard = table.lock().unwrap();
    match entity.get_id_version() {
        IdVersion::Existing { id, version } => {
            let existing = guard.get(&id).ok_or(DbError::NotFound)?;
            let existing_version = existing.get_id_version().get_version().unwrap_or(0);
            if existing_version != version {
                return Err(DbError::OptimisticLockConflict);
            }
            set_id_version(&mut entity, IdVersion::Existing { id, version: version + 1 });
        }
        IdVersion::New => {
            set_id_version(&mut entity, IdVersion::allocated(Uuid::new_v4()));
        }
        IdVersion::NewWithId(id) => {
            if guard.contains_key(&id) {
                return Err(DbError::UniqueViolation(Some(format!("id {id} already exists"))));
            }
            set_id_version(&mut entity, IdVersion::allocated(id));
        }
    }
    let id = entity.get_id_version().get_id().expect("just allocated");
    guard.insert(id, entity.clone());
    Ok(entity)
}

/// in-memory double for the full persistence contract. Not a
/// realistic backend — no actual transactions, no real row locking — but
/// faithful to the same save/delete/list semantics the orchestrator depends
/// on, which is all a unit test needs.
#[derive(Default)]
pub struct FakeDatabasePort {
    tournaments: Mutex<HashMap<Uuid, Tournament>>,
    events: Mutex<HashMap<Uuid, Event>>,
    teams: Mutex<HashMap<Uuid, Team>>,
    avoid_edges: Mutex<HashMap<Uuid, AvoidEdge>>,
    versions: Mutex<HashMap<Uuid, ScheduleVersion>>,
    slots: Mutex<HashMap<Uuid, Slot>>,
    matches: Mutex<HashMap<Uuid, Match>>,
    assignments: Mutex<HashMap<Uuid, Assignment>>,
    version_numbers: Mutex<HashMap<Uuid, u32>>,
    locked_versions: Mutex<HashSet<Uuid>>,
    fail_next: Mutex<HashSet<&'static str>>,
}

impl FakeDatabasePort {
    pub fn new() -> Self {
        Self::default()
    }

    /// arms a one-shot failure for the named operation (e.g. `"save_matches"`),
    /// used to exercise `BuildOrchestrator`'s rollback-on-failure path.
    pub fn fail_once(&self, op: &'static str) {
        self.fail_next.lock().unwrap().insert(op);
    }

    fn should_fail(&self, op: &'static str) -> DbResult<()> {
        if self.fail_next.lock().unwrap().remove(op) {
            return Err(DbError::Other(format!("injected failure: {op}")));
        }
        Ok(())
    }

    pub fn seed_tournament(&self, tournament: Tournament) -> Uuid {
        let saved = upsert(&self.tournaments, tournament, |e: &mut Tournament, iv| { e.set_id_version(iv); }).unwrap();
        saved.get_id_version().get_id().unwrap()
    }

    pub fn seed_event(&self, event: Event) -> Uuid {
        let saved = upsert(&self.events, event, |e: &mut Event, iv| { e.set_id_version(iv); }).unwrap();
        saved.get_id_version().get_id().unwrap()
    }

    pub fn seed_team(&self, team: Team) -> Uuid {
        let saved = upsert(&self.teams, team, |e: &mut Team, iv| { e.set_id_version(iv); }).unwrap();
        saved.get_id_version().get_id().unwrap()
    }

    pub fn seed_avoid_edge(&self, edge: AvoidEdge) -> Uuid {
        let saved = upsert(&self.avoid_edges, edge, |e: &mut AvoidEdge, iv| { e.set_id_version(iv); }).unwrap();
        saved.get_id_version().get_id().unwrap()
    }

    pub fn seed_schedule_version(&self, version: ScheduleVersion) -> Uuid {
        let saved = upsert(&self.versions, version, |e: &mut ScheduleVersion, iv| { e.set_id_version(iv); }).unwrap();
        saved.get_id_version().get_id().unwrap()
    }
}

#[async_trait]
impl DbpTournament for FakeDatabasePort {
    async fn get_tournament(&self, id: Uuid) -> DbResult<Tournament> {
        self.should_fail("get_tournament")?;
        self.tournaments.lock().unwrap().get(&id).cloned().ok_or(DbError::NotFound)
    }

    async fn save_tournament(&self, tournament: Tournament) -> DbResult<Tournament> {
        self.should_fail("save_tournament")?;
        upsert(&self.tournaments, tournament, |e: &mut Tournament, iv| { e.set_id_version(iv); })
    }
}

#[async_trait]
impl DbpEvent for FakeDatabasePort {
    async fn get_event(&self, id: Uuid) -> DbResult<Event> {
        self.should_fail("get_event")?;
        self.events.lock().unwrap().get(&id).cloned().ok_or(DbError::NotFound)
    }

    async fn list_events_of_tournament(&self, tournament_id: Uuid) -> DbResult<Vec<Event>> {
        self.should_fail("list_events_of_tournament")?;
        let mut events: Vec<Event> = self
            .events
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.get_tournament_id() == tournament_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.get_id());
        Ok(events)
    }

    async fn save_event(&self, event: Event) -> DbResult<Event> {
        self.should_fail("save_event")?;
        upsert(&self.events, event, |e: &mut Event, iv| { e.set_id_version(iv); })
    }
}

#[async_trait]
impl DbpTeam for FakeDatabasePort {
    async fn list_teams_of_event(&self, event_id: Uuid) -> DbResult<Vec<Team>> {
        self.should_fail("list_teams_of_event")?;
        let mut teams: Vec<Team> = self
            .teams
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.get_event_id() == event_id)
            .cloned()
            .collect();
        teams.sort_by(|a, b| a.cmp_canonical(b));
        Ok(teams)
    }

    async fn save_team(&self, team: Team) -> DbResult<Team> {
        self.should_fail("save_team")?;
        upsert(&self.teams, team, |e: &mut Team, iv| { e.set_id_version(iv); })
    }
}

#[async_trait]
impl DbpAvoidEdge for FakeDatabasePort {
    async fn list_avoid_edges_of_event(&self, event_id: Uuid) -> DbResult<Vec<AvoidEdge>> {
        self.should_fail("list_avoid_edges_of_event")?;
        Ok(self
            .avoid_edges
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.get_event_id() == event_id)
            .cloned()
            .collect())
    }

    async fn save_avoid_edge(&self, edge: AvoidEdge) -> DbResult<AvoidEdge> {
        self.should_fail("save_avoid_edge")?;
        let canonical = edge.canonical_pair();
        let duplicate = self
            .avoid_edges
            .lock()
            .unwrap()
            .values()
            .any(|e| e.get_event_id() == edge.get_event_id() && e.canonical_pair() == canonical && e.get_id_version().get_id() != edge.get_id_version().get_id());
        if duplicate {
            return Err(DbError::UniqueViolation(Some(format!("{canonical:?}"))));
        }
        upsert(&self.avoid_edges, edge, |e: &mut AvoidEdge, iv| { e.set_id_version(iv); })
    }
}

#[async_trait]
impl DbpScheduleVersion for FakeDatabasePort {
    async fn get_schedule_version(&self, id: Uuid) -> DbResult<ScheduleVersion> {
        self.should_fail("get_schedule_version")?;
        self.versions.lock().unwrap().get(&id).cloned().ok_or(DbError::NotFound)
    }

    async fn list_versions_of_tournament(&self, tournament_id: Uuid) -> DbResult<Vec<ScheduleVersion>> {
        self.should_fail("list_versions_of_tournament")?;
        let mut versions: Vec<ScheduleVersion> = self
            .versions
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.get_tournament_id() == tournament_id)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.get_version_number());
        Ok(versions)
    }

    async fn save_schedule_version(&self, version: ScheduleVersion) -> DbResult<ScheduleVersion> {
        self.should_fail("save_schedule_version")?;
        upsert(&self.versions, version, |e: &mut ScheduleVersion, iv| { e.set_id_version(iv); })
    }

    async fn next_version_number(&self, tournament_id: Uuid) -> DbResult<u32> {
        self.should_fail("next_version_number")?;
        let mut numbers = self.version_numbers.lock().unwrap();
        let next = numbers.entry(tournament_id).or_insert(0);
        *next += 1;
        Ok(*next)
    }
}

#[async_trait]
impl DbpSlot for FakeDatabasePort {
    async fn list_slots_of_version(&self, version_id: Uuid) -> DbResult<Vec<Slot>> {
        self.should_fail("list_slots_of_version")?;
        let mut slots: Vec<Slot> = self
            .slots
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.get_schedule_version_id() == version_id)
            .cloned()
            .collect();
        slots.sort_by_key(|s| s.sort_key());
        Ok(slots)
    }

    async fn save_slots(&self, slots: Vec<Slot>) -> DbResult<Vec<Slot>> {
        self.should_fail("save_slots")?;
        slots.into_iter().map(|s| upsert(&self.slots, s, |e: &mut Slot, iv| { e.set_id_version(iv); })).collect()
    }

    async fn delete_slots_of_version(&self, version_id: Uuid) -> DbResult<u64> {
        self.should_fail("delete_slots_of_version")?;
        let mut guard = self.slots.lock().unwrap();
        let before = guard.len();
        guard.retain(|_, s| s.get_schedule_version_id() != version_id);
        Ok((before - guard.len()) as u64)
    }
}

#[async_trait]
impl DbpMatch for FakeDatabasePort {
    async fn list_matches_of_version(&self, version_id: Uuid) -> DbResult<Vec<Match>> {
        self.should_fail("list_matches_of_version")?;
        let mut matches: Vec<Match> = self
            .matches
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.get_schedule_version_id() == version_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(matches)
    }

    async fn list_matches_of_event_and_version(&self, event_id: Uuid, version_id: Uuid) -> DbResult<Vec<Match>> {
        self.should_fail("list_matches_of_event_and_version")?;
        let mut matches: Vec<Match> = self
            .matches
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.get_event_id() == event_id && m.get_schedule_version_id() == version_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(matches)
    }

    async fn save_matches(&self, matches: Vec<Match>) -> DbResult<Vec<Match>> {
        self.should_fail("save_matches")?;
        matches.into_iter().map(|m| upsert(&self.matches, m, |e: &mut Match, iv| { e.set_id_version(iv); })).collect()
    }

    async fn delete_matches_of_event_and_version(&self, event_id: Uuid, version_id: Uuid) -> DbResult<u64> {
        self.should_fail("delete_matches_of_event_and_version")?;
        let mut guard = self.matches.lock().unwrap();
        let before = guard.len();
        guard.retain(|_, m| !(m.get_event_id() == event_id && m.get_schedule_version_id() == version_id));
        Ok((before - guard.len()) as u64)
    }
}

#[async_trait]
impl DbpAssignment for FakeDatabasePort {
    async fn list_assignments_of_version(&self, version_id: Uuid) -> DbResult<Vec<Assignment>> {
        self.should_fail("list_assignments_of_version")?;
        Ok(self
            .assignments
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.get_schedule_version_id() == version_id)
            .cloned()
            .collect())
    }

    async fn save_assignments(&self, assignments: Vec<Assignment>) -> DbResult<Vec<Assignment>> {
        self.should_fail("save_assignments")?;
        assignments.into_iter().map(|a| upsert(&self.assignments, a, |e: &mut Assignment, iv| { e.set_id_version(iv); })).collect()
    }

    async fn delete_assignments_of_version(&self, version_id: Uuid) -> DbResult<u64> {
        self.should_fail("delete_assignments_of_version")?;
        let mut guard = self.assignments.lock().unwrap();
        let before = guard.len();
        guard.retain(|_, a| a.get_schedule_version_id() != version_id);
        Ok((before - guard.len()) as u64)
    }
}

/// no real transaction boundary: the fake applies every write immediately.
/// `lock_version_row` just records intent so a test can assert serialization
/// was attempted; it never blocks, since the fake is single-threaded.
#[async_trait]
impl TransactionPort for FakeDatabasePort {
    async fn begin(&self) -> DbResult<()> {
        self.should_fail("begin")
    }

    async fn commit(&self) -> DbResult<()> {
        self.should_fail("commit")
    }

    async fn rollback(&self) -> DbResult<()> {
        self.should_fail("rollback")
    }

    async fn lock_version_row(&self, version_id: Uuid) -> DbResult<()> {
        self.should_fail("lock_version_row")?;
        self.locked_versions.lock().unwrap().insert(version_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TournamentDay;
    use chrono::{NaiveDate, NaiveTime};

    fn tournament() -> Tournament {
        let mut t = Tournament::new(IdVersion::New, "Summer Classic");
        t.add_day(TournamentDay::new(
            NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
            NaiveTime::parse_from_str("09:00", "%H:%M").unwrap(),
            NaiveTime::parse_from_str("18:00", "%H:%M").unwrap(),
            2,
        ));
        t
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let db = FakeDatabasePort::new();
        let saved = db.save_tournament(tournament()).await.unwrap();
        let id = saved.get_id_version().get_id().unwrap();
        let fetched = db.get_tournament(id).await.unwrap();
        assert_eq!(fetched.get_name(), "Summer Classic");
    }

    #[tokio::test]
    async fn stale_version_is_rejected_with_optimistic_lock_conflict() {
        let db = FakeDatabasePort::new();
        let saved = db.save_tournament(tournament()).await.unwrap();
        let id = saved.get_id_version().get_id().unwrap();

        // a second writer loads the same row and saves concurrently
        let mut stale = saved.clone();
        db.save_tournament(saved).await.unwrap();

        stale.set_id_version(IdVersion::Existing { id, version: 0 });
        let result = db.save_tournament(stale).await;
        assert!(matches!(result, Err(DbError::OptimisticLockConflict)));
    }

    #[tokio::test]
    async fn injected_failure_fires_exactly_once() {
        let db = FakeDatabasePort::new();
        db.fail_once("save_tournament");
        assert!(db.save_tournament(tournament()).await.is_err());
        assert!(db.save_tournament(tournament()).await.is_ok());
    }

    #[tokio::test]
    async fn version_numbers_are_monotonic_per_tournament() {
        let db = FakeDatabasePort::new();
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        assert_eq!(db.next_version_number(t1).await.unwrap(), 1);
        assert_eq!(db.next_version_number(t1).await.unwrap(), 2);
        assert_eq!(db.next_version_number(t2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_avoid_edge_rejected_as_unique_violation() {
        let db = FakeDatabasePort::new();
        let event_id = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let edge = AvoidEdge::new(IdVersion::New, event_id, a, b, None).unwrap();
        db.save_avoid_edge(edge).await.unwrap();

        let duplicate = AvoidEdge::new(IdVersion::New, event_id, b, a, None).unwrap();
        let result = db.save_avoid_edge(duplicate).await;
        assert!(matches!(result, Err(DbError::UniqueViolation(_))));
    }
}
