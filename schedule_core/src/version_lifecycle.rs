//! draft/final state machine for a [`crate::model::ScheduleVersion`]: create,
//! reset, finalize (with its sanity checks and checksum), and clone-to-draft.

use crate::errors::{CoreError, CoreResult, PlanIssue};
use crate::model::{Assignment, Match, ScheduleVersion, Slot, VersionStatus};
use crate::ports::SchedulePort;
use crate::utils::IdVersion;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tracing::instrument;
use uuid::Uuid;

fn match_type_code(match_type: crate::model::MatchType) -> &'static str {
    use crate::model::MatchType::*;
    match match_type {
        Wf => "WF",
        Main => "MAIN",
        Consolation => "CONSOLATION",
        Placement => "PLACEMENT",
    }
}

/// sorted by the typed tuple `(day_date, start_time, court_number, id)`
/// before formatting, not by the formatted string: unpadded integers like
/// `court_number` would otherwise sort "10" before "2".
fn slot_lines(slots: &[Slot]) -> Vec<String> {
    let mut ordered: Vec<&Slot> = slots.iter().collect();
    ordered.sort_by_key(|s| (s.get_day_date(), s.get_start_time(), s.get_court_number(), s.get_id().unwrap_or_default()));
    ordered
        .into_iter()
        .map(|s| {
            format!(
                "S|{}|{}|{}|{}",
                s.get_day_date(),
                s.get_start_time(),
                s.get_court_number(),
                s.get_id().unwrap_or_default()
            )
        })
        .collect()
}

/// sorted by the typed tuple `(match_type, round_index, sequence_in_round,
/// id)` before formatting, for the same reason as `slot_lines`.
fn match_lines(matches: &[Match]) -> Vec<String> {
    let mut ordered: Vec<&Match> = matches.iter().collect();
    ordered.sort_by_key(|m| {
        (
            match_type_code(m.get_match_type()),
            m.get_round_index(),
            m.get_sequence_in_round(),
            m.get_id().unwrap_or_default(),
        )
    });
    ordered
        .into_iter()
        .map(|m| {
            format!(
                "M|{}|{}|{}|{}",
                match_type_code(m.get_match_type()),
                m.get_round_index(),
                m.get_sequence_in_round(),
                m.get_id().unwrap_or_default()
            )
        })
        .collect()
}

fn assignment_lines(assignments: &[Assignment]) -> Vec<String> {
    let mut ordered: Vec<&Assignment> = assignments.iter().collect();
    ordered.sort_by_key(|a| (a.get_slot_id(), a.get_match_id()));
    ordered
        .into_iter()
        .map(|a| format!("A|{}|{}", a.get_slot_id(), a.get_match_id()))
        .collect()
}

/// deterministic checksum over a version's content: three
/// canonicalized, independently sorted line groups (slots, matches,
/// assignments), concatenated and hashed. Byte-identical input state always
/// produces the same hex digest.
pub fn compute_checksum(slots: &[Slot], matches: &[Match], assignments: &[Assignment]) -> String {
    let joined = slot_lines(slots)
        .into_iter()
        .chain(match_lines(matches))
        .chain(assignment_lines(assignments))
        .collect::<Vec<_>>()
        .join("\n");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionDiff {
    pub slots_added: Vec<String>,
    pub slots_removed: Vec<String>,
    pub matches_added: Vec<String>,
    pub matches_removed: Vec<String>,
    pub assignments_added: Vec<String>,
    pub assignments_removed: Vec<String>,
}

impl VersionDiff {
    pub fn is_empty(&self) -> bool {
        self.slots_added.is_empty()
            && self.slots_removed.is_empty()
            && self.matches_added.is_empty()
            && self.matches_removed.is_empty()
            && self.assignments_added.is_empty()
            && self.assignments_removed.is_empty()
    }
}

fn set_diff(before: &[String], after: &[String]) -> (Vec<String>, Vec<String>) {
    let before_set: HashSet<&String> = before.iter().collect();
    let after_set: HashSet<&String> = after.iter().collect();
    let mut added: Vec<String> = after_set.difference(&before_set).map(|s| s.to_string()).collect();
    let mut removed: Vec<String> = before_set.difference(&after_set).map(|s| s.to_string()).collect();
    added.sort();
    removed.sort();
    (added, removed)
}

/// compares two content snapshots line-by-line, reusing the same
/// canonicalization `compute_checksum` hashes, and reports exactly which
/// slot/match/assignment lines were added or removed between them. Purely
/// additive: a caller with `before` and `after` state for the same version
/// (e.g. around a `build()` call) can see what changed without re-deriving
/// the checksum comparison into something more expensive.
pub fn diff_snapshots(
    before: (&[Slot], &[Match], &[Assignment]),
    after: (&[Slot], &[Match], &[Assignment]),
) -> VersionDiff {
    let (slots_added, slots_removed) = set_diff(&slot_lines(before.0), &slot_lines(after.0));
    let (matches_added, matches_removed) = set_diff(&match_lines(before.1), &match_lines(after.1));
    let (assignments_added, assignments_removed) = set_diff(&assignment_lines(before.2), &assignment_lines(after.2));
    VersionDiff {
        slots_added,
        slots_removed,
        matches_added,
        matches_removed,
        assignments_added,
        assignments_removed,
    }
}

/// `create_draft(tournament_id) → ScheduleVersion`.
#[instrument(name = "version_lifecycle.create_draft", skip(db))]
pub async fn create_draft(db: &dyn SchedulePort, tournament_id: Uuid) -> CoreResult<ScheduleVersion> {
    let version_number = db.next_version_number(tournament_id).await?;
    let version = ScheduleVersion::new_draft(IdVersion::New, tournament_id, version_number, Utc::now());
    Ok(db.save_schedule_version(version).await?)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetCounts {
    pub assignments_deleted: u64,
    pub matches_deleted: u64,
    pub slots_deleted: u64,
}

/// `reset(version_id) → ResetCounts`. Requires a draft version;
/// cascades assignments → matches → slots, in that order, so no delete ever
/// leaves a dangling foreign key even for a caller racing a partial failure.
#[instrument(name = "version_lifecycle.reset", skip(db))]
pub async fn reset(db: &dyn SchedulePort, version_id: Uuid) -> CoreResult<ResetCounts> {
    let mut version = db.get_schedule_version(version_id).await?;
    if version.get_status() != VersionStatus::Draft {
        return Err(CoreError::ScheduleVersionNotDraft {
            version_id,
            status: version.get_status(),
        });
    }

    let assignments_deleted = db.delete_assignments_of_version(version_id).await?;

    let events = db.list_events_of_tournament(version.get_tournament_id()).await?;
    let mut matches_deleted = 0;
    for event in events {
        let Some(event_id) = event.get_id() else { continue };
        matches_deleted += db.delete_matches_of_event_and_version(event_id, version_id).await?;
    }

    let slots_deleted = db.delete_slots_of_version(version_id).await?;

    version.clear_to_empty_draft();
    db.save_schedule_version(version).await?;

    Ok(ResetCounts {
        assignments_deleted,
        matches_deleted,
        slots_deleted,
    })
}

/// `finalize(version_id) → ScheduleVersion`. Requires a draft version
/// and runs three sanity checks before sealing it: no slot double-booked, no
/// assignment referencing a match or slot outside this version, and no
/// match referencing a team outside its own event.
#[instrument(name = "version_lifecycle.finalize", skip(db))]
pub async fn finalize(db: &dyn SchedulePort, version_id: Uuid) -> CoreResult<ScheduleVersion> {
    let mut version = db.get_schedule_version(version_id).await?;
    if version.get_status() != VersionStatus::Draft {
        return Err(CoreError::ScheduleVersionNotDraft {
            version_id,
            status: version.get_status(),
        });
    }

    let slots = db.list_slots_of_version(version_id).await?;
    let matches = db.list_matches_of_version(version_id).await?;
    let assignments = db.list_assignments_of_version(version_id).await?;

    let mut blocking = Vec::new();

    let slot_ids: HashSet<Uuid> = slots.iter().filter_map(Slot::get_id).collect();
    let match_ids: HashSet<Uuid> = matches.iter().filter_map(Match::get_id).collect();

    let mut seen_slots = HashSet::new();
    for a in &assignments {
        if !slot_ids.contains(&a.get_slot_id()) || !match_ids.contains(&a.get_match_id()) {
            blocking.push(PlanIssue::new(
                "DANGLING_ASSIGNMENT",
                format!("assignment {} references a match or slot outside this version", a.get_match_id()),
            ));
        }
        if !seen_slots.insert(a.get_slot_id()) {
            blocking.push(PlanIssue::new(
                "DOUBLE_BOOKED_SLOT",
                format!("slot {} is assigned to more than one match", a.get_slot_id()),
            ));
        }
    }

    let mut teams_by_event: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
    for m in &matches {
        let team_ids = teams_by_event
            .entry(m.get_event_id())
            .or_insert_with(HashSet::new);
        if team_ids.is_empty() {
            let teams = db.list_teams_of_event(m.get_event_id()).await?;
            team_ids.extend(teams.iter().filter_map(crate::model::Team::get_id));
        }
        for team_id in m.resolved_teams() {
            if !team_ids.contains(&team_id) {
                blocking.push(PlanIssue::new(
                    "TEAM_OUTSIDE_EVENT",
                    format!("match {} references team {team_id} outside its own event", m.get_match_code()),
                ));
            }
        }
    }

    if !blocking.is_empty() {
        return Err(CoreError::PlanInvalid { blocking });
    }

    let checksum = compute_checksum(&slots, &matches, &assignments);
    version.mark_final(Utc::now(), checksum);
    Ok(db.save_schedule_version(version).await?)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloneCounts {
    pub slots_copied: u32,
    pub matches_copied: u32,
    pub assignments_copied: u32,
}

/// `clone_to_draft(source_version_id) → (ScheduleVersion, CloneCounts)`.
/// Requires the source to be final; deep-copies its slots, matches
/// (teams stay shared — they belong to the event, not the version), and
/// assignments under a fresh draft version with remapped ids.
#[instrument(name = "version_lifecycle.clone_to_draft", skip(db))]
pub async fn clone_to_draft(
    db: &dyn SchedulePort,
    source_version_id: Uuid,
) -> CoreResult<(ScheduleVersion, CloneCounts)> {
    let source = db.get_schedule_version(source_version_id).await?;
    if source.get_status() != VersionStatus::Final {
        return Err(CoreError::SourceVersionNotFinal {
            version_id: source_version_id,
        });
    }

    let version_number = db.next_version_number(source.get_tournament_id()).await?;
    let new_version = db
        .save_schedule_version(ScheduleVersion::new_draft(
            IdVersion::New,
            source.get_tournament_id(),
            version_number,
            Utc::now(),
        ))
        .await?;
    let new_version_id = new_version.get_id().ok_or_else(|| CoreError::MissingId("schedule_version".into()))?;

    let source_slots = db.list_slots_of_version(source_version_id).await?;
    let new_slots: Vec<Slot> = source_slots
        .iter()
        .map(|s| Slot::new(IdVersion::New, new_version_id, s.get_day_date(), s.get_start_time(), s.get_court_number(), s.get_court_label().map(str::to_string)))
        .collect();
    let saved_slots = db.save_slots(new_slots).await?;
    let slot_id_map: HashMap<Uuid, Uuid> = source_slots
        .iter()
        .filter_map(Slot::get_id)
        .zip(saved_slots.iter().filter_map(Slot::get_id))
        .collect();

    let source_matches = db.list_matches_of_version(source_version_id).await?;
    let new_matches: Vec<Match> = source_matches
        .iter()
        .map(|m| {
            let mut copy = Match::new(
                IdVersion::New,
                m.get_event_id(),
                new_version_id,
                m.get_match_code(),
                m.get_match_type(),
                m.get_round_index(),
                m.get_sequence_in_round(),
                m.get_duration_minutes(),
                m.get_placeholder_side_a(),
                m.get_placeholder_side_b(),
            );
            copy.set_consolation_tier(m.get_consolation_tier())
                .set_placement_type(m.get_placement_type())
                .set_teams(m.get_team_a_id(), m.get_team_b_id())
                .set_preferred_day(m.get_preferred_day())
                .set_status(m.get_status());
            copy
        })
        .collect();
    let saved_matches = db.save_matches(new_matches).await?;
    let match_id_map: HashMap<Uuid, Uuid> = source_matches
        .iter()
        .filter_map(Match::get_id)
        .zip(saved_matches.iter().filter_map(Match::get_id))
        .collect();

    let source_assignments = db.list_assignments_of_version(source_version_id).await?;
    let new_assignments: Vec<Assignment> = source_assignments
        .iter()
        .filter_map(|a| {
            let new_match_id = *match_id_map.get(&a.get_match_id())?;
            let new_slot_id = *slot_id_map.get(&a.get_slot_id())?;
            Some(Assignment::new(IdVersion::New, new_version_id, new_match_id, new_slot_id))
        })
        .collect();
    let saved_assignments = db.save_assignments(new_assignments).await?;

    Ok((
        new_version,
        CloneCounts {
            slots_copied: saved_slots.len() as u32,
            matches_copied: saved_matches.len() as u32,
            assignments_copied: saved_assignments.len() as u32,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchStatus, MatchType};
    use chrono::{NaiveDate, NaiveTime};

    fn slot(day: &str, time: &str, court: u32) -> Slot {
        Slot::new(
            IdVersion::NewWithId(Uuid::new_v4()),
            Uuid::new_v4(),
            NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
            NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
            court,
            None,
        )
    }

    fn a_match(code: &str) -> Match {
        let mut m = Match::new(
            IdVersion::NewWithId(Uuid::new_v4()),
            Uuid::new_v4(),
            Uuid::new_v4(),
            code,
            MatchType::Main,
            1,
            1,
            60,
            "A",
            "B",
        );
        m.set_status(MatchStatus::Unscheduled);
        m
    }

    #[test]
    fn checksum_is_stable_across_reordering() {
        let s1 = slot("2026-07-28", "09:00", 1);
        let s2 = slot("2026-07-28", "09:15", 1);
        let m1 = a_match("M1");

        let checksum_a = compute_checksum(&[s1.clone(), s2.clone()], &[m1.clone()], &[]);
        let checksum_b = compute_checksum(&[s2, s1], &[m1], &[]);
        assert_eq!(checksum_a, checksum_b);
    }

    #[test]
    fn checksum_changes_when_content_changes() {
        let s1 = slot("2026-07-28", "09:00", 1);
        let s2 = slot("2026-07-28", "09:15", 1);
        let checksum_a = compute_checksum(&[s1.clone()], &[], &[]);
        let checksum_b = compute_checksum(&[s1, s2], &[], &[]);
        assert_ne!(checksum_a, checksum_b);
    }

    #[test]
    fn checksum_is_a_64_char_hex_digest() {
        let checksum = compute_checksum(&[], &[], &[]);
        assert_eq!(checksum.len(), 64);
        assert!(checksum.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn diff_snapshots_is_empty_for_identical_content() {
        let s1 = slot("2026-07-28", "09:00", 1);
        let m1 = a_match("M1");
        let diff = diff_snapshots((&[s1.clone()], &[m1.clone()], &[]), (&[s1], &[m1], &[]));
        assert!(diff.is_empty());
    }

    #[test]
    fn diff_snapshots_reports_added_and_removed_matches() {
        let s1 = slot("2026-07-28", "09:00", 1);
        let m1 = a_match("M1");
        let m2 = a_match("M2");

        let diff = diff_snapshots((&[s1.clone()], &[m1.clone()], &[]), (&[s1], &[m2], &[]));

        assert!(!diff.is_empty());
        assert_eq!(diff.matches_added.len(), 1);
        assert_eq!(diff.matches_removed.len(), 1);
        assert!(diff.slots_added.is_empty());
        assert!(diff.slots_removed.is_empty());
    }
}
