//! deterministic first-fit matching of matches to slots, honoring
//! non-overlap, day-end, and inter-stage rest constraints.

use crate::errors::{CoreError, CoreResult};
use crate::model::{Assignment, Match, MatchType, Slot, TournamentDay, VersionStatus};
use crate::utils::IdVersion;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

fn required_gap_minutes(previous_stage: MatchType, candidate_stage: MatchType) -> i64 {
    if previous_stage == MatchType::Wf && candidate_stage != MatchType::Wf {
        60
    } else {
        90
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnassignedReason {
    SlotsExhausted,
    DurationTooLong,
    NoRestCompatibleSlot,
    NoCompatibleSlot,
}

#[derive(Debug, Clone)]
pub struct UnassignedMatch {
    pub match_id: Uuid,
    pub reason: UnassignedReason,
}

#[derive(Debug, Clone, Default)]
pub struct RestViolationsSummary {
    pub wf_to_scoring_violations: u32,
    pub scoring_to_scoring_violations: u32,
    pub total_rest_blocked: u32,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentResult {
    pub assignments: Vec<Assignment>,
    pub assigned_count: u32,
    pub unassigned_count: u32,
    pub unassigned: Vec<UnassignedMatch>,
    pub rest_violations_summary: RestViolationsSummary,
}

#[derive(Clone, Copy)]
pub(crate) struct RestState {
    pub(crate) last_end: NaiveDateTime,
    pub(crate) last_stage: MatchType,
}

fn slot_datetime(slot: &Slot) -> NaiveDateTime {
    NaiveDateTime::new(slot.get_day_date(), slot.get_start_time())
}

/// deterministic slot read order: (day_date, start_time_in_minutes, court_label, id).
pub(crate) fn slot_sort_key(slot: &Slot) -> (NaiveDate, i32, String, Uuid) {
    let minutes = slot.get_start_time().signed_duration_since(NaiveTime::MIN).num_minutes() as i32;
    (
        slot.get_day_date(),
        minutes,
        slot.get_court_label().unwrap_or_default().to_string(),
        slot.get_id().unwrap_or(Uuid::nil()),
    )
}

/// the per-(slot, match) compatibility predicate, decomposed so the
/// unassigned-reason classifier below can ask about each clause separately.
pub(crate) struct Compatibility<'a> {
    pub(crate) days_by_date: &'a HashMap<NaiveDate, NaiveTime>,
    pub(crate) occupied: &'a HashMap<(NaiveDate, u32), Vec<(NaiveDateTime, NaiveDateTime)>>,
    pub(crate) rest_state: &'a HashMap<Uuid, RestState>,
}

impl Compatibility<'_> {
    pub(crate) fn fits_before_day_end(&self, slot: &Slot, m: &Match) -> bool {
        let Some(&day_end) = self.days_by_date.get(&slot.get_day_date()) else {
            return false;
        };
        let candidate_end = slot.get_start_time() + Duration::minutes(m.get_duration_minutes() as i64);
        candidate_end <= day_end
    }

    pub(crate) fn not_overlapping(&self, slot: &Slot, m: &Match) -> bool {
        let start = slot_datetime(slot);
        let end = start + Duration::minutes(m.get_duration_minutes() as i64);
        match self.occupied.get(&(slot.get_day_date(), slot.get_court_number())) {
            None => true,
            Some(existing) => existing.iter().all(|&(es, ee)| end <= es || ee <= start),
        }
    }

    pub(crate) fn rest_ok(&self, slot: &Slot, m: &Match) -> bool {
        let start = slot_datetime(slot);
        m.resolved_teams().all(|team_id| match self.rest_state.get(&team_id) {
            None => true,
            Some(state) => {
                let gap = required_gap_minutes(state.last_stage, m.get_match_type());
                start >= state.last_end + Duration::minutes(gap)
            }
        })
    }

    fn compatible(&self, slot: &Slot, m: &Match) -> bool {
        self.fits_before_day_end(slot, m) && self.not_overlapping(slot, m) && self.rest_ok(slot, m)
    }
}

pub(crate) fn classify_unassigned(slots: &[&Slot], m: &Match, compat: &Compatibility) -> UnassignedReason {
    if slots.is_empty() {
        return UnassignedReason::SlotsExhausted;
    }
    if slots.iter().all(|s| !compat.fits_before_day_end(s, m)) {
        return UnassignedReason::DurationTooLong;
    }
    // slots that the match could start in on duration alone, and that aren't
    // already occupied by another assignment on the same (day, court).
    let free: Vec<&&Slot> = slots
        .iter()
        .filter(|s| compat.fits_before_day_end(s, m) && compat.not_overlapping(s, m))
        .collect();
    if free.is_empty() {
        // every duration-fitting slot in the window is already taken: the
        // court/day combination has run out of room for this match, same as
        // an empty slot list.
        return UnassignedReason::SlotsExhausted;
    }
    if free.iter().any(|s| !compat.rest_ok(s, m)) {
        return UnassignedReason::NoRestCompatibleSlot;
    }
    UnassignedReason::NoCompatibleSlot
}

/// `assign(version, matches, slots, days) → AssignmentResult`.
/// `clear_existing` (deleting prior assignments in the version) is the
/// caller's responsibility. Fails with `SCHEDULE_VERSION_NOT_DRAFT` if the
/// version is final.
#[instrument(name = "assignment.assign", skip(matches, slots, days))]
pub fn assign(
    version_id: Uuid,
    version_status: VersionStatus,
    matches: &[Match],
    slots: &[Slot],
    days: &[TournamentDay],
) -> CoreResult<AssignmentResult> {
    if version_status != VersionStatus::Draft {
        return Err(CoreError::ScheduleVersionNotDraft {
            version_id,
            status: version_status,
        });
    }

    let days_by_date: HashMap<NaiveDate, NaiveTime> = days.iter().map(|d| (d.date, d.end_time)).collect();

    let mut sorted_matches: Vec<&Match> = matches.iter().collect();
    sorted_matches.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let mut sorted_slots: Vec<&Slot> = slots.iter().collect();
    sorted_slots.sort_by(|a, b| slot_sort_key(a).cmp(&slot_sort_key(b)));

    let mut occupied: HashMap<(NaiveDate, u32), Vec<(NaiveDateTime, NaiveDateTime)>> = HashMap::new();
    let mut rest_state: HashMap<Uuid, RestState> = HashMap::new();
    let mut result = AssignmentResult::default();

    for m in sorted_matches {
        let Some(match_id) = m.get_id() else {
            continue;
        };

        let compat = Compatibility {
            days_by_date: &days_by_date,
            occupied: &occupied,
            rest_state: &rest_state,
        };

        let chosen = sorted_slots.iter().find(|s| compat.compatible(s, m));

        match chosen {
            Some(&slot) => {
                let Some(slot_id) = slot.get_id() else { continue };
                result.assignments.push(Assignment::new(IdVersion::New, version_id, match_id, slot_id));
                result.assigned_count += 1;

                let start = slot_datetime(slot);
                let end = start + Duration::minutes(m.get_duration_minutes() as i64);
                occupied.entry((slot.get_day_date(), slot.get_court_number())).or_default().push((start, end));

                for team_id in m.resolved_teams() {
                    rest_state.insert(
                        team_id,
                        RestState {
                            last_end: end,
                            last_stage: m.get_match_type(),
                        },
                    );
                }
            }
            None => {
                let reason = classify_unassigned(&sorted_slots, m, &compat);
                if reason == UnassignedReason::NoRestCompatibleSlot {
                    result.rest_violations_summary.total_rest_blocked += 1;
                    let prev_was_wf = m
                        .resolved_teams()
                        .filter_map(|t| rest_state.get(&t))
                        .any(|s| s.last_stage == MatchType::Wf);
                    if prev_was_wf {
                        result.rest_violations_summary.wf_to_scoring_violations += 1;
                    } else {
                        result.rest_violations_summary.scoring_to_scoring_violations += 1;
                    }
                }
                result.unassigned.push(UnassignedMatch { match_id, reason });
                result.unassigned_count += 1;
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MatchStatus;
    use uuid::Uuid;

    fn day(start: &str, end: &str) -> TournamentDay {
        TournamentDay::new(
            NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
            NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
            1,
        )
    }

    fn plain_match(version_id: Uuid, code: &str, round: u32, seq: u32, duration: u32) -> Match {
        let mut m = Match::new(
            IdVersion::NewWithId(Uuid::new_v4()),
            Uuid::new_v4(),
            version_id,
            code,
            MatchType::Main,
            round,
            seq,
            duration,
            "A",
            "B",
        );
        m.set_status(MatchStatus::Unscheduled);
        m
    }

    fn slots_for(version_id: Uuid, day: &TournamentDay) -> Vec<Slot> {
        crate::slots::generate_slots(version_id, crate::slots::SlotSource::Auto(&{
            let mut t = crate::model::Tournament::new(IdVersion::New, "t");
            t.add_day(day.clone());
            t
        }))
    }

    #[test]
    fn three_matches_fit_sequential_hourly_slots_then_run_out_of_room() {
        let version_id = Uuid::new_v4();
        let day = day("09:00", "12:00");
        let slots = slots_for(version_id, &day);
        let matches: Vec<Match> = (1..=6)
            .map(|i| plain_match(version_id, &format!("M{i}"), 1, i, 60))
            .collect();

        let result = assign(version_id, VersionStatus::Draft, &matches, &slots, &[day]).unwrap();
        assert_eq!(result.assigned_count, 3);
        assert_eq!(result.unassigned_count, 3);
        assert!(result.unassigned.iter().all(|u| u.reason == UnassignedReason::SlotsExhausted));
    }

    #[test]
    fn empty_slot_list_is_reported_as_slots_exhausted() {
        let version_id = Uuid::new_v4();
        let matches = vec![plain_match(version_id, "M1", 1, 1, 60)];
        let result = assign(version_id, VersionStatus::Draft, &matches, &[], &[]).unwrap();
        assert_eq!(result.unassigned[0].reason, UnassignedReason::SlotsExhausted);
    }

    #[test]
    fn rejects_assignment_against_final_version() {
        let version_id = Uuid::new_v4();
        let result = assign(version_id, VersionStatus::Final, &[], &[], &[]);
        assert!(matches!(result, Err(CoreError::ScheduleVersionNotDraft { .. })));
    }

    #[test]
    fn duration_longer_than_slot_window_is_reported_as_too_long() {
        let version_id = Uuid::new_v4();
        let day = day("09:00", "09:15");
        let slots = slots_for(version_id, &day);
        let matches = vec![plain_match(version_id, "M1", 1, 1, 60)];

        let result = assign(version_id, VersionStatus::Draft, &matches, &slots, &[day]).unwrap();
        assert_eq!(result.unassigned[0].reason, UnassignedReason::DurationTooLong);
    }

    #[test]
    fn back_to_back_same_team_respects_ninety_minute_gap() {
        let version_id = Uuid::new_v4();
        let day = day("09:00", "12:00");
        let slots = slots_for(version_id, &day);
        let team_a = Uuid::new_v4();
        let team_b = Uuid::new_v4();
        let team_c = Uuid::new_v4();

        let mut m1 = plain_match(version_id, "M1", 1, 1, 60);
        m1.set_teams(Some(team_a), Some(team_b));
        let mut m2 = plain_match(version_id, "M2", 1, 2, 60);
        m2.set_teams(Some(team_a), Some(team_c));

        let result = assign(version_id, VersionStatus::Draft, &[m1, m2], &slots, &[day]).unwrap();
        assert_eq!(result.assigned_count, 1);
        assert_eq!(result.unassigned[0].reason, UnassignedReason::NoRestCompatibleSlot);
    }
}
