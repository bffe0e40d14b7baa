//! pure, read-only diagnostic analyzer over a schedule version. Never
//! writes; repeat calls on unchanged state yield byte-identical reports.

use crate::assignment::{classify_unassigned, slot_sort_key, Compatibility, RestState, UnassignedReason};
use crate::grouping::{self, GroupingSummary};
use crate::model::{Assignment, AvoidEdge, Match, MatchType, Slot, Team, TournamentDay};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub total_matches: u32,
    pub assigned_matches: u32,
    pub unassigned_matches: u32,
    pub assignment_rate_percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnassignedLine {
    pub match_id: Uuid,
    pub match_code: String,
    pub reason: UnassignedReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPressureLine {
    pub day_date: NaiveDate,
    pub court_number: u32,
    pub unused_slots: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPressureReport {
    pub by_day_and_court: Vec<SlotPressureLine>,
    pub slots_shorter_than_longest_match: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTimelineLine {
    pub match_type: MatchType,
    pub first_start: Option<NaiveDateTime>,
    pub last_start: Option<NaiveDateTime>,
    pub assigned_count: u32,
    pub unassigned_count: u32,
    pub spillover_warning: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingViolationKind {
    StageOrderInversion,
    RoundOrderInversion,
    OrderingViolation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingViolation {
    pub earlier_match_id: Uuid,
    pub later_match_id: Uuid,
    pub kind: OrderingViolationKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WfConflictLensEntry {
    pub event_id: Uuid,
    pub group_count: u32,
    pub grouping_summary: GroupingSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticReport {
    pub summary: ReportSummary,
    pub unassigned: Vec<UnassignedLine>,
    pub slot_pressure: SlotPressureReport,
    pub stage_timeline: Vec<StageTimelineLine>,
    pub ordering_integrity: Vec<OrderingViolation>,
    pub wf_conflict_lens: Vec<WfConflictLensEntry>,
}

struct Occupancy {
    by_match: HashMap<Uuid, (Uuid, NaiveDateTime, NaiveDateTime)>,
    by_day_court: HashMap<(NaiveDate, u32), Vec<(NaiveDateTime, NaiveDateTime)>>,
}

fn build_occupancy(matches: &[Match], slots: &[Slot], assignments: &[Assignment]) -> Occupancy {
    let match_by_id: HashMap<Uuid, &Match> = matches.iter().filter_map(|m| m.get_id().map(|id| (id, m))).collect();
    let slot_by_id: HashMap<Uuid, &Slot> = slots.iter().filter_map(|s| s.get_id().map(|id| (id, s))).collect();

    let mut by_match = HashMap::new();
    let mut by_day_court: HashMap<(NaiveDate, u32), Vec<(NaiveDateTime, NaiveDateTime)>> = HashMap::new();

    for a in assignments {
        let (Some(m), Some(s)) = (match_by_id.get(&a.get_match_id()), slot_by_id.get(&a.get_slot_id())) else {
            continue;
        };
        let start = NaiveDateTime::new(s.get_day_date(), s.get_start_time());
        let end = start + Duration::minutes(m.get_duration_minutes() as i64);
        by_match.insert(a.get_match_id(), (a.get_slot_id(), start, end));
        by_day_court.entry((s.get_day_date(), s.get_court_number())).or_default().push((start, end));
    }

    Occupancy { by_match, by_day_court }
}

fn reason_for_unassigned(
    m: &Match,
    slots: &[&Slot],
    days_by_date: &HashMap<NaiveDate, NaiveTime>,
    occupancy: &Occupancy,
    rest_state: &HashMap<Uuid, RestState>,
) -> UnassignedReason {
    let compat = Compatibility {
        days_by_date,
        occupied: &occupancy.by_day_court,
        rest_state,
    };
    classify_unassigned(slots, m, &compat)
}

/// recomputes ordering integrity by walking assigned matches in slot-time
/// order and comparing against the canonical sort key.
fn ordering_integrity(matches: &[Match], occupancy: &Occupancy) -> Vec<OrderingViolation> {
    let mut timeline: Vec<(&Match, NaiveDateTime)> = matches
        .iter()
        .filter_map(|m| m.get_id().and_then(|id| occupancy.by_match.get(&id)).map(|(_, start, _)| (m, *start)))
        .collect();
    timeline.sort_by_key(|(_, start)| *start);

    let mut violations = Vec::new();
    for window in timeline.windows(2) {
        let (earlier, _) = window[0];
        let (later, _) = window[1];
        let kind = if later.get_match_type().stage_priority() < earlier.get_match_type().stage_priority() {
            Some(OrderingViolationKind::StageOrderInversion)
        } else if later.get_match_type() == earlier.get_match_type() && later.get_round_index() < earlier.get_round_index() {
            Some(OrderingViolationKind::RoundOrderInversion)
        } else if later.sort_key() < earlier.sort_key() {
            Some(OrderingViolationKind::OrderingViolation)
        } else {
            None
        };
        if let Some(kind) = kind {
            violations.push(OrderingViolation {
                earlier_match_id: earlier.get_id().unwrap_or(Uuid::nil()),
                later_match_id: later.get_id().unwrap_or(Uuid::nil()),
                kind,
            });
        }
    }
    violations
}

fn stage_timeline(matches: &[Match], occupancy: &Occupancy) -> Vec<StageTimelineLine> {
    let stages = [MatchType::Wf, MatchType::Main, MatchType::Consolation, MatchType::Placement];
    let mut lines: Vec<StageTimelineLine> = stages
        .iter()
        .map(|&stage| {
            let in_stage: Vec<&Match> = matches.iter().filter(|m| m.get_match_type() == stage).collect();
            let starts: Vec<NaiveDateTime> = in_stage
                .iter()
                .filter_map(|m| m.get_id().and_then(|id| occupancy.by_match.get(&id)).map(|(_, s, _)| *s))
                .collect();
            StageTimelineLine {
                match_type: stage,
                first_start: starts.iter().min().copied(),
                last_start: starts.iter().max().copied(),
                assigned_count: starts.len() as u32,
                unassigned_count: (in_stage.len() - starts.len()) as u32,
                spillover_warning: false,
            }
        })
        .collect();

    let ends: Vec<Option<NaiveDateTime>> = lines
        .iter()
        .map(|line| {
            matches
                .iter()
                .filter(|m| m.get_match_type() == line.match_type)
                .filter_map(|m| m.get_id().and_then(|id| occupancy.by_match.get(&id)).map(|(_, _, e)| *e))
                .max()
        })
        .collect();

    for i in 1..lines.len() {
        if let (Some(next_first), Some(prev_last)) = (lines[i].first_start, ends[i - 1]) {
            if next_first < prev_last {
                lines[i].spillover_warning = true;
            }
        }
    }
    lines
}

#[derive(Debug, Clone)]
pub struct EventAvoidContext<'a> {
    pub event_id: Uuid,
    pub teams: &'a [Team],
    pub avoid_edges: &'a [AvoidEdge],
    pub group_count: u32,
}

#[instrument(
    name = "report.build_report",
    skip(matches, slots, assignments, days, event_contexts)
)]
pub fn build_report(
    matches: &[Match],
    slots: &[Slot],
    assignments: &[Assignment],
    days: &[TournamentDay],
    event_contexts: &[EventAvoidContext],
) -> DiagnosticReport {
    let occupancy = build_occupancy(matches, slots, assignments);
    let days_by_date: HashMap<NaiveDate, NaiveTime> = days.iter().map(|d| (d.date, d.end_time)).collect();

    let assigned_ids: std::collections::HashSet<Uuid> = occupancy.by_match.keys().copied().collect();
    let sorted_slots: Vec<&Slot> = {
        let mut s: Vec<&Slot> = slots.iter().collect();
        s.sort_by(|a, b| slot_sort_key(a).cmp(&slot_sort_key(b)));
        s
    };

    let mut rest_state: HashMap<Uuid, RestState> = HashMap::new();
    for m in matches {
        if let Some(id) = m.get_id() {
            if let Some((_, _, end)) = occupancy.by_match.get(&id) {
                for team_id in m.resolved_teams() {
                    rest_state.insert(
                        team_id,
                        RestState {
                            last_end: *end,
                            last_stage: m.get_match_type(),
                        },
                    );
                }
            }
        }
    }

    let unassigned: Vec<UnassignedLine> = matches
        .iter()
        .filter(|m| m.get_id().map(|id| !assigned_ids.contains(&id)).unwrap_or(true))
        .map(|m| UnassignedLine {
            match_id: m.get_id().unwrap_or(Uuid::nil()),
            match_code: m.get_match_code().to_string(),
            reason: reason_for_unassigned(m, &sorted_slots, &days_by_date, &occupancy, &rest_state),
        })
        .collect();

    let longest_match = matches.iter().map(|m| m.get_duration_minutes()).max().unwrap_or(0);
    let mut by_day_court: HashMap<(NaiveDate, u32), u32> = HashMap::new();
    for slot in slots {
        let key = (slot.get_day_date(), slot.get_court_number());
        let used = slot.get_id().map(|id| occupancy.by_match.values().any(|(sid, _, _)| *sid == id)).unwrap_or(false);
        if !used {
            *by_day_court.entry(key).or_insert(0) += 1;
        }
    }
    let mut pressure_lines: Vec<SlotPressureLine> = by_day_court
        .into_iter()
        .map(|((day_date, court_number), unused_slots)| SlotPressureLine { day_date, court_number, unused_slots })
        .collect();
    pressure_lines.sort_by_key(|l| (l.day_date, l.court_number));

    let slots_shorter_than_longest_match =
        slots.iter().filter(|s| s.get_block_minutes() < longest_match).count() as u32;

    let total_matches = matches.len() as u32;
    let assigned_matches = assigned_ids.len() as u32;
    let summary = ReportSummary {
        total_matches,
        assigned_matches,
        unassigned_matches: total_matches - assigned_matches,
        assignment_rate_percent: if total_matches == 0 { 100 } else { assigned_matches * 100 / total_matches },
    };

    let wf_conflict_lens = event_contexts
        .iter()
        .filter_map(|ctx| {
            grouping::assign_groups(ctx.teams, ctx.avoid_edges, ctx.group_count)
                .ok()
                .map(|result| WfConflictLensEntry {
                    event_id: ctx.event_id,
                    group_count: ctx.group_count,
                    grouping_summary: result.summary,
                })
        })
        .collect();

    DiagnosticReport {
        summary,
        unassigned,
        slot_pressure: SlotPressureReport {
            by_day_and_court: pressure_lines,
            slots_shorter_than_longest_match,
        },
        stage_timeline: stage_timeline(matches, &occupancy),
        ordering_integrity: ordering_integrity(matches, &occupancy),
        wf_conflict_lens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchStatus, TemplateType};
    use crate::utils::IdVersion;

    fn day(start: &str, end: &str) -> TournamentDay {
        TournamentDay::new(
            NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
            NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
            1,
        )
    }

    fn plain_match(version_id: Uuid, code: &str, match_type: MatchType, round: u32, seq: u32, duration: u32) -> Match {
        let mut m = Match::new(
            IdVersion::NewWithId(Uuid::new_v4()),
            Uuid::new_v4(),
            version_id,
            code,
            match_type,
            round,
            seq,
            duration,
            "A",
            "B",
        );
        m.set_status(MatchStatus::Unscheduled);
        m
    }

    #[test]
    fn summary_reflects_assigned_and_unassigned_counts() {
        let version_id = Uuid::new_v4();
        let day = day("09:00", "12:00");
        let slots = crate::slots::generate_slots(version_id, crate::slots::SlotSource::Auto(&{
            let mut t = crate::model::Tournament::new(IdVersion::New, "t");
            t.add_day(day.clone());
            t
        }));
        let matches = vec![
            plain_match(version_id, "M1", MatchType::Main, 1, 1, 60),
            plain_match(version_id, "M2", MatchType::Main, 1, 2, 60),
        ];
        let first_slot = slots[0].get_id().unwrap();
        let assignments = vec![Assignment::new(IdVersion::New, version_id, matches[0].get_id().unwrap(), first_slot)];

        let report = build_report(&matches, &slots, &assignments, &[day], &[]);
        assert_eq!(report.summary.total_matches, 2);
        assert_eq!(report.summary.assigned_matches, 1);
        assert_eq!(report.summary.unassigned_matches, 1);
        assert_eq!(report.unassigned[0].match_code, "M2");
    }

    #[test]
    fn stage_spillover_is_flagged_when_main_starts_before_wf_ends() {
        let version_id = Uuid::new_v4();
        let day = day("09:00", "12:00");
        let slots = crate::slots::generate_slots(version_id, crate::slots::SlotSource::Auto(&{
            let mut t = crate::model::Tournament::new(IdVersion::New, "t");
            t.add_day(day.clone());
            t
        }));
        let wf_match = plain_match(version_id, "WF1", MatchType::Wf, 1, 1, 60);
        let main_match = plain_match(version_id, "M1", MatchType::Main, 1, 1, 60);

        let wf_slot = slots.iter().find(|s| s.get_start_time().to_string().starts_with("10:00")).unwrap();
        let main_slot = &slots[0];
        let assignments = vec![
            Assignment::new(IdVersion::New, version_id, wf_match.get_id().unwrap(), wf_slot.get_id().unwrap()),
            Assignment::new(IdVersion::New, version_id, main_match.get_id().unwrap(), main_slot.get_id().unwrap()),
        ];

        let report = build_report(&[wf_match, main_match], &slots, &assignments, &[day], &[]);
        let main_line = report.stage_timeline.iter().find(|l| l.match_type == MatchType::Main).unwrap();
        assert!(main_line.spillover_warning);
    }

    #[test]
    fn wf_conflict_lens_reports_grouping_summary_per_event() {
        let event_id = Uuid::new_v4();
        let mut teams: Vec<Team> = (1..=8)
            .map(|s| {
                let mut t = Team::new(IdVersion::NewWithId(Uuid::new_v4()), event_id, format!("Seed {s}"));
                t.set_seed(Some(s));
                t
            })
            .collect();
        teams.sort_by(|a, b| a.cmp_canonical(b));
        let edges = vec![];
        let ctx = [EventAvoidContext {
            event_id,
            teams: &teams,
            avoid_edges: &edges,
            group_count: crate::grouping::group_count_for(TemplateType::Canonical32, 8).unwrap(),
        }];

        let report = build_report(&[], &[], &[], &[], &ctx);
        assert_eq!(report.wf_conflict_lens.len(), 1);
        assert_eq!(report.wf_conflict_lens[0].grouping_summary.group_sizes, vec![8]);
    }

    #[test]
    fn empty_state_yields_full_assignment_rate() {
        let report = build_report(&[], &[], &[], &[], &[]);
        assert_eq!(report.summary.assignment_rate_percent, 100);
        assert!(report.unassigned.is_empty());
    }
}
