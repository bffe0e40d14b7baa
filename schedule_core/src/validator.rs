//! gates any operation that depends on a draw plan being implementable.
//! Pure, synchronous, and the single place that knows the
//! (template, team_count) → wf_rounds table.

use crate::errors::PlanIssue;
use crate::model::{Event, TemplateType, Tournament};
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPlanCheck {
    pub ok: bool,
    pub blocking: Vec<PlanIssue>,
    pub warnings: Vec<PlanIssue>,
}

/// per-event line of a [`PlanReport`]: the inventory totals `generate` would
/// produce if called right now, without actually generating anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInventoryExpectation {
    pub event_name: String,
    pub check: EventPlanCheck,
    pub expected_wf_matches: u32,
    pub expected_main_matches: u32,
    pub expected_consolation_matches: u32,
    pub expected_placement_matches: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanReport {
    pub tournament_name: String,
    pub events: Vec<EventInventoryExpectation>,
    pub total_matches: u32,
}

/// the canonical (template, team_count) → wf_rounds table. Authoritative;
/// every other component trusts this answer rather than re-deriving it.
fn expected_wf_rounds(template: TemplateType, team_count: u32) -> Option<u8> {
    match template {
        TemplateType::RrOnly => Some(0),
        TemplateType::WfToPoolsDynamic => match team_count {
            8 | 10 => Some(1),
            12 | 14 | 16 | 18 | 20 => Some(2),
            _ => None,
        },
        TemplateType::WfToBrackets8 => (team_count == 32).then_some(2),
        // legacy alias: treated as the 8-team bracket, see DESIGN.md
        TemplateType::Canonical32 => (team_count == 8).then_some(2),
        TemplateType::WfToPools4 => (team_count == 16).then_some(0),
    }
}

#[instrument(name = "validator.validate_event", skip(event))]
pub fn validate_event(event: &Event) -> EventPlanCheck {
    let mut blocking = Vec::new();
    let mut warnings = Vec::new();

    let team_count = event.get_team_count();
    if team_count < 2 || team_count % 2 != 0 {
        blocking.push(PlanIssue::new(
            "INVALID_TEAM_COUNT",
            format!("team_count must be even and at least 2, got {team_count}"),
        ));
    }

    if ![4, 5].contains(&event.get_guarantee_selected()) {
        blocking.push(PlanIssue::new(
            "INVALID_GUARANTEE",
            format!("guarantee_selected must be 4 or 5, got {}", event.get_guarantee_selected()),
        ));
    }

    let plan = event.get_draw_plan();
    match expected_wf_rounds(plan.template_type, team_count) {
        None => {
            blocking.push(PlanIssue::new(
                "TEMPLATE_UNSUPPORTED",
                format!("{:?} does not support team_count {team_count}", plan.template_type),
            ));
        }
        Some(expected_rounds) => {
            if plan.wf_rounds != expected_rounds {
                blocking.push(PlanIssue::new(
                    "WF_ROUNDS_MISMATCH",
                    format!(
                        "{:?} with team_count {team_count} requires wf_rounds={expected_rounds}, got {}",
                        plan.template_type, plan.wf_rounds
                    ),
                ));
            }
        }
    }

    // a (template, team_count) pair can pass the wf_rounds table above yet
    // still not divide evenly into that template's WF groups (e.g.
    // WF_TO_POOLS_DYNAMIC with team_count=14 or 18 against 4 groups);
    // downstream grouping hard-errors on that, so reject it here instead.
    if let Some(groups) = crate::grouping::group_count_for(plan.template_type, team_count) {
        if groups > 0 && team_count % groups != 0 {
            blocking.push(PlanIssue::new(
                "GROUP_CAPACITY_MISMATCH",
                format!("{:?} with team_count {team_count} does not divide evenly into {groups} WF groups", plan.template_type),
            ));
        }
    }

    for (label, minutes) in [
        ("wf_block_minutes", plan.wf_block_minutes),
        ("standard_block_minutes", plan.standard_block_minutes),
    ] {
        if ![60, 90, 105, 120].contains(&minutes) {
            blocking.push(PlanIssue::new(
                "INVALID_DURATION",
                format!("{label} must be one of {{60,90,105,120}}, got {minutes}"),
            ));
        }
    }

    if team_count > 64 {
        warnings.push(PlanIssue::new(
            "LARGE_EVENT",
            format!("team_count {team_count} is unusually large; double-check capacity"),
        ));
    }
    if team_count == 0 {
        warnings.push(PlanIssue::new("NO_TEAMS_FOR_EVENT", "event has no teams registered"));
    }

    EventPlanCheck {
        ok: blocking.is_empty(),
        blocking,
        warnings,
    }
}

fn expected_totals(event: &Event, check: &EventPlanCheck) -> (u32, u32, u32, u32) {
    if !check.ok {
        return (0, 0, 0, 0);
    }
    let team_count = event.get_team_count();
    let plan = event.get_draw_plan();
    let wf_matches = plan.wf_rounds as u32 * (team_count / 2);

    match plan.template_type {
        TemplateType::RrOnly => (0, team_count * (team_count - 1) / 2, 0, 0),
        TemplateType::WfToPoolsDynamic | TemplateType::WfToPools4 => {
            // pools of 4 behind wf_rounds=2, pools of 5/pairs behind wf_rounds=1;
            // round-robin within each pool. See inventory.rs for the authoritative
            // generator this mirrors.
            let groups = crate::grouping::group_count_for(plan.template_type, team_count).unwrap_or(1);
            let pool_size = team_count / groups.max(1);
            let main = groups * (pool_size * (pool_size.saturating_sub(1)) / 2);
            (wf_matches, main, 0, 0)
        }
        TemplateType::WfToBrackets8 => {
            let brackets = team_count / 8;
            let (main, cons, place) = bracket_totals(event.get_guarantee_selected());
            (wf_matches, main * brackets, cons * brackets, place * brackets)
        }
        TemplateType::Canonical32 => {
            let (main, cons, place) = bracket_totals(event.get_guarantee_selected());
            (wf_matches, main, cons, place)
        }
    }
}

/// totals for one 8-team bracket excluding WF: guarantee 4 → 9 matches
/// (QF+SF+Final=7, CONS tier1=2); guarantee 5 → 13 (adds CONS tier2=1 and
/// three placement matches).
fn bracket_totals(guarantee: u8) -> (u32, u32, u32) {
    let main = 7; // QF(4) + SF(2) + Final(1)
    if guarantee == 5 {
        (main, 3, 3) // CONS tier1(2)+tier2(1)=3; placement 3
    } else {
        (main, 2, 0)
    }
}

#[instrument(name = "validator.get_plan_report", skip(tournament, events))]
pub fn get_plan_report(tournament: &Tournament, events: &[Event]) -> PlanReport {
    let mut total_matches = 0u32;
    let lines = events
        .iter()
        .map(|event| {
            let check = validate_event(event);
            let (wf, main, cons, place) = expected_totals(event, &check);
            total_matches += wf + main + cons + place;
            EventInventoryExpectation {
                event_name: event.get_name().to_string(),
                check,
                expected_wf_matches: wf,
                expected_main_matches: main,
                expected_consolation_matches: cons,
                expected_placement_matches: place,
            }
        })
        .collect();

    PlanReport {
        tournament_name: tournament.get_name().to_string(),
        events: lines,
        total_matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DrawPlan;
    use crate::utils::IdVersion;
    use uuid::Uuid;

    fn event_with(template: TemplateType, team_count: u32, wf_rounds: u8, guarantee: u8) -> Event {
        let mut plan = DrawPlan::new(template, 60, 60);
        plan.wf_rounds = wf_rounds;
        Event::new(IdVersion::New, Uuid::new_v4(), "Open", "A", team_count, guarantee, plan)
    }

    #[test]
    fn rr_only_any_even_count_with_zero_wf_rounds_is_valid() {
        let event = event_with(TemplateType::RrOnly, 6, 0, 4);
        assert!(validate_event(&event).ok);
    }

    #[test]
    fn odd_team_count_is_rejected() {
        let event = event_with(TemplateType::RrOnly, 9, 0, 4);
        let check = validate_event(&event);
        assert!(!check.ok);
        assert!(check.blocking.iter().any(|i| i.code == "INVALID_TEAM_COUNT"));
    }

    #[test]
    fn wf_to_pools_dynamic_requires_matching_wf_rounds() {
        let wrong = event_with(TemplateType::WfToPoolsDynamic, 16, 1, 4);
        assert!(!validate_event(&wrong).ok);
        let right = event_with(TemplateType::WfToPoolsDynamic, 16, 2, 4);
        assert!(validate_event(&right).ok);
    }

    #[test]
    fn wf_to_pools_dynamic_rejects_counts_that_do_not_divide_into_four_groups() {
        // 14 and 18 pass the wf_rounds=2 table but aren't divisible by the
        // 4 groups WF_TO_POOLS_DYNAMIC targets above 10 teams.
        for team_count in [14, 18] {
            let event = event_with(TemplateType::WfToPoolsDynamic, team_count, 2, 4);
            let check = validate_event(&event);
            assert!(!check.ok, "team_count {team_count} should be rejected");
            assert!(check.blocking.iter().any(|i| i.code == "GROUP_CAPACITY_MISMATCH"));
        }
        let ok = event_with(TemplateType::WfToPoolsDynamic, 20, 2, 4);
        assert!(validate_event(&ok).ok);
    }

    #[test]
    fn canonical_32_requires_exactly_eight_teams() {
        let wrong = event_with(TemplateType::Canonical32, 32, 2, 4);
        assert!(!validate_event(&wrong).ok);
        let right = event_with(TemplateType::Canonical32, 8, 2, 4);
        assert!(validate_event(&right).ok);
    }

    #[test]
    fn eight_team_bracket_totals_match_guarantee_table() {
        let g4 = event_with(TemplateType::Canonical32, 8, 2, 4);
        let (_, main, cons, place) = expected_totals(&g4, &validate_event(&g4));
        assert_eq!(main + cons + place, 9);

        let g5 = event_with(TemplateType::Canonical32, 8, 2, 5);
        let (_, main, cons, place) = expected_totals(&g5, &validate_event(&g5));
        assert_eq!(main + cons + place, 13);
    }
}
