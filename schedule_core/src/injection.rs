//! attaches concrete team ids to matches where immediately resolvable,
//! leaving the human-readable placeholder otherwise. Idempotent: a
//! caller clears prior injections on the event's matches before calling
//! this again; `inject` itself never needs to know whether it is a rerun.

use crate::errors::{CoreError, CoreResult, PlanIssue};
use crate::inventory::round_robin_pairs;
use crate::model::{Event, Match, MatchType, Team, TemplateType};
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionResult {
    pub injected_count: u32,
    pub placeholder_count: u32,
    pub warnings: Vec<PlanIssue>,
}

/// standard single-elimination 8-draw seeding: 1v8, 4v5, 3v6, 2v7.
const BRACKET_SEEDING: [(usize, usize); 4] = [(0, 7), (3, 4), (2, 5), (1, 6)];

fn canonical_order(teams: &[Team]) -> Vec<&Team> {
    let mut ordered: Vec<&Team> = teams.iter().collect();
    ordered.sort_by(|a, b| a.cmp_canonical(b));
    ordered
}

/// injects one 8-team bracket's QF matches by rank within `teams` (already in
/// canonical order, length exactly 8). `match_code_prefix` lets the
/// 32-team `WF_TO_BRACKETS_8` case address each of its four brackets.
fn inject_bracket(teams: &[&Team], matches: &mut [Match], match_code_prefix: &str) -> u32 {
    let mut injected = 0;
    for (i, &(rank_a, rank_b)) in BRACKET_SEEDING.iter().enumerate() {
        let code = format!("{match_code_prefix}QF{}", i + 1);
        if let Some(m) = matches.iter_mut().find(|m| m.get_match_code() == code) {
            if let (Some(a), Some(b)) = (teams.get(rank_a), teams.get(rank_b)) {
                m.set_teams(a.get_id(), b.get_id());
                injected += 1;
            }
        }
    }
    injected
}

/// injects each WF pool's internal round robin by `wf_group_index`,
/// mirroring `inventory::generate_pool_round_robin`'s `POOL{n}_M{seq}`
/// codes. `teams` need not be pre-filtered to a single group; grouping is
/// read straight off `Team::get_wf_group_index`.
fn inject_pools(teams: &[&Team], matches: &mut [Match], groups: u32) -> u32 {
    let mut injected = 0;
    for group in 0..groups {
        let pool_number = group + 1;
        let pool_teams: Vec<&&Team> = teams.iter().filter(|t| t.get_wf_group_index() == Some(group)).collect();

        let mut matches_sorted_codes: Vec<(u32, u32, String)> = matches
            .iter()
            .filter(|m| {
                m.get_match_type() == MatchType::Main && m.get_match_code().starts_with(&format!("POOL{pool_number}_"))
            })
            .map(|m| (m.get_round_index(), m.get_sequence_in_round(), m.get_match_code().to_string()))
            .collect();
        matches_sorted_codes.sort();

        let mut pairing_iter = round_robin_pairs(pool_teams.len() as u32).into_iter().flatten();
        for (_, _, code) in matches_sorted_codes {
            let Some((pos_a, pos_b)) = pairing_iter.next() else {
                break;
            };
            if let (Some(a), Some(b)) = (pool_teams.get(pos_a as usize), pool_teams.get(pos_b as usize)) {
                if let Some(m) = matches.iter_mut().find(|m| m.get_match_code() == code) {
                    m.set_teams(a.get_id(), b.get_id());
                    injected += 1;
                }
            }
        }
    }
    injected
}

fn inject_round_robin(teams: &[&Team], matches: &mut [Match]) -> u32 {
    let team_count = teams.len() as u32;
    let mut injected = 0;
    let mut matches_sorted_codes: Vec<(u32, u32, String)> = matches
        .iter()
        .filter(|m| m.get_match_type() == MatchType::Main && m.get_match_code().starts_with("RR_"))
        .map(|m| (m.get_round_index(), m.get_sequence_in_round(), m.get_match_code().to_string()))
        .collect();
    matches_sorted_codes.sort();

    let mut pairing_iter = round_robin_pairs(team_count).into_iter().flatten();
    for (_, _, code) in matches_sorted_codes {
        let Some((pos_a, pos_b)) = pairing_iter.next() else {
            break;
        };
        if let (Some(a), Some(b)) = (teams.get(pos_a as usize), teams.get(pos_b as usize)) {
            if let Some(m) = matches.iter_mut().find(|m| m.get_match_code() == code) {
                m.set_teams(a.get_id(), b.get_id());
                injected += 1;
            }
        }
    }
    injected
}

/// `inject(event, teams, matches) → InjectionResult`.
#[instrument(name = "injection.inject", skip(event, teams, matches))]
pub fn inject(event: &Event, teams: &[Team], matches: &mut [Match]) -> CoreResult<InjectionResult> {
    let mut warnings = Vec::new();
    if teams.is_empty() {
        warnings.push(PlanIssue::new("NO_TEAMS_FOR_EVENT", "event has no teams; injection skipped"));
        return Ok(InjectionResult {
            injected_count: 0,
            placeholder_count: matches.len() as u32,
            warnings,
        });
    }

    // clear prior injections before reinjecting, making this idempotent
    for m in matches.iter_mut() {
        m.clear_teams();
    }

    let team_count = teams.len() as u32;
    let template_type = event.get_draw_plan().template_type;
    let injected = if template_type == TemplateType::WfToBrackets8 {
        let mut total = 0;
        for group in 0..(team_count / 8) {
            let group_teams: Vec<&Team> = canonical_order(teams)
                .into_iter()
                .filter(|t| t.get_wf_group_index() == Some(group))
                .collect();
            if group_teams.len() != 8 {
                continue;
            }
            total += inject_bracket(&group_teams, matches, &format!("B{}_", group + 1));
        }
        total
    } else if matches!(template_type, TemplateType::WfToPoolsDynamic | TemplateType::WfToPools4) {
        let groups = crate::grouping::group_count_for(template_type, team_count)
            .ok_or(CoreError::InvalidTeamCount { team_count })?;
        let ordered = canonical_order(teams);
        inject_pools(&ordered, matches, groups)
    } else if team_count == 8 {
        let ordered = canonical_order(teams);
        inject_bracket(&ordered, matches, "")
    } else if team_count < 8 && team_count % 2 == 0 {
        let ordered = canonical_order(teams);
        inject_round_robin(&ordered, matches)
    } else {
        return Err(CoreError::InvalidTeamCount { team_count });
    };

    let placeholder_count = matches.len() as u32 - injected;
    Ok(InjectionResult {
        injected_count: injected,
        placeholder_count,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DrawPlan, MatchType};
    use crate::utils::IdVersion;
    use uuid::Uuid;

    fn team(event_id: Uuid, seed: u32) -> Team {
        let mut t = Team::new(IdVersion::NewWithId(Uuid::new_v4()), event_id, format!("Seed {seed}"));
        t.set_seed(Some(seed));
        t
    }

    fn event(team_count: u32, guarantee: u8) -> Event {
        Event::new(
            IdVersion::NewWithId(Uuid::new_v4()),
            Uuid::new_v4(),
            "Open",
            "A",
            team_count,
            guarantee,
            DrawPlan::new(crate::model::TemplateType::Canonical32, 60, 60),
        )
    }

    #[test]
    fn rejects_team_count_above_eight() {
        let event_id = Uuid::new_v4();
        let teams: Vec<_> = (1..=10).map(|s| team(event_id, s)).collect();
        let mut matches = Vec::new();
        let result = inject(&event(10, 4), &teams, &mut matches);
        assert!(matches!(result, Err(CoreError::InvalidTeamCount { team_count: 10 })));
    }

    #[test]
    fn pool_template_injects_within_group_round_robin() {
        let event_id = Uuid::new_v4();
        let mut teams: Vec<_> = (1..=16).map(|s| team(event_id, s)).collect();
        // simulate a prior waterfall-grouping pass: four pools of four, in seed order
        for (i, t) in teams.iter_mut().enumerate() {
            t.set_wf_group_index(Some((i as u32) / 4));
        }
        let mut pool_event = event(16, 4);
        pool_event.draw_plan_mut().template_type = crate::model::TemplateType::WfToPoolsDynamic;
        pool_event.draw_plan_mut().wf_rounds = 2;
        let mut matches = crate::inventory::generate(&pool_event, Uuid::new_v4()).unwrap();

        let result = inject(&pool_event, &teams, &mut matches).unwrap();
        assert_eq!(result.injected_count, 24, "4 pools x 6 round-robin pairs each");
        assert_eq!(result.placeholder_count, 16, "WF matches are never immediately resolvable");

        let pool1_m1 = matches.iter().find(|m| m.get_match_code() == "POOL1_M1").unwrap();
        assert!(pool1_m1.get_team_a_id().is_some());
        assert!(pool1_m1.get_team_b_id().is_some());
    }

    #[test]
    fn eight_team_bracket_seeds_qf1_as_one_vs_eight() {
        let event_id = Uuid::new_v4();
        let teams: Vec<_> = (1..=8).map(|s| team(event_id, s)).collect();
        let seed1 = teams[0].get_id().unwrap();
        let seed8 = teams[7].get_id().unwrap();
        let mut matches = crate::inventory::generate(&event(8, 4), Uuid::new_v4()).unwrap();

        let result = inject(&event(8, 4), &teams, &mut matches).unwrap();
        assert!(result.injected_count > 0);

        let qf1 = matches.iter().find(|m| m.get_match_code() == "QF1").unwrap();
        assert_eq!(qf1.get_team_a_id(), Some(seed1));
        assert_eq!(qf1.get_team_b_id(), Some(seed8));
    }

    #[test]
    fn injection_is_idempotent() {
        let event_id = Uuid::new_v4();
        let teams: Vec<_> = (1..=4).map(|s| team(event_id, s)).collect();
        let mut rr_event = event(4, 4);
        rr_event.draw_plan_mut().template_type = crate::model::TemplateType::RrOnly;
        let mut matches = crate::inventory::generate(&rr_event, Uuid::new_v4()).unwrap();

        let first = inject(&rr_event, &teams, &mut matches).unwrap();
        let second = inject(&rr_event, &teams, &mut matches).unwrap();
        assert_eq!(first, second);
        assert!(matches.iter().all(|m| m.get_match_type() != MatchType::Wf || m.get_team_a_id().is_none()));
    }

    #[test]
    fn empty_team_list_warns_instead_of_failing() {
        let mut matches = Vec::new();
        let result = inject(&event(0, 4), &[], &mut matches).unwrap();
        assert_eq!(result.injected_count, 0);
        assert!(result.warnings.iter().any(|w| w.code == "NO_TEAMS_FOR_EVENT"));
    }
}
