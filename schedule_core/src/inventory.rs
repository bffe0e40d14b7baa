//! produces the deterministic match list for an event from a validated draw
//! plan. Fully determined by (event_id, draw_plan, guarantee,
//! version_id); nothing here consults a random source or prior results.

use crate::errors::{CoreError, CoreResult};
use crate::grouping;
use crate::model::{DrawPlan, Event, Match, MatchType, PlacementType, TemplateType};
use crate::utils::IdVersion;
use tracing::instrument;
use uuid::Uuid;

/// standard circle method: team `0` stays fixed, the remaining positions
/// rotate one step each round. Returns one `Vec<(pos_a, pos_b)>` per round,
/// already in `sequence_in_round` order. The single definition of the RR
/// pairing schedule, resolved here and reused verbatim by team injection so
/// the two components never drift apart.
pub(crate) fn round_robin_pairs(team_count: u32) -> Vec<Vec<(u32, u32)>> {
    let n = team_count as usize;
    if n < 2 || n % 2 != 0 {
        return Vec::new();
    }
    let mut positions: Vec<u32> = (0..team_count).collect();
    let mut rounds = Vec::with_capacity(n - 1);
    for _ in 0..(n - 1) {
        let mut pairs = Vec::with_capacity(n / 2);
        for i in 0..n / 2 {
            pairs.push((positions[i], positions[n - 1 - i]));
        }
        rounds.push(pairs);
        // keep position 0 fixed, rotate the rest by one
        let last = positions.pop().unwrap();
        positions.insert(1, last);
    }
    rounds
}

fn new_match(
    event_id: Uuid,
    version_id: Uuid,
    code: impl Into<String>,
    match_type: MatchType,
    round_index: u32,
    sequence_in_round: u32,
    duration_minutes: u32,
    side_a: impl Into<String>,
    side_b: impl Into<String>,
) -> Match {
    Match::new(
        IdVersion::New,
        event_id,
        version_id,
        code,
        match_type,
        round_index,
        sequence_in_round,
        duration_minutes,
        side_a,
        side_b,
    )
}

fn generate_rr(event_id: Uuid, version_id: Uuid, team_count: u32, duration: u32) -> Vec<Match> {
    let mut matches = Vec::new();
    for (round_idx, round) in round_robin_pairs(team_count).into_iter().enumerate() {
        for (seq_idx, (a, b)) in round.into_iter().enumerate() {
            matches.push(new_match(
                event_id,
                version_id,
                format!("RR_R{}_M{}", round_idx + 1, seq_idx + 1),
                MatchType::Main,
                round_idx as u32 + 1,
                seq_idx as u32 + 1,
                duration,
                format!("Position {}", a + 1),
                format!("Position {}", b + 1),
            ));
        }
    }
    matches
}

fn generate_wf(event_id: Uuid, version_id: Uuid, team_count: u32, plan: &DrawPlan) -> Vec<Match> {
    let mut matches = Vec::new();
    let per_round = team_count / 2;
    for round in 1..=plan.wf_rounds as u32 {
        for seq in 1..=per_round {
            matches.push(new_match(
                event_id,
                version_id,
                format!("WF_R{round}_M{seq}"),
                MatchType::Wf,
                round,
                seq,
                plan.wf_block_minutes,
                format!("WF R{round} Position {}", 2 * seq - 1),
                format!("WF R{round} Position {}", 2 * seq),
            ));
        }
    }
    matches
}

/// one pool's internal round robin, tagged MAIN with `round_index` set to
/// the pool number.
fn generate_pool_round_robin(
    event_id: Uuid,
    version_id: Uuid,
    pool_number: u32,
    pool_size: u32,
    duration: u32,
) -> Vec<Match> {
    let mut matches = Vec::new();
    let mut seq = 0u32;
    for round in round_robin_pairs(pool_size) {
        for (a, b) in round {
            seq += 1;
            matches.push(new_match(
                event_id,
                version_id,
                format!("POOL{pool_number}_M{seq}"),
                MatchType::Main,
                pool_number,
                seq,
                duration,
                format!("Pool {pool_number} Position {}", a + 1),
                format!("Pool {pool_number} Position {}", b + 1),
            ));
        }
    }
    matches
}

/// a single 8-team single-elimination bracket with consolation/placement
/// matches. `prefix` distinguishes replicated brackets (`WF_TO_BRACKETS_8`
/// with 32 teams runs four of these); the legacy `CANONICAL_32` 8-team alias
/// runs exactly one with an empty prefix.
fn generate_eight_team_bracket(
    event_id: Uuid,
    version_id: Uuid,
    prefix: &str,
    guarantee: u8,
    duration: u32,
) -> Vec<Match> {
    let mut matches = Vec::new();

    for i in 1..=4u32 {
        matches.push(new_match(
            event_id,
            version_id,
            format!("{prefix}QF{i}"),
            MatchType::Main,
            1,
            i,
            duration,
            format!("{prefix}QF{i} Seed A"),
            format!("{prefix}QF{i} Seed B"),
        ));
    }
    for i in 1..=2u32 {
        matches.push(new_match(
            event_id,
            version_id,
            format!("{prefix}SF{i}"),
            MatchType::Main,
            2,
            i,
            duration,
            format!("Winner of {prefix}QF{}", 2 * i - 1),
            format!("Winner of {prefix}QF{}", 2 * i),
        ));
    }
    matches.push(new_match(
        event_id,
        version_id,
        format!("{prefix}FINAL"),
        MatchType::Main,
        3,
        1,
        duration,
        format!("Winner of {prefix}SF1"),
        format!("Winner of {prefix}SF2"),
    ));

    for i in 1..=2u32 {
        let mut m = new_match(
            event_id,
            version_id,
            format!("{prefix}CONS1_{i}"),
            MatchType::Consolation,
            1,
            i,
            duration,
            format!("Loser of {prefix}QF{}", 2 * i - 1),
            format!("Loser of {prefix}QF{}", 2 * i),
        );
        m.set_consolation_tier(Some(1));
        matches.push(m);
    }

    if guarantee == 5 {
        let mut cons2 = new_match(
            event_id,
            version_id,
            format!("{prefix}CONS2_1"),
            MatchType::Consolation,
            2,
            1,
            duration,
            format!("Winner of {prefix}CONS1_1"),
            format!("Winner of {prefix}CONS1_2"),
        );
        cons2.set_consolation_tier(Some(2));
        matches.push(cons2);

        let mut pl1 = new_match(
            event_id,
            version_id,
            format!("{prefix}PL1_3rd4th"),
            MatchType::Placement,
            1,
            1,
            duration,
            format!("Loser of {prefix}SF1"),
            format!("Loser of {prefix}SF2"),
        );
        pl1.set_placement_type(Some(PlacementType::MainSfLosers));
        matches.push(pl1);

        let mut pl2 = new_match(
            event_id,
            version_id,
            format!("{prefix}PL2_5th6th"),
            MatchType::Placement,
            1,
            2,
            duration,
            format!("Winner of {prefix}CONS1_1's loser bracket"),
            format!("Winner of {prefix}CONS1_2's loser bracket"),
        );
        pl2.set_placement_type(Some(PlacementType::ConsR1Winners));
        matches.push(pl2);

        let mut pl3 = new_match(
            event_id,
            version_id,
            format!("{prefix}PL3_7th8th"),
            MatchType::Placement,
            1,
            3,
            duration,
            format!("Loser of {prefix}CONS1_1"),
            format!("Loser of {prefix}CONS1_2"),
        );
        pl3.set_placement_type(Some(PlacementType::ConsR1Losers));
        matches.push(pl3);
    }

    matches
}

/// `generate(event, version) → [Match]`. `wipe_existing` is the
/// caller's responsibility (deleting prior version-bound matches for the
/// event) — this function is a pure generator and always returns the full
/// fresh inventory for the given inputs.
#[instrument(name = "inventory.generate", skip(event))]
pub fn generate(event: &Event, version_id: Uuid) -> CoreResult<Vec<Match>> {
    let event_id = event
        .get_id()
        .ok_or_else(|| CoreError::MissingId("event".into()))?;
    let team_count = event.get_team_count();
    let plan = event.get_draw_plan();
    let guarantee = event.get_guarantee_selected();

    let mut matches = generate_wf(event_id, version_id, team_count, plan);

    match plan.template_type {
        TemplateType::RrOnly => {
            matches.extend(generate_rr(event_id, version_id, team_count, plan.standard_block_minutes));
        }
        TemplateType::WfToPoolsDynamic | TemplateType::WfToPools4 => {
            let groups = grouping::group_count_for(plan.template_type, team_count)
                .ok_or(CoreError::TemplateUnsupported { template: plan.template_type, team_count })?;
            let pool_size = team_count / groups;
            for pool in 1..=groups {
                matches.extend(generate_pool_round_robin(
                    event_id,
                    version_id,
                    pool,
                    pool_size,
                    plan.standard_block_minutes,
                ));
            }
        }
        TemplateType::Canonical32 => {
            matches.extend(generate_eight_team_bracket(
                event_id,
                version_id,
                "",
                guarantee,
                plan.standard_block_minutes,
            ));
        }
        TemplateType::WfToBrackets8 => {
            let brackets = team_count / 8;
            for b in 1..=brackets {
                matches.extend(generate_eight_team_bracket(
                    event_id,
                    version_id,
                    &format!("B{b}_"),
                    guarantee,
                    plan.standard_block_minutes,
                ));
            }
        }
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DrawPlan;
    use uuid::Uuid;

    fn event_with(template: TemplateType, team_count: u32, wf_rounds: u8, guarantee: u8) -> Event {
        let mut plan = DrawPlan::new(template, 60, 60);
        plan.wf_rounds = wf_rounds;
        Event::new(
            IdVersion::NewWithId(Uuid::new_v4()),
            Uuid::new_v4(),
            "Open",
            "A",
            team_count,
            guarantee,
            plan,
        )
    }

    #[test]
    fn round_robin_pairs_every_team_plays_every_other_exactly_once() {
        let rounds = round_robin_pairs(6);
        assert_eq!(rounds.len(), 5);
        let mut seen = std::collections::HashSet::new();
        for round in &rounds {
            assert_eq!(round.len(), 3);
            for &(a, b) in round {
                let key = (a.min(b), a.max(b));
                assert!(seen.insert(key), "pair {key:?} repeated");
            }
        }
        assert_eq!(seen.len(), 6 * 5 / 2);
    }

    #[test]
    fn rr_only_four_teams_yields_six_matches() {
        let event = event_with(TemplateType::RrOnly, 4, 0, 4);
        let version_id = Uuid::new_v4();
        let matches = generate(&event, version_id).unwrap();
        assert_eq!(matches.len(), 6);
        assert!(matches.iter().all(|m| m.get_match_type() == MatchType::Main));
    }

    #[test]
    fn eight_team_bracket_totals_match_guarantee_table() {
        let g4 = event_with(TemplateType::Canonical32, 8, 2, 4);
        let version_id = Uuid::new_v4();
        let non_wf = generate(&g4, version_id)
            .unwrap()
            .into_iter()
            .filter(|m| m.get_match_type() != MatchType::Wf)
            .count();
        assert_eq!(non_wf, 9);

        let g5 = event_with(TemplateType::Canonical32, 8, 2, 5);
        let non_wf = generate(&g5, version_id)
            .unwrap()
            .into_iter()
            .filter(|m| m.get_match_type() != MatchType::Wf)
            .count();
        assert_eq!(non_wf, 13);
    }

    #[test]
    fn wf_to_brackets_8_replicates_across_four_brackets() {
        let event = event_with(TemplateType::WfToBrackets8, 32, 2, 5);
        let version_id = Uuid::new_v4();
        let matches = generate(&event, version_id).unwrap();
        let wf_count = matches.iter().filter(|m| m.get_match_type() == MatchType::Wf).count();
        assert_eq!(wf_count, 2 * 16);
        let non_wf_count = matches.len() - wf_count;
        assert_eq!(non_wf_count, 13 * 4);
    }

    #[test]
    fn match_codes_are_unique_within_event() {
        let event = event_with(TemplateType::WfToPoolsDynamic, 16, 2, 4);
        let version_id = Uuid::new_v4();
        let matches = generate(&event, version_id).unwrap();
        let mut codes: Vec<&str> = matches.iter().map(|m| m.get_match_code()).collect();
        codes.sort_unstable();
        let mut deduped = codes.clone();
        deduped.dedup();
        assert_eq!(codes.len(), deduped.len());
    }
}
