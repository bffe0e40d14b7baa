//! partitions the teams of a WF-bearing event into equally-sized groups,
//! minimizing avoid-edge violations with a single deterministic pass.

use crate::errors::{CoreError, CoreResult};
use crate::model::{AvoidEdge, Team, TemplateType};
use petgraph::graphmap::UnGraphMap;
use std::collections::{HashMap, HashSet};
use tracing::instrument;
use uuid::Uuid;

/// number of WF groups a (template, team_count) pair targets, or `None` if
/// the template has no WF grouping step at all (e.g. `RR_ONLY`).
pub fn group_count_for(template: TemplateType, team_count: u32) -> Option<u32> {
    match template {
        TemplateType::RrOnly => None,
        TemplateType::WfToPoolsDynamic => match team_count {
            8 | 10 => Some(2),
            12 | 14 | 16 | 18 | 20 => Some(4),
            _ => None,
        },
        TemplateType::WfToPools4 => (team_count == 16).then_some(4),
        TemplateType::WfToBrackets8 => (team_count == 32).then_some(4),
        // a single 8-team bracket is one undivided group: no sub-pools to separate
        TemplateType::Canonical32 => (team_count == 8).then_some(1),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupingSummary {
    pub group_sizes: Vec<u32>,
    pub internal_conflicts_per_group: Vec<u32>,
    pub separation_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupingResult {
    /// team id → assigned group index
    pub assignments: HashMap<Uuid, u32>,
    pub summary: GroupingSummary,
}

/// builds the avoid-edge graph, computes connected components (unused beyond
/// informing degree/locality of the heuristic — recorded for the diagnostic
/// reporter's `wf_conflict_lens`), then runs a constructive single-pass
/// placement: teams sorted into canonical order, each placed into the
/// candidate group with the fewest existing avoid-edge conflicts.
#[instrument(name = "grouping.assign_groups", skip(teams, avoid_edges))]
pub fn assign_groups(teams: &[Team], avoid_edges: &[AvoidEdge], groups: u32) -> CoreResult<GroupingResult> {
    let team_count = teams.len() as u32;
    if groups == 0 || team_count % groups != 0 {
        return Err(CoreError::GroupCapacityMismatch { team_count, groups });
    }
    let capacity = (team_count / groups) as usize;

    let mut graph: UnGraphMap<Uuid, ()> = UnGraphMap::new();
    for team in teams {
        if let Some(id) = team.get_id() {
            graph.add_node(id);
        }
    }
    for edge in avoid_edges {
        graph.add_edge(edge.get_team_id_a(), edge.get_team_id_b(), ());
    }

    // canonical order: seed asc (null last), rating desc, registered asc, id asc
    let mut ordered: Vec<&Team> = teams.iter().collect();
    ordered.sort_by(|a, b| a.cmp_canonical(b));

    let mut group_members: Vec<HashSet<Uuid>> = vec![HashSet::new(); groups as usize];
    let mut assignments: HashMap<Uuid, u32> = HashMap::new();

    for team in &ordered {
        let Some(team_id) = team.get_id() else {
            continue;
        };
        let neighbors: HashSet<Uuid> = graph.neighbors(team_id).collect();

        let mut best_group = None;
        let mut best_conflicts = u32::MAX;
        for (idx, members) in group_members.iter().enumerate() {
            if members.len() >= capacity {
                continue;
            }
            let conflicts = members.intersection(&neighbors).count() as u32;
            if conflicts < best_conflicts {
                best_conflicts = conflicts;
                best_group = Some(idx);
            }
        }

        // every group is at capacity only if team_count isn't a multiple of
        // groups, which is rejected above, so this always finds a home
        let group_idx = best_group.expect("some group must be below capacity");
        group_members[group_idx].insert(team_id);
        assignments.insert(team_id, group_idx as u32);
    }

    let mut internal_conflicts_per_group = vec![0u32; groups as usize];
    let mut separated = 0u32;
    for edge in avoid_edges {
        let (a, b) = edge.canonical_pair();
        match (assignments.get(&a), assignments.get(&b)) {
            (Some(ga), Some(gb)) if ga == gb => {
                internal_conflicts_per_group[*ga as usize] += 1;
            }
            (Some(_), Some(_)) => separated += 1,
            _ => {}
        }
    }
    let separation_rate = if avoid_edges.is_empty() {
        1.0
    } else {
        separated as f64 / avoid_edges.len() as f64
    };

    Ok(GroupingResult {
        assignments,
        summary: GroupingSummary {
            group_sizes: group_members.iter().map(|g| g.len() as u32).collect(),
            internal_conflicts_per_group,
            separation_rate,
        },
    })
}
