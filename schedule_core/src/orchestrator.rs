//! sequences every other component into the single strict build pipeline:
//! validate, clear, generate, group, inject, assign, report. Runs inside
//! one transaction; any failed step rolls the whole build back.

use crate::errors::{CoreError, PlanIssue};
use crate::grouping;
use crate::injection;
use crate::inventory;
use crate::model::{Match, Team, VersionStatus};
use crate::ports::SchedulePort;
use crate::report::{self, DiagnosticReport, EventAvoidContext};
use crate::slots::{self, SlotSource};
use crate::validator;
use crate::{assignment, version_lifecycle};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    ValidatePlans,
    ClearExisting,
    ConfirmSlotsAndMatches,
    WaterfallGrouping,
    TeamInjection,
    RestAwareAssignment,
    Report,
}

impl BuildStep {
    pub fn code(self) -> &'static str {
        match self {
            BuildStep::ValidatePlans => "VALIDATE_PLANS",
            BuildStep::ClearExisting => "CLEAR_EXISTING",
            BuildStep::ConfirmSlotsAndMatches => "CONFIRM_SLOTS_AND_MATCHES",
            BuildStep::WaterfallGrouping => "WATERFALL_GROUPING",
            BuildStep::TeamInjection => "TEAM_INJECTION",
            BuildStep::RestAwareAssignment => "REST_AWARE_ASSIGNMENT",
            BuildStep::Report => "REPORT",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    pub clear_existing: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct BuildSuccess {
    pub report: DiagnosticReport,
    pub warnings: Vec<PlanIssue>,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct BuildFailure {
    pub failed_step: BuildStep,
    pub error_message: String,
}

#[derive(Debug, Clone)]
pub enum BuildResult {
    Success(BuildSuccess),
    Error(BuildFailure),
}

type StepResult<T> = Result<T, (BuildStep, CoreError)>;

/// `build(tournament_id, version_id, options) → BuildResult`. Never
/// returns `Err` itself — a failing step is reported as `BuildResult::Error`
/// after the transaction is rolled back, so callers never have to distinguish
/// "the pipeline failed" from "the database call failed".
#[instrument(name = "orchestrator.build", skip(db))]
pub async fn build(
    db: &dyn SchedulePort,
    tournament_id: Uuid,
    version_id: Uuid,
    options: BuildOptions,
) -> BuildResult {
    if let Err(e) = db.begin().await {
        return BuildResult::Error(BuildFailure {
            failed_step: BuildStep::ValidatePlans,
            error_message: CoreError::from(e).to_string(),
        });
    }
    if let Err(e) = db.lock_version_row(version_id).await {
        let _ = db.rollback().await;
        return BuildResult::Error(BuildFailure {
            failed_step: BuildStep::ValidatePlans,
            error_message: CoreError::from(e).to_string(),
        });
    }

    match run_pipeline(db, tournament_id, version_id, options).await {
        Ok(success) => {
            if options.dry_run {
                let _ = db.rollback().await;
            } else if let Err(e) = db.commit().await {
                let _ = db.rollback().await;
                return BuildResult::Error(BuildFailure {
                    failed_step: BuildStep::Report,
                    error_message: CoreError::from(e).to_string(),
                });
            }
            BuildResult::Success(success)
        }
        Err((failed_step, error)) => {
            let _ = db.rollback().await;
            BuildResult::Error(BuildFailure {
                failed_step,
                error_message: error.to_string(),
            })
        }
    }
}

async fn run_pipeline(
    db: &dyn SchedulePort,
    tournament_id: Uuid,
    version_id: Uuid,
    options: BuildOptions,
) -> StepResult<BuildSuccess> {
    let tournament = db
        .get_tournament(tournament_id)
        .await
        .map_err(|e| (BuildStep::ValidatePlans, e.into()))?;
    let version = db
        .get_schedule_version(version_id)
        .await
        .map_err(|e| (BuildStep::ValidatePlans, e.into()))?;
    if version.get_status() != VersionStatus::Draft {
        return Err((
            BuildStep::ValidatePlans,
            CoreError::ScheduleVersionNotDraft {
                version_id,
                status: version.get_status(),
            },
        ));
    }

    let events = db
        .list_events_of_tournament(tournament_id)
        .await
        .map_err(|e| (BuildStep::ValidatePlans, e.into()))?;

    let mut warnings = Vec::new();
    let mut blocking = Vec::new();
    for event in &events {
        let check = validator::validate_event(event);
        warnings.extend(check.warnings.clone());
        blocking.extend(check.blocking.clone());
    }
    if !blocking.is_empty() {
        return Err((BuildStep::ValidatePlans, CoreError::PlanInvalid { blocking }));
    }

    if options.clear_existing {
        version_lifecycle::reset(db, version_id)
            .await
            .map_err(|e| (BuildStep::ClearExisting, e))?;
    }

    let mut slots = db
        .list_slots_of_version(version_id)
        .await
        .map_err(|e| (BuildStep::ConfirmSlotsAndMatches, e.into()))?;
    if slots.is_empty() {
        let generated = slots::generate_slots(version_id, SlotSource::Auto(&tournament));
        slots = db
            .save_slots(generated)
            .await
            .map_err(|e| (BuildStep::ConfirmSlotsAndMatches, e.into()))?;
    }

    let mut matches_by_event: HashMap<Uuid, Vec<Match>> = HashMap::new();
    for event in &events {
        let event_id = event.get_id().ok_or_else(|| (BuildStep::ConfirmSlotsAndMatches, CoreError::MissingId("event".into())))?;
        let mut existing = db
            .list_matches_of_event_and_version(event_id, version_id)
            .await
            .map_err(|e| (BuildStep::ConfirmSlotsAndMatches, e.into()))?;
        if existing.is_empty() {
            let generated = inventory::generate(event, version_id).map_err(|e| (BuildStep::ConfirmSlotsAndMatches, e))?;
            existing = db
                .save_matches(generated)
                .await
                .map_err(|e| (BuildStep::ConfirmSlotsAndMatches, e.into()))?;
        }
        matches_by_event.insert(event_id, existing);
    }

    let mut teams_by_event: HashMap<Uuid, Vec<Team>> = HashMap::new();
    let mut avoid_edges_by_event = HashMap::new();
    for event in &events {
        let event_id = event.get_id().ok_or_else(|| (BuildStep::WaterfallGrouping, CoreError::MissingId("event".into())))?;
        let teams = db
            .list_teams_of_event(event_id)
            .await
            .map_err(|e| (BuildStep::WaterfallGrouping, e.into()))?;
        let edges = db
            .list_avoid_edges_of_event(event_id)
            .await
            .map_err(|e| (BuildStep::WaterfallGrouping, e.into()))?;
        teams_by_event.insert(event_id, teams);
        avoid_edges_by_event.insert(event_id, edges);
    }

    let mut event_contexts_owned: Vec<(Uuid, u32)> = Vec::new();
    for event in &events {
        let event_id = event.get_id().ok_or_else(|| (BuildStep::WaterfallGrouping, CoreError::MissingId("event".into())))?;
        let team_count = teams_by_event.get(&event_id).map(|t| t.len() as u32).unwrap_or(0);
        if let Some(groups) = grouping::group_count_for(event.get_draw_plan().template_type, team_count) {
            if groups > 1 {
                let teams = teams_by_event.remove(&event_id).unwrap_or_default();
                let edges = avoid_edges_by_event.get(&event_id).cloned().unwrap_or_default();
                let result = grouping::assign_groups(&teams, &edges, groups).map_err(|e| (BuildStep::WaterfallGrouping, e))?;
                let mut updated = Vec::with_capacity(teams.len());
                for mut team in teams {
                    if let Some(id) = team.get_id() {
                        team.set_wf_group_index(result.assignments.get(&id).copied());
                    }
                    updated.push(team);
                }
                let saved = db
                    .save_teams(updated)
                    .await
                    .map_err(|e| (BuildStep::WaterfallGrouping, e.into()))?;
                teams_by_event.insert(event_id, saved);
            }
            event_contexts_owned.push((event_id, groups));
        }
    }

    for event in &events {
        let event_id = event.get_id().ok_or_else(|| (BuildStep::TeamInjection, CoreError::MissingId("event".into())))?;
        let teams = teams_by_event.get(&event_id).cloned().unwrap_or_default();
        if teams.is_empty() {
            warnings.push(PlanIssue::new("NO_TEAMS_FOR_EVENT", format!("event {event_id} has no teams; injection skipped")));
            continue;
        }
        let matches = matches_by_event.entry(event_id).or_default();
        let result = injection::inject(event, &teams, matches).map_err(|e| (BuildStep::TeamInjection, e))?;
        warnings.extend(result.warnings);
        let saved = db
            .save_matches(std::mem::take(matches))
            .await
            .map_err(|e| (BuildStep::TeamInjection, e.into()))?;
        *matches = saved;
    }

    let all_matches: Vec<Match> = matches_by_event.values().flatten().cloned().collect();

    let assignment_result = assignment::assign(version_id, version.get_status(), &all_matches, &slots, tournament.get_days())
        .map_err(|e| (BuildStep::RestAwareAssignment, e))?;
    let saved_assignments = db
        .save_assignments(assignment_result.assignments.clone())
        .await
        .map_err(|e| (BuildStep::RestAwareAssignment, e.into()))?;

    let event_contexts: Vec<EventAvoidContext> = event_contexts_owned
        .iter()
        .map(|&(event_id, groups)| EventAvoidContext {
            event_id,
            teams: teams_by_event.get(&event_id).map(Vec::as_slice).unwrap_or_default(),
            avoid_edges: avoid_edges_by_event.get(&event_id).map(Vec::as_slice).unwrap_or_default(),
            group_count: groups,
        })
        .collect();

    let diagnostic_report = report::build_report(&all_matches, &slots, &saved_assignments, tournament.get_days(), &event_contexts);

    Ok(BuildSuccess {
        report: diagnostic_report,
        warnings,
        dry_run: options.dry_run,
    })
}
