//! exercises the full build pipeline end to end against the in-memory
//! `FakeDatabasePort`, the way a component test against a real Postgres
//! instance would, minus the database.

#![cfg(feature = "test-support")]

use chrono::{NaiveDate, NaiveTime, Utc};
use schedule_core::model::{DrawPlan, Event, ScheduleVersion, TemplateType, Team, Tournament, TournamentDay, VersionStatus};
use schedule_core::orchestrator::{self, BuildOptions, BuildResult};
use schedule_core::ports::{DbpEvent, DbpMatch, DbpScheduleVersion, DbpTeam, DbpTournament};
use schedule_core::testing::FakeDatabasePort;
use schedule_core::utils::IdVersion;

fn seeded_tournament(db: &FakeDatabasePort) -> uuid::Uuid {
    let mut tournament = Tournament::new(IdVersion::New, "Fall Invitational");
    tournament.add_day(TournamentDay::new(
        NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
        NaiveTime::parse_from_str("09:00", "%H:%M").unwrap(),
        NaiveTime::parse_from_str("18:00", "%H:%M").unwrap(),
        4,
    ));
    db.seed_tournament(tournament)
}

#[tokio::test]
async fn build_runs_rr_only_event_end_to_end() {
    let db = FakeDatabasePort::new();
    let tournament_id = seeded_tournament(&db);

    let event = Event::new(
        IdVersion::New,
        tournament_id,
        "Women's Open",
        "AAA",
        8,
        5,
        DrawPlan::new(TemplateType::RrOnly, 60, 60),
    );
    db.save_event(event).await.unwrap();

    let version = ScheduleVersion::new_draft(IdVersion::New, tournament_id, 1, Utc::now());
    let saved_version = db.save_schedule_version(version).await.unwrap();
    let version_id = saved_version.get_id().unwrap();

    let result = orchestrator::build(&db, tournament_id, version_id, BuildOptions::default()).await;

    match result {
        BuildResult::Success(success) => {
            assert!(success.report.summary.total_matches > 0);
            assert!(!success.dry_run);
        }
        BuildResult::Error(failure) => panic!("build failed at {:?}: {}", failure.failed_step, failure.error_message),
    }
}

#[tokio::test]
async fn dry_run_leaves_version_in_draft_and_rolls_back() {
    let db = FakeDatabasePort::new();
    let tournament_id = seeded_tournament(&db);

    let event = Event::new(
        IdVersion::New,
        tournament_id,
        "Men's Open",
        "AAA",
        4,
        4,
        DrawPlan::new(TemplateType::RrOnly, 60, 60),
    );
    db.save_event(event).await.unwrap();

    let version = ScheduleVersion::new_draft(IdVersion::New, tournament_id, 1, Utc::now());
    let saved_version = db.save_schedule_version(version).await.unwrap();
    let version_id = saved_version.get_id().unwrap();

    let options = BuildOptions {
        clear_existing: false,
        dry_run: true,
    };
    let result = orchestrator::build(&db, tournament_id, version_id, options).await;

    match result {
        BuildResult::Success(success) => assert!(success.dry_run),
        BuildResult::Error(failure) => panic!("build failed at {:?}: {}", failure.failed_step, failure.error_message),
    }

    let reloaded = db.get_schedule_version(version_id).await.unwrap();
    assert_eq!(reloaded.get_status(), VersionStatus::Draft);
}

#[tokio::test]
async fn build_injects_real_teams_into_a_pool_template_event() {
    let db = FakeDatabasePort::new();
    let tournament_id = seeded_tournament(&db);

    let mut plan = DrawPlan::new(TemplateType::WfToPoolsDynamic, 60, 60);
    plan.wf_rounds = 2;
    let event = Event::new(IdVersion::New, tournament_id, "Mixed Pools", "AAA", 16, 4, plan);
    let saved_event = db.save_event(event).await.unwrap();
    let event_id = saved_event.get_id().unwrap();

    for seed in 1..=16u32 {
        let mut team = Team::new(IdVersion::New, event_id, format!("Team {seed}"));
        team.set_seed(Some(seed));
        db.save_team(team).await.unwrap();
    }

    let version = ScheduleVersion::new_draft(IdVersion::New, tournament_id, 1, Utc::now());
    let saved_version = db.save_schedule_version(version).await.unwrap();
    let version_id = saved_version.get_id().unwrap();

    let result = orchestrator::build(&db, tournament_id, version_id, BuildOptions::default()).await;

    match result {
        BuildResult::Success(success) => {
            assert!(success.report.summary.total_matches > 0);
            assert!(!success.warnings.iter().any(|w| w.code == "NO_TEAMS_FOR_EVENT"));
        }
        BuildResult::Error(failure) => panic!("build failed at {:?}: {}", failure.failed_step, failure.error_message),
    }

    let matches = db.list_matches_of_event_and_version(event_id, version_id).await.unwrap();
    let pool_matches_with_teams = matches
        .iter()
        .filter(|m| m.get_match_code().starts_with("POOL"))
        .filter(|m| m.get_team_a_id().is_some() && m.get_team_b_id().is_some())
        .count();
    assert!(pool_matches_with_teams > 0, "pool round-robin matches should have been injected with real teams");
}

#[tokio::test]
async fn injected_lock_failure_surfaces_as_build_error() {
    let db = FakeDatabasePort::new();
    let tournament_id = seeded_tournament(&db);

    let version = ScheduleVersion::new_draft(IdVersion::New, tournament_id, 1, Utc::now());
    let saved_version = db.save_schedule_version(version).await.unwrap();
    let version_id = saved_version.get_id().unwrap();

    db.fail_once("lock_version_row");
    let result = orchestrator::build(&db, tournament_id, version_id, BuildOptions::default()).await;

    match result {
        BuildResult::Error(failure) => {
            assert_eq!(failure.failed_step, orchestrator::BuildStep::ValidatePlans);
        }
        BuildResult::Success(_) => panic!("expected the injected lock failure to surface as a build error"),
    }
}
