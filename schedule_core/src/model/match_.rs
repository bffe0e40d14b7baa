use crate::utils::{IdVersion, ObjectIdVersion};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    Wf,
    Main,
    Consolation,
    Placement,
}

impl MatchType {
    /// stage priority fixed by the glossary: WF=1, MAIN=2, CONSOLATION=3, PLACEMENT=4.
    pub fn stage_priority(self) -> u8 {
        match self {
            MatchType::Wf => 1,
            MatchType::Main => 2,
            MatchType::Consolation => 3,
            MatchType::Placement => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementType {
    MainSfLosers,
    ConsR1Winners,
    ConsR1Losers,
}

impl PlacementType {
    /// tie-break order within PLACEMENT matches.
    pub fn order(self) -> u8 {
        match self {
            PlacementType::MainSfLosers => 0,
            PlacementType::ConsR1Winners => 1,
            PlacementType::ConsR1Losers => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Unscheduled,
    Scheduled,
}

/// child of [`crate::model::Event`], bound to a single
/// [`crate::model::ScheduleVersion`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    id_version: IdVersion,
    event_id: Uuid,
    schedule_version_id: Uuid,
    match_code: String,
    match_type: MatchType,
    round_index: u32,
    sequence_in_round: u32,
    duration_minutes: u32,
    consolation_tier: Option<u8>,
    placement_type: Option<PlacementType>,
    team_a_id: Option<Uuid>,
    team_b_id: Option<Uuid>,
    placeholder_side_a: String,
    placeholder_side_b: String,
    preferred_day: Option<NaiveDate>,
    status: MatchStatus,
}

impl ObjectIdVersion for Match {
    fn get_id_version(&self) -> IdVersion {
        self.id_version
    }
}

#[allow(clippy::too_many_arguments)]
impl Match {
    pub fn new(
        id_version: IdVersion,
        event_id: Uuid,
        schedule_version_id: Uuid,
        match_code: impl Into<String>,
        match_type: MatchType,
        round_index: u32,
        sequence_in_round: u32,
        duration_minutes: u32,
        placeholder_side_a: impl Into<String>,
        placeholder_side_b: impl Into<String>,
    ) -> Self {
        Self {
            id_version,
            event_id,
            schedule_version_id,
            match_code: match_code.into(),
            match_type,
            round_index,
            sequence_in_round,
            duration_minutes,
            consolation_tier: None,
            placement_type: None,
            team_a_id: None,
            team_b_id: None,
            placeholder_side_a: placeholder_side_a.into(),
            placeholder_side_b: placeholder_side_b.into(),
            preferred_day: None,
            status: MatchStatus::Unscheduled,
        }
    }

    pub fn get_id(&self) -> Option<Uuid> {
        self.id_version.get_id()
    }
    pub fn get_event_id(&self) -> Uuid {
        self.event_id
    }
    pub fn get_schedule_version_id(&self) -> Uuid {
        self.schedule_version_id
    }
    pub fn get_match_code(&self) -> &str {
        &self.match_code
    }
    pub fn get_match_type(&self) -> MatchType {
        self.match_type
    }
    pub fn get_round_index(&self) -> u32 {
        self.round_index
    }
    pub fn get_sequence_in_round(&self) -> u32 {
        self.sequence_in_round
    }
    pub fn get_duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
    pub fn get_consolation_tier(&self) -> Option<u8> {
        self.consolation_tier
    }
    pub fn set_consolation_tier(&mut self, tier: Option<u8>) -> &mut Self {
        self.consolation_tier = tier;
        self
    }
    pub fn get_placement_type(&self) -> Option<PlacementType> {
        self.placement_type
    }
    pub fn set_placement_type(&mut self, placement_type: Option<PlacementType>) -> &mut Self {
        self.placement_type = placement_type;
        self
    }
    pub fn get_team_a_id(&self) -> Option<Uuid> {
        self.team_a_id
    }
    pub fn get_team_b_id(&self) -> Option<Uuid> {
        self.team_b_id
    }
    pub fn set_teams(&mut self, team_a_id: Option<Uuid>, team_b_id: Option<Uuid>) -> &mut Self {
        self.team_a_id = team_a_id;
        self.team_b_id = team_b_id;
        self
    }
    pub fn clear_teams(&mut self) -> &mut Self {
        self.team_a_id = None;
        self.team_b_id = None;
        self
    }
    pub fn get_placeholder_side_a(&self) -> &str {
        &self.placeholder_side_a
    }
    pub fn get_placeholder_side_b(&self) -> &str {
        &self.placeholder_side_b
    }
    pub fn get_preferred_day(&self) -> Option<NaiveDate> {
        self.preferred_day
    }
    pub fn set_preferred_day(&mut self, day: Option<NaiveDate>) -> &mut Self {
        self.preferred_day = day;
        self
    }
    pub fn get_status(&self) -> MatchStatus {
        self.status
    }
    pub fn set_status(&mut self, status: MatchStatus) -> &mut Self {
        self.status = status;
        self
    }
    pub fn set_id_version(&mut self, id_version: IdVersion) -> &mut Self {
        self.id_version = id_version;
        self
    }

    /// resolved (non-placeholder) teams participating in this match.
    pub fn resolved_teams(&self) -> impl Iterator<Item = Uuid> {
        [self.team_a_id, self.team_b_id].into_iter().flatten()
    }

    /// canonical sort key: (stage_priority, round_index, event_id,
    /// match_type, round_number, sequence_in_round, match_code). `match_type`
    /// is included for a stable key even though it is a function of
    /// stage_priority for all but PLACEMENT, where `placement_type.order()`
    /// provides the additional tie-break.
    pub fn sort_key(&self) -> (u8, u32, Uuid, u8, u32, u32, u8, &str) {
        (
            self.match_type.stage_priority(),
            self.round_index,
            self.event_id,
            self.match_type.stage_priority(),
            self.round_index,
            self.sequence_in_round,
            self.placement_type.map(|p| p.order()).unwrap_or(0),
            self.match_code.as_str(),
        )
    }
}
