use crate::utils::{IdVersion, ObjectIdVersion, ObjectNumber};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionStatus {
    Draft,
    Final,
}

/// child of [`crate::model::Tournament`]; exclusively owns its slots,
/// version-bound matches, and assignments. State machine:
/// `not_started → draft → final`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleVersion {
    id_version: IdVersion,
    tournament_id: Uuid,
    version_number: u32,
    status: VersionStatus,
    created_at: DateTime<Utc>,
    finalized_at: Option<DateTime<Utc>>,
    finalized_checksum: Option<String>,
    notes: Option<String>,
}

impl ObjectIdVersion for ScheduleVersion {
    fn get_id_version(&self) -> IdVersion {
        self.id_version
    }
}

impl ObjectNumber for ScheduleVersion {
    fn get_object_number(&self) -> u32 {
        self.version_number
    }
}

impl ScheduleVersion {
    pub fn new_draft(
        id_version: IdVersion,
        tournament_id: Uuid,
        version_number: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id_version,
            tournament_id,
            version_number,
            status: VersionStatus::Draft,
            created_at,
            finalized_at: None,
            finalized_checksum: None,
            notes: None,
        }
    }

    pub fn get_id(&self) -> Option<Uuid> {
        self.id_version.get_id()
    }
    pub fn get_tournament_id(&self) -> Uuid {
        self.tournament_id
    }
    pub fn get_version_number(&self) -> u32 {
        self.version_number
    }
    pub fn get_status(&self) -> VersionStatus {
        self.status
    }
    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn get_finalized_at(&self) -> Option<DateTime<Utc>> {
        self.finalized_at
    }
    pub fn get_finalized_checksum(&self) -> Option<&str> {
        self.finalized_checksum.as_deref()
    }
    pub fn get_notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
    pub fn set_notes(&mut self, notes: Option<String>) -> &mut Self {
        self.notes = notes;
        self
    }
    pub fn set_id_version(&mut self, id_version: IdVersion) -> &mut Self {
        self.id_version = id_version;
        self
    }
    pub fn is_draft(&self) -> bool {
        self.status == VersionStatus::Draft
    }

    /// transitions draft → final with a computed checksum. Called only by
    /// `version_lifecycle::finalize`, which runs the sanity checks first.
    pub(crate) fn mark_final(&mut self, finalized_at: DateTime<Utc>, checksum: String) {
        self.status = VersionStatus::Final;
        self.finalized_at = Some(finalized_at);
        self.finalized_checksum = Some(checksum);
    }

    /// returns this version's draft fields to a fresh, empty draft state, used
    /// by `reset`. The version's own identity and version_number are unchanged.
    pub(crate) fn clear_to_empty_draft(&mut self) {
        self.status = VersionStatus::Draft;
        self.finalized_at = None;
        self.finalized_checksum = None;
    }
}
