//! crate-wide error type and the stable codes carried across the port boundary

use crate::model::{TemplateType, VersionStatus};
use crate::ports::DbError;
use crate::utils::{FieldError, ValidationErrors};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// one blocking or non-blocking finding from the draw-plan validator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanIssue {
    pub code: String,
    pub message: String,
}

impl PlanIssue {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// top-level error returned by every public entry point in this crate.
///
/// Every variant carries a stable `code()` string: the contract an external
/// HTTP adapter maps to a status code, even though this crate never performs
/// that mapping itself.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum CoreError {
    #[error("database error: {0}")]
    Db(#[from] DbError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("field error: {0}")]
    Field(#[from] FieldError),

    #[error("missing id for {0}")]
    MissingId(String),

    #[error("draw plan invalid: {} blocking issue(s)", blocking.len())]
    PlanInvalid { blocking: Vec<PlanIssue> },

    #[error("schedule version {version_id} is not a draft (status: {status:?})")]
    ScheduleVersionNotDraft {
        version_id: Uuid,
        status: VersionStatus,
    },

    #[error("source version {version_id} is not final")]
    SourceVersionNotFinal { version_id: Uuid },

    #[error("invalid team count: {team_count}")]
    InvalidTeamCount { team_count: u32 },

    #[error("self-edge not allowed for team {team_id}")]
    SelfEdge { team_id: Uuid },

    #[error("{team_count} teams cannot be split into {groups} equal group(s)")]
    GroupCapacityMismatch { team_count: u32, groups: u32 },

    #[error("template {template:?} unsupported for team_count {team_count}")]
    TemplateUnsupported {
        template: TemplateType,
        team_count: u32,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
}

impl CoreError {
    /// stable identifier used as the HTTP-mapped code
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Db(_) => "DB_ERROR",
            CoreError::Validation(_) => "VALIDATION",
            CoreError::Field(_) => "FIELD",
            CoreError::MissingId(_) => "MISSING_ID",
            CoreError::PlanInvalid { .. } => "PLAN_INVALID",
            CoreError::ScheduleVersionNotDraft { .. } => "SCHEDULE_VERSION_NOT_DRAFT",
            CoreError::SourceVersionNotFinal { .. } => "SOURCE_VERSION_NOT_FINAL",
            CoreError::InvalidTeamCount { .. } => "INVALID_TEAM_COUNT",
            CoreError::SelfEdge { .. } => "SELF_EDGE",
            CoreError::GroupCapacityMismatch { .. } => "GROUP_CAPACITY_MISMATCH",
            CoreError::TemplateUnsupported { .. } => "TEMPLATE_UNSUPPORTED",
            CoreError::NotFound { .. } => "NOT_FOUND",
        }
    }

    pub fn is_optimistic_lock_conflict(&self) -> bool {
        matches!(self, CoreError::Db(DbError::OptimisticLockConflict))
    }

    pub fn is_not_draft(&self) -> bool {
        matches!(self, CoreError::ScheduleVersionNotDraft { .. })
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
