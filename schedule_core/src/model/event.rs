use crate::utils::{FieldError, IdVersion, ObjectIdVersion, ValidationErrors, normalize_ws};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// closed sum of draw templates: a tagged variant with a single generator
/// dispatch, not a class hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateType {
    RrOnly,
    WfToPoolsDynamic,
    WfToBrackets8,
    /// legacy accepted: 16 teams, 4 pools of 4
    WfToPools4,
    /// legacy accepted: 8 teams, treated as the 8-team bracket alias (see DESIGN.md)
    Canonical32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawStatus {
    NotStarted,
    Draft,
    Final,
}

/// embedded document on [`Event`] describing how its match inventory is produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawPlan {
    pub template_type: TemplateType,
    pub wf_rounds: u8,
    pub post_wf: Option<String>,
    pub pool_assignment: Option<String>,
    pub wf_block_minutes: u32,
    pub standard_block_minutes: u32,
    pub cadence_hint: Option<String>,
}

impl DrawPlan {
    pub fn new(template_type: TemplateType, wf_block_minutes: u32, standard_block_minutes: u32) -> Self {
        Self {
            template_type,
            wf_rounds: 0,
            post_wf: None,
            pool_assignment: None,
            wf_block_minutes,
            standard_block_minutes,
            cadence_hint: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    id_version: IdVersion,
    tournament_id: Uuid,
    name: String,
    category: String,
    team_count: u32,
    guarantee_selected: u8,
    draw_status: DrawStatus,
    draw_plan: DrawPlan,
    schedule_profile: Option<String>,
}

impl ObjectIdVersion for Event {
    fn get_id_version(&self) -> IdVersion {
        self.id_version
    }
}

impl Event {
    pub fn new(
        id_version: IdVersion,
        tournament_id: Uuid,
        name: impl Into<String>,
        category: impl Into<String>,
        team_count: u32,
        guarantee_selected: u8,
        draw_plan: DrawPlan,
    ) -> Self {
        Self {
            id_version,
            tournament_id,
            name: normalize_ws(name.into()),
            category: normalize_ws(category.into()),
            team_count,
            guarantee_selected,
            draw_status: DrawStatus::NotStarted,
            draw_plan,
            schedule_profile: None,
        }
    }

    pub fn get_id(&self) -> Option<Uuid> {
        self.id_version.get_id()
    }
    pub fn get_tournament_id(&self) -> Uuid {
        self.tournament_id
    }
    pub fn get_name(&self) -> &str {
        &self.name
    }
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = normalize_ws(name.into());
        self
    }
    pub fn get_category(&self) -> &str {
        &self.category
    }
    pub fn get_team_count(&self) -> u32 {
        self.team_count
    }
    pub fn get_guarantee_selected(&self) -> u8 {
        self.guarantee_selected
    }
    pub fn get_draw_status(&self) -> DrawStatus {
        self.draw_status
    }
    pub fn set_draw_status(&mut self, status: DrawStatus) -> &mut Self {
        self.draw_status = status;
        self
    }
    pub fn get_draw_plan(&self) -> &DrawPlan {
        &self.draw_plan
    }
    pub fn draw_plan_mut(&mut self) -> &mut DrawPlan {
        &mut self.draw_plan
    }
    pub fn set_id_version(&mut self, id_version: IdVersion) -> &mut Self {
        self.id_version = id_version;
        self
    }

    /// field-level invariants that do not depend on the draw plan's
    /// compatibility with team_count — that cross-field rule belongs to the
    /// draw-plan validator, which needs validated field values first.
    pub fn validate_fields(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.is_empty() {
            errors.add(FieldError::builder().set_field("name").add_required().build());
        }
        if self.team_count == 0 {
            errors.add(
                FieldError::builder()
                    .set_field("team_count")
                    .add_user_defined_code("positive_integer")
                    .add_message("team_count must be a positive integer")
                    .build(),
            );
        }
        if ![4, 5].contains(&self.guarantee_selected) {
            errors.add(
                FieldError::builder()
                    .set_field("guarantee_selected")
                    .add_user_defined_code("invalid_guarantee")
                    .add_message("guarantee_selected must be 4 or 5")
                    .build(),
            );
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(team_count: u32, guarantee: u8) -> Event {
        Event::new(
            IdVersion::New,
            Uuid::new_v4(),
            "Women's Open",
            "AAA",
            team_count,
            guarantee,
            DrawPlan::new(TemplateType::RrOnly, 60, 60),
        )
    }

    #[test]
    fn rejects_zero_team_count() {
        assert!(event(0, 4).validate_fields().is_err());
    }

    #[test]
    fn rejects_bad_guarantee() {
        assert!(event(8, 6).validate_fields().is_err());
    }

    #[test]
    fn accepts_valid_fields() {
        assert!(event(8, 5).validate_fields().is_ok());
    }
}
