use crate::utils::{FieldError, IdVersion, ObjectIdVersion, ValidationErrors, normalize_ws};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// top-level container. Owns its days and, transitively through
/// [`crate::model::Event`], its events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    id_version: IdVersion,
    name: String,
    days: Vec<TournamentDay>,
}

impl ObjectIdVersion for Tournament {
    fn get_id_version(&self) -> IdVersion {
        self.id_version
    }
}

impl Tournament {
    pub fn new(id_version: IdVersion, name: impl Into<String>) -> Self {
        Self {
            id_version,
            name: normalize_ws(name.into()),
            days: Vec::new(),
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = normalize_ws(name.into());
        self
    }

    pub fn get_days(&self) -> &[TournamentDay] {
        &self.days
    }

    pub fn add_day(&mut self, day: TournamentDay) -> &mut Self {
        self.days.push(day);
        self
    }

    pub fn set_id_version(&mut self, id_version: IdVersion) -> &mut Self {
        self.id_version = id_version;
        self
    }

    /// : end > start per day; courts_available ≥ 1 per active day.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.is_empty() {
            errors.add(FieldError::builder().set_field("name").add_required().build());
        }
        for (idx, day) in self.days.iter().enumerate() {
            if let Err(err) = day.validate() {
                for mut field_error in err.errors {
                    let field = format!("days[{idx}].{}", field_error.get_field());
                    field_error = FieldError::builder()
                        .set_field(field)
                        .add_user_defined_code(field_error.get_code())
                        .add_message(field_error.get_message())
                        .build();
                    errors.add(field_error);
                }
            }
        }
        errors.into_result()
    }
}

/// one scheduling day of a tournament: a wall-clock window replicated across
/// `courts_available` courts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentDay {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub courts_available: u32,
    pub court_labels: Option<Vec<String>>,
}

impl TournamentDay {
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime, courts_available: u32) -> Self {
        Self {
            date,
            start_time,
            end_time,
            courts_available,
            court_labels: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.end_time <= self.start_time {
            errors.add(
                FieldError::builder()
                    .set_field("end_time")
                    .add_user_defined_code("end_before_start")
                    .add_message("end_time must be after start_time")
                    .build(),
            );
        }
        if self.courts_available < 1 {
            errors.add(
                FieldError::builder()
                    .set_field("courts_available")
                    .add_user_defined_code("min_courts")
                    .add_message("courts_available must be at least 1")
                    .build(),
            );
        }
        errors.into_result()
    }

    pub fn court_label(&self, court_number: u32) -> Option<&str> {
        self.court_labels
            .as_ref()
            .and_then(|labels| labels.get((court_number - 1) as usize))
            .map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(start: &str, end: &str, courts: u32) -> TournamentDay {
        TournamentDay::new(
            NaiveDate::from_ymd_opt(2026, 7, 28).unwrap(),
            NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
            courts,
        )
    }

    #[test]
    fn day_rejects_end_before_start() {
        assert!(day("12:00", "09:00", 2).validate().is_err());
    }

    #[test]
    fn day_rejects_zero_courts() {
        assert!(day("09:00", "12:00", 0).validate().is_err());
    }

    #[test]
    fn day_accepts_valid_window() {
        assert!(day("09:00", "12:00", 2).validate().is_ok());
    }

    #[test]
    fn tournament_name_is_normalized() {
        let t = Tournament::new(IdVersion::New, "  Summer   Classic  ");
        assert_eq!(t.get_name(), "Summer Classic");
    }
}
