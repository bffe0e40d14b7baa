use crate::utils::{IdVersion, ObjectIdVersion};
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// a potential match start at a specific (day, court). Does not by itself
/// reserve more than its 15-minute cell; occupancy is a function of an
/// assignment's match duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    id_version: IdVersion,
    schedule_version_id: Uuid,
    day_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    court_number: u32,
    court_label: Option<String>,
    block_minutes: u32,
    is_active: bool,
}

impl ObjectIdVersion for Slot {
    fn get_id_version(&self) -> IdVersion {
        self.id_version
    }
}

pub const SLOT_BLOCK_MINUTES: u32 = 15;

impl Slot {
    pub fn new(
        id_version: IdVersion,
        schedule_version_id: Uuid,
        day_date: NaiveDate,
        start_time: NaiveTime,
        court_number: u32,
        court_label: Option<String>,
    ) -> Self {
        let end_time = start_time + Duration::minutes(SLOT_BLOCK_MINUTES as i64);
        Self {
            id_version,
            schedule_version_id,
            day_date,
            start_time,
            end_time,
            court_number,
            court_label,
            block_minutes: SLOT_BLOCK_MINUTES,
            is_active: true,
        }
    }

    pub fn get_id(&self) -> Option<Uuid> {
        self.id_version.get_id()
    }
    pub fn get_schedule_version_id(&self) -> Uuid {
        self.schedule_version_id
    }
    pub fn get_day_date(&self) -> NaiveDate {
        self.day_date
    }
    pub fn get_start_time(&self) -> NaiveTime {
        self.start_time
    }
    pub fn get_end_time(&self) -> NaiveTime {
        self.end_time
    }
    pub fn get_court_number(&self) -> u32 {
        self.court_number
    }
    pub fn get_court_label(&self) -> Option<&str> {
        self.court_label.as_deref()
    }
    pub fn get_block_minutes(&self) -> u32 {
        self.block_minutes
    }
    pub fn is_active(&self) -> bool {
        self.is_active
    }
    pub fn set_id_version(&mut self, id_version: IdVersion) -> &mut Self {
        self.id_version = id_version;
        self
    }

    /// deterministic read order: (day_date asc, start_time asc, court_number
    /// asc, id asc).
    pub fn sort_key(&self) -> (NaiveDate, NaiveTime, u32, Uuid) {
        (
            self.day_date,
            self.start_time,
            self.court_number,
            self.get_id().unwrap_or(Uuid::nil()),
        )
    }
}
