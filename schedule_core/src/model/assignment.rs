use crate::utils::{IdVersion, ObjectIdVersion};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// child of [`crate::model::ScheduleVersion`]; binds exactly one match to
/// exactly one slot within that version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    id_version: IdVersion,
    schedule_version_id: Uuid,
    match_id: Uuid,
    slot_id: Uuid,
}

impl ObjectIdVersion for Assignment {
    fn get_id_version(&self) -> IdVersion {
        self.id_version
    }
}

impl Assignment {
    pub fn new(id_version: IdVersion, schedule_version_id: Uuid, match_id: Uuid, slot_id: Uuid) -> Self {
        Self {
            id_version,
            schedule_version_id,
            match_id,
            slot_id,
        }
    }

    pub fn get_id(&self) -> Option<Uuid> {
        self.id_version.get_id()
    }
    pub fn get_schedule_version_id(&self) -> Uuid {
        self.schedule_version_id
    }
    pub fn get_match_id(&self) -> Uuid {
        self.match_id
    }
    pub fn get_slot_id(&self) -> Uuid {
        self.slot_id
    }
    pub fn set_id_version(&mut self, id_version: IdVersion) -> &mut Self {
        self.id_version = id_version;
        self
    }
}
