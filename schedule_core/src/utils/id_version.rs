//! ID and version handling for optimistically-locked persisted entities.
//!
//! A freshly constructed entity cannot be saved without going through the
//! allocation protocol below, and a loaded entity cannot silently skip the
//! optimistic-lock check on save: both states are represented directly in
//! the enum instead of by sentinel values on a plain struct.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdVersion {
    /// not yet persisted, id to be allocated by the store
    New,
    /// not yet persisted, caller pins the id (e.g. restoring a snapshot)
    NewWithId(Uuid),
    /// persisted at `version`; a save must match this version or fail with
    /// `DbError::OptimisticLockConflict`
    Existing { id: Uuid, version: i64 },
}

impl IdVersion {
    pub fn new(id: Uuid, version: Option<i64>) -> Self {
        match version {
            Some(version) => IdVersion::Existing { id, version },
            None => IdVersion::NewWithId(id),
        }
    }

    pub fn get_id(&self) -> Option<Uuid> {
        match self {
            IdVersion::New => None,
            IdVersion::NewWithId(id) => Some(*id),
            IdVersion::Existing { id, .. } => Some(*id),
        }
    }

    pub fn get_version(&self) -> Option<i64> {
        match self {
            IdVersion::Existing { version, .. } => Some(*version),
            _ => None,
        }
    }

    pub fn is_new(&self) -> bool {
        !matches!(self, IdVersion::Existing { .. })
    }

    /// id_version for the same entity after a successful save of a new row
    pub fn allocated(id: Uuid) -> Self {
        IdVersion::Existing { id, version: 0 }
    }

    /// id_version for the same entity after a successful save of an existing row
    pub fn bumped(&self) -> Option<Self> {
        match self {
            IdVersion::Existing { id, version } => Some(IdVersion::Existing {
                id: *id,
                version: version + 1,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_no_id_or_version() {
        let iv = IdVersion::New;
        assert_eq!(iv.get_id(), None);
        assert_eq!(iv.get_version(), None);
        assert!(iv.is_new());
    }

    #[test]
    fn existing_bumps_version_and_keeps_id() {
        let id = Uuid::new_v4();
        let iv = IdVersion::Existing { id, version: 4 };
        let bumped = iv.bumped().unwrap();
        assert_eq!(bumped.get_id(), Some(id));
        assert_eq!(bumped.get_version(), Some(5));
        assert!(!bumped.is_new());
    }

    #[test]
    fn new_with_id_cannot_be_bumped() {
        assert!(IdVersion::NewWithId(Uuid::new_v4()).bumped().is_none());
    }
}
