//! traits for utils

use crate::utils::id_version::IdVersion;

pub trait ObjectIdVersion {
    fn get_id_version(&self) -> IdVersion;
}

/// objects ordered by a stable, persisted integer (round_index,
/// sequence_in_round, version_number, ...)
pub trait ObjectNumber {
    fn get_object_number(&self) -> u32;
}
