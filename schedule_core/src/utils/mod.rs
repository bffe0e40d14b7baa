//! generic, cross-cutting helpers shared by the domain model and components

pub mod id_version;
pub mod normalize;
pub mod traits;
pub mod validation;

pub use id_version::IdVersion;
pub use normalize::*;
pub use traits::{ObjectIdVersion, ObjectNumber};
pub use validation::*;
