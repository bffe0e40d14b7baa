//! domain entities and their invariants. The single source of truth for
//! enums and constraints used by every other component.

mod assignment;
mod event;
mod match_;
mod slot;
mod team;
mod tournament;
mod version;

pub use assignment::Assignment;
pub use event::{DrawPlan, DrawStatus, Event, TemplateType};
pub use match_::{Match, MatchStatus, MatchType, PlacementType};
pub use slot::{SLOT_BLOCK_MINUTES, Slot};
pub use team::{AvoidEdge, Team};
pub use tournament::{Tournament, TournamentDay};
pub use version::{ScheduleVersion, VersionStatus};
