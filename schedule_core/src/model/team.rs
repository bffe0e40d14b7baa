use crate::errors::{CoreError, CoreResult};
use crate::utils::{IdVersion, ObjectIdVersion, normalize_opt, normalize_ws};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// child of [`crate::model::Event`]. Uniqueness within event on (seed when
/// non-null) and on name is enforced at the persistence boundary, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    id_version: IdVersion,
    event_id: Uuid,
    name: String,
    seed: Option<u32>,
    rating: Option<f64>,
    registered_at: Option<DateTime<Utc>>,
    wf_group_index: Option<u32>,
}

impl ObjectIdVersion for Team {
    fn get_id_version(&self) -> IdVersion {
        self.id_version
    }
}

impl Team {
    pub fn new(id_version: IdVersion, event_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id_version,
            event_id,
            name: normalize_ws(name.into()),
            seed: None,
            rating: None,
            registered_at: None,
            wf_group_index: None,
        }
    }

    pub fn get_id(&self) -> Option<Uuid> {
        self.id_version.get_id()
    }
    pub fn get_event_id(&self) -> Uuid {
        self.event_id
    }
    pub fn get_name(&self) -> &str {
        &self.name
    }
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = normalize_ws(name.into());
        self
    }
    pub fn get_seed(&self) -> Option<u32> {
        self.seed
    }
    pub fn set_seed(&mut self, seed: Option<u32>) -> &mut Self {
        self.seed = seed;
        self
    }
    pub fn get_rating(&self) -> Option<f64> {
        self.rating
    }
    pub fn set_rating(&mut self, rating: Option<f64>) -> &mut Self {
        self.rating = rating;
        self
    }
    pub fn get_registered_at(&self) -> Option<DateTime<Utc>> {
        self.registered_at
    }
    pub fn set_registered_at(&mut self, at: Option<DateTime<Utc>>) -> &mut Self {
        self.registered_at = at;
        self
    }
    pub fn get_wf_group_index(&self) -> Option<u32> {
        self.wf_group_index
    }
    pub fn set_wf_group_index(&mut self, index: Option<u32>) -> &mut Self {
        self.wf_group_index = index;
        self
    }
    pub fn set_id_version(&mut self, id_version: IdVersion) -> &mut Self {
        self.id_version = id_version;
        self
    }

    /// seed ascending (null seeds last), rating descending, registration
    /// timestamp ascending, team id ascending — the canonical order shared by
    /// the grouping engine and team injection. `f64` has no total order, so
    /// this compares by key rather than deriving `Ord` on a tuple.
    pub fn cmp_canonical(&self, other: &Team) -> std::cmp::Ordering {
        let seed_a = self.seed.unwrap_or(u32::MAX);
        let seed_b = other.seed.unwrap_or(u32::MAX);
        seed_a
            .cmp(&seed_b)
            .then_with(|| {
                let rating_a = self.rating.unwrap_or(f64::MIN);
                let rating_b = other.rating.unwrap_or(f64::MIN);
                rating_b.total_cmp(&rating_a)
            })
            .then_with(|| {
                let reg_a = self.registered_at.map(|t| t.timestamp()).unwrap_or(i64::MAX);
                let reg_b = other.registered_at.map(|t| t.timestamp()).unwrap_or(i64::MAX);
                reg_a.cmp(&reg_b)
            })
            .then_with(|| self.get_id().unwrap_or(Uuid::nil()).cmp(&other.get_id().unwrap_or(Uuid::nil())))
    }
}

/// undirected avoid-edge between two teams of the same event. Stored in
/// canonical `(team_id_a < team_id_b)` form so equal pairs, regardless of
/// construction order, collide on the same uniqueness key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvoidEdge {
    id_version: IdVersion,
    event_id: Uuid,
    team_id_a: Uuid,
    team_id_b: Uuid,
    reason: Option<String>,
}

impl ObjectIdVersion for AvoidEdge {
    fn get_id_version(&self) -> IdVersion {
        self.id_version
    }
}

impl AvoidEdge {
    /// canonicalizes the pair and rejects self-edges.
    pub fn new(
        id_version: IdVersion,
        event_id: Uuid,
        team_x: Uuid,
        team_y: Uuid,
        reason: Option<String>,
    ) -> CoreResult<Self> {
        if team_x == team_y {
            return Err(CoreError::SelfEdge { team_id: team_x });
        }
        let (team_id_a, team_id_b) = if team_x < team_y {
            (team_x, team_y)
        } else {
            (team_y, team_x)
        };
        Ok(Self {
            id_version,
            event_id,
            team_id_a,
            team_id_b,
            reason: normalize_opt(reason),
        })
    }

    pub fn get_event_id(&self) -> Uuid {
        self.event_id
    }
    pub fn get_team_id_a(&self) -> Uuid {
        self.team_id_a
    }
    pub fn get_team_id_b(&self) -> Uuid {
        self.team_id_b
    }
    pub fn get_reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
    pub fn canonical_pair(&self) -> (Uuid, Uuid) {
        (self.team_id_a, self.team_id_b)
    }
    pub fn connects(&self, team_id: Uuid) -> bool {
        self.team_id_a == team_id || self.team_id_b == team_id
    }
    pub fn other(&self, team_id: Uuid) -> Option<Uuid> {
        if self.team_id_a == team_id {
            Some(self.team_id_b)
        } else if self.team_id_b == team_id {
            Some(self.team_id_a)
        } else {
            None
        }
    }
}
