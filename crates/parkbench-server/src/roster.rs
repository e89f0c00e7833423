//! Short-TTL read-through cache over the live park roster.

use std::time::{Duration, Instant};

use sea_orm::{ConnectionTrait, DbErr};
use serde::Serialize;
use tokio::sync::RwLock;

use entity::checkin;

use crate::store;

pub const ROSTER_CACHE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActiveVisitorCheckin {
    pub id: String,
    pub name: String,
    pub checkin: checkin::Model,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ParkWithVisitors {
    pub id: String,
    pub name: String,
    pub visitors: Vec<ActiveVisitorCheckin>,
}

struct Snapshot {
    taken_at: Instant,
    parks: Vec<ParkWithVisitors>,
}

/// Single-slot snapshot of the roster aggregate.
///
/// The roster is a shared view, not per-user, so one global slot is enough.
/// Reads that find the slot empty or expired always recompute before
/// returning, and `invalidate` only clears the slot, so a concurrent
/// invalidate and read cannot leave the cache stale forever. Every mutating
/// engine operation invalidates unconditionally; an extra recompute beats
/// serving stale data.
pub struct RosterCache {
    ttl: Duration,
    slot: RwLock<Option<Snapshot>>,
}

impl RosterCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub async fn get<C: ConnectionTrait>(&self, conn: &C) -> Result<Vec<ParkWithVisitors>, DbErr> {
        {
            let slot = self.slot.read().await;
            if let Some(snapshot) = slot.as_ref() {
                if snapshot.taken_at.elapsed() < self.ttl {
                    return Ok(snapshot.parks.clone());
                }
            }
        }

        let parks = store::load_roster(conn).await?;

        let mut slot = self.slot.write().await;
        *slot = Some(Snapshot {
            taken_at: Instant::now(),
            parks: parks.clone(),
        });

        Ok(parks)
    }

    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        *slot = None;
    }
}
