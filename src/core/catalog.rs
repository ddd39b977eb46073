//! Rate plan table and guest registry

use dashmap::DashMap;
use uuid::Uuid;

use crate::types::{Guest, GuestId, NewGuest, RatePlan, RatePlanId};

/// Read-mostly rate plan lookup table
#[derive(Debug, Default)]
pub struct RatePlanTable {
    plans: DashMap<RatePlanId, RatePlan>,
}

impl RatePlanTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, plan: RatePlan) {
        self.plans.insert(plan.id.clone(), plan);
    }

    pub fn get(&self, id: &str) -> Option<RatePlan> {
        self.plans.get(id).map(|entry| entry.value().clone())
    }

    pub fn by_code(&self, code: &str) -> Option<RatePlan> {
        self.plans
            .iter()
            .find(|entry| entry.value().code == code)
            .map(|entry| entry.value().clone())
    }

    /// All plans sorted by id
    pub fn all(&self) -> Vec<RatePlan> {
        let mut plans: Vec<RatePlan> = self.plans.iter().map(|e| e.value().clone()).collect();
        plans.sort_by(|a, b| a.id.cmp(&b.id));
        plans
    }
}

/// Guest profiles referenced by reservations
#[derive(Debug, Default)]
pub struct GuestRegistry {
    guests: DashMap<GuestId, Guest>,
}

impl GuestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an id to a new profile without registering it yet
    pub fn prepare(&self, profile: NewGuest) -> Guest {
        profile.into_guest(format!("guest-{}", Uuid::new_v4()))
    }

    pub fn upsert(&self, guest: Guest) {
        self.guests.insert(guest.id.clone(), guest);
    }

    pub fn get(&self, id: &str) -> Option<Guest> {
        self.guests.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.guests.contains_key(id)
    }

    pub fn all(&self) -> Vec<Guest> {
        let mut guests: Vec<Guest> = self.guests.iter().map(|e| e.value().clone()).collect();
        guests.sort_by(|a, b| a.id.cmp(&b.id));
        guests
    }
}
