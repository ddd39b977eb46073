//! Guest profile types
//!
//! Guests are owned independently of reservations and referenced by id. The engine
//! never deletes a guest.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Guest identifier
pub type GuestId = String;

/// Postal address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Guest identity and contact details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: GuestId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Address,
    /// Free-form preferences (pillow type, floor, dietary notes, ...)
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
}

impl Guest {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Profile for a guest created together with a reservation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGuest {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
}

impl NewGuest {
    /// Turn the profile into a guest with the given id
    pub fn into_guest(self, id: GuestId) -> Guest {
        Guest {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            preferences: self.preferences,
        }
    }
}

/// Guest reference supplied when creating a reservation
#[derive(Debug, Clone, PartialEq)]
pub enum GuestSelection {
    /// Guest already registered
    Existing(GuestId),
    /// Guest registered as part of the booking
    New(NewGuest),
}
