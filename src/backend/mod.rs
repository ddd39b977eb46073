//! Backend-of-record collaborator
//!
//! This module defines the minimal REST surface the engine depends on:
//!
//! - `GET /reservations`
//! - `POST /reservations`
//! - `PUT /reservations/:id`
//! - `DELETE /reservations/:id`
//! - `GET /reservations/availability?arrivalDate&departureDate&roomType`
//!
//! - [`wire`] - server record shapes and their mapping onto the domain model
//! - [`http`] - `reqwest` implementation
//! - [`memory`] - in-process implementation for tests and offline use

pub mod http;
pub mod memory;
pub mod wire;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::OpsError;

pub use http::HttpBackend;
pub use memory::InMemoryBackend;
pub use wire::{ReservationPayload, ServerReservation, ServerStatus, WireMapper};

/// Failure reported by the backend collaborator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// The request never produced a response
    #[error("network error: {message}")]
    Network {
        /// Transport-level description, not shown to users
        message: String,
    },

    /// The server answered with a non-success status
    #[error("server rejected request with status {status}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Message from the error body, when the server supplied one
        message: Option<String>,
    },
}

/// Backend operations, used to pick the fallback message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendOperation {
    List,
    Create,
    Update,
    Delete,
    Availability,
}

impl BackendOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendOperation::List => "list reservations",
            BackendOperation::Create => "create reservation",
            BackendOperation::Update => "update reservation",
            BackendOperation::Delete => "delete reservation",
            BackendOperation::Availability => "check availability",
        }
    }

    /// Generic message used when the server supplied none
    pub fn fallback_message(&self) -> &'static str {
        match self {
            BackendOperation::List => "Failed to load reservations.",
            BackendOperation::Create => "Failed to create reservation.",
            BackendOperation::Update => "Failed to update reservation.",
            BackendOperation::Delete => "Failed to delete reservation.",
            BackendOperation::Availability => "Failed to check availability.",
        }
    }
}

impl BackendError {
    /// Convert into the engine error, keeping the server's message unchanged when present
    pub fn into_ops(self, operation: BackendOperation) -> OpsError {
        let message = match self {
            BackendError::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message,
            _ => operation.fallback_message().to_string(),
        };
        OpsError::backend(operation.as_str(), &message)
    }
}

/// Query for remaining inventory of one room type over a date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    /// Room type short code
    pub room_type: String,
}

/// A room the backend reports as free for the queried range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableRoom {
    pub id: String,
    #[serde(default)]
    pub number: Option<String>,
}

/// Authoritative remaining-room count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    #[serde(default)]
    pub available_rooms: Vec<AvailableRoom>,
    pub total_available: u32,
}

/// Backend REST collaborator
#[async_trait]
pub trait ReservationBackend: Send + Sync {
    async fn list_reservations(&self) -> Result<Vec<ServerReservation>, BackendError>;

    async fn create_reservation(
        &self,
        payload: &ReservationPayload,
    ) -> Result<ServerReservation, BackendError>;

    /// Partial update; the payload carries any subset of fields
    async fn update_reservation(
        &self,
        id: &str,
        payload: &ReservationPayload,
    ) -> Result<ServerReservation, BackendError>;

    /// Hard delete
    async fn delete_reservation(&self, id: &str) -> Result<(), BackendError>;

    async fn availability(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<AvailabilityResponse, BackendError>;
}
