//! `reqwest` implementation of [`ReservationBackend`]

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{
    AvailabilityQuery, AvailabilityResponse, BackendError, ReservationBackend, ReservationPayload,
    ServerReservation,
};

/// Error body returned by the backend on non-success responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the reservation backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Build a client against `base_url` (e.g. `https://pms.example.com/api`)
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let response = Self::check(response).await?;
        response.json::<T>().await.map_err(network)
    }

    /// Turn a non-success status into `Rejected`, reading `message` from the body
    async fn check(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message);
        warn!(status = status.as_u16(), ?message, "backend rejected request");
        Err(BackendError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

fn network(error: reqwest::Error) -> BackendError {
    BackendError::Network {
        message: error.to_string(),
    }
}

#[async_trait]
impl ReservationBackend for HttpBackend {
    async fn list_reservations(&self) -> Result<Vec<ServerReservation>, BackendError> {
        debug!("GET /reservations");
        let response = self
            .client
            .get(self.url("reservations"))
            .send()
            .await
            .map_err(network)?;
        Self::decode(response).await
    }

    async fn create_reservation(
        &self,
        payload: &ReservationPayload,
    ) -> Result<ServerReservation, BackendError> {
        debug!("POST /reservations");
        let response = self
            .client
            .post(self.url("reservations"))
            .json(payload)
            .send()
            .await
            .map_err(network)?;
        Self::decode(response).await
    }

    async fn update_reservation(
        &self,
        id: &str,
        payload: &ReservationPayload,
    ) -> Result<ServerReservation, BackendError> {
        debug!(reservation = id, "PUT /reservations/:id");
        let response = self
            .client
            .put(self.url(&format!("reservations/{id}")))
            .json(payload)
            .send()
            .await
            .map_err(network)?;
        Self::decode(response).await
    }

    async fn delete_reservation(&self, id: &str) -> Result<(), BackendError> {
        debug!(reservation = id, "DELETE /reservations/:id");
        let response = self
            .client
            .delete(self.url(&format!("reservations/{id}")))
            .send()
            .await
            .map_err(network)?;
        Self::check(response).await.map(|_| ())
    }

    async fn availability(
        &self,
        query: &AvailabilityQuery,
    ) -> Result<AvailabilityResponse, BackendError> {
        debug!(room_type = %query.room_type, "GET /reservations/availability");
        let response = self
            .client
            .get(self.url("reservations/availability"))
            .query(&[
                ("arrivalDate", query.arrival_date.to_string()),
                ("departureDate", query.departure_date.to_string()),
                ("roomType", query.room_type.clone()),
            ])
            .send()
            .await
            .map_err(network)?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://localhost:8080/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            backend.url("reservations"),
            "http://localhost:8080/api/reservations"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();

        let result = backend.list_reservations().await;

        assert!(matches!(result, Err(BackendError::Network { .. })));
    }
}
