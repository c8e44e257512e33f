//! The JSON envelope every endpoint answers with.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Uniform `{success, data|message, timestamp}` wrapper.
///
/// Optional members are omitted from the JSON when unset, so each route only
/// carries the fields its contract names.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T = ()> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contato_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> Envelope<T> {
    fn new(success: bool, data: Option<T>) -> Self {
        Self {
            success,
            data,
            message: None,
            error: None,
            total: None,
            contato_id: None,
            status: None,
            database: None,
            timestamp: Utc::now(),
        }
    }

    /// Successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self::new(true, Some(data))
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_contact_id(mut self, id: i64) -> Self {
        self.contato_id = Some(id);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}

impl Envelope<()> {
    /// Successful response without a `data` member.
    pub fn success() -> Self {
        Self::new(true, None)
    }

    /// Failed response; `error` carries the safe textual detail, if any.
    pub fn failure(message: impl Into<String>, error: Option<String>) -> Self {
        let mut envelope = Self::new(false, None).with_message(message);
        envelope.error = error;
        envelope
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
