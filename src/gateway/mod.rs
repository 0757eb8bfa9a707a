use crate::{
    domain::{ProjectId, TicketId, TicketStatus},
    error::{Result, TaskboardError},
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub mod file_gateway;
pub mod record;

pub use file_gateway::FileGateway;
pub use record::{PersonRef, ProjectRef, TicketEdit, TicketRecord};

/// Field carrying the ticket list in a fetch response
pub const ALL_TICKETS_FIELD: &str = "allTickets";
/// Field carrying the ticket in a full-record edit response
pub const EDITED_TICKET_FIELD: &str = "editedTicket";
/// Field carrying the ticket in a status-only update response
pub const UPDATED_TICKET_FIELD: &str = "updatedTicket";

/// Status code and JSON body returned by the ticket API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// 200 response with `value` under `field`
    pub fn ok(field: &str, value: Value) -> Self {
        let mut body = Map::new();
        body.insert(field.to_string(), value);
        Self::new(200, Value::Object(body))
    }

    /// Error response carrying a `message`
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::new(status, json!({ "message": message.into() }))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The server's `message`, if the body has one
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }

    /// Decodes the record under `field` from a successful response.
    ///
    /// Non-success responses become `Server` errors, with an empty message
    /// when the body carries none. A success body missing
    /// the field, or holding something that does not decode, becomes
    /// `MalformedResponse`.
    pub fn into_record<T: DeserializeOwned>(self, field: &str) -> Result<T> {
        if !self.is_success() {
            return Err(TaskboardError::Server {
                status: self.status,
                message: self.message().unwrap_or_default().to_string(),
            });
        }

        let value = match self.body {
            Value::Object(mut map) => map.remove(field),
            _ => None,
        }
        .ok_or_else(|| TaskboardError::MalformedResponse(format!("missing `{}`", field)))?;

        serde_json::from_value(value)
            .map_err(|e| TaskboardError::MalformedResponse(format!("bad `{}`: {}", field, e)))
    }
}

/// The ticket API the board talks to.
///
/// Implementations return `Err(TaskboardError::Transport)` when the request
/// never produced a response. Every response that did arrive, including
/// error statuses, is returned as an `ApiResponse`.
#[async_trait]
pub trait TicketGateway: Send + Sync {
    /// Fetches every ticket of a project (`allTickets`)
    async fn fetch_tickets(&self, project_id: &ProjectId) -> Result<ApiResponse>;

    /// Full-record edit, used by project owners (`editedTicket`)
    async fn update_ticket(&self, id: &TicketId, edit: &TicketEdit) -> Result<ApiResponse>;

    /// Status-only update, used by assignees (`updatedTicket`)
    async fn update_ticket_status(
        &self,
        id: &TicketId,
        status: TicketStatus,
    ) -> Result<ApiResponse>;
}

#[async_trait]
impl<G: TicketGateway + ?Sized> TicketGateway for Arc<G> {
    async fn fetch_tickets(&self, project_id: &ProjectId) -> Result<ApiResponse> {
        (**self).fetch_tickets(project_id).await
    }

    async fn update_ticket(&self, id: &TicketId, edit: &TicketEdit) -> Result<ApiResponse> {
        (**self).update_ticket(id, edit).await
    }

    async fn update_ticket_status(
        &self,
        id: &TicketId,
        status: TicketStatus,
    ) -> Result<ApiResponse> {
        (**self).update_ticket_status(id, status).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_record_success() {
        let response = ApiResponse::ok("count", json!(3));
        let value: u32 = response.into_record("count").unwrap();
        assert_eq!(value, 3);
    }

    #[test]
    fn test_into_record_missing_field_is_malformed() {
        let response = ApiResponse::ok("somethingElse", json!(3));
        let err = response.into_record::<u32>("count").unwrap_err();
        assert!(matches!(err, TaskboardError::MalformedResponse(_)));
    }

    #[test]
    fn test_into_record_wrong_shape_is_malformed() {
        let response = ApiResponse::ok("count", json!("three"));
        let err = response.into_record::<u32>("count").unwrap_err();
        assert!(matches!(err, TaskboardError::MalformedResponse(_)));

        let response = ApiResponse::new(200, json!([1, 2]));
        let err = response.into_record::<u32>("count").unwrap_err();
        assert!(matches!(err, TaskboardError::MalformedResponse(_)));
    }

    #[test]
    fn test_into_record_error_status_carries_message() {
        let response = ApiResponse::error(403, "Not a team member");
        assert!(!response.is_success());
        assert_eq!(response.message(), Some("Not a team member"));

        match response.into_record::<u32>("count").unwrap_err() {
            TaskboardError::Server { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Not a team member");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_into_record_error_status_without_message() {
        let response = ApiResponse::new(500, json!({}));
        assert_eq!(response.message(), None);

        match response.into_record::<u32>("count").unwrap_err() {
            TaskboardError::Server { status, message } => {
                assert_eq!(status, 500);
                assert!(message.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
