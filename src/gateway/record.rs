//! Ticket records as the ticket API sends them.
//!
//! The API nests the parent project, and the project's creator, inside every
//! ticket. The board flattens that into `Ticket::project_owner_id` on read.

use crate::domain::{
    ProjectId, Ticket, TicketId, TicketPriority, TicketStatus, TicketType, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

impl PersonRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: String::new(),
            name: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub project_key: String,
    #[serde(rename = "userId")]
    pub owner: PersonRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "projectId")]
    pub project: ProjectRef,
    pub assignee: PersonRef,
    pub ticket_title: String,
    #[serde(default)]
    pub ticket_description: String,
    #[serde(default)]
    pub ticket_type: TicketType,
    #[serde(default)]
    pub ticket_priority: TicketPriority,
    pub ticket_status: TicketStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<TicketRecord> for Ticket {
    fn from(record: TicketRecord) -> Self {
        let assignee_email = Some(record.assignee.email).filter(|email| !email.is_empty());
        Self {
            id: TicketId::new(record.id),
            project_id: ProjectId::new(record.project.id),
            project_owner_id: UserId::new(record.project.owner.id),
            assignee_id: UserId::new(record.assignee.id),
            assignee_email,
            title: record.ticket_title,
            description: record.ticket_description,
            ticket_type: record.ticket_type,
            priority: record.ticket_priority,
            status: record.ticket_status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Body of the full-record edit call.
///
/// `assignee` is the assignee's email when known, otherwise their id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketEdit {
    pub ticket_title: String,
    pub ticket_description: String,
    pub assignee: String,
    pub ticket_type: TicketType,
    pub ticket_priority: TicketPriority,
    pub ticket_status: TicketStatus,
}

impl TicketEdit {
    /// The ticket's current fields with only the status changed
    pub fn moving(ticket: &Ticket, status: TicketStatus) -> Self {
        Self {
            ticket_title: ticket.title.clone(),
            ticket_description: ticket.description.clone(),
            assignee: ticket
                .assignee_email
                .clone()
                .unwrap_or_else(|| ticket.assignee_id.to_string()),
            ticket_type: ticket.ticket_type,
            ticket_priority: ticket.priority,
            ticket_status: status,
        }
    }
}
