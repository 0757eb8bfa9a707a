//! Who may move which ticket to which column.
//!
//! The project owner may move any ticket anywhere. Anyone else may move a
//! ticket only when it is assigned to them, to any column. Everyone else is
//! refused. There are no further actor categories: a collaborator who is
//! neither owner nor assignee lands in the same refusal as a stranger.

use crate::domain::ticket::{Ticket, TicketStatus, UserId};
use serde::Serialize;
use std::{fmt, str::FromStr};

/// Why a move was allowed. Selects the update route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grant {
    Owner,
    Assignee,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    InvalidTargetStatus(String),
    NotOwnerOrAssignee,
}

impl DenyReason {
    /// Message suitable for a toast
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidTargetStatus(_) => "That column does not exist on this board",
            Self::NotOwnerOrAssignee => "You are not allowed to change status for other assignees",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTargetStatus(_) => write!(f, "invalid target status"),
            Self::NotOwnerOrAssignee => write!(f, "actor is neither owner nor assignee"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The move may go ahead to the validated `target`
    Allow { grant: Grant, target: TicketStatus },
    Deny(DenyReason),
}

/// Decides a move whose target arrives as raw text from the caller
pub fn authorize(actor: &UserId, ticket: &Ticket, target: &str) -> Decision {
    match TicketStatus::from_str(target) {
        Ok(status) => authorize_status(actor, ticket, status),
        Err(_) => Decision::Deny(DenyReason::InvalidTargetStatus(target.to_string())),
    }
}

/// Decides a move to an already validated status
pub fn authorize_status(actor: &UserId, ticket: &Ticket, target: TicketStatus) -> Decision {
    if ticket.is_owned_by(actor) {
        Decision::Allow {
            grant: Grant::Owner,
            target,
        }
    } else if ticket.is_assigned_to(actor) {
        Decision::Allow {
            grant: Grant::Assignee,
            target,
        }
    } else {
        Decision::Deny(DenyReason::NotOwnerOrAssignee)
    }
}
