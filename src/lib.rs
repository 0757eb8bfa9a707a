//! # TaskBoard Core
//!
//! Kanban board state machine and move authorization for TaskBoard projects.
//!
//! A [`MoveCoordinator`] owns one project's [`Board`] and turns card drops into
//! authorized, server-confirmed status changes through a [`TicketGateway`].
//! The board is only ever written with records the server returned.

pub mod config;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod gateway;

// Re-export commonly used types
pub use config::{MoveConfig, OwnerRoute, TaskboardConfig};
pub use coordinator::{DropEvent, MoveCoordinator, MoveFailure, MoveIntent, MoveResult, SharedBoard};
pub use domain::{
    authorize::{authorize, authorize_status, Decision, DenyReason, Grant},
    board::{Board, BoardConfig, Column, Columns},
    project::Project,
    ticket::{ProjectId, Ticket, TicketId, TicketPriority, TicketStatus, TicketType, UserId},
};
pub use error::{Result, TaskboardError};
pub use gateway::{ApiResponse, FileGateway, TicketGateway};
