pub mod authorize;
pub mod board;
pub mod project;
pub mod ticket;

pub use authorize::{authorize, authorize_status, Decision, DenyReason, Grant};
pub use board::{Board, BoardConfig, Column, Columns};
pub use project::Project;
pub use ticket::{ProjectId, Ticket, TicketId, TicketPriority, TicketStatus, TicketType, UserId};
