//! Drives a single card move from drop to commit.
//!
//! A move resolves its ticket from the board, asks the authorizer, sends the
//! update through the gateway and, only once the server answers with a
//! ticket record, writes that record into the board. Denials and failures
//! leave the board exactly as it was. There is no optimistic update.

use crate::{
    config::{MoveConfig, OwnerRoute, TaskboardConfig},
    domain::{
        authorize, Board, Columns, Decision, DenyReason, Grant, ProjectId, Ticket, TicketId,
        UserId,
    },
    error::{Result, TaskboardError},
    gateway::{
        TicketEdit, TicketGateway, TicketRecord, ALL_TICKETS_FIELD, EDITED_TICKET_FIELD,
        UPDATED_TICKET_FIELD,
    },
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Board shared between the coordinator and whatever renders it
pub type SharedBoard = Arc<RwLock<Board>>;

/// A card dropped onto a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropEvent {
    pub ticket_id: TicketId,
    pub target_column: String,
}

impl DropEvent {
    pub fn new(ticket_id: TicketId, target_column: impl Into<String>) -> Self {
        Self {
            ticket_id,
            target_column: target_column.into(),
        }
    }
}

/// One requested move, alive for the duration of that move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveIntent {
    pub ticket_id: TicketId,
    pub target: String,
    pub actor: UserId,
}

impl MoveIntent {
    pub fn from_drop(event: DropEvent, actor: UserId) -> Self {
        Self {
            ticket_id: event.ticket_id,
            target: event.target_column,
            actor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveFailure {
    #[error("ticket no longer exists")]
    TicketNotFound,

    #[error("a move for this ticket is already in progress")]
    MoveInProgress,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("malformed response")]
    MalformedResponse(String),

    #[error("board was closed or switched project while the move was in flight")]
    StaleBoard,
}

impl MoveFailure {
    /// Message suitable for a toast
    pub fn user_message(&self) -> String {
        match self {
            Self::TicketNotFound => "This ticket no longer exists, refresh the board".to_string(),
            Self::MoveInProgress => "This ticket is still being moved".to_string(),
            Self::Server { message, .. } if !message.is_empty() => message.clone(),
            _ => "Could not edit ticket status".to_string(),
        }
    }
}

impl From<TaskboardError> for MoveFailure {
    fn from(err: TaskboardError) -> Self {
        match err {
            TaskboardError::TicketNotFound(_) => Self::TicketNotFound,
            TaskboardError::Server { status, message } => Self::Server { status, message },
            TaskboardError::MalformedResponse(detail) => Self::MalformedResponse(detail),
            TaskboardError::Transport(detail) => Self::Transport(detail),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// How a move ended
#[derive(Debug, Clone, PartialEq)]
pub enum MoveResult {
    /// The server accepted the move; carries the server's record
    Committed(Ticket),
    Denied(DenyReason),
    Failed(MoveFailure),
}

impl MoveResult {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    /// Toast text for denials and failures
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Committed(_) => None,
            Self::Denied(reason) => Some(reason.user_message().to_string()),
            Self::Failed(failure) => Some(failure.user_message()),
        }
    }
}

/// Marks a ticket as having a move in flight until dropped
struct InFlight<'a> {
    moving: &'a Mutex<HashSet<TicketId>>,
    ticket_id: TicketId,
}

impl<'a> InFlight<'a> {
    fn acquire(moving: &'a Mutex<HashSet<TicketId>>, ticket_id: &TicketId) -> Option<Self> {
        let inserted = moving
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ticket_id.clone());
        inserted.then(|| Self {
            moving,
            ticket_id: ticket_id.clone(),
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.moving
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.ticket_id);
    }
}

pub struct MoveCoordinator<G> {
    gateway: G,
    board: SharedBoard,
    config: MoveConfig,
    moving: Mutex<HashSet<TicketId>>,
}

impl<G: TicketGateway> MoveCoordinator<G> {
    /// Creates a coordinator with its own empty board
    pub fn new(gateway: G, config: TaskboardConfig) -> Self {
        let board = Arc::new(RwLock::new(Board::new(config.board)));
        Self::with_board(gateway, board, config.moves)
    }

    /// Creates a coordinator writing into an existing board
    pub fn with_board(gateway: G, board: SharedBoard, config: MoveConfig) -> Self {
        Self {
            gateway,
            board,
            config,
            moving: Mutex::new(HashSet::new()),
        }
    }

    pub fn board(&self) -> SharedBoard {
        Arc::clone(&self.board)
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub async fn columns(&self) -> Columns {
        self.board.read().await.columns()
    }

    pub async fn ticket(&self, id: &TicketId) -> Option<Ticket> {
        self.board.read().await.get(id).cloned()
    }

    /// Fetches a project's tickets and loads them into the board
    pub async fn refresh(&self, project_id: &ProjectId) -> Result<usize> {
        let response = self.gateway.fetch_tickets(project_id).await?;
        let records: Vec<TicketRecord> = response.into_record(ALL_TICKETS_FIELD)?;
        let tickets: Vec<Ticket> = records.into_iter().map(Ticket::from).collect();

        let mut board = self.board.write().await;
        board.load(project_id.clone(), tickets);
        info!(project = %project_id, tickets = board.len(), "board loaded");
        Ok(board.len())
    }

    /// Removes a ticket that was deleted elsewhere
    pub async fn observe_deletion(&self, id: &TicketId) -> bool {
        let removed = self.board.write().await.remove(id).is_some();
        if removed {
            debug!(ticket = %id, "ticket removed from board");
        }
        removed
    }

    /// Tears the board down; responses still in flight will be discarded
    pub async fn close(&self) {
        self.board.write().await.close();
    }

    pub async fn handle_drop(&self, event: DropEvent, actor: &UserId) -> MoveResult {
        self.execute(MoveIntent::from_drop(event, actor.clone())).await
    }

    /// Runs every drop from `drops` in arrival order until the sender closes
    pub async fn drain_drops(
        &self,
        mut drops: mpsc::Receiver<DropEvent>,
        actor: &UserId,
    ) -> Vec<MoveResult> {
        let mut results = Vec::new();
        while let Some(event) = drops.recv().await {
            results.push(self.handle_drop(event, actor).await);
        }
        results
    }

    pub async fn request_move(
        &self,
        ticket_id: &TicketId,
        target: &str,
        actor: &UserId,
    ) -> MoveResult {
        self.execute(MoveIntent {
            ticket_id: ticket_id.clone(),
            target: target.to_string(),
            actor: actor.clone(),
        })
        .await
    }

    async fn execute(&self, intent: MoveIntent) -> MoveResult {
        let span = info_span!(
            "move",
            ticket = %intent.ticket_id,
            actor = %intent.actor,
            target = %intent.target
        );
        self.run(intent).instrument(span).await
    }

    async fn run(&self, intent: MoveIntent) -> MoveResult {
        let (ticket, decision, project) = {
            let board = self.board.read().await;
            let Some(ticket) = board.get(&intent.ticket_id).cloned() else {
                warn!("dropped ticket is not on the board");
                return MoveResult::Failed(MoveFailure::TicketNotFound);
            };
            let target = board
                .config
                .status_for_column(&intent.target)
                .map_or(intent.target.as_str(), |status| status.as_str());
            let decision = authorize(&intent.actor, &ticket, target);
            (ticket, decision, board.project_id().cloned())
        };
        debug!(from = %ticket.status, "move intent captured");

        let (grant, target) = match decision {
            Decision::Allow { grant, target } => (grant, target),
            Decision::Deny(reason) => {
                warn!(%reason, "move denied");
                return MoveResult::Denied(reason);
            }
        };

        let _in_flight = if self.config.guard_in_flight {
            match InFlight::acquire(&self.moving, &ticket.id) {
                Some(guard) => Some(guard),
                None => {
                    warn!("ticket already has a move in flight");
                    return MoveResult::Failed(MoveFailure::MoveInProgress);
                }
            }
        } else {
            None
        };

        let persisted = match (grant, self.config.owner_route) {
            (Grant::Owner, OwnerRoute::FullRecord) => {
                let edit = TicketEdit::moving(&ticket, target);
                match self.gateway.update_ticket(&ticket.id, &edit).await {
                    Ok(response) => response.into_record::<TicketRecord>(EDITED_TICKET_FIELD),
                    Err(e) => Err(e),
                }
            }
            _ => match self.gateway.update_ticket_status(&ticket.id, target).await {
                Ok(response) => response.into_record::<TicketRecord>(UPDATED_TICKET_FIELD),
                Err(e) => Err(e),
            },
        };

        let persisted = persisted.and_then(|record| {
            if record.id == ticket.id.as_str() {
                Ok(Ticket::from(record))
            } else {
                Err(TaskboardError::MalformedResponse(format!(
                    "record for `{}` returned for `{}`",
                    record.id, ticket.id
                )))
            }
        });

        let committed = match persisted {
            Ok(committed) => committed,
            Err(TaskboardError::MalformedResponse(detail)) => {
                error!(%detail, "update response carries no usable ticket record");
                return MoveResult::Failed(MoveFailure::MalformedResponse(detail));
            }
            Err(e) => {
                warn!(error = %e, "move could not be persisted");
                return MoveResult::Failed(e.into());
            }
        };

        let mut board = self.board.write().await;
        if board.project_id() != project.as_ref() {
            warn!("board was closed or switched project mid-move, discarding response");
            return MoveResult::Failed(MoveFailure::StaleBoard);
        }
        if !board.replace(committed.clone()) {
            debug!("ticket left the board before the move committed");
        }
        info!(status = %committed.status, "move committed");
        MoveResult::Committed(committed)
    }
}
