use crate::domain::ticket::{ProjectId, Ticket, TicketId, TicketStatus};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, str::FromStr};

/// Configuration for a kanban board column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub status: TicketStatus,
}

impl Column {
    pub fn new(name: String, status: TicketStatus) -> Self {
        Self { name, status }
    }
}

/// Board configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub name: String,
    pub columns: Vec<Column>,
}

impl BoardConfig {
    /// Resolves a drop target to a status.
    ///
    /// Configured column titles win; otherwise the name is parsed as a status.
    pub fn status_for_column(&self, name: &str) -> Option<TicketStatus> {
        self.columns
            .iter()
            .find(|col| col.name.eq_ignore_ascii_case(name.trim()))
            .map(|col| col.status)
            .or_else(|| TicketStatus::from_str(name).ok())
    }

    pub fn column_for_status(&self, status: TicketStatus) -> Option<&Column> {
        self.columns.iter().find(|col| col.status == status)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            name: "Kanban Board".to_string(),
            columns: TicketStatus::ALL
                .iter()
                .map(|status| Column::new(status.to_string(), *status))
                .collect(),
        }
    }
}

/// Tickets grouped by column, in fetch order within each column
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Columns {
    pub to_do: Vec<Ticket>,
    pub in_progress: Vec<Ticket>,
    pub done: Vec<Ticket>,
}

impl Columns {
    pub fn get(&self, status: TicketStatus) -> &[Ticket] {
        match status {
            TicketStatus::ToDo => &self.to_do,
            TicketStatus::InProgress => &self.in_progress,
            TicketStatus::Done => &self.done,
        }
    }

    pub fn len(&self) -> usize {
        self.to_do.len() + self.in_progress.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory kanban board for one project.
///
/// Tickets are stored once, in fetch order. Column membership is derived from
/// each ticket's status on every read, so a ticket can never sit in two
/// columns. Writes happen through `load` and `replace` only.
#[derive(Debug, Default)]
pub struct Board {
    pub config: BoardConfig,
    project_id: Option<ProjectId>,
    tickets: Vec<Ticket>,
}

impl Board {
    pub fn new(config: BoardConfig) -> Self {
        Self {
            config,
            project_id: None,
            tickets: Vec::new(),
        }
    }

    /// Replaces the whole board with a freshly fetched ticket list.
    ///
    /// Repeated ids keep their first occurrence.
    pub fn load(&mut self, project_id: ProjectId, tickets: Vec<Ticket>) {
        let mut seen = HashSet::new();
        self.tickets = tickets
            .into_iter()
            .filter(|ticket| seen.insert(ticket.id.clone()))
            .collect();
        self.project_id = Some(project_id);
    }

    /// Drops all tickets and forgets the project
    pub fn close(&mut self) {
        self.tickets.clear();
        self.project_id = None;
    }

    /// Snapshot of the tickets in one column
    pub fn by_status(&self, status: TicketStatus) -> Vec<Ticket> {
        self.tickets
            .iter()
            .filter(|ticket| ticket.status == status)
            .cloned()
            .collect()
    }

    pub fn columns(&self) -> Columns {
        Columns {
            to_do: self.by_status(TicketStatus::ToDo),
            in_progress: self.by_status(TicketStatus::InProgress),
            done: self.by_status(TicketStatus::Done),
        }
    }

    pub fn get(&self, id: &TicketId) -> Option<&Ticket> {
        self.tickets.iter().find(|ticket| &ticket.id == id)
    }

    /// Overwrites the ticket with the same id in place.
    ///
    /// Returns `false` without touching the board if the id is unknown.
    pub fn replace(&mut self, ticket: Ticket) -> bool {
        match self.tickets.iter_mut().find(|t| t.id == ticket.id) {
            Some(slot) => {
                *slot = ticket;
                true
            }
            None => false,
        }
    }

    /// Forgets a ticket deleted elsewhere
    pub fn remove(&mut self, id: &TicketId) -> Option<Ticket> {
        let pos = self.tickets.iter().position(|ticket| &ticket.id == id)?;
        Some(self.tickets.remove(pos))
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn project_id(&self) -> Option<&ProjectId> {
        self.project_id.as_ref()
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}
