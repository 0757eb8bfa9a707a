use thiserror::Error;

pub type Result<T> = std::result::Result<T, TaskboardError>;

#[derive(Debug, Error)]
pub enum TaskboardError {
    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    #[error("Invalid ticket id: {0}")]
    InvalidTicketId(String),

    #[error("Not a member of this project: {0}")]
    NotAMember(String),

    #[error("Invalid ticket status: {0}")]
    InvalidStatus(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
