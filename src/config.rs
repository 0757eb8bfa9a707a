//! Board and move settings, loaded from `config.toml`.

use crate::{
    domain::BoardConfig,
    error::{Result, TaskboardError},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

const CONFIG_FILE: &str = "config.toml";

/// Which update call an owner's move goes through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerRoute {
    /// Resend the whole ticket with the new status (`UpdateTicket`)
    #[default]
    FullRecord,
    /// Send only the new status (`UpdateTicketStatus`)
    StatusOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveConfig {
    pub owner_route: OwnerRoute,
    /// Refuse a second move of a ticket while its first is still persisting
    pub guard_in_flight: bool,
}

impl Default for MoveConfig {
    fn default() -> Self {
        Self {
            owner_route: OwnerRoute::default(),
            guard_in_flight: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskboardConfig {
    pub board: BoardConfig,
    pub moves: MoveConfig,
}

impl TaskboardConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| TaskboardError::ConfigError(format!("failed to parse {}: {}", CONFIG_FILE, e)))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self)
            .map_err(|e| TaskboardError::ConfigError(format!("failed to serialize config: {}", e)))
    }

    /// Reads `config.toml` from `dir`, falling back to defaults when absent
    pub async fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).await.map_err(|e| {
            TaskboardError::ConfigError(format!("failed to read {}: {}", CONFIG_FILE, e))
        })?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TicketStatus;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = TaskboardConfig::default();
        assert_eq!(config.moves.owner_route, OwnerRoute::FullRecord);
        assert!(config.moves.guard_in_flight);
        assert_eq!(config.board.columns.len(), 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TaskboardConfig::from_toml_str(
            r#"
            [moves]
            owner_route = "status_only"
            "#,
        )
        .unwrap();

        assert_eq!(config.moves.owner_route, OwnerRoute::StatusOnly);
        assert!(config.moves.guard_in_flight);
        assert_eq!(config.board, BoardConfig::default());
    }

    #[test]
    fn test_custom_columns() {
        let config = TaskboardConfig::from_toml_str(
            r#"
            [board]
            name = "Sprint 4"

            [[board.columns]]
            name = "Backlog"
            status = "To Do"

            [[board.columns]]
            name = "Doing"
            status = "In Progress"

            [[board.columns]]
            name = "Shipped"
            status = "Done"
            "#,
        )
        .unwrap();

        assert_eq!(config.board.name, "Sprint 4");
        assert_eq!(config.board.status_for_column("Doing"), Some(TicketStatus::InProgress));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TaskboardConfig::from_toml_str("[moves]\nowner_route = \"sideways\"").unwrap_err();
        assert!(matches!(err, TaskboardError::ConfigError(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = TaskboardConfig::default();
        config.moves.guard_in_flight = false;
        let text = config.to_toml_string().unwrap();
        assert_eq!(TaskboardConfig::from_toml_str(&text).unwrap(), config);
    }

    #[tokio::test]
    async fn test_load_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = TaskboardConfig::load(temp_dir.path()).await.unwrap();
        assert_eq!(config, TaskboardConfig::default());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("config.toml"),
            "[moves]\nguard_in_flight = false\n",
        )
        .unwrap();

        let config = TaskboardConfig::load(temp_dir.path()).await.unwrap();
        assert!(!config.moves.guard_in_flight);
    }
}
