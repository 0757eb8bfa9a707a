use crate::{
    domain::{Project, ProjectId, TicketId, TicketStatus, UserId},
    error::{Result, TaskboardError},
    gateway::{
        record::{PersonRef, ProjectRef, TicketEdit, TicketRecord},
        ApiResponse, TicketGateway, ALL_TICKETS_FIELD, EDITED_TICKET_FIELD, UPDATED_TICKET_FIELD,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Ticket API backed by JSON files on disk.
///
/// Each ticket is one `TicketRecord` document under `.taskboard/tickets/`.
/// Responses are shaped like the remote API's, so the board cannot tell the
/// two apart.
pub struct FileGateway {
    root_path: PathBuf,
}

impl FileGateway {
    const TASKBOARD_DIR: &'static str = ".taskboard";
    const TICKETS_DIR: &'static str = "tickets";

    /// Creates a gateway rooted at the given project directory
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root_path: project_root.as_ref().join(Self::TASKBOARD_DIR),
        }
    }

    /// Directory holding `config.toml`
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn tickets_dir(&self) -> PathBuf {
        self.root_path.join(Self::TICKETS_DIR)
    }

    /// Path of a ticket document. Ids that could leave `tickets/` are refused.
    fn ticket_file(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(TaskboardError::InvalidTicketId(id.to_string()));
        }
        Ok(self.tickets_dir().join(format!("{}.json", id)))
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    pub async fn initialize(&self) -> Result<()> {
        self.ensure_directory_exists(&self.tickets_dir()).await
    }

    pub async fn is_initialized(&self) -> bool {
        self.tickets_dir().exists()
    }

    pub async fn save_record(&self, record: &TicketRecord) -> Result<()> {
        self.ensure_directory_exists(&self.tickets_dir()).await?;

        let json = serde_json::to_string_pretty(record)?;
        fs::write(self.ticket_file(&record.id)?, json).await?;
        Ok(())
    }

    pub async fn load_record(&self, id: &TicketId) -> Result<TicketRecord> {
        let file_path = self.ticket_file(id.as_str())?;

        if !file_path.exists() {
            return Err(TaskboardError::TicketNotFound(id.to_string()));
        }

        let contents = fs::read_to_string(&file_path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Stores a new `To Do` ticket in `project`, assigned to `assignee`.
    ///
    /// The assignee must be the owner or a team member of the project.
    pub async fn create_ticket(
        &self,
        project: &Project,
        assignee: &UserId,
        title: &str,
    ) -> Result<TicketRecord> {
        if !project.is_member(assignee) {
            return Err(TaskboardError::NotAMember(assignee.to_string()));
        }

        let record = TicketRecord {
            id: TicketId::generate().to_string(),
            project: ProjectRef {
                id: project.id.to_string(),
                project_name: project.name.clone(),
                project_key: project.key.clone(),
                owner: PersonRef::new(project.owner_id.as_str()),
            },
            assignee: PersonRef::new(assignee.as_str()),
            ticket_title: title.to_string(),
            ticket_description: String::new(),
            ticket_type: Default::default(),
            ticket_priority: Default::default(),
            ticket_status: TicketStatus::ToDo,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.save_record(&record).await?;
        Ok(record)
    }

    pub async fn delete_ticket(&self, id: &TicketId) -> Result<()> {
        let file_path = self.ticket_file(id.as_str())?;

        if !file_path.exists() {
            return Err(TaskboardError::TicketNotFound(id.to_string()));
        }

        fs::remove_file(file_path).await?;
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<TicketRecord>> {
        let tickets_dir = self.tickets_dir();

        if !tickets_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&tickets_dir).await?;
        let mut records = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                let contents = fs::read_to_string(&path).await?;
                records.push(serde_json::from_str::<TicketRecord>(&contents)?);
            }
        }

        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    /// Like `load_record`, with a missing or unstorable id as `None`
    async fn find_record(&self, id: &TicketId) -> Result<Option<TicketRecord>> {
        match self.load_record(id).await {
            Ok(record) => Ok(Some(record)),
            Err(TaskboardError::TicketNotFound(_) | TaskboardError::InvalidTicketId(_)) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl TicketGateway for FileGateway {
    async fn fetch_tickets(&self, project_id: &ProjectId) -> Result<ApiResponse> {
        let records: Vec<TicketRecord> = self
            .list_records()
            .await?
            .into_iter()
            .filter(|record| record.project.id == project_id.as_str())
            .collect();

        debug!(project = %project_id, count = records.len(), "fetched tickets from disk");
        Ok(ApiResponse::ok(ALL_TICKETS_FIELD, serde_json::to_value(records)?))
    }

    async fn update_ticket(&self, id: &TicketId, edit: &TicketEdit) -> Result<ApiResponse> {
        let Some(mut record) = self.find_record(id).await? else {
            return Ok(ApiResponse::error(404, "Ticket not found"));
        };

        if edit.assignee != record.assignee.id && edit.assignee != record.assignee.email {
            return Ok(ApiResponse::error(400, "Assignee is not a member of this project"));
        }

        record.ticket_title = edit.ticket_title.clone();
        record.ticket_description = edit.ticket_description.clone();
        record.ticket_type = edit.ticket_type;
        record.ticket_priority = edit.ticket_priority;
        record.ticket_status = edit.ticket_status;
        record.updated_at = Some(Utc::now());
        self.save_record(&record).await?;

        Ok(ApiResponse::ok(EDITED_TICKET_FIELD, serde_json::to_value(&record)?))
    }

    async fn update_ticket_status(
        &self,
        id: &TicketId,
        status: TicketStatus,
    ) -> Result<ApiResponse> {
        let Some(mut record) = self.find_record(id).await? else {
            return Ok(ApiResponse::error(404, "Ticket not found"));
        };

        record.ticket_status = status;
        record.updated_at = Some(Utc::now());
        self.save_record(&record).await?;

        Ok(ApiResponse::ok(UPDATED_TICKET_FIELD, serde_json::to_value(&record)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Ticket;
    use tempfile::TempDir;

    fn project() -> Project {
        let mut project = Project::new(
            ProjectId::from("p1"),
            UserId::from("u1"),
            "Website".to_string(),
            "WEB".to_string(),
        );
        project.add_member(UserId::from("u2"));
        project.add_member(UserId::from("u3"));
        project
    }

    #[tokio::test]
    async fn test_gateway_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(temp_dir.path());

        assert!(!gateway.is_initialized().await);
        gateway.initialize().await.unwrap();
        assert!(gateway.is_initialized().await);
    }

    #[tokio::test]
    async fn test_create_and_load_ticket() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(temp_dir.path());

        let created = gateway
            .create_ticket(&project(), &UserId::from("u2"), "Write docs")
            .await
            .unwrap();
        let loaded = gateway
            .load_record(&TicketId::new(created.id.clone()))
            .await
            .unwrap();

        assert_eq!(loaded, created);
        assert_eq!(loaded.project.owner.id, "u1");
    }

    #[tokio::test]
    async fn test_fetch_filters_by_project() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(temp_dir.path());
        let mut other = project();
        other.id = ProjectId::from("p2");

        gateway.create_ticket(&project(), &UserId::from("u2"), "A").await.unwrap();
        gateway.create_ticket(&other, &UserId::from("u2"), "B").await.unwrap();
        gateway.create_ticket(&project(), &UserId::from("u3"), "C").await.unwrap();

        let response = gateway.fetch_tickets(&ProjectId::from("p1")).await.unwrap();
        let records: Vec<TicketRecord> = response.into_record(ALL_TICKETS_FIELD).unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.project.id == "p1"));
    }

    #[tokio::test]
    async fn test_fetch_on_empty_gateway() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(temp_dir.path());

        let response = gateway.fetch_tickets(&ProjectId::from("p1")).await.unwrap();
        let records: Vec<TicketRecord> = response.into_record(ALL_TICKETS_FIELD).unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_update_status_persists_and_stamps() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(temp_dir.path());
        let created = gateway
            .create_ticket(&project(), &UserId::from("u2"), "A")
            .await
            .unwrap();
        let id = TicketId::new(created.id.clone());

        let response = gateway
            .update_ticket_status(&id, TicketStatus::InProgress)
            .await
            .unwrap();
        let updated: TicketRecord = response.into_record(UPDATED_TICKET_FIELD).unwrap();

        assert_eq!(updated.ticket_status, TicketStatus::InProgress);
        assert!(updated.updated_at.is_some());
        assert_eq!(gateway.load_record(&id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_full_edit_checks_assignee() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(temp_dir.path());
        let created = gateway
            .create_ticket(&project(), &UserId::from("u2"), "A")
            .await
            .unwrap();
        let id = TicketId::new(created.id.clone());
        let ticket = Ticket::from(created);

        let edit = TicketEdit::moving(&ticket, TicketStatus::Done);
        let response = gateway.update_ticket(&id, &edit).await.unwrap();
        let edited: TicketRecord = response.into_record(EDITED_TICKET_FIELD).unwrap();
        assert_eq!(edited.ticket_status, TicketStatus::Done);

        let mut bad = TicketEdit::moving(&ticket, TicketStatus::ToDo);
        bad.assignee = "someone@else.com".to_string();
        let response = gateway.update_ticket(&id, &bad).await.unwrap();
        assert_eq!(response.status, 400);
        assert_eq!(
            gateway.load_record(&id).await.unwrap().ticket_status,
            TicketStatus::Done
        );
    }

    #[tokio::test]
    async fn test_update_missing_ticket_is_404() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(temp_dir.path());
        gateway.initialize().await.unwrap();

        let response = gateway
            .update_ticket_status(&TicketId::from("nope"), TicketStatus::Done)
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.message(), Some("Ticket not found"));
    }

    #[tokio::test]
    async fn test_delete_ticket() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(temp_dir.path());
        let created = gateway
            .create_ticket(&project(), &UserId::from("u2"), "A")
            .await
            .unwrap();
        let id = TicketId::new(created.id);

        gateway.delete_ticket(&id).await.unwrap();
        assert!(matches!(
            gateway.load_record(&id).await,
            Err(TaskboardError::TicketNotFound(_))
        ));
        assert!(gateway.delete_ticket(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_create_ticket_requires_member_assignee() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(temp_dir.path());

        let err = gateway
            .create_ticket(&project(), &UserId::from("u9"), "A")
            .await
            .unwrap_err();
        assert!(matches!(err, TaskboardError::NotAMember(_)));

        let owned = gateway
            .create_ticket(&project(), &UserId::from("u1"), "B")
            .await
            .unwrap();
        assert_eq!(owned.assignee.id, "u1");
    }

    #[tokio::test]
    async fn test_ids_cannot_escape_tickets_dir() {
        let temp_dir = TempDir::new().unwrap();
        let gateway = FileGateway::new(temp_dir.path());
        gateway.initialize().await.unwrap();
        std::fs::write(temp_dir.path().join(".taskboard").join("x.json"), "{}").unwrap();

        for id in ["../x", "a/b", "a\\b", "..", ""] {
            let id = TicketId::from(id);
            assert!(matches!(
                gateway.load_record(&id).await,
                Err(TaskboardError::InvalidTicketId(_))
            ));
            assert!(matches!(
                gateway.delete_ticket(&id).await,
                Err(TaskboardError::InvalidTicketId(_))
            ));
            let response = gateway
                .update_ticket_status(&id, TicketStatus::Done)
                .await
                .unwrap();
            assert_eq!(response.status, 404);
        }
        assert!(temp_dir.path().join(".taskboard").join("x.json").exists());
    }
}
