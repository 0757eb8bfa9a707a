use crate::domain::ticket::{ProjectId, UserId};
use serde::{Deserialize, Serialize};

/// A project owning a board's tickets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: UserId,
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub team_members: Vec<UserId>,
}

impl Project {
    pub fn new(id: ProjectId, owner_id: UserId, name: String, key: String) -> Self {
        Self {
            id,
            owner_id,
            name,
            key,
            team_members: Vec::new(),
        }
    }

    /// Adds a collaborator, ignoring duplicates and the owner
    pub fn add_member(&mut self, user: UserId) {
        if user != self.owner_id && !self.team_members.contains(&user) {
            self.team_members.push(user);
        }
    }

    pub fn is_owner(&self, user: &UserId) -> bool {
        &self.owner_id == user
    }

    /// True for the owner and every team member
    pub fn is_member(&self, user: &UserId) -> bool {
        self.is_owner(user) || self.team_members.contains(user)
    }
}
