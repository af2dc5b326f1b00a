use serde::{Deserialize, Serialize};

/// A to-do entry. Unlike collection indices, task ids are never reused or
/// compacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: u64,
    pub text: String,
    pub completed: bool,
}

/// A user's to-do list. Plain CRUD, no reconciliation invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    #[serde(default)]
    pub tasks: Vec<TaskItem>,
}

impl TaskList {
    pub fn add(&mut self, text: &str) -> u64 {
        let id = self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        self.tasks.push(TaskItem {
            id,
            text: text.to_owned(),
            completed: false,
        });
        id
    }

    /// Flip completion; no-op on an unknown id.
    pub fn toggle(&mut self, id: u64) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            task.completed = !task.completed;
        }
    }

    /// Remove by id; no-op on an unknown id.
    pub fn remove(&mut self, id: u64) {
        self.tasks.retain(|t| t.id != id);
    }
}
