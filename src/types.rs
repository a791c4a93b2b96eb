/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Lifecycle of a project row. A draft only ever moves to published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectStatus {
    Draft,
    Published,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "DRAFT",
            ProjectStatus::Published => "PUBLISHED",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_stored_value() {
        assert_eq!(serde_json::to_value(ProjectStatus::Draft).unwrap(), serde_json::json!("DRAFT"));
        let status: ProjectStatus = serde_json::from_value(serde_json::json!("PUBLISHED")).unwrap();
        assert_eq!(status, ProjectStatus::Published);
    }
}
