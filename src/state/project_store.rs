//! Project registry
//!
//! Keyed by project id; every operation touches a single entry, so there is
//! no store-wide lock.

use crate::error::AppError;
use crate::state::models::{Project, ProjectId};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

/// Registry of projects, created on first reference
#[derive(Debug, Default)]
pub struct ProjectStore {
    projects: DashMap<ProjectId, Project>,
}

impl ProjectStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a project, creating it if this is the first reference
    ///
    /// `initial_image_url` is only used on creation; an existing project
    /// keeps the image it was created with.
    pub fn get_or_create(&self, project_id: &str, initial_image_url: Option<String>) -> Project {
        match self.projects.entry(project_id.to_string()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let project = Project::new(project_id.to_string(), initial_image_url);
                info!(
                    project_id = %project_id,
                    has_image = project.original_image_url.is_some(),
                    "Project created"
                );
                entry.insert(project.clone());
                project
            }
        }
    }

    /// Get a project by id
    pub fn get(&self, project_id: &str) -> Result<Project, AppError> {
        self.projects
            .get(project_id)
            .map(|p| p.clone())
            .ok_or_else(|| AppError::NotFound(format!("project {}", project_id)))
    }

    /// Record the latest reusable asset of a project
    ///
    /// Last write wins. Two jobs of the same project finishing close together
    /// race here, and nothing orders them.
    pub fn set_derived_asset(&self, project_id: &str, url: String) -> Result<(), AppError> {
        let mut project = self
            .projects
            .get_mut(project_id)
            .ok_or_else(|| AppError::NotFound(format!("project {}", project_id)))?;
        project.derived_asset_url = Some(url);
        project.updated_at = Utc::now();
        debug!(project_id = %project_id, "Derived asset updated");
        Ok(())
    }

    /// All projects, sorted by creation time
    pub fn list(&self) -> Vec<Project> {
        let mut projects: Vec<Project> = self.projects.iter().map(|p| p.clone()).collect();
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        projects
    }

    /// Number of projects
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
