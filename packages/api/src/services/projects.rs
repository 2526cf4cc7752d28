use store::{Category, LocalCollection, Project, ProjectDraft, RecordId, StoreError};

use super::FallbackCollection;
use crate::events::{ChangeEvent, EventBus};
use crate::remote::{DocumentClient, RemoteCollection};

/// Remote collection holding the gallery.
pub const COLLECTION: &str = "projects";

/// The portfolio gallery.
#[derive(Debug)]
pub struct ProjectService<C> {
    records: FallbackCollection<Project, C>,
}

impl<C: DocumentClient> ProjectService<C> {
    pub fn new(client: C, local: LocalCollection<Project>, events: EventBus) -> Self {
        Self {
            records: FallbackCollection::new(
                RemoteCollection::new(client, COLLECTION),
                local,
                events,
                ChangeEvent::Project,
            ),
        }
    }

    pub async fn list(&self) -> Vec<Project> {
        self.records.list().await
    }

    pub async fn add(&self, draft: ProjectDraft) -> Result<Project, StoreError> {
        self.records.add(draft).await
    }

    pub async fn update(&self, project: &Project) -> Result<(), StoreError> {
        self.records.update(project).await
    }

    pub async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        self.records.delete(id).await
    }

    /// Show a hidden project or hide a shown one. Returns the stored version.
    pub async fn toggle_visibility(&self, project: &Project) -> Result<Project, StoreError> {
        let mut toggled = project.clone();
        toggled.visible = !toggled.visible;
        self.records.update(&toggled).await?;
        Ok(toggled)
    }

    /// What visitors see: visible projects, optionally of one category.
    pub async fn list_public(&self, category: Option<Category>) -> Vec<Project> {
        self.list()
            .await
            .into_iter()
            .filter(|p| p.visible)
            .filter(|p| category.map_or(true, |c| p.category == c))
            .collect()
    }

    /// Dashboard search over title, description and category.
    pub async fn search(&self, query: &str) -> Vec<Project> {
        self.list()
            .await
            .into_iter()
            .filter(|p| p.matches_query(query))
            .collect()
    }

    pub fn records(&self) -> &FallbackCollection<Project, C> {
        &self.records
    }
}
