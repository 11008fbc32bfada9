use super::WorkspaceError;
use crate::db::models::{Project, ProjectRuleset};
use crate::db::Database;

pub fn create_project(db: &Database, name: &str) -> Result<Project, WorkspaceError> {
    if name.trim().is_empty() {
        return Err(WorkspaceError::InvalidInput("project name is empty".into()));
    }
    let project = db.create_project(name, &ProjectRuleset::default())?;
    tracing::info!(project_id = %project.id, "project created");
    Ok(project)
}

pub fn list_projects(db: &Database) -> Result<Vec<Project>, WorkspaceError> {
    Ok(db.list_projects()?)
}

pub fn get_project(db: &Database, id: &str) -> Result<Project, WorkspaceError> {
    db.get_project(id)?
        .ok_or_else(|| WorkspaceError::NotFound(format!("project {}", id)))
}

/// The only mutation path for a project's rules. Stack entries that trim to
/// nothing are dropped; the remaining fields are stored as given, empty or
/// not.
pub fn update_ruleset(
    db: &Database,
    id: &str,
    mut ruleset: ProjectRuleset,
) -> Result<Project, WorkspaceError> {
    ruleset.tech_stack.retain(|entry| !entry.trim().is_empty());
    get_project(db, id)?;
    db.update_ruleset(id, &ruleset)?;
    get_project(db, id)
}

pub fn delete_project(db: &Database, id: &str) -> Result<(), WorkspaceError> {
    db.delete_project(id)?;
    tracing::info!(project_id = %id, "project deleted");
    Ok(())
}
