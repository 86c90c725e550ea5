use autopatch_git::Vcs;
use autopatch_store::Workspace;

use crate::FlowError;

/// How far back `update_applied` looks for merged commits.
pub const APPLIED_WINDOW: &str = "120.days.ago";

/// Mark records whose title matches a recent upstream commit by the
/// configured author as applied. Returns the updated titles.
pub fn update_applied(workspace: &mut Workspace, vcs: &dyn Vcs) -> Result<Vec<String>, FlowError> {
    if workspace.registry().list().iter().all(|c| c.status == autopatch_core::Status::Applied) {
        return Ok(Vec::new());
    }
    let author = vcs.author_email()?;
    let subjects = vcs.subjects_since(&author, APPLIED_WINDOW)?;
    tracing::debug!(author, found = subjects.len(), "recent upstream subjects");

    let updated = workspace.registry_mut().mark_applied(&subjects);
    workspace.flush()?;
    tracing::info!(count = updated.len(), "marked applied");
    Ok(updated)
}
