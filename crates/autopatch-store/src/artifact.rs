use std::path::Path;

use autopatch_core::artifact::commit_message;
use autopatch_core::subject::{decorate_subject, plain_subject, Decoration};

use crate::StoreError;

/// Rewrite the subject prefix of an artifact in place. Returns `false`
/// when there was nothing to decorate and the file was left alone.
pub fn decorate_artifact(path: &Path, decoration: &Decoration<'_>) -> Result<bool, StoreError> {
    let text = std::fs::read_to_string(path)?;
    let Some(decorated) = decorate_subject(&text, decoration) else {
        return Ok(false);
    };
    if decorated != text {
        std::fs::write(path, decorated)?;
    }
    tracing::debug!(path = %path.display(), "decorated subject");
    Ok(true)
}

/// Put an artifact's subject back to a plain `[PATCH]`. Returns whether
/// the file changed.
pub fn strip_decoration(path: &Path) -> Result<bool, StoreError> {
    let text = std::fs::read_to_string(path)?;
    let plain = plain_subject(&text);
    if plain == text {
        return Ok(false);
    }
    std::fs::write(path, plain)?;
    tracing::debug!(path = %path.display(), "reset subject to plain [PATCH]");
    Ok(true)
}

/// Commit message carried by an artifact, `None` if it has no subject.
pub fn read_commit_message(path: &Path) -> Result<Option<String>, StoreError> {
    let text = std::fs::read_to_string(path)?;
    Ok(commit_message(&text))
}
