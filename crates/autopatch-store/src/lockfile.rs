use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::StoreError;

const RETRIES: u32 = 5;
const RETRY_DELAY: Duration = Duration::from_millis(20);

/// Exclusive `<target>.lock` marker held while the workspace file is
/// rewritten. The marker holds the owner's pid.
pub struct WorkspaceLock {
    path: PathBuf,
}

impl WorkspaceLock {
    /// Take the lock, waiting briefly for a concurrent flush to finish.
    pub fn acquire(target: &Path) -> Result<Self, StoreError> {
        let path = target.with_extension("lock");
        for attempt in 0..=RETRIES {
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(mut marker) => {
                    writeln!(marker, "{}", std::process::id())?;
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if attempt < RETRIES {
                        std::thread::sleep(RETRY_DELAY);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        let holder = std::fs::read_to_string(&path).unwrap_or_default();
        tracing::warn!(lock = %path.display(), holder = holder.trim(), "workspace is locked");
        Err(StoreError::LockContention(path))
    }
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_contends_until_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("workspace.toml");

        let first = WorkspaceLock::acquire(&target).unwrap();
        let marker = std::fs::read_to_string(tmp.path().join("workspace.lock")).unwrap();
        assert_eq!(marker.trim(), std::process::id().to_string());
        assert!(matches!(
            WorkspaceLock::acquire(&target),
            Err(StoreError::LockContention(_))
        ));
        drop(first);
        assert!(WorkspaceLock::acquire(&target).is_ok());
        assert!(!tmp.path().join("workspace.lock").exists());
    }
}
