//! Config file change notification.
//!
//! Windows are fixed once the scheduler runs, so a changed file is only
//! reported; picking it up takes a restart.

use std::path::Path;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

/// Start watching `path`. Drop the returned watcher to stop.
pub fn watch_config(path: &Path) -> notify::Result<RecommendedWatcher> {
    let watched = path.to_path_buf();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if requires_restart(&event) => {
            warn!(
                path = %watched.display(),
                "config file changed, restart required to apply"
            );
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "config watcher error"),
    })?;

    watcher.watch(path, RecursiveMode::NonRecursive)?;
    info!(path = %path.display(), "watching config file for changes");
    Ok(watcher)
}

fn requires_restart(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

#[cfg(test)]
mod tests {
    use notify::event::{AccessKind, CreateKind, DataChange, ModifyKind};

    use super::*;

    #[test]
    fn content_changes_require_restart() {
        assert!(requires_restart(&Event::new(EventKind::Modify(ModifyKind::Data(
            DataChange::Content
        )))));
        assert!(requires_restart(&Event::new(EventKind::Create(CreateKind::File))));
    }

    #[test]
    fn reads_are_ignored() {
        assert!(!requires_restart(&Event::new(EventKind::Access(AccessKind::Read))));
    }

    #[test]
    fn watches_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "windows: []\n").unwrap();
        assert!(watch_config(&path).is_ok());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(watch_config(&dir.path().join("missing.yaml")).is_err());
    }
}
