extern crate notify;

use notify::Watcher;

use crate::config::Config;
use crate::result;
use crate::scheduler::SchedulerHandle;

const DEBOUNCE: std::time::Duration = std::time::Duration::from_secs(2);

/// Keeps the file watch alive; dropping it stops reloading.
pub struct ConfigWatcher {
    _watcher: notify::RecommendedWatcher,
}

struct Reloader {
    path: std::path::PathBuf,
    handle: SchedulerHandle,
    debounce: std::time::Duration,
    last_reload: Option<std::time::Instant>,
}

impl Reloader {
    fn is_config(&self, path: &std::path::Path) -> bool {
        return path == self.path
            || std::fs::canonicalize(path).map(|p| p == self.path).unwrap_or(false);
    }

    /// Returns true if a new configuration was handed to the scheduler.
    fn on_event(&mut self, event: &notify::Event) -> bool {
        use notify::EventKind;

        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return false;
        }
        if !event.paths.iter().any(|p| self.is_config(p)) {
            return false;
        }
        // Editors tend to write a file in several steps.
        if let Some(last) = self.last_reload {
            if last.elapsed() < self.debounce {
                return false;
            }
        }
        self.last_reload = Some(std::time::Instant::now());

        info!("Config change detected: {}", self.path.display());
        match Config::load(&self.path) {
            Ok(config) => {
                info!("Reloaded config with {} page(s)", config.pages.len());
                self.handle.apply_config(config);
                return true;
            },
            Err(err) => {
                error!("Keeping previous config: {}", err);
                return false;
            },
        }
    }
}

/// Watches the directory holding `path` and hands every valid new version
/// of the file to the scheduler.
pub fn watch(path: &std::path::Path, handle: SchedulerHandle) -> result::DashResult<ConfigWatcher> {
    let path = std::fs::canonicalize(path)?;
    let dir = path.parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| std::path::PathBuf::from("."));

    let mut reloader = Reloader{
        path: path.clone(),
        handle: handle,
        debounce: DEBOUNCE,
        last_reload: None,
    };
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) => { reloader.on_event(&event); },
            Err(err) => warn!("Watch error: {}", err),
        }
    })?;
    watcher.watch(&dir, notify::RecursiveMode::NonRecursive)?;
    info!("Watching {} for changes", path.display());

    return Ok(ConfigWatcher{_watcher: watcher});
}

#[cfg(test)]
mod tests {
    extern crate notify;
    extern crate tempfile;

    use std::io::Write;

    use notify::event::{CreateKind, DataChange, EventKind, ModifyKind};

    use super::Reloader;
    use crate::config::Config;
    use crate::scheduler::SchedulerHandle;

    const VALID: &str = r#"{"global_settings": {}, "pages": [{"id": 7, "vvo_id_or_name": "Hbf"}]}"#;

    fn initial() -> Config {
        return Config::parse(r#"{"global_settings": {}, "pages": [{"id": 1, "vvo_id_or_name": "Postplatz"}]}"#)
            .expect("initial config");
    }

    fn write_config(file: &mut tempfile::NamedTempFile, contents: &str) {
        file.as_file_mut().set_len(0).expect("truncate");
        std::io::Seek::seek(file.as_file_mut(), std::io::SeekFrom::Start(0)).expect("seek");
        file.write_all(contents.as_bytes()).expect("write");
        file.flush().expect("flush");
    }

    fn reloader(file: &tempfile::NamedTempFile, handle: &SchedulerHandle, debounce_ms: u64) -> Reloader {
        return Reloader{
            path: std::fs::canonicalize(file.path()).expect("canonicalize"),
            handle: handle.clone(),
            debounce: std::time::Duration::from_millis(debounce_ms),
            last_reload: None,
        };
    }

    fn modified(path: &std::path::Path) -> notify::Event {
        return notify::Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(path.to_path_buf());
    }

    #[test]
    fn reload_swaps_config() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write_config(&mut file, VALID);
        let handle = SchedulerHandle::new(initial());
        let mut reloader = reloader(&file, &handle, 0);

        assert!(reloader.on_event(&modified(file.path())));
        assert_eq!(7, handle.config().pages[0].id);
    }

    #[test]
    fn create_events_count_too() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write_config(&mut file, VALID);
        let handle = SchedulerHandle::new(initial());
        let mut reloader = reloader(&file, &handle, 0);

        let event = notify::Event::new(EventKind::Create(CreateKind::File)).add_path(file.path().to_path_buf());
        assert!(reloader.on_event(&event));
    }

    #[test]
    fn invalid_config_keeps_previous() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write_config(&mut file, "{\"pages\": [");
        let handle = SchedulerHandle::new(initial());
        let mut reloader = reloader(&file, &handle, 0);

        assert!(!reloader.on_event(&modified(file.path())));
        assert_eq!(1, handle.config().pages[0].id);
    }

    #[test]
    fn other_files_and_events_are_ignored() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write_config(&mut file, VALID);
        let other = tempfile::NamedTempFile::new().expect("tempfile");
        let handle = SchedulerHandle::new(initial());
        let mut reloader = reloader(&file, &handle, 0);

        assert!(!reloader.on_event(&modified(other.path())));
        let access = notify::Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(file.path().to_path_buf());
        assert!(!reloader.on_event(&access));
        assert_eq!(1, handle.config().pages[0].id);
    }

    #[test]
    fn bursts_are_debounced() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write_config(&mut file, VALID);
        let handle = SchedulerHandle::new(initial());
        let mut reloader = reloader(&file, &handle, 60_000);

        assert!(reloader.on_event(&modified(file.path())));
        write_config(&mut file, r#"{"global_settings": {}, "pages": [{"id": 9, "vvo_id_or_name": "Hbf"}]}"#);
        assert!(!reloader.on_event(&modified(file.path())));
        assert_eq!(7, handle.config().pages[0].id);
    }
}
