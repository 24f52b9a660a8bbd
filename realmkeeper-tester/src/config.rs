use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use realmkeeper_game::ConfigSource;

/// Config overrides stored as `<dir>/<name>.json`.
///
/// Without a directory every lookup misses and callers fall back to the
/// built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigDir {
    root: Option<PathBuf>,
}

impl ConfigDir {
    pub const fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    fn path_for(&self, name: &str) -> Option<PathBuf> {
        self.root
            .as_ref()
            .map(|root| root.join(format!("{name}.json")))
    }
}

impl ConfigSource for ConfigDir {
    type Error = io::Error;

    fn load_raw(&self, name: &str) -> Result<Option<String>, Self::Error> {
        let Some(path) = self.path_for(name) else {
            return Ok(None);
        };
        match fs::read_to_string(&path) {
            Ok(json) => {
                debug!("loaded {name} override from {}", path.display());
                Ok(Some(json))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use realmkeeper_game::{LevyRounding, MemoryStore, load_event_catalog, open_ledger};

    fn scratch_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "realmkeeper-config-{label}-{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn no_directory_means_defaults() {
        let source = ConfigDir::default();
        assert!(source.root().is_none());
        assert_eq!(source.load_raw("ledger").unwrap(), None);
        let ledger = open_ledger(MemoryStore::new(), &source).unwrap();
        assert_eq!(ledger.config().faction_slots, 5);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let source = ConfigDir::new(Some(scratch_dir("missing")));
        assert_eq!(source.load_raw("random_events").unwrap(), None);
        assert!(!load_event_catalog(&source).unwrap().events.is_empty());
    }

    #[test]
    fn reads_ledger_override() {
        let dir = scratch_dir("override");
        fs::write(
            dir.join("ledger.json"),
            r#"{"faction_slots": 3, "levy_rounding": "round"}"#,
        )
        .unwrap();
        let ledger = open_ledger(MemoryStore::new(), &ConfigDir::new(Some(dir))).unwrap();
        assert_eq!(ledger.config().faction_slots, 3);
        assert_eq!(ledger.config().levy_rounding, LevyRounding::Round);
    }

    #[test]
    fn unreadable_path_surfaces_io_error() {
        let dir = scratch_dir("unreadable");
        fs::create_dir_all(dir.join("ledger.json")).unwrap();
        let source = ConfigDir::new(Some(dir));
        assert!(source.load_raw("ledger").is_err());
        assert!(open_ledger(MemoryStore::new(), &source).is_err());
    }
}
