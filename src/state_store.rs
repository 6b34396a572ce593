//! Persistent state: items, settings, and the diagnostics ring buffer,
//! each a full-file JSON blob written atomically (write to a temp file,
//! then rename over the target).

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::models::{DiagnosticEntry, Item, Settings, DIAGNOSTICS_CAP};

#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub items: Vec<Item>,
    pub settings: Settings,
    pub diagnostics: VecDeque<DiagnosticEntry>,
}

/// Collaborator boundary for persistence so the scheduler and API layers
/// can be tested against an in-memory fake.
pub trait StateStore: Send + Sync {
    fn load(&self) -> io::Result<StateSnapshot>;
    fn save_items(&self, items: &[Item]) -> io::Result<()>;
    fn save_settings(&self, settings: &Settings) -> io::Result<()>;
    fn save_diagnostics(&self, diagnostics: &VecDeque<DiagnosticEntry>) -> io::Result<()>;
}

pub struct FileStateStore {
    items_path: PathBuf,
    settings_path: PathBuf,
    diagnostics_path: PathBuf,
}

impl FileStateStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            items_path: dir.join("items.json"),
            settings_path: dir.join("settings.json"),
            diagnostics_path: dir.join("diagnostics.json"),
        }
    }

    fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> io::Result<T> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents).unwrap_or_default()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(T::default()),
            Err(err) => Err(err),
        }
    }

    fn write_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
        let tmp_path = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(value)?;
        std::fs::write(&tmp_path, body)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> io::Result<StateSnapshot> {
        let items: Vec<Item> = Self::read_or_default(&self.items_path)?;
        let settings: Settings = match std::fs::read_to_string(&self.settings_path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Settings::default(),
            Err(err) => return Err(err),
        };
        let mut diagnostics: VecDeque<DiagnosticEntry> = Self::read_or_default(&self.diagnostics_path)?;
        while diagnostics.len() > DIAGNOSTICS_CAP {
            diagnostics.pop_back();
        }

        Ok(StateSnapshot {
            items,
            settings,
            diagnostics,
        })
    }

    fn save_items(&self, items: &[Item]) -> io::Result<()> {
        Self::write_atomic(&self.items_path, &items)
    }

    fn save_settings(&self, settings: &Settings) -> io::Result<()> {
        Self::write_atomic(&self.settings_path, settings)
    }

    fn save_diagnostics(&self, diagnostics: &VecDeque<DiagnosticEntry>) -> io::Result<()> {
        Self::write_atomic(&self.diagnostics_path, diagnostics)
    }
}
