use super::recovery::{decode_state, encode_state};
use super::{Collection, CollectionState, DataStore, Record};
use crate::config::BillbookConfig;
use crate::error::{BillbookError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use uuid::Uuid;

pub struct FileStore {
    root: PathBuf,
    clients_file: String,
    invoices_file: String,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self::from_config(root, &BillbookConfig::default())
    }

    pub fn from_config(root: PathBuf, config: &BillbookConfig) -> Self {
        Self {
            root,
            clients_file: config.clients_file.clone(),
            invoices_file: config.invoices_file.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection_path(&self, collection: Collection) -> PathBuf {
        let file = match collection {
            Collection::Clients => &self.clients_file,
            Collection::Invoices => &self.invoices_file,
        };
        self.root.join(file)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }

    fn read_document(&self, path: &Path) -> Option<String> {
        match fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                // Unreadable counts as damaged: recovery resets it.
                error!(path = %path.display(), error = %e, "failed to read stored document");
                Some(String::new())
            }
        }
    }
}

impl DataStore for FileStore {
    fn load<R: Record>(&self) -> CollectionState<R> {
        let path = self.collection_path(R::COLLECTION);
        debug!(path = %path.display(), "loading collection");
        let raw = self.read_document(&path);
        decode_state(raw.as_deref())
    }

    fn save<R: Record>(&self, state: &CollectionState<R>) -> Result<()> {
        self.ensure_dir()?;
        let path = self.collection_path(R::COLLECTION);
        let content = encode_state(state)?;

        // Atomic write
        let tmp_file = self
            .root
            .join(format!(".{}-{}.tmp", R::COLLECTION.key(), Uuid::new_v4()));
        if let Err(e) = write_then_rename(&tmp_file, &path, &content) {
            let _ = fs::remove_file(&tmp_file);
            return Err(e);
        }

        debug!(path = %path.display(), records = state.len(), next_id = state.next_id, "saved collection");
        Ok(())
    }
}

fn write_then_rename(tmp_file: &Path, path: &Path, content: &str) -> Result<()> {
    fs::write(tmp_file, content)?;
    fs::rename(tmp_file, path).map_err(|e| {
        BillbookError::Store(format!("failed to replace {}: {}", path.display(), e))
    })
}
