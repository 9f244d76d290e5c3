use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{IndexError, VectorIndex};

/// File name of the serialised index inside the index directory.
const INDEX_FILE: &str = "index.json";

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct IndexFileRef<'a> {
    format_version: u32,
    chunk_count: usize,
    index: &'a VectorIndex,
}

#[derive(Deserialize)]
struct IndexFile {
    format_version: u32,
    chunk_count: usize,
    index: VectorIndex,
}

fn index_path(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILE)
}

impl VectorIndex {
    /// Write the index to `dir`. The file is written to a temporary path and
    /// renamed into place, so a reader never sees a partial index.
    pub fn persist(&self, dir: &Path) -> Result<(), IndexError> {
        fs::create_dir_all(dir)?;
        let path = index_path(dir);
        let tmp = path.with_extension("json.tmp");

        let file = IndexFileRef {
            format_version: FORMAT_VERSION,
            chunk_count: self.len(),
            index: self,
        };
        let json = serde_json::to_vec(&file).map_err(|e| {
            IndexError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        info!(path = %path.display(), chunks = self.len(), "persisted index");
        Ok(())
    }

    /// Load an index previously written by [`VectorIndex::persist`].
    pub fn load(dir: &Path) -> Result<Self, IndexError> {
        let path = index_path(dir);
        if !path.is_file() {
            return Err(IndexError::NotFound(dir.display().to_string()));
        }

        let corrupt = |reason: String| IndexError::Corrupt {
            path: path.display().to_string(),
            reason,
        };

        let bytes = fs::read(&path).map_err(|e| corrupt(e.to_string()))?;
        let file: IndexFile = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;

        if file.format_version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported format version {}",
                file.format_version
            )));
        }
        if file.chunk_count != file.index.len() {
            return Err(corrupt(format!(
                "header says {} chunks, found {}",
                file.chunk_count,
                file.index.len()
            )));
        }
        file.index.validate().map_err(corrupt)?;

        debug!(path = %path.display(), chunks = file.index.len(), "loaded index");
        Ok(file.index)
    }
}
