//! App-private image storage
//!
//! Picked images are copied into a private directory under timestamp-derived
//! names (`img_<millis>.jpg`). Attachment rows store the absolute path of the
//! copy. Copies are never removed when a note or attachment row is deleted.

use crate::config::{IMAGE_FILE_EXTENSION, IMAGE_FILE_PREFIX};
use crate::database::now_millis;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Directory of imported images
#[derive(Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the directory if needed
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Image store initialized at: {:?}", self.root);
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy every source into the store, in order.
    ///
    /// Returns the absolute paths of the copies that succeeded; sources that
    /// fail to copy are left out of the result.
    pub async fn import_all(&self, sources: &[PathBuf]) -> Vec<String> {
        let mut copied = Vec::with_capacity(sources.len());

        for source in sources {
            match self.import(source).await {
                Ok(path) => copied.push(path.to_string_lossy().into_owned()),
                Err(e) => tracing::warn!("Skipping image {:?}: {}", source, e),
            }
        }

        copied
    }

    /// Copy one source into the store and return the absolute path of the copy
    pub async fn import(&self, source: &Path) -> Result<PathBuf> {
        let mut input = fs::File::open(source).await?;

        let path = self.claim_name().await?;

        // Write to temp file first so a failed copy never leaves a file
        // under the final name. The claimed name keeps the temp name unique.
        let temp_path = path.with_extension("tmp");
        let copied = async {
            let mut output = fs::File::create(&temp_path).await?;
            let bytes = tokio::io::copy(&mut input, &mut output).await?;
            output.flush().await?;
            output.sync_all().await?;
            drop(output);
            fs::rename(&temp_path, &path).await?;
            Ok::<u64, std::io::Error>(bytes)
        }
        .await;

        let bytes = match copied {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                let _ = fs::remove_file(&path).await;
                return Err(e.into());
            }
        };

        let path = fs::canonicalize(&path).await?;

        tracing::debug!("Imported image {:?} -> {:?} ({} bytes)", source, path, bytes);

        Ok(path)
    }

    /// Reserve the first unused `img_<millis>[_n].jpg` name by creating an
    /// empty file under it; the copy is renamed over it.
    async fn claim_name(&self) -> Result<PathBuf> {
        let stamp = now_millis();
        let mut suffix = 0u32;

        loop {
            let name = if suffix == 0 {
                format!("{}{}.{}", IMAGE_FILE_PREFIX, stamp, IMAGE_FILE_EXTENSION)
            } else {
                format!(
                    "{}{}_{}.{}",
                    IMAGE_FILE_PREFIX, stamp, suffix, IMAGE_FILE_EXTENSION
                )
            };

            let candidate = self.root.join(name);
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(_) => return Ok(candidate),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }
}
