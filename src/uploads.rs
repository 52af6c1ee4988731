use anyhow::{anyhow, Context};
use rusqlite::Connection;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::messages;
use crate::model::Upload;
use crate::store::uploads::NewUpload;
use crate::store::{Repository, Uploads};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub upload: Upload,
    pub message: String,
}

/// Destination for uploaded files.
pub trait FileStore {
    fn put(&self, file_name: &str, bytes: &[u8]) -> anyhow::Result<UploadReceipt>;
}

/// Writes blobs under a workspace directory and records them in `uploads`.
pub struct DirFileStore<'c> {
    root: PathBuf,
    conn: &'c Connection,
}

impl<'c> DirFileStore<'c> {
    pub fn new(root: PathBuf, conn: &'c Connection) -> Self {
        DirFileStore { root, conn }
    }
}

/// Keep the name recognisable but safe as a single path component.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

impl FileStore for DirFileStore<'_> {
    fn put(&self, file_name: &str, bytes: &[u8]) -> anyhow::Result<UploadReceipt> {
        let file_name = file_name.trim();
        if file_name.is_empty() {
            return Err(anyhow!(messages::UPLOAD_NO_FILE));
        }
        std::fs::create_dir_all(&self.root).with_context(|| {
            format!("failed to create directory {}", self.root.to_string_lossy())
        })?;

        let id = Uuid::new_v4().to_string();
        let stored = self
            .root
            .join(format!("{}-{}", id, sanitize_file_name(file_name)));
        std::fs::write(&stored, bytes)
            .with_context(|| format!("failed to write {}", stored.to_string_lossy()))?;

        let recorded = Uploads::new(self.conn).create(&NewUpload {
            id,
            file_name: file_name.to_string(),
            stored_path: stored.to_string_lossy().to_string(),
            size_bytes: bytes.len() as i64,
            sha256: sha256_hex(bytes),
        });
        let upload = match recorded {
            Ok(u) => u,
            Err(e) => {
                // No row will ever point at the blob; drop it.
                match std::fs::remove_file(&stored) {
                    Ok(()) => debug!(path = %stored.display(), "removed unrecorded upload"),
                    Err(rm) => warn!(
                        path = %stored.display(),
                        error = %rm,
                        "failed to remove unrecorded upload"
                    ),
                }
                return Err(anyhow::Error::new(e).context("failed to record upload"));
            }
        };

        Ok(UploadReceipt {
            message: messages::upload_ok(file_name),
            upload,
        })
    }
}
