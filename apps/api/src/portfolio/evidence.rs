//! Evidence Store: proof files namespaced per student.
//!
//! Files are named `evidence_<YYYYmmdd_HHMMSS_mmm>.<ext>` so repeated uploads
//! from one student do not collide.

use std::path::PathBuf;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{info, warn};

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("unsupported evidence file type '{0}' (expected jpg, jpeg or png)")]
    UnsupportedExtension(String),

    #[error("evidence file is empty")]
    EmptyFile,

    #[error("invalid student id for evidence storage")]
    InvalidStudentId,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 request failed: {0}")]
    S3(String),
}

#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Persists `bytes` for `student_id` and returns the stored path.
    async fn save(
        &self,
        student_id: &str,
        bytes: Bytes,
        extension: &str,
    ) -> Result<String, EvidenceError>;

    /// Deletes a file previously returned by `save`.
    async fn remove(&self, path: &str) -> Result<(), EvidenceError>;
}

/// Best-effort cleanup of a saved file whose activity row was never written.
pub async fn discard_orphan(store: &dyn EvidenceStore, path: &str) {
    match store.remove(path).await {
        Ok(()) => info!("Removed orphaned evidence {path}"),
        Err(e) => warn!("Orphaned evidence left at {path}: {e}"),
    }
}

/// Lower-cases the extension and checks it against the allowed image types.
pub fn normalize_extension(extension: &str) -> Result<String, EvidenceError> {
    let ext = extension.trim().trim_start_matches('.').to_ascii_lowercase();
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(EvidenceError::UnsupportedExtension(ext))
    }
}

/// Extension of an uploaded file name (`photo.final.PNG` -> `PNG`).
pub fn extension_of(file_name: &str) -> Option<&str> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

pub fn evidence_file_name(extension: &str, now: DateTime<Local>) -> String {
    format!("evidence_{}.{extension}", now.format("%Y%m%d_%H%M%S_%3f"))
}

/// Maps a student id onto a single directory or key segment. Bytes outside
/// `[A-Za-z0-9._-]` are percent-encoded, as are dot-only ids, so distinct ids
/// never share a segment and none can escape it.
fn namespace(student_id: &str) -> Result<String, EvidenceError> {
    let id = student_id.trim();
    if id.is_empty() {
        return Err(EvidenceError::InvalidStudentId);
    }
    let dots_only = id.chars().all(|c| c == '.');

    let mut segment = String::with_capacity(id.len());
    for byte in id.bytes() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'_')
            || (byte == b'.' && !dots_only);
        if keep {
            segment.push(char::from(byte));
        } else {
            segment.push_str(&format!("%{byte:02X}"));
        }
    }
    Ok(segment)
}

fn checked_upload(
    student_id: &str,
    bytes: &Bytes,
    extension: &str,
) -> Result<(String, String, String), EvidenceError> {
    if bytes.is_empty() {
        return Err(EvidenceError::EmptyFile);
    }
    let dir = namespace(student_id)?;
    let ext = normalize_extension(extension)?;
    let file_name = evidence_file_name(&ext, Local::now());
    Ok((dir, ext, file_name))
}

/// Stores evidence under `<root>/<student_id>/`.
pub struct LocalEvidenceStore {
    root: PathBuf,
}

impl LocalEvidenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl EvidenceStore for LocalEvidenceStore {
    async fn save(
        &self,
        student_id: &str,
        bytes: Bytes,
        extension: &str,
    ) -> Result<String, EvidenceError> {
        let (dir, _, file_name) = checked_upload(student_id, &bytes, extension)?;
        let student_dir = self.root.join(dir);
        tokio::fs::create_dir_all(&student_dir).await?;

        let path = student_dir.join(file_name);
        tokio::fs::write(&path, &bytes).await?;

        info!("Stored {} bytes of evidence at {}", bytes.len(), path.display());
        Ok(path.to_string_lossy().into_owned())
    }

    async fn remove(&self, path: &str) -> Result<(), EvidenceError> {
        tokio::fs::remove_file(path).await?;
        Ok(())
    }
}

/// Stores evidence at `s3://<bucket>/evidence/<student_id>/`.
pub struct S3EvidenceStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3EvidenceStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

fn content_type(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        _ => "image/jpeg",
    }
}

#[async_trait]
impl EvidenceStore for S3EvidenceStore {
    async fn save(
        &self,
        student_id: &str,
        bytes: Bytes,
        extension: &str,
    ) -> Result<String, EvidenceError> {
        let (dir, ext, file_name) = checked_upload(student_id, &bytes, extension)?;
        let key = format!("evidence/{dir}/{file_name}");
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type(&ext))
            .send()
            .await
            .map_err(|e| EvidenceError::S3(e.to_string()))?;

        info!("Uploaded {size} bytes of evidence to s3://{}/{}", self.bucket, key);
        Ok(format!("s3://{}/{}", self.bucket, key))
    }

    async fn remove(&self, path: &str) -> Result<(), EvidenceError> {
        let key = path
            .strip_prefix("s3://")
            .and_then(|rest| rest.strip_prefix(self.bucket.as_str()))
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| {
                EvidenceError::S3(format!("{path} is not in bucket {}", self.bucket))
            })?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| EvidenceError::S3(e.to_string()))?;
        Ok(())
    }
}
