//! Multipart intake for listing media.
//!
//! Three file slots are accepted: `images` (up to the configured image
//! limit), `idProof` and `landProof` (one each). Every file is checked for
//! type and size before anything touches the disk.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::UploadConfig;
use crate::models::ContractPatch;

const MAX_NAME_LEN: usize = 100;
const MAX_COLLISION_RETRIES: u32 = 100;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Not an accepted file type")]
    UnsupportedType,

    #[error("File too large")]
    TooLarge,

    #[error("Unexpected field")]
    UnexpectedField(String),

    #[error("Upload error: {0}")]
    Multipart(String),

    #[error("failed to store upload: {0}")]
    Storage(#[from] std::io::Error),
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        UploadError::Multipart(err.body_text())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Images,
    IdProof,
    LandProof,
}

impl Slot {
    fn from_field(name: &str) -> Option<Self> {
        match name {
            "images" => Some(Slot::Images),
            "idProof" => Some(Slot::IdProof),
            "landProof" => Some(Slot::LandProof),
            _ => None,
        }
    }
}

struct PendingFile {
    slot: Slot,
    original_name: String,
    data: Bytes,
}

/// A parsed listing form: text fields plus stored file references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub fields: BTreeMap<String, String>,
    /// `None` when no image was uploaded.
    pub images: Option<Vec<String>>,
    pub id_proof_document: Option<String>,
    pub land_proof_document: Option<String>,
}

impl Submission {
    pub fn into_patch(self) -> ContractPatch {
        ContractPatch::from_fields(&self.fields).with_files(
            self.images,
            self.id_proof_document,
            self.land_proof_document,
        )
    }
}

#[derive(Debug, Clone)]
pub struct UploadIntake {
    dir: PathBuf,
    public_prefix: String,
    max_file_size: usize,
    max_images: usize,
}

impl UploadIntake {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            public_prefix: config.public_prefix.trim_matches('/').to_string(),
            max_file_size: config.max_file_size,
            max_images: config.max_images,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Reads the whole form, validates every file, then stores the files.
    pub async fn accept(&self, mut multipart: Multipart) -> Result<Submission, UploadError> {
        let mut submission = Submission::default();
        let mut pending = Vec::new();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();

            match field.file_name() {
                None => {
                    let value = field.text().await?;
                    submission.fields.insert(name, value);
                    continue;
                }
                // Browsers send an empty filename for an untouched file input.
                Some("") => {
                    debug!("skipping empty file part '{}'", name);
                    continue;
                }
                Some(_) => {}
            }

            let slot = Slot::from_field(&name).ok_or_else(|| UploadError::UnexpectedField(name.clone()))?;
            if self.slot_is_full(slot, &pending) {
                debug!("dropping extra file for slot '{}'", name);
                continue;
            }

            if !is_accepted_type(field.content_type()) {
                return Err(UploadError::UnsupportedType);
            }

            let original_name = field.file_name().unwrap_or("file").to_string();
            let data = self.read_limited(field).await?;
            pending.push(PendingFile { slot, original_name, data });
        }

        let stored = try_join_all(pending.iter().map(|file| self.store(file))).await?;

        for (file, reference) in pending.iter().zip(stored) {
            match file.slot {
                Slot::Images => submission.images.get_or_insert_with(Vec::new).push(reference),
                Slot::IdProof => submission.id_proof_document = Some(reference),
                Slot::LandProof => submission.land_proof_document = Some(reference),
            }
        }

        Ok(submission)
    }

    fn slot_is_full(&self, slot: Slot, pending: &[PendingFile]) -> bool {
        let limit = match slot {
            Slot::Images => self.max_images,
            Slot::IdProof | Slot::LandProof => 1,
        };
        pending.iter().filter(|f| f.slot == slot).count() >= limit
    }

    async fn read_limited(&self, mut field: Field<'_>) -> Result<Bytes, UploadError> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = field.chunk().await? {
            if buffer.len() + chunk.len() > self.max_file_size {
                return Err(UploadError::TooLarge);
            }
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }

    /// Writes one file under a fresh name and returns its public reference.
    async fn store(&self, file: &PendingFile) -> Result<String, UploadError> {
        let millis = Utc::now().timestamp_millis();
        let safe = sanitize_file_name(&file.original_name);

        for attempt in 0..=MAX_COLLISION_RETRIES {
            let name = stored_name(millis, attempt, &safe);
            let path = self.dir.join(&name);

            let mut handle = match tokio::fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(handle) => handle,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };
            handle.write_all(&file.data).await?;
            handle.flush().await?;

            info!("stored upload {} ({} bytes)", name, file.data.len());
            return Ok(format!("{}/{}", self.public_prefix, name));
        }

        Err(UploadError::Storage(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free name for {}", safe),
        )))
    }
}

fn stored_name(millis: i64, attempt: u32, safe_name: &str) -> String {
    if attempt == 0 {
        format!("{}-{}", millis, safe_name)
    } else {
        format!("{}-{}-{}", millis, attempt, safe_name)
    }
}

/// `image/*` or `application/pdf`; parameters such as charset are ignored.
pub fn is_accepted_type(content_type: Option<&str>) -> bool {
    let Some(raw) = content_type else {
        return false;
    };
    let essence = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    match essence.split_once('/') {
        Some(("image", subtype)) => !subtype.is_empty(),
        Some(("application", "pdf")) => true,
        _ => false,
    }
}

/// Keeps the base name only, restricted to `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let truncated: String = cleaned.chars().rev().take(MAX_NAME_LEN).collect::<Vec<_>>().into_iter().rev().collect();

    if truncated.is_empty() {
        "file".to_string()
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intake(dir: &Path) -> UploadIntake {
        UploadIntake::new(&UploadConfig {
            dir: dir.to_path_buf(),
            ..UploadConfig::default()
        })
    }

    #[test]
    fn accepted_types() {
        assert!(is_accepted_type(Some("image/jpeg")));
        assert!(is_accepted_type(Some("IMAGE/PNG")));
        assert!(is_accepted_type(Some("application/pdf")));
        assert!(is_accepted_type(Some("application/pdf; charset=binary")));
        assert!(!is_accepted_type(Some("text/plain")));
        assert!(!is_accepted_type(Some("application/pdfx")));
        assert!(!is_accepted_type(Some("image/")));
        assert!(!is_accepted_type(None));
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_file_name("field photo 1.jpg"), "field_photo_1.jpg");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\raj\\aadhaar.pdf"), "aadhaar.pdf");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name("भूमि.pdf"), "____.pdf");

        let long = format!("{}.pdf", "a".repeat(300));
        let cleaned = sanitize_file_name(&long);
        assert_eq!(cleaned.len(), MAX_NAME_LEN);
        assert!(cleaned.ends_with(".pdf"));
    }

    #[test]
    fn collision_names_stay_distinct() {
        assert_eq!(stored_name(1700000000000, 0, "a.jpg"), "1700000000000-a.jpg");
        assert_eq!(stored_name(1700000000000, 2, "a.jpg"), "1700000000000-2-a.jpg");
    }

    #[tokio::test]
    async fn store_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let intake = intake(dir.path());
        let file = |data: &'static [u8]| PendingFile {
            slot: Slot::Images,
            original_name: "same.jpg".into(),
            data: Bytes::from_static(data),
        };

        let first = intake.store(&file(b"one")).await.unwrap();
        let second = intake.store(&file(b"two")).await.unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("uploads/"));

        let first_path = dir.path().join(first.trim_start_matches("uploads/"));
        let second_path = dir.path().join(second.trim_start_matches("uploads/"));
        assert_eq!(tokio::fs::read(first_path).await.unwrap(), b"one");
        assert_eq!(tokio::fs::read(second_path).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn ensure_dir_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("media").join("contracts");
        let intake = intake(&nested);
        intake.ensure_dir().await.unwrap();
        assert!(nested.is_dir());
    }
}
