//! Multipart form reading shared by the finalize and manual-entry endpoints.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::AppError;
use crate::portfolio::evidence::extension_of;

/// Field name carrying the proof image.
pub const EVIDENCE_FIELD: &str = "evidence";

#[derive(Debug)]
pub struct EvidenceUpload {
    pub extension: String,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    /// `None` when no file, or an empty file, was sent.
    pub evidence: Option<EvidenceUpload>,
}

impl UploadForm {
    /// Trimmed text field; empty values count as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == EVIDENCE_FIELD {
            let extension = field
                .file_name()
                .and_then(extension_of)
                .unwrap_or_default()
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("could not read evidence: {e}")))?;
            if !bytes.is_empty() {
                form.evidence = Some(EvidenceUpload { extension, bytes });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("could not read field '{name}': {e}")))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}
