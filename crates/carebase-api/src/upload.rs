//! Multipart file uploads into the object store.

use axum::body::Bytes;
use axum::extract::Multipart;
use tracing::info;

use crate::context::ApiContext;
use crate::error::ApiError;

pub const FILE_FIELD: &str = "file";
pub const AVATAR_DEFAULT_EXT: &str = "jpg";
pub const PRESCRIPTION_DEFAULT_EXT: &str = "pdf";
const MAX_EXT_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Pull the `file` field out of a multipart body. Other fields are skipped.
///
/// # Errors
///
/// `BadRequest` for a malformed body, a missing or empty file, or one larger
/// than `max_bytes`.
pub async fn read_file_field(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;

        if bytes.is_empty() {
            return Err(ApiError::BadRequest("Uploaded file is empty".into()));
        }
        if bytes.len() > max_bytes {
            return Err(ApiError::BadRequest(format!(
                "Uploaded file exceeds the {max_bytes} byte limit"
            )));
        }
        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(ApiError::BadRequest("Missing 'file' field".into()))
}

/// Lower-cased extension from the client's filename, or `default` when it
/// has none or it looks unsafe.
pub fn extension_for(file_name: Option<&str>, default: &str) -> String {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= MAX_EXT_LEN && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| default.to_string())
}

/// `{owner}_{uuid}.{ext}`
pub fn object_name(owner_id: &str, file_name: Option<&str>, default_ext: &str) -> String {
    format!(
        "{owner_id}_{}.{}",
        uuid::Uuid::new_v4(),
        extension_for(file_name, default_ext)
    )
}

/// Write `file` to `bucket` under a fresh name and return its public URL.
pub fn store_upload(
    ctx: &ApiContext,
    bucket: &str,
    owner_id: &str,
    file: &UploadedFile,
    default_ext: &str,
) -> Result<String, ApiError> {
    let name = object_name(owner_id, file.file_name.as_deref(), default_ext);
    let url = ctx
        .objects
        .put(bucket, &name, &file.bytes, file.content_type.as_deref())?;
    info!(bucket, object = %name, size = file.bytes.len(), "upload stored");
    Ok(url)
}
