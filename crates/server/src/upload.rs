use axum::body::Bytes;
use axum::extract::Multipart;

use crate::error::PredictError;

/// Multipart field carrying the receipt image.
pub const FILE_FIELD: &str = "file";

/// An uploaded receipt image, owned by the request that received it.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Pull the `file` part out of a multipart body.
///
/// Other fields are skipped, as is a `file` part with no `filename`
/// parameter: that is a plain form value, not an upload. A `file` part with
/// an empty filename is rejected before its body is read.
pub async fn read_upload(mut multipart: Multipart) -> Result<UploadedImage, PredictError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = match field.file_name() {
            None => continue,
            Some("") => return Err(PredictError::NoSelectedFile),
            Some(name) => name.to_owned(),
        };

        let bytes = field.bytes().await?;
        return Ok(UploadedImage { file_name, bytes });
    }

    Err(PredictError::NoFilePart)
}
