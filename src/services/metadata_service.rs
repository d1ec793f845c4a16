//! Derives the [`FileDescriptor`] of a local file: basename, size, MD5
//! checksum (base64) and MIME type.

use crate::{
    errors::{Error, Result},
    models::file::{ContentType, FileDescriptor},
};
use base64::{Engine as _, engine::general_purpose};
use std::{io::ErrorKind, path::Path};
use tokio::fs;
use tracing::{debug, warn};

/// Read `path` in full and describe it.
///
/// The checksum covers the whole contents in one pass, which is what the
/// direct-upload integrity check compares against.
pub async fn describe_file(path: &Path) -> Result<FileDescriptor> {
    let bytes = read_file(path).await?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::FileUnreadable {
            path: path.to_path_buf(),
            source: std::io::Error::new(ErrorKind::InvalidInput, "path has no file name"),
        })?;

    let content_type = content_type_for(path);
    if !content_type.is_known() {
        warn!(
            "could not infer a content type for {}, sending {}",
            filename, content_type
        );
    }

    let descriptor = FileDescriptor {
        filename,
        byte_size: bytes.len() as u64,
        checksum: checksum(&bytes),
        content_type,
    };
    debug!("described {} as {:?}", path.display(), descriptor);

    Ok(descriptor)
}

/// Base64-encoded MD5 digest of `bytes`.
pub fn checksum(bytes: &[u8]) -> String {
    let digest = md5::compute(bytes);
    general_purpose::STANDARD.encode(digest.0)
}

/// MIME type from the file extension.
pub fn content_type_for(path: &Path) -> ContentType {
    match mime_guess::from_path(path).first_raw() {
        Some(mime) => ContentType::Known(mime.to_string()),
        None => ContentType::Unknown,
    }
}

/// Read a file for upload, mapping I/O failures onto the pipeline errors.
pub(crate) async fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).await.map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            Error::FileNotFound(path.to_path_buf())
        } else {
            Error::FileUnreadable {
                path: path.to_path_buf(),
                source: err,
            }
        }
    })
}
