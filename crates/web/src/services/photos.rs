//! Store photo processing.
//!
//! Uploaded photos are checked against their declared mimetype, decoded,
//! resized to [`PHOTO_WIDTH`] pixels wide (aspect ratio kept) and written to
//! the uploads directory as `{uuid}.{subtype}`.

use std::io::Cursor;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;
use uuid::Uuid;

/// Width every stored photo is resized to.
pub const PHOTO_WIDTH: u32 = 800;

/// Largest accepted upload (10 MB).
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Errors from processing an uploaded photo.
#[derive(Debug, Error)]
pub enum PhotoError {
    /// The declared mimetype is not an image type we can handle.
    #[error("That filetype isn't allowed!")]
    UnsupportedType(String),

    /// The upload exceeds [`MAX_PHOTO_BYTES`].
    #[error("That photo is too large (max {max} bytes)")]
    TooLarge { max: usize },

    /// The bytes could not be decoded as the declared format.
    #[error("invalid image: {0}")]
    Decode(#[source] image::ImageError),

    /// Re-encoding the resized image failed.
    #[error("failed to encode photo: {0}")]
    Encode(#[source] image::ImageError),

    /// Writing the file failed.
    #[error("failed to write photo: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking resize task panicked or was cancelled.
    #[error("photo task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PhotoError {
    /// Whether the upload itself was at fault (as opposed to the server).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedType(_) | Self::TooLarge { .. } | Self::Decode(_)
        )
    }
}

/// A photo as received from a multipart form.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// Declared mimetype, e.g. `image/jpeg`.
    pub content_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

/// File extension and codec for a declared mimetype.
///
/// The extension is the mimetype's subtype, lower-cased, parameters dropped.
///
/// # Errors
///
/// Returns `PhotoError::UnsupportedType` for non-image mimetypes and image
/// subtypes without an enabled codec.
pub fn format_for(content_type: &str) -> Result<(String, ImageFormat), PhotoError> {
    let unsupported = || PhotoError::UnsupportedType(content_type.to_owned());

    let essence = content_type.split(';').next().unwrap_or_default().trim();
    let (kind, subtype) = essence.split_once('/').ok_or_else(unsupported)?;
    if !kind.eq_ignore_ascii_case("image") || subtype.is_empty() {
        return Err(unsupported());
    }

    let ext = subtype.to_ascii_lowercase();
    let format = ImageFormat::from_extension(&ext).ok_or_else(unsupported)?;
    if !format.reading_enabled() || !format.writing_enabled() {
        return Err(unsupported());
    }

    Ok((ext, format))
}

/// Height that keeps the aspect ratio when scaling to `target_width`.
fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return height.max(1);
    }
    let scaled = u64::from(height) * u64::from(target_width) / u64::from(width);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Decode, resize and re-encode. CPU bound; run off the async executor.
fn process(bytes: &[u8], format: ImageFormat) -> Result<Vec<u8>, PhotoError> {
    let img = image::load_from_memory_with_format(bytes, format).map_err(PhotoError::Decode)?;

    let height = scaled_height(img.width(), img.height(), PHOTO_WIDTH);
    let mut resized = img.resize_exact(PHOTO_WIDTH, height, FilterType::Lanczos3);
    if format == ImageFormat::Jpeg {
        // JPEG has no alpha channel
        resized = DynamicImage::ImageRgb8(resized.to_rgb8());
    }

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, format)
        .map_err(PhotoError::Encode)?;
    Ok(out.into_inner())
}

/// Resize `upload` and write it into `dir`, returning the stored filename.
///
/// # Errors
///
/// Returns a client-side `PhotoError` for bad uploads (see
/// [`PhotoError::is_client_error`]) and `Io`/`Encode`/`Task` for server faults.
pub async fn store_photo(dir: &Path, upload: PhotoUpload) -> Result<String, PhotoError> {
    let (ext, format) = format_for(&upload.content_type)?;
    if upload.bytes.len() > MAX_PHOTO_BYTES {
        return Err(PhotoError::TooLarge {
            max: MAX_PHOTO_BYTES,
        });
    }

    let bytes = upload.bytes;
    let encoded = tokio::task::spawn_blocking(move || process(&bytes, format)).await??;

    tokio::fs::create_dir_all(dir).await?;
    let filename = format!("{}.{ext}", Uuid::new_v4());
    tokio::fs::write(dir.join(&filename), encoded).await?;

    tracing::info!(photo = %filename, "photo stored");
    Ok(filename)
}

/// Delete a stored photo. A file that is already gone is not an error.
///
/// # Errors
///
/// Returns `PhotoError::Io` if the file exists but cannot be removed.
pub async fn remove_photo(dir: &Path, filename: &str) -> Result<(), PhotoError> {
    match tokio::fs::remove_file(dir.join(filename)).await {
        Ok(()) => {
            tracing::info!(photo = %filename, "photo removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgba([200_u8, 40, 40, 255]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_format_for_images() {
        let (ext, format) = format_for("image/jpeg").unwrap();
        assert_eq!(ext, "jpeg");
        assert_eq!(format, ImageFormat::Jpeg);

        let (ext, format) = format_for("IMAGE/PNG; charset=binary").unwrap();
        assert_eq!(ext, "png");
        assert_eq!(format, ImageFormat::Png);
    }

    #[test]
    fn test_format_for_rejects_non_images() {
        for mime in ["text/plain", "application/pdf", "image/", "image", ""] {
            let err = format_for(mime).unwrap_err();
            assert!(matches!(err, PhotoError::UnsupportedType(_)), "{mime}");
            assert_eq!(err.to_string(), "That filetype isn't allowed!");
        }
    }

    #[test]
    fn test_format_for_rejects_images_without_codec() {
        assert!(format_for("image/svg+xml").is_err());
    }

    #[test]
    fn test_scaled_height() {
        assert_eq!(scaled_height(1600, 1200, 800), 600);
        assert_eq!(scaled_height(400, 300, 800), 600);
        assert_eq!(scaled_height(8000, 1, 800), 1);
    }

    #[test]
    fn test_process_resizes_to_width() {
        let resized = process(&png_bytes(1600, 900), ImageFormat::Png).unwrap();
        let img = image::load_from_memory(&resized).unwrap();
        assert_eq!(img.width(), PHOTO_WIDTH);
        assert_eq!(img.height(), 450);
    }

    #[test]
    fn test_process_rejects_mislabelled_bytes() {
        let err = process(b"definitely not a jpeg", ImageFormat::Jpeg).unwrap_err();
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_store_photo_writes_uuid_named_file() {
        let dir = std::env::temp_dir().join(format!("delicious-photos-{}", Uuid::new_v4()));
        let upload = PhotoUpload {
            content_type: "image/png".to_string(),
            bytes: png_bytes(200, 100),
        };

        let filename = store_photo(&dir, upload).await.unwrap();
        assert!(filename.ends_with(".png"));
        assert!(Uuid::parse_str(filename.trim_end_matches(".png")).is_ok());

        let written = image::open(dir.join(&filename)).unwrap();
        assert_eq!((written.width(), written.height()), (800, 400));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_remove_photo_deletes_and_tolerates_missing() {
        let dir = std::env::temp_dir().join(format!("delicious-photos-{}", Uuid::new_v4()));
        let upload = PhotoUpload {
            content_type: "image/png".to_string(),
            bytes: png_bytes(50, 50),
        };
        let filename = store_photo(&dir, upload).await.unwrap();

        remove_photo(&dir, &filename).await.unwrap();
        assert!(!dir.join(&filename).exists());
        remove_photo(&dir, &filename).await.unwrap();

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_store_photo_rejects_oversized() {
        let upload = PhotoUpload {
            content_type: "image/png".to_string(),
            bytes: vec![0; MAX_PHOTO_BYTES + 1],
        };
        let err = store_photo(Path::new("unused"), upload).await.unwrap_err();
        assert!(matches!(err, PhotoError::TooLarge { .. }));
    }
}
