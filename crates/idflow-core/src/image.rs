//! Image ingestion: uploads become base64 strings for the provider.
//!
//! HEIC/HEIF images are converted to JPEG first. Conversion is best effort:
//! if it fails, the original bytes are encoded unchanged.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

/// An uploaded image and the metadata used to detect its format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    /// Read a file, guessing the content type from its extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = content_type_for(&file_name).map(str::to_string);
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    /// HEIC/HEIF by extension or declared content type.
    pub fn is_heif(&self) -> bool {
        let name = self.file_name.to_ascii_lowercase();
        name.ends_with(".heic")
            || name.ends_with(".heif")
            || matches!(
                self.content_type.as_deref(),
                Some("image/heic") | Some("image/heif")
            )
    }
}

fn content_type_for(file_name: &str) -> Option<&'static str> {
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("converter unavailable: {0}")]
    Unavailable(String),

    #[error("converter failed: {0}")]
    Failed(String),

    #[error("converter I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts HEIC/HEIF bytes to a standard photographic format (JPEG).
#[async_trait]
pub trait ImageConverter: Send + Sync {
    async fn to_jpeg(&self, bytes: &[u8]) -> Result<Vec<u8>, ConversionError>;
}

/// Converter backed by the ImageMagick executable (`magick - jpeg:-`).
#[derive(Debug, Clone)]
pub struct MagickConverter {
    program: PathBuf,
}

impl Default for MagickConverter {
    fn default() -> Self {
        Self {
            program: PathBuf::from("magick"),
        }
    }
}

impl MagickConverter {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl ImageConverter for MagickConverter {
    async fn to_jpeg(&self, bytes: &[u8]) -> Result<Vec<u8>, ConversionError> {
        let mut child = tokio::process::Command::new(&self.program)
            .args(["-", "jpeg:-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ConversionError::Unavailable(format!("{}: {}", self.program.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ConversionError::Failed("stdin not captured".into()))?;
        let input = bytes.to_vec();
        let writer = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;
        writer
            .await
            .map_err(|e| ConversionError::Failed(e.to_string()))??;

        if !output.status.success() {
            return Err(ConversionError::Failed(format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output.stdout)
    }
}

/// Converter that never converts; HEIF uploads fall back to their original bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughConverter;

#[async_trait]
impl ImageConverter for PassthroughConverter {
    async fn to_jpeg(&self, _bytes: &[u8]) -> Result<Vec<u8>, ConversionError> {
        Err(ConversionError::Unavailable("conversion disabled".into()))
    }
}

/// Base64-encode an upload, converting HEIC/HEIF to JPEG first.
pub async fn encode_upload<C: ImageConverter + ?Sized>(
    upload: &ImageUpload,
    converter: &C,
) -> String {
    if upload.is_heif() {
        info!(file = %upload.file_name, "converting HEIC image to JPEG");
        match converter.to_jpeg(&upload.bytes).await {
            Ok(jpeg) => return STANDARD.encode(jpeg),
            Err(e) => {
                error!(file = %upload.file_name, error = %e, "image conversion failed; using original bytes");
            }
        }
    }
    STANDARD.encode(&upload.bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

    /// Pretends to transcode by emitting a JPEG header followed by the input.
    struct FakeJpegConverter;

    #[async_trait]
    impl ImageConverter for FakeJpegConverter {
        async fn to_jpeg(&self, bytes: &[u8]) -> Result<Vec<u8>, ConversionError> {
            let mut out = JPEG_MAGIC.to_vec();
            out.extend_from_slice(bytes);
            Ok(out)
        }
    }

    #[test]
    fn test_heif_detection() {
        let by_name = ImageUpload::new("IMG_0001.HEIC", None, vec![]);
        assert!(by_name.is_heif());

        let by_type = ImageUpload::new("upload", Some("image/heif".into()), vec![]);
        assert!(by_type.is_heif());

        let jpeg = ImageUpload::new("front.jpg", Some("image/jpeg".into()), vec![]);
        assert!(!jpeg.is_heif());
    }

    #[test]
    fn test_content_type_guess() {
        assert_eq!(content_type_for("a.JPG"), Some("image/jpeg"));
        assert_eq!(content_type_for("a.heif"), Some("image/heif"));
        assert_eq!(content_type_for("noext"), None);
    }

    #[tokio::test]
    async fn test_non_heif_round_trip() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let upload = ImageUpload::new("face.png", Some("image/png".into()), bytes.clone());

        let encoded = encode_upload(&upload, &FakeJpegConverter).await;
        assert_eq!(STANDARD.decode(encoded).unwrap(), bytes);
    }

    #[tokio::test]
    async fn test_heif_is_converted() {
        let upload = ImageUpload::new("front.heic", None, b"heif-data".to_vec());

        let encoded = encode_upload(&upload, &FakeJpegConverter).await;
        let decoded = STANDARD.decode(encoded).unwrap();
        assert!(decoded.starts_with(&JPEG_MAGIC));
    }

    #[tokio::test]
    async fn test_failed_conversion_falls_back_to_original() {
        let upload = ImageUpload::new("front.heic", None, b"heif-data".to_vec());

        let encoded = encode_upload(&upload, &PassthroughConverter).await;
        assert_eq!(STANDARD.decode(encoded).unwrap(), b"heif-data");
    }

    #[tokio::test]
    async fn test_missing_magick_binary_falls_back() {
        let converter = MagickConverter::with_program("/nonexistent/bin/magick");
        let upload = ImageUpload::new("front.heif", None, b"heif-data".to_vec());

        let encoded = encode_upload(&upload, &converter).await;
        assert_eq!(STANDARD.decode(encoded).unwrap(), b"heif-data");
    }

    #[tokio::test]
    async fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selfie.jpeg");
        tokio::fs::write(&path, b"jpeg-bytes").await.unwrap();

        let upload = ImageUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.file_name, "selfie.jpeg");
        assert_eq!(upload.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(upload.bytes, b"jpeg-bytes");
    }
}
