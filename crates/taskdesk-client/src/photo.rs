/*
[INPUT]:  Photo files on disk or in-memory image bytes
[OUTPUT]: Base64 data URLs accepted by the photo upload endpoint
[POS]:    Encoding layer - photo payload preparation
[UPDATE]: When supporting new image types or sources
*/

use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("failed to read photo {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A photo waiting to be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSource {
    File(PathBuf),
    Bytes {
        name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

impl PhotoSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn name(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Bytes { name, .. } => name.clone(),
        }
    }

    /// Read the photo and encode it as `data:<mime>;base64,<payload>`.
    pub async fn to_data_url(&self) -> Result<String, PhotoError> {
        match self {
            Self::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|source| PhotoError::Read {
                    path: path.clone(),
                    source,
                })?;
                Ok(encode_data_url(&content_type_for(path), &bytes))
            }
            Self::Bytes {
                content_type,
                bytes,
                ..
            } => Ok(encode_data_url(content_type, bytes)),
        }
    }
}

pub fn encode_data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{content_type};base64,{}", BASE64.encode(bytes))
}

fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("site.JPG", "image/jpeg")]
    #[case("site.jpeg", "image/jpeg")]
    #[case("plan.png", "image/png")]
    #[case("scan.webp", "image/webp")]
    #[case("archive.unknownext", "application/octet-stream")]
    #[case("no_extension", "application/octet-stream")]
    fn test_content_type_for(#[case] file: &str, #[case] expected: &str) {
        assert_eq!(content_type_for(Path::new(file)), expected);
    }

    #[tokio::test]
    async fn test_file_to_data_url() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tiny.png");
        std::fs::write(&path, [0u8, 1, 2]).expect("write photo");

        let url = PhotoSource::file(&path).to_data_url().await.expect("encode");
        assert_eq!(url, "data:image/png;base64,AAEC");
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = PhotoSource::file(dir.path().join("gone.jpg"));

        let err = source.to_data_url().await.expect_err("file is missing");
        assert!(matches!(err, PhotoError::Read { .. }));
    }

    #[tokio::test]
    async fn test_bytes_to_data_url() {
        let source = PhotoSource::Bytes {
            name: "camera".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: b"hi".to_vec(),
        };
        assert_eq!(source.name(), "camera");
        assert_eq!(
            source.to_data_url().await.expect("encode"),
            "data:image/jpeg;base64,aGk="
        );
    }
}
