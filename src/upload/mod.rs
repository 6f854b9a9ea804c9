//! Boundary with the upload pipeline: the decoded input image and the
//! done/abort completion it hands to the editor.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{ImageError, ImageFormat, RgbaImage};
use thiserror::Error;

const FALLBACK_MIME: &str = "image/png";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to decode {name}: {source}")]
    Decode { name: String, source: ImageError },
    #[error("{name} decoded to an empty image")]
    EmptyImage { name: String },
}

pub type UploadResult<T> = std::result::Result<T, UploadError>;

/// An already-decoded upload together with the file identity it arrived with.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub image: Arc<RgbaImage>,
    pub name: String,
    pub mime: String,
}

impl UploadedImage {
    pub fn new(image: RgbaImage, name: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            image: Arc::new(image),
            name: name.into(),
            mime: mime.into(),
        }
    }

    /// Decodes raw file bytes. An empty `mime` is filled in from the sniffed format.
    pub fn decode(bytes: &[u8], name: impl Into<String>, mime: &str) -> UploadResult<Self> {
        let name = name.into();
        let decoded = image::load_from_memory(bytes).map_err(|source| UploadError::Decode {
            name: name.clone(),
            source,
        })?;
        let mime = if mime.trim().is_empty() {
            image::guess_format(bytes)
                .map(|format| format.to_mime_type().to_string())
                .unwrap_or_else(|_| FALLBACK_MIME.to_string())
        } else {
            mime.trim().to_string()
        };
        let image = decoded.to_rgba8();
        if image.width() == 0 || image.height() == 0 {
            return Err(UploadError::EmptyImage { name });
        }
        tracing::debug!(
            %name,
            %mime,
            width = image.width(),
            height = image.height(),
            "upload decoded"
        );
        Ok(Self::new(image, name, mime))
    }

    /// Reads and decodes a file, taking its MIME type from the extension.
    pub fn open(path: &Path) -> UploadResult<Self> {
        let bytes = fs::read(path).map_err(|source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime = ImageFormat::from_path(path)
            .map(|format| format.to_mime_type())
            .unwrap_or("");
        Self::decode(&bytes, name, mime)
    }
}

/// The rasterized result, wrapped in the upload's original name and type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Callbacks the upload pipeline hands to an editor session.
pub trait UploadCompletion {
    /// Replaces the pipeline's file with the edited result.
    fn done(self: Box<Self>, file: EditedFile);
    /// Leaves the original upload untouched.
    fn abort(self: Box<Self>);
}

/// Owns an [`UploadCompletion`] and guarantees exactly one of `done` or
/// `abort` reaches it. Dropping an unresolved handle aborts.
pub struct CompletionHandle {
    inner: Option<Box<dyn UploadCompletion>>,
}

impl std::fmt::Debug for CompletionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl CompletionHandle {
    pub fn new(completion: impl UploadCompletion + 'static) -> Self {
        Self {
            inner: Some(Box::new(completion)),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.is_some()
    }

    /// Returns `false` if the completion already ran.
    pub fn done(&mut self, file: EditedFile) -> bool {
        match self.inner.take() {
            Some(completion) => {
                tracing::info!(name = %file.name, bytes = file.bytes.len(), "upload completed");
                completion.done(file);
                true
            }
            None => {
                tracing::warn!("upload completion already resolved; dropping result");
                false
            }
        }
    }

    pub fn abort(&mut self) -> bool {
        match self.inner.take() {
            Some(completion) => {
                tracing::info!("upload aborted");
                completion.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for CompletionHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Writes the edited file into a directory, under its original name.
#[derive(Debug, Clone)]
pub struct DirectoryCompletion {
    dir: PathBuf,
}

impl DirectoryCompletion {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl UploadCompletion for DirectoryCompletion {
    fn done(self: Box<Self>, file: EditedFile) {
        let path = self.dir.join(&file.name);
        if let Err(err) = fs::write(&path, &file.bytes) {
            tracing::warn!(path = %path.display(), ?err, "failed to write edited image");
        }
    }

    fn abort(self: Box<Self>) {
        tracing::debug!(dir = %self.dir.display(), "edit aborted; nothing written");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{EditedFile, UploadCompletion};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Resolution {
        Done(EditedFile),
        Aborted,
    }

    /// Records every call it receives.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingCompletion {
        pub calls: Rc<RefCell<Vec<Resolution>>>,
    }

    impl UploadCompletion for RecordingCompletion {
        fn done(self: Box<Self>, file: EditedFile) {
            self.calls.borrow_mut().push(Resolution::Done(file));
        }

        fn abort(self: Box<Self>) {
            self.calls.borrow_mut().push(Resolution::Aborted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{RecordingCompletion, Resolution};
    use super::*;
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("encode png fixture");
        bytes
    }

    #[test]
    fn decode_sniffs_missing_mime() {
        let upload = UploadedImage::decode(&png_bytes(), "a.png", "").expect("valid png");
        assert_eq!(upload.mime, "image/png");
        assert_eq!(upload.image.dimensions(), (3, 2));
        assert_eq!(upload.name, "a.png");
    }

    #[test]
    fn decode_failure_names_the_file() {
        let err = UploadedImage::decode(b"not an image", "broken.jpg", "image/jpeg")
            .expect_err("garbage must not decode");
        assert!(err.to_string().contains("broken.jpg"));
    }

    #[test]
    fn completion_resolves_exactly_once() {
        let recorder = RecordingCompletion::default();
        let calls = recorder.calls.clone();
        let mut handle = CompletionHandle::new(recorder);
        let file = EditedFile {
            name: "a.png".into(),
            mime: "image/png".into(),
            bytes: vec![1, 2, 3],
        };
        assert!(handle.done(file.clone()));
        assert!(!handle.abort());
        assert!(!handle.done(file.clone()));
        drop(handle);
        assert_eq!(*calls.borrow(), vec![Resolution::Done(file)]);
    }

    #[test]
    fn dropping_unresolved_handle_aborts() {
        let recorder = RecordingCompletion::default();
        let calls = recorder.calls.clone();
        drop(CompletionHandle::new(recorder));
        assert_eq!(*calls.borrow(), vec![Resolution::Aborted]);
    }
}
