use std::fs;
use std::path::{ Path, PathBuf };
use std::sync::{ Arc, Mutex };
use thiserror::Error;

use crate::models::chat::data_uri;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The user declined the capture or clipboard permission.
    #[error("permiso denegado")]
    PermissionDenied,
    #[error("{0}")]
    Other(String),
}

/// A raw captured frame, before data-URI encoding.
#[derive(Clone, Debug)]
pub struct CapturedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl CapturedImage {
    pub fn to_data_uri(&self) -> String {
        data_uri(&self.mime, &self.bytes)
    }
}

/// Everything rendered to the user. The controller never touches the
/// presentation layer directly, so tests can record what was shown.
pub trait ChatView: Send {
    fn render_user_text(&mut self, text: &str);
    fn render_user_image(&mut self, data_uri: &str);
    fn render_assistant(&mut self, text: &str);
    fn render_notice(&mut self, text: &str);
    fn alert(&mut self, text: &str);
    fn show_image_preview(&mut self, data_uri: &str);
    fn clear_image_preview(&mut self);
}

/// Platform capture and clipboard capabilities, consumed as an opaque
/// collaborator. Implementations decide what a "screen" is.
pub trait CaptureSurface: Send {
    fn capture(&mut self) -> Result<CapturedImage, CaptureError>;
    fn copy_to_clipboard(&mut self, image: &CapturedImage) -> Result<(), CaptureError>;
}

/// File-backed capture surface for the terminal client: "capturing" reads
/// the configured image file, and the "clipboard" is a file next to it.
pub struct FileCapture {
    source: Arc<Mutex<Option<PathBuf>>>,
    clipboard_path: PathBuf,
}

impl FileCapture {
    pub fn new(source: Arc<Mutex<Option<PathBuf>>>) -> Self {
        Self {
            source,
            clipboard_path: PathBuf::from("captura-portapapeles.png"),
        }
    }
}

pub(crate) fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

impl CaptureSurface for FileCapture {
    fn capture(&mut self) -> Result<CapturedImage, CaptureError> {
        let source = self.source.lock().map_err(|e| CaptureError::Other(e.to_string()))?;
        let path = source.as_ref().ok_or(CaptureError::PermissionDenied)?;
        let bytes = fs::read(path).map_err(|e| CaptureError::Other(e.to_string()))?;
        Ok(CapturedImage {
            mime: mime_for(path).to_string(),
            bytes,
        })
    }

    fn copy_to_clipboard(&mut self, image: &CapturedImage) -> Result<(), CaptureError> {
        fs::write(&self.clipboard_path, &image.bytes)
            .map_err(|e| CaptureError::Other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_source_reads_as_a_declined_capture() {
        let mut surface = FileCapture::new(Arc::new(Mutex::new(None)));
        assert!(matches!(surface.capture(), Err(CaptureError::PermissionDenied)));
    }

    #[test]
    fn mime_follows_the_file_extension() {
        assert_eq!(mime_for(Path::new("shot.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("shot.webp")), "image/webp");
        assert_eq!(mime_for(Path::new("shot")), "image/png");
    }

    #[test]
    fn captured_image_encodes_to_a_data_uri() {
        let image = CapturedImage { mime: "image/png".to_string(), bytes: b"abc".to_vec() };
        assert_eq!(image.to_data_uri(), "data:image/png;base64,YWJj");
    }
}
