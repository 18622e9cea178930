// Collaborators the controller drives: screen capture, template loading, input actions
use super::error::PortError;
use crate::template_matching::Image;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Supplies a fresh screen image on demand
pub trait CapturePort: Send + Sync + 'static {
    /// Capture the live screen. `timeout` is the bound the controller enforces; an
    /// implementation may use it to abandon its own work early.
    fn capture(&self, timeout: Duration) -> impl Future<Output = Result<Image, PortError>> + Send;
}

/// Resolves an opaque template reference to a decoded image
///
/// Called from a blocking context, so implementations may do file I/O directly.
pub trait TemplateLoader: Send + Sync + 'static {
    fn load(&self, reference: &str) -> Result<Image, PortError>;
}

/// Performs input at screen coordinates
pub trait ActionPort: Send + Sync + 'static {
    /// Tap-equivalent gesture at `(x, y)` in capture coordinates
    fn tap(&self, x: u32, y: u32) -> impl Future<Output = Result<(), PortError>> + Send;

    /// Secondary signal after a tap (e.g. a short vibration); best-effort
    fn feedback(&self) -> impl Future<Output = Result<(), PortError>> + Send;
}

impl<T: CapturePort> CapturePort for Arc<T> {
    fn capture(&self, timeout: Duration) -> impl Future<Output = Result<Image, PortError>> + Send {
        (**self).capture(timeout)
    }
}

impl<T: TemplateLoader> TemplateLoader for Arc<T> {
    fn load(&self, reference: &str) -> Result<Image, PortError> {
        (**self).load(reference)
    }
}

impl<T: ActionPort> ActionPort for Arc<T> {
    fn tap(&self, x: u32, y: u32) -> impl Future<Output = Result<(), PortError>> + Send {
        (**self).tap(x, y)
    }

    fn feedback(&self) -> impl Future<Output = Result<(), PortError>> + Send {
        (**self).feedback()
    }
}

/// The three collaborators a controller needs
pub struct BotPorts<C, L, A> {
    pub capture: C,
    pub loader: L,
    pub action: A,
}

/// Loads templates from the local filesystem
///
/// Accepts plain paths and `file://` URIs. Relative paths resolve against the base
/// directory when one is set, otherwise against the working directory.
#[derive(Debug, Clone, Default)]
pub struct FileTemplateLoader {
    base_dir: Option<PathBuf>,
}

impl FileTemplateLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    /// Map a reference to a filesystem path without touching the disk
    pub fn resolve(&self, reference: &str) -> Result<PathBuf, PortError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(PortError::NotFound("empty template reference".to_string()));
        }

        let raw = match reference.strip_prefix("file://") {
            Some(rest) => rest,
            None if reference.contains("://") => {
                return Err(PortError::NotFound(format!(
                    "unsupported locator scheme in '{reference}'"
                )));
            }
            None => reference,
        };

        let path = Path::new(raw);
        Ok(match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        })
    }
}

impl TemplateLoader for FileTemplateLoader {
    fn load(&self, reference: &str) -> Result<Image, PortError> {
        let path = self.resolve(reference)?;
        if !path.is_file() {
            return Err(PortError::NotFound(format!(
                "template file {} does not exist",
                path.display()
            )));
        }
        Image::open(&path).map_err(|e| {
            PortError::Unavailable(format!("failed to decode template {}: {e}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "template-tap-bot-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_resolve_plain_and_file_uri() {
        let loader = FileTemplateLoader::new();
        assert_eq!(
            loader.resolve("/sdcard/btn.png").unwrap(),
            PathBuf::from("/sdcard/btn.png")
        );
        assert_eq!(
            loader.resolve("file:///sdcard/btn.png").unwrap(),
            PathBuf::from("/sdcard/btn.png")
        );
    }

    #[test]
    fn test_resolve_relative_against_base() {
        let loader = FileTemplateLoader::with_base_dir("/templates");
        assert_eq!(
            loader.resolve("ok.png").unwrap(),
            PathBuf::from("/templates/ok.png")
        );
        assert_eq!(
            loader.resolve("/abs/ok.png").unwrap(),
            PathBuf::from("/abs/ok.png")
        );
    }

    #[test]
    fn test_resolve_rejects_unsupported_scheme() {
        let loader = FileTemplateLoader::new();
        let err = loader
            .resolve("content://media/external/images/1")
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(msg) if msg.contains("unsupported")));
        assert!(loader.resolve("   ").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let loader = FileTemplateLoader::new();
        let err = loader.load("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[test]
    fn test_load_png_round_trip() {
        let dir = scratch_dir("load");
        let path = dir.join("tpl.png");
        let mut img = image::RgbaImage::new(4, 3);
        img.put_pixel(1, 2, image::Rgba([200, 100, 50, 255]));
        img.save(&path).unwrap();

        let loaded = FileTemplateLoader::with_base_dir(&dir).load("tpl.png").unwrap();
        assert_eq!((loaded.width(), loaded.height()), (4, 3));
        assert_eq!(loaded.pixel(1, 2), [200, 100, 50, 255]);
    }

    #[test]
    fn test_load_undecodable_file() {
        let dir = scratch_dir("garbage");
        let path = dir.join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let err = FileTemplateLoader::new()
            .load(path.to_str().unwrap())
            .unwrap_err();
        assert!(matches!(err, PortError::Unavailable(_)));
    }
}
