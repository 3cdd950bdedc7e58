//! Live preview of the Document Source.
//!
//! A [`PreviewSurface`] is anything that can display a whole HTML document,
//! with each render replacing the previous one. [`PreviewRenderer`] sits in
//! front of a surface and debounces edits, so a burst of keystrokes produces
//! one render of the final text.
//!
//! Markup is written verbatim. It is the user's own document, so nothing is
//! escaped or sanitised. A blank source shows [`PREVIEW_PLACEHOLDER`].

use crate::error::ClientError;
use crate::schedule::{lock, Debouncer};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Shown in place of an empty document.
pub const PREVIEW_PLACEHOLDER: &str =
    r#"<p style="text-align: center; color: #999; padding: 2rem;">Preview will appear here...</p>"#;

/// What the preview should display for `source`.
pub fn preview_markup(source: &str) -> &str {
    if source.trim().is_empty() {
        PREVIEW_PLACEHOLDER
    } else {
        source
    }
}

/// A display that shows one complete HTML document at a time.
pub trait PreviewSurface: Send + Sync {
    /// Replace the surface's entire contents with `html`.
    fn render(&self, html: &str) -> Result<(), ClientError>;
}

/// Preview written to an HTML file, for a browser to display.
///
/// Each render goes to a temp file beside the target, which is then renamed
/// over it. A browser reloading the page never sees a half-written file.
#[derive(Debug, Clone)]
pub struct FilePreview {
    path: PathBuf,
}

impl FilePreview {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreviewSurface for FilePreview {
    fn render(&self, html: &str) -> Result<(), ClientError> {
        let err = |source| ClientError::OutputWriteFailed {
            path: self.path.clone(),
            source,
        };
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(err)?;
        tmp.write_all(html.as_bytes()).map_err(err)?;
        tmp.persist(&self.path).map_err(|e| err(e.error))?;
        debug!("Preview written to {} ({} bytes)", self.path.display(), html.len());
        Ok(())
    }
}

/// Preview kept in memory; every render is recorded.
#[derive(Debug, Default)]
pub struct MemoryPreview {
    renders: Mutex<Vec<String>>,
}

impl MemoryPreview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every render so far, oldest first.
    pub fn renders(&self) -> Vec<String> {
        lock(&self.renders).clone()
    }

    /// What the surface currently shows.
    pub fn current(&self) -> Option<String> {
        lock(&self.renders).last().cloned()
    }
}

impl PreviewSurface for MemoryPreview {
    fn render(&self, html: &str) -> Result<(), ClientError> {
        lock(&self.renders).push(html.to_string());
        Ok(())
    }
}

/// Surface that discards renders, for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPreview;

impl PreviewSurface for NullPreview {
    fn render(&self, _html: &str) -> Result<(), ClientError> {
        Ok(())
    }
}

fn paint(surface: &dyn PreviewSurface, source: &str) {
    if let Err(e) = surface.render(preview_markup(source)) {
        warn!("Preview render failed: {}", e);
    }
}

/// Debounced front-end to a [`PreviewSurface`].
pub struct PreviewRenderer {
    surface: Arc<dyn PreviewSurface>,
    debouncer: Debouncer<String>,
}

impl PreviewRenderer {
    pub fn new(surface: Arc<dyn PreviewSurface>, quiet: Duration) -> Self {
        let target = Arc::clone(&surface);
        let debouncer = Debouncer::new(quiet, move |source: String| paint(target.as_ref(), &source));
        Self { surface, debouncer }
    }

    /// Render `source` once the quiet period passes without another call.
    pub fn schedule(&self, source: String) {
        self.debouncer.trigger(source);
    }

    /// Render `source` right away, dropping any pending debounced render
    /// so an older snapshot cannot overwrite it.
    pub fn render_now(&self, source: &str) {
        self.debouncer.cancel();
        paint(self.surface.as_ref(), source);
    }

    /// Whether a debounced render is waiting.
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

impl std::fmt::Debug for PreviewRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewRenderer")
            .field("debouncer", &self.debouncer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[test]
    fn blank_source_shows_placeholder() {
        assert_eq!(preview_markup(""), PREVIEW_PLACEHOLDER);
        assert_eq!(preview_markup("  \n"), PREVIEW_PLACEHOLDER);
    }

    #[test]
    fn content_is_written_verbatim() {
        let src = "  <script>alert(1)</script>\n";
        assert_eq!(preview_markup(src), src);
    }

    #[test]
    fn file_preview_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let surface = FilePreview::new(dir.path().join("preview.html"));
        surface.render("<h1>first, much longer content</h1>").unwrap();
        surface.render("<p>2</p>").unwrap();
        assert_eq!(std::fs::read_to_string(surface.path()).unwrap(), "<p>2</p>");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn edits_render_once_after_quiet_period() {
        let surface = Arc::new(MemoryPreview::new());
        let renderer = PreviewRenderer::new(surface.clone(), Duration::from_millis(500));

        for partial in ["<h", "<h1", "<h1>", "<h1>Hi</h1>"] {
            renderer.schedule(partial.to_string());
            sleep(Duration::from_millis(100)).await;
        }
        assert!(surface.renders().is_empty());

        sleep(Duration::from_millis(500)).await;
        assert_eq!(surface.renders(), vec!["<h1>Hi</h1>"]);
    }

    #[tokio::test(start_paused = true)]
    async fn render_now_supersedes_pending_edit() {
        let surface = Arc::new(MemoryPreview::new());
        let renderer = PreviewRenderer::new(surface.clone(), Duration::from_millis(500));

        renderer.schedule("<p>typed</p>".to_string());
        renderer.render_now("<p>loaded from file</p>");
        assert!(!renderer.is_pending());

        sleep(Duration::from_secs(1)).await;
        assert_eq!(surface.renders(), vec!["<p>loaded from file</p>"]);
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_blank_renders_placeholder() {
        let surface = Arc::new(MemoryPreview::new());
        let renderer = PreviewRenderer::new(surface.clone(), Duration::from_millis(500));
        renderer.schedule("   ".to_string());
        sleep(Duration::from_millis(600)).await;
        assert_eq!(surface.current().as_deref(), Some(PREVIEW_PLACEHOLDER));
    }
}
