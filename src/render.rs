//! Headless browser rendering.
//!
//! Drives a Chromium-family browser over the DevTools protocol (via the
//! `headless_chrome` crate) to load a markup document, measure its natural
//! content box, clamp the viewport to `[requested, 2x requested]` and
//! capture a transparent-background PNG.
//!
//! A [`RenderSession`] owns the browser process for the duration of one
//! render call; dropping it tears the process down, so cleanup runs on
//! every exit path including panics and cancelled callers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as Base64Engine;
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::DOM::RGBA;
use headless_chrome::protocol::cdp::{Emulation, Page};
use headless_chrome::types::Bounds;
use headless_chrome::{Browser, LaunchOptions};
use log::{debug, info, warn};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{BrowserKind, Error, RenderConfig, Result};

/// A single render invocation: a markup document plus minimum output bounds.
///
/// `width` and `height` are lower bounds, not a fixed output size; the
/// captured image is at most twice as large on each axis.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub document: String,
    pub width: u32,
    pub height: u32,
}

// Natural content box: the maximum of scroll/offset/client extents across
// body and the root element, returned as JSON so the value survives the
// protocol round-trip intact.
const MEASURE_JS: &str = r#"
(function () {
    const body = document.body;
    const html = document.documentElement;
    const width = Math.max(
        body.scrollWidth, body.offsetWidth,
        html.clientWidth, html.scrollWidth, html.offsetWidth
    );
    const height = Math.max(
        body.scrollHeight, body.offsetHeight,
        html.clientHeight, html.scrollHeight, html.offsetHeight
    );
    return JSON.stringify({ width, height });
})()
"#;

#[derive(Deserialize)]
struct ContentSize {
    width: f64,
    height: f64,
}

/// Clamp a measured content extent to `[requested, 2x requested]`.
///
/// The lower bound keeps output at least as large as the caller asked for;
/// the upper bound protects against runaway layouts.
pub fn clamp_axis(measured: u32, requested: u32) -> u32 {
    measured.min(requested.saturating_mul(2)).max(requested)
}

/// Resolve the executable for a browser engine variant.
///
/// `Chromium` defers to the crate's own discovery; the named variants are
/// looked up on `PATH` and are an initialization error when absent.
pub(crate) fn executable_for(kind: BrowserKind) -> Result<Option<PathBuf>> {
    match kind {
        BrowserKind::Chromium => Ok(None),
        BrowserKind::Chrome => {
            find_in_path(&["google-chrome", "google-chrome-stable", "chrome"])
                .map(Some)
                .ok_or_else(|| Error::Initialization("Chrome executable not found in PATH".into()))
        }
        BrowserKind::Edge => find_in_path(&["microsoft-edge", "microsoft-edge-stable", "msedge"])
            .map(Some)
            .ok_or_else(|| Error::Initialization("Edge executable not found in PATH".into())),
    }
}

fn find_in_path(candidates: &[&str]) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&paths) {
        for name in candidates {
            let full = dir.join(name);
            if full.is_file() {
                return Some(full);
            }
        }
    }
    None
}

/// Persist the pre-render document under a content-addressed name, if a
/// debug directory is configured. Side effect only; failures are logged.
pub(crate) fn dump_debug_artifact(config: &RenderConfig, document: &str) {
    if let Some(dir) = &config.debug_dir {
        let digest = hex::encode(Sha256::digest(document.as_bytes()));
        let path = dir.join(format!("chart_{}.html", &digest[..16]));
        let written = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, document));
        match written {
            Ok(()) => info!("Saved pre-render document to {:?}", path),
            Err(e) => warn!("Failed to persist debug document: {}", e),
        }
    }
}

/// A scoped browser session for one render call.
///
/// The underlying browser process is owned by this value and terminated
/// when it goes out of scope, whichever way the call exits.
pub struct RenderSession {
    browser: Browser,
    tab: Arc<Tab>,
}

impl RenderSession {
    /// Launch the configured engine headless with an initial viewport of
    /// `(width, height)`.
    pub fn launch(config: &RenderConfig, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Config(format!(
                "Viewport dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        let path = executable_for(config.browser)?;
        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((width, height)))
            .path(path)
            .build()
            .map_err(|e| Error::Initialization(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options).map_err(|e| {
            Error::Initialization(format!("Failed to launch {}: {}", config.browser, e))
        })?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::Initialization(format!("Failed to create tab: {}", e)))?;

        tab.set_default_timeout(Duration::from_millis(config.timeout_ms));

        Ok(Self { browser, tab })
    }

    /// Load the document via a data URL and wait for the page to settle.
    ///
    /// A wait timeout is best-effort success: the current layout is used
    /// as-is rather than failing the render.
    pub fn set_content(&self, document: &str) -> Result<()> {
        let encoded = Base64Engine::encode(&base64::engine::general_purpose::STANDARD, document);
        let url = format!("data:text/html;charset=utf-8;base64,{}", encoded);

        self.tab
            .navigate_to(&url)
            .map_err(|e| Error::Load(format!("Navigation failed: {}", e)))?;

        if let Err(e) = self.tab.wait_until_navigated() {
            warn!("Page did not reach idle in time, proceeding best-effort: {}", e);
        }

        // Let in-document scripts settle before measuring.
        std::thread::sleep(Duration::from_millis(500));

        Ok(())
    }

    /// Measure the natural content box of the loaded document.
    pub fn measure(&self) -> Result<(u32, u32)> {
        let eval = self
            .tab
            .evaluate(MEASURE_JS, false)
            .map_err(|e| Error::Render(format!("Content measurement failed: {}", e)))?;

        let value = eval
            .value
            .ok_or_else(|| Error::Render("No value returned from measurement".into()))?;
        let raw = value
            .as_str()
            .ok_or_else(|| Error::Render("Measurement did not return a string".into()))?;

        let size: ContentSize = serde_json::from_str(raw)
            .map_err(|e| Error::Render(format!("Malformed measurement payload: {}", e)))?;

        Ok((size.width.max(1.0) as u32, size.height.max(1.0) as u32))
    }

    /// Re-apply a computed viewport.
    pub fn resize(&self, width: u32, height: u32) -> Result<()> {
        self.tab
            .set_bounds(Bounds::Normal {
                left: None,
                top: None,
                width: Some(width as f64),
                height: Some(height as f64),
            })
            .map_err(|e| Error::Render(format!("Viewport resize failed: {}", e)))?;
        Ok(())
    }

    /// Capture a PNG of the page with a fully transparent background,
    /// clipped to exactly `(width, height)`.
    pub fn capture(&self, width: u32, height: u32) -> Result<Vec<u8>> {
        self.tab
            .call_method(Emulation::SetDefaultBackgroundColorOverride {
                color: Some(RGBA {
                    r: 0,
                    g: 0,
                    b: 0,
                    a: Some(0.0),
                }),
            })
            .map_err(|e| Error::Render(format!("Background override failed: {}", e)))?;

        let clip = Page::Viewport {
            x: 0.0,
            y: 0.0,
            width: width as f64,
            height: height as f64,
            scale: 1.0,
        };
        let bytes = self
            .tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, Some(clip), true)
            .map_err(|e| Error::Render(format!("Screenshot failed: {}", e)))?;

        if bytes.is_empty() {
            return Err(Error::Render("Screenshot returned no data".into()));
        }
        Ok(bytes)
    }

    /// One more screenshot of whatever is currently loaded, with no content
    /// or viewport changes. Used by the fallback chain after a failure.
    pub fn capture_current(&self) -> Result<Vec<u8>> {
        let bytes = self
            .tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| Error::Render(format!("Error screenshot failed: {}", e)))?;

        if bytes.is_empty() {
            return Err(Error::Render("Error screenshot returned no data".into()));
        }
        Ok(bytes)
    }

    /// Run the full sequence: load, measure, clamp, resize, capture.
    pub fn render_document(&self, request: &RenderRequest) -> Result<Vec<u8>> {
        self.set_content(&request.document)?;

        let (content_width, content_height) = self.measure()?;
        let width = clamp_axis(content_width, request.width);
        let height = clamp_axis(content_height, request.height);
        debug!(
            "Content {}x{}, capturing at {}x{}",
            content_width, content_height, width, height
        );

        self.resize(width, height)?;
        self.capture(width, height)
    }

    /// Close the session, tearing down the browser process.
    pub fn close(self) -> Result<()> {
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}

/// Renders documents through scoped browser sessions.
///
/// `render` surfaces failures to the caller; wrap it in a
/// [`crate::FallbackChain`] for the never-failing variant.
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render a document to PNG bytes, surfacing any failure.
    ///
    /// The browser session lives exactly as long as this call.
    pub fn render(&self, request: &RenderRequest) -> Result<Vec<u8>> {
        dump_debug_artifact(&self.config, &request.document);
        let session = RenderSession::launch(&self.config, request.width, request.height)?;
        let result = session.render_document(request);
        session.close()?;
        result
    }
}
