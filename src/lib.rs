//! Chartshot
//!
//! A library for turning free-form chart descriptions (or Mermaid-like
//! markup) into styled, transparent-background PNG images.
//!
//! # Pipeline
//!
//! - **Classify**: pure heuristics infer the chart category, a named CSS
//!   template, and inline style overrides from the raw input text
//! - **Style**: the named template (looked up in a template directory) and
//!   inline overrides are injected into the document `<head>`
//! - **Render**: a scoped headless browser session loads the document,
//!   measures the content box, clamps the viewport and captures a PNG
//! - **Degrade**: on any rendering failure a fallback chain produces an
//!   error screenshot, a synthesized text image, or a constant placeholder
//!   pixel, so callers always receive valid image bytes
//!
//! # Example
//!
//! ```no_run
//! use chartshot::{classify, FallbackChain, RenderConfig, RenderRequest};
//!
//! let result = classify("flowchart showing login steps");
//! assert!(result.chart_type.is_some());
//!
//! let config = RenderConfig::default();
//! let chain = FallbackChain::new(&config);
//! let png = chain.render(&RenderRequest {
//!     document: "<html><body><h1>Login</h1></body></html>".to_string(),
//!     width: 800,
//!     height: 600,
//! });
//! assert!(!png.is_empty());
//! ```

use std::path::PathBuf;
use std::str::FromStr;

pub mod error;
pub use error::{Error, Result};

pub mod classify;
pub use classify::{classify, ChartType, Classification};

pub mod template;
pub use template::TemplateStore;

pub mod style;
pub use style::apply_style;

pub mod render;
pub use render::{Renderer, RenderRequest};

pub mod fallback;
pub use fallback::{FallbackChain, PLACEHOLDER_PNG};

pub mod pipeline;
pub use pipeline::{ChartRequest, DocumentSource, PassthroughSource, Pipeline};

// Async-friendly facade (worker-thread backed)
pub mod service;
pub use service::ChartService;

/// Browser engine variant used for rendering.
///
/// A closed set of Chromium-family engines, all driven over the DevTools
/// protocol. The variant is injected through [`RenderConfig`] rather than
/// read from the environment inside the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserKind {
    /// Plain Chromium (or whatever the default discovery finds)
    #[default]
    Chromium,
    /// Google Chrome
    Chrome,
    /// Microsoft Edge
    Edge,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Chrome => "chrome",
            BrowserKind::Edge => "edge",
        }
    }
}

impl FromStr for BrowserKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" => Ok(BrowserKind::Chromium),
            "chrome" => Ok(BrowserKind::Chrome),
            "edge" => Ok(BrowserKind::Edge),
            other => Err(Error::Config(format!("Unknown browser engine: {}", other))),
        }
    }
}

impl std::fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Viewport dimensions
///
/// For a render call these are *minimum* bounds: the captured image is
/// never smaller than the viewport on either axis, and never more than
/// twice as large.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// Configuration for the rendering stage
///
/// An explicit configuration object passed into constructors so tests can
/// build isolated instances without global side effects.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Which browser engine to launch
    pub browser: BrowserKind,
    /// Default viewport (per-call requests override this)
    pub viewport: Viewport,
    /// Timeout for document loads in milliseconds. Hitting it is treated
    /// as best-effort success, not failure.
    pub timeout_ms: u64,
    /// Whether to run the browser headless (always true in practice)
    pub headless: bool,
    /// If set, the pre-render document is persisted here under a
    /// content-addressed name for inspection
    pub debug_dir: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chromium,
            viewport: Viewport::default(),
            timeout_ms: 30000,
            headless: true,
            debug_dir: None,
        }
    }
}
