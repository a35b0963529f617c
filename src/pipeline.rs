//! Pipeline orchestration.
//!
//! Ties the stages together: classification fills defaults the caller left
//! empty, a [`DocumentSource`] collaborator produces the markup, the styler
//! injects CSS, and the fallback chain renders. The pipeline never returns
//! an error: a failing document source is rendered as an error page and
//! rendering failures degrade inside the chain.

use log::{info, warn};

use crate::classify::{classify, ChartType, Classification};
use crate::fallback::FallbackChain;
use crate::render::RenderRequest;
use crate::style::apply_style;
use crate::template::TemplateStore;
use crate::{RenderConfig, Result};

/// A chart generation request.
///
/// `chart_type`, `template` and `inline_style` are explicit caller values;
/// any left as `None` is filled from classification of `input_text`.
/// Explicit values are never overridden.
#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub input_text: String,
    pub chart_type: Option<ChartType>,
    pub template: Option<String>,
    pub inline_style: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl ChartRequest {
    pub fn new(input_text: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
            chart_type: None,
            template: None,
            inline_style: None,
            width: 800,
            height: 600,
        }
    }
}

/// Produces a markup document from input text.
///
/// This is the seam for the text-generation collaborator; which backend
/// fills it and how prompts are built is outside this crate's scope.
pub trait DocumentSource: Send + Sync {
    fn generate(&self, input: &str, chart_type: Option<ChartType>) -> Result<String>;
}

/// Treats the input text as markup directly.
///
/// Useful for tests and for callers that already hold a document (e.g.
/// pre-generated Mermaid exports or raw HTML).
pub struct PassthroughSource;

impl DocumentSource for PassthroughSource {
    fn generate(&self, input: &str, _chart_type: Option<ChartType>) -> Result<String> {
        Ok(input.to_string())
    }
}

/// Normalize raw markup into a renderable document.
///
/// Strips a surrounding code fence and wraps fragments that lack an
/// `<html>` root in a minimal document shell.
pub fn normalize_document(content: &str) -> String {
    let mut text = content.trim().to_string();

    if text.starts_with("```") {
        let mut lines: Vec<&str> = text.split('\n').collect();
        if lines.first().is_some_and(|l| l.starts_with("```")) {
            lines.remove(0);
        }
        if lines.last().is_some_and(|l| l.trim() == "```") {
            lines.pop();
        }
        text = lines.join("\n");
    }

    if !text.trim_start().starts_with("<html") {
        text = format!("<html>\n<body>\n{}\n</body>\n</html>", text);
    }

    text
}

fn error_document(message: &str) -> String {
    let escaped = message
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        "<html><body><h1>Chart generation failed</h1><p>{}</p></body></html>",
        escaped
    )
}

/// The full text-to-image pipeline.
pub struct Pipeline {
    store: TemplateStore,
    config: RenderConfig,
}

impl Pipeline {
    pub fn new(store: TemplateStore, config: RenderConfig) -> Self {
        Self { store, config }
    }

    pub fn template_store(&self) -> &TemplateStore {
        &self.store
    }

    /// Names of the templates the pipeline can style with.
    pub fn list_templates(&self) -> Vec<String> {
        self.store.list()
    }

    /// Merge caller-supplied values with classification of the input text.
    ///
    /// Inferred values fill gaps only; an explicit value always wins.
    pub fn resolve(&self, request: &ChartRequest) -> Classification {
        let inferred = classify(&request.input_text);
        Classification {
            chart_type: request.chart_type.or(inferred.chart_type),
            template: request.template.clone().or(inferred.template),
            inline_style: request.inline_style.clone().or(inferred.inline_style),
        }
    }

    /// Generate a chart image from a request.
    ///
    /// Always returns valid PNG bytes: a failing document source renders as
    /// an error page, and rendering failures degrade through the fallback
    /// chain.
    pub fn generate(&self, request: &ChartRequest, source: &dyn DocumentSource) -> Vec<u8> {
        let resolved = self.resolve(request);
        if let Some(chart_type) = resolved.chart_type {
            info!("Generating {} chart", chart_type);
        }

        let styled = match source.generate(&request.input_text, resolved.chart_type) {
            Ok(markup) => {
                let document = normalize_document(&markup);
                apply_style(
                    &document,
                    resolved.template.as_deref(),
                    resolved.inline_style.as_deref(),
                    &self.store,
                )
            }
            Err(e) => {
                warn!("Document source failed: {}", e);
                error_document(&e.to_string())
            }
        };

        let chain = FallbackChain::new(&self.config);
        chain.render(&RenderRequest {
            document: styled,
            width: request.width,
            height: request.height,
        })
    }
}
