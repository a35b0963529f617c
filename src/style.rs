//! Style injection.
//!
//! Merges a named template from the [`TemplateStore`] with optional inline
//! overrides and injects the combined CSS into a document's `<head>`. The
//! injection is a single textual substitution and is intentionally not
//! idempotent: styling an already-styled document inserts a second block.

use crate::template::TemplateStore;

/// Sentinel template name that suppresses template loading entirely.
pub const NO_TEMPLATE: &str = "none";

/// Apply a named template and inline overrides to a markup document.
///
/// The template name defaults to `"default"`; a missing template is a
/// non-fatal condition (logged by the store) and contributes no CSS.
/// Inline overrides are appended after the template text so they win on
/// cascade order. Documents without a `<head>` get one synthesized right
/// after the `<html>` opening tag; a document with neither tag is returned
/// unchanged (the pipeline normalizes documents before styling).
pub fn apply_style(
    document: &str,
    template: Option<&str>,
    inline: Option<&str>,
    store: &TemplateStore,
) -> String {
    let name = template.unwrap_or("default");

    let mut css = String::new();
    if name != NO_TEMPLATE {
        if let Some(text) = store.load(name) {
            css = text;
        }
    }

    if let Some(extra) = inline {
        if !css.is_empty() {
            css.push_str("\n\n");
        }
        css.push_str("/* custom overrides */\n");
        css.push_str(extra);
    }

    if css.is_empty() {
        return document.to_string();
    }

    let block = format!("<style>\n{}\n</style>", css);
    if document.contains("<head>") {
        document.replacen("<head>", &format!("<head>\n{}", block), 1)
    } else {
        document.replacen("<html>", &format!("<html>\n<head>\n{}\n</head>", block), 1)
    }
}
