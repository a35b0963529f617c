//! Integration tests for the rendering pipeline
//!
//! These drive a real headless browser and are ignored by default.

use chartshot::{
    ChartRequest, FallbackChain, PassthroughSource, Pipeline, Renderer, RenderConfig,
    RenderRequest, TemplateStore, PLACEHOLDER_PNG,
};

fn test_document(body: &str) -> String {
    format!(
        "<html><head><title>t</title></head><body>{}</body></html>",
        body
    )
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_render_normal_document() {
    if std::env::var("CI").is_ok() {
        return;
    }

    let renderer = Renderer::new(RenderConfig::default());
    let png = renderer
        .render(&RenderRequest {
            document: test_document("<h1>Hello</h1><p>A normal page.</p>"),
            width: 400,
            height: 300,
        })
        .expect("Failed to render");

    assert!(png.len() > 100, "PNG data seems too small");
    // PNG files start with these magic bytes
    assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_output_dimensions_respect_clamp() {
    if std::env::var("CI").is_ok() {
        return;
    }

    // Content much wider than the viewport: output must stay within
    // [requested, 2x requested] on each axis.
    let wide = test_document("<div style=\"width:3000px;height:20px;background:#00f\"></div>");
    let renderer = Renderer::new(RenderConfig::default());
    let png = renderer
        .render(&RenderRequest {
            document: wide,
            width: 400,
            height: 300,
        })
        .expect("Failed to render");

    let img = image::load_from_memory(&png).expect("Output must decode");
    assert!(img.width() >= 400 && img.width() <= 800, "width {}", img.width());
    assert!(img.height() >= 300 && img.height() <= 600, "height {}", img.height());
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_small_content_keeps_requested_minimum() {
    if std::env::var("CI").is_ok() {
        return;
    }

    let tiny = test_document("<div style=\"width:10px;height:10px\"></div>");
    let renderer = Renderer::new(RenderConfig::default());
    let png = renderer
        .render(&RenderRequest {
            document: tiny,
            width: 400,
            height: 300,
        })
        .expect("Failed to render");

    let img = image::load_from_memory(&png).expect("Output must decode");
    assert!(img.width() >= 400);
    assert!(img.height() >= 300);
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_throwing_document_still_yields_bytes() {
    if std::env::var("CI").is_ok() {
        return;
    }

    let config = RenderConfig::default();
    let chain = FallbackChain::new(&config);
    let png = chain.render(&RenderRequest {
        document: test_document("<script>throw new Error('boom')</script><p>after</p>"),
        width: 400,
        height: 300,
    });

    assert!(!png.is_empty());
    assert!(image::load_from_memory(&png).is_ok());
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_hanging_document_is_best_effort() {
    if std::env::var("CI").is_ok() {
        return;
    }

    // A subresource on a non-routable address keeps the network busy past
    // the (short) timeout; the render must still produce valid bytes.
    let hanging = test_document(
        "<p>visible</p><img src=\"http://10.255.255.1/never.png\" width=\"1\" height=\"1\">",
    );
    let config = RenderConfig {
        timeout_ms: 1500,
        ..Default::default()
    };
    let chain = FallbackChain::new(&config);
    let png = chain.render(&RenderRequest {
        document: hanging,
        width: 400,
        height: 300,
    });

    assert!(!png.is_empty());
    assert!(image::load_from_memory(&png).is_ok());
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_end_to_end_flowchart_takes_normal_path() {
    if std::env::var("CI").is_ok() {
        return;
    }

    let pipeline = Pipeline::new(TemplateStore::new("templates"), RenderConfig::default());
    let request = ChartRequest::new(
        "flowchart showing login steps\n<div class=\"chart-container\"><div class=\"node\">Login</div></div>",
    );

    let resolved = pipeline.resolve(&request);
    assert_eq!(resolved.chart_type.map(|t| t.to_string()), Some("flowchart".to_string()));
    assert_eq!(resolved.template, None);
    assert_eq!(resolved.inline_style, None);

    let png = pipeline.generate(&request, &PassthroughSource);
    assert!(!png.is_empty());
    assert_ne!(png.as_slice(), PLACEHOLDER_PNG, "normal path must not degrade");
    let img = image::load_from_memory(&png).expect("Output must decode");
    assert!(img.width() >= 800);
    assert!(img.height() >= 600);
}
