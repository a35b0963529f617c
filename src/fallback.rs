//! Degrading render fallbacks.
//!
//! Wraps the renderer with three strategies attempted in strict order:
//! an error screenshot of whatever the failed session still shows, a
//! browser-free synthesized text image, and finally a constant placeholder
//! pixel. The chain never returns an error and never returns empty bytes.

use log::{info, warn};
use resvg::usvg::fontdb;

use crate::render::{dump_debug_artifact, RenderRequest, RenderSession};
use crate::{Error, RenderConfig, Result};

/// A minimal valid PNG: one fully transparent pixel.
///
/// A literal constant so the last fallback tier can never itself fail.
pub const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d,
    0x49, 0x48, 0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
    0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4, 0x89, 0x00, 0x00, 0x00,
    0x0b, 0x49, 0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0x60, 0x00, 0x02, 0x00,
    0x00, 0x05, 0x00, 0x01, 0xe9, 0xfa, 0xdc, 0xd8, 0x00, 0x00, 0x00, 0x00,
    0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

const ERROR_CARD_WIDTH: u32 = 800;
const ERROR_CARD_HEIGHT: u32 = 400;

/// Never-failing render front end.
///
/// Runs the full render sequence and, on any failure, degrades through the
/// strategies described at module level. Each call owns its own browser
/// session; the session is torn down on every path.
pub struct FallbackChain<'a> {
    config: &'a RenderConfig,
}

impl<'a> FallbackChain<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    /// Render a document, always returning valid PNG bytes.
    pub fn render(&self, request: &RenderRequest) -> Vec<u8> {
        dump_debug_artifact(self.config, &request.document);

        let session = match RenderSession::launch(self.config, request.width, request.height) {
            Ok(session) => session,
            Err(e) => {
                warn!("Render failed before a page existed: {}", e);
                return self.degrade(&e, None);
            }
        };

        let bytes = match session.render_document(request) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Render failed, degrading: {}", e);
                self.degrade(&e, Some(&session))
            }
        };

        let _ = session.close();
        bytes
    }

    fn degrade(&self, error: &Error, session: Option<&RenderSession>) -> Vec<u8> {
        // Partial rendering beats nothing: one more screenshot of whatever
        // the page currently shows, no content or viewport changes.
        if let Some(session) = session {
            if let Ok(bytes) = session.capture_current() {
                info!("Degraded to error screenshot");
                return bytes;
            }
        }

        match synthesize_error_image(&error.to_string()) {
            Ok(bytes) => {
                info!("Degraded to synthesized error image");
                bytes
            }
            Err(e) => {
                warn!("Error image synthesis failed ({}), returning placeholder", e);
                PLACEHOLDER_PNG.to_vec()
            }
        }
    }
}

/// Draw an error message onto a fixed-size canvas without a browser.
///
/// The message is wrapped into an SVG text card, rasterized with system
/// fonts and encoded as PNG.
fn synthesize_error_image(message: &str) -> Result<Vec<u8>> {
    let svg = error_card_svg(message);

    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    let opts = resvg::usvg::Options {
        fontdb: std::sync::Arc::new(db),
        ..Default::default()
    };

    let tree = resvg::usvg::Tree::from_str(&svg, &opts)
        .map_err(|e| Error::Render(format!("Error card SVG rejected: {}", e)))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(ERROR_CARD_WIDTH, ERROR_CARD_HEIGHT)
        .ok_or_else(|| Error::Render("Failed to allocate error card pixmap".into()))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );

    let rgba = pixmap.data().to_vec();
    let img = image::RgbaImage::from_raw(ERROR_CARD_WIDTH, ERROR_CARD_HEIGHT, rgba)
        .ok_or_else(|| Error::Render("Failed to build error card image".into()))?;

    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| Error::Render(format!("Failed to encode error card: {}", e)))?;
    Ok(bytes)
}

fn error_card_svg(message: &str) -> String {
    let mut texts = String::new();
    let mut y = 64;
    for line in wrap_lines(message, 78, 13) {
        texts.push_str(&format!(
            "<text x=\"24\" y=\"{}\" font-family=\"sans-serif\" font-size=\"15\" fill=\"#b91c1c\">{}</text>",
            y,
            xml_escape(&line)
        ));
        y += 24;
    }

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\">\
         <rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\
         <text x=\"24\" y=\"36\" font-family=\"sans-serif\" font-size=\"20\" font-weight=\"bold\" fill=\"#b91c1c\">Render error</text>\
         {texts}</svg>",
        w = ERROR_CARD_WIDTH,
        h = ERROR_CARD_HEIGHT,
        texts = texts
    )
}

fn wrap_lines(message: &str, width: usize, max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    'outer: for raw in message.lines() {
        let mut current = String::new();
        let mut count = 0;
        for ch in raw.chars() {
            current.push(ch);
            count += 1;
            if count >= width {
                lines.push(std::mem::take(&mut current));
                count = 0;
                if lines.len() == max_lines {
                    break 'outer;
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
            if lines.len() == max_lines {
                break;
            }
        }
    }
    lines
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_a_valid_transparent_pixel() {
        let img = image::load_from_memory(PLACEHOLDER_PNG).expect("placeholder must decode");
        assert_eq!((img.width(), img.height()), (1, 1));
        assert_eq!(img.to_rgba8().get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn synthesized_image_has_fixed_dimensions() {
        let bytes = synthesize_error_image("Engine initialization failed: no browser").unwrap();
        let img = image::load_from_memory(&bytes).expect("error card must decode");
        assert_eq!((img.width(), img.height()), (800, 400));
    }

    #[test]
    fn synthesized_image_survives_markup_in_message() {
        let bytes = synthesize_error_image("<script>&\"oops\"</script>").unwrap();
        assert!(image::load_from_memory(&bytes).is_ok());
    }

    #[test]
    fn wrap_lines_bounds_output() {
        let long = "x".repeat(1000);
        let lines = wrap_lines(&long, 78, 13);
        assert_eq!(lines.len(), 13);
        assert!(lines.iter().all(|l| l.chars().count() <= 78));
    }

    #[test]
    fn chain_degrades_without_a_browser() {
        // Zero width fails before launch, so no error screenshot is
        // possible and the chain must still produce decodable bytes.
        let config = RenderConfig::default();
        let chain = FallbackChain::new(&config);
        let bytes = chain.render(&RenderRequest {
            document: "<html></html>".to_string(),
            width: 0,
            height: 600,
        });
        assert!(!bytes.is_empty());
        assert!(image::load_from_memory(&bytes).is_ok());
    }
}
