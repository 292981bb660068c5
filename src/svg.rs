//! SVG rasterization using resvg/usvg.

use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};
use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::error::{Error, Result};

/// How to size the rasterized document.
///
/// Serializes as `{ "zoom": 2.0 }`, `{ "width": 64 }` or `{ "height": 64 }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SvgFit {
    /// Multiply the intrinsic size.
    Zoom(f32),
    /// Scale to this width, keeping the aspect ratio.
    Width(u32),
    /// Scale to this height, keeping the aspect ratio.
    Height(u32),
}

/// Renders an SVG document into a new buffer.
///
/// Without a `fit` the document's intrinsic size is used. Parse failures are
/// reported as [`Error::Codec`].
pub fn rasterize(data: &[u8], fit: Option<SvgFit>) -> Result<PixelBuffer> {
    let tree = Tree::from_data(data, &Options::default()).map_err(|e| Error::Codec(Box::new(e)))?;

    let size = tree.size();
    let scale = match fit {
        None => 1.0,
        Some(SvgFit::Zoom(zoom)) if zoom.is_finite() && zoom > 0.0 => zoom,
        Some(SvgFit::Zoom(zoom)) => return Err(Error::invalid(format!("invalid svg zoom: {zoom}"))),
        Some(SvgFit::Width(width)) => width as f32 / size.width(),
        Some(SvgFit::Height(height)) => height as f32 / size.height(),
    };
    let width = ((size.width() * scale).ceil() as u32).max(1);
    let height = ((size.height() * scale).ceil() as u32).max(1);

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| Error::invalid(format!("cannot allocate a {width}x{height} svg canvas")))?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    let mut bitmap = pixmap.take();
    for px in bitmap.chunks_exact_mut(4) {
        unpremultiply(px);
    }

    log::debug!("rasterized svg ({} bytes) at {width}x{height}", data.len());
    PixelBuffer::from_raw(width, height, bitmap)
}

/// Converts a premultiplied RGBA pixel to straight alpha.
fn unpremultiply(px: &mut [u8]) {
    match px[3] {
        0 => px.fill(0),
        255 => {}
        alpha => {
            let a = alpha as f32 / 255.0;
            for channel in &mut px[..3] {
                *channel = (*channel as f32 / a).round().min(255.0) as u8;
            }
        }
    }
}
