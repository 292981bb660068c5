//! JPEG collaborator backed by the `image` crate's codec.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageFormat};

use super::{LossyCodec, LossyFrame};
use crate::error::{CodecError, Error, Result};

/// [`LossyCodec`] adapter over `image`'s baseline JPEG encoder and decoder.
///
/// Alpha is dropped on encode since JPEG has no alpha channel.
#[derive(Debug, Clone, Copy)]
pub struct JpegCodec {
    _loaded: (),
}

impl JpegCodec {
    /// Loads the codec once.
    ///
    /// Fails with [`Error::CodecUnavailable`] when the `image` crate was built
    /// without JPEG support.
    pub fn load() -> Result<Self> {
        let format = ImageFormat::Jpeg;
        if !format.reading_enabled() || !format.writing_enabled() {
            return Err(Error::CodecUnavailable(
                "jpeg support is not compiled into the image crate".into(),
            ));
        }
        log::debug!("jpeg codec loaded");
        Ok(Self { _loaded: () })
    }
}

impl LossyCodec for JpegCodec {
    fn encode(
        &self,
        rgba: &[u8],
        width: u32,
        height: u32,
        quality: u8,
    ) -> std::result::Result<Vec<u8>, CodecError> {
        let rgb: Vec<u8> = rgba.chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]).collect();
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, quality).encode(
            &rgb,
            width,
            height,
            ExtendedColorType::Rgb8,
        )?;
        Ok(out)
    }

    fn decode(&self, bytes: &[u8]) -> std::result::Result<LossyFrame, CodecError> {
        let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?;
        let (width, height) = (image.width(), image.height());
        let (channels, bytes) = match image {
            DynamicImage::ImageLuma8(grey) => (1, grey.into_raw()),
            DynamicImage::ImageRgb8(rgb) => (3, rgb.into_raw()),
            other => (4, other.into_rgba8().into_raw()),
        };
        Ok(LossyFrame {
            width,
            height,
            channels,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codecs, DecodeFormat, EncodeFormat};
    use crate::PixelBuffer;

    #[test]
    fn loads_with_default_features() {
        assert!(JpegCodec::load().is_ok());
    }

    #[test]
    fn roundtrip_is_close() {
        let codecs = Codecs::new().with_lossy(JpegCodec::load().unwrap());
        let mut buffer = PixelBuffer::new(16, 16).unwrap();
        buffer.fill(0x808080ff);

        let bytes = codecs.encode(&buffer, &EncodeFormat::Jpeg { quality: 95 }).unwrap();
        assert_eq!(&bytes[..3], &[0xff, 0xd8, 0xff]);

        let decoded = codecs.decode(&bytes, &DecodeFormat::Auto).unwrap();
        assert_eq!(decoded.dimensions(), (16, 16));
        let [r, g, b, a] = decoded.get(8, 8).unwrap().to_be_bytes();
        assert!(r.abs_diff(0x80) <= 2 && g.abs_diff(0x80) <= 2 && b.abs_diff(0x80) <= 2);
        assert_eq!(a, 0xff);
    }

    #[test]
    fn garbage_is_a_codec_error() {
        let codecs = Codecs::new().with_lossy(JpegCodec::load().unwrap());
        assert!(matches!(
            codecs.decode(&[0xff, 0xd8, 0xff, 0x00, 0x01], &DecodeFormat::Jpeg),
            Err(Error::Codec(_))
        ));
    }
}
