//! Image decoding for uploads.
//!
//! The whole image is decoded, so a valid header in front of corrupt pixel
//! data is rejected. Only PNG, JPEG, GIF and BMP are accepted.

use std::io::Cursor;

use ::image::{io::Reader as ImageReader, GenericImageView};

use ingestor_core::error::{IngestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }

    fn from_guessed(format: Option<::image::ImageFormat>) -> Result<Self> {
        match format {
            Some(::image::ImageFormat::Png) => Ok(ImageFormat::Png),
            Some(::image::ImageFormat::Jpeg) => Ok(ImageFormat::Jpeg),
            Some(::image::ImageFormat::Gif) => Ok(ImageFormat::Gif),
            Some(::image::ImageFormat::Bmp) => Ok(ImageFormat::Bmp),
            _ => Err(IngestError::Decode("unsupported image format".into())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| IngestError::Decode(format!("reading image: {e}")))?;
    let format = ImageFormat::from_guessed(reader.format())?;

    let decoded = reader
        .decode()
        .map_err(|e| IngestError::Decode(format!("{} image: {e}", format.as_str())))?;

    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return Err(IngestError::Decode(format!(
            "{} image has zero dimension ({width}x{height})",
            format.as_str()
        )));
    }
    Ok(DecodedImage { format, width, height })
}
