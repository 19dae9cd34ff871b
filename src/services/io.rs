//! Image I/O operations service
//!
//! Keeps decoding and encoding out of the pipeline so that the stages only
//! ever see decoded pixel buffers.

use crate::{
    config::OutputFormat,
    error::{ColorizeError, Result},
};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

/// Service for handling image file input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path
    ///
    /// Extension-based detection is tried first, then content sniffing.
    ///
    /// # Errors
    /// - `Io` when the file is missing or unreadable
    /// - `Decode` when neither detection method yields an image
    ///
    /// # Examples
    /// ```rust,no_run
    /// use garment_colorize::services::ImageIOService;
    ///
    /// let sketch = ImageIOService::load_image("sketch.png")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(ColorizeError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                log::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    e
                );

                let data = std::fs::read(path_ref)
                    .map_err(|io_err| ColorizeError::file_io_error("read image data", path_ref, &io_err))?;

                image::load_from_memory(&data).map_err(|content_err| {
                    ColorizeError::decode(format!(
                        "{} is not a readable image ({} bytes): {}",
                        path_ref.display(),
                        data.len(),
                        content_err
                    ))
                })
            },
        }
    }

    /// Decode an image from raw bytes
    ///
    /// # Errors
    /// - `Decode` for empty or malformed data
    pub fn load_from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(ColorizeError::decode("Image data is empty"));
        }
        image::load_from_memory(bytes)
            .map_err(|e| ColorizeError::decode(format!("Failed to decode image from bytes: {}", e)))
    }

    /// Check if a file path has a supported image extension
    pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                matches!(
                    ext.to_lowercase().as_str(),
                    "jpg" | "jpeg" | "png" | "webp" | "tiff" | "tif"
                )
            })
    }

    /// Encode an image into bytes
    ///
    /// JPEG uses `quality` (clamped to 1-100); the other formats are lossless.
    ///
    /// # Errors
    /// - `UnsupportedFormat` when WebP support is compiled out
    /// - `Processing` when the encoder fails
    pub fn encode_image(image: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
        #[cfg(not(feature = "webp-support"))]
        if matches!(format, OutputFormat::WebP) {
            return Err(ColorizeError::unsupported_format("webp (built without webp-support)"));
        }

        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        let result = match format {
            OutputFormat::Png => image.write_to(&mut cursor, ImageFormat::Png),
            OutputFormat::Tiff => image.write_to(&mut cursor, ImageFormat::Tiff),
            OutputFormat::Jpeg => {
                let rgb = image.to_rgb8();
                JpegEncoder::new_with_quality(&mut cursor, quality.clamp(1, 100)).encode_image(&rgb)
            },
            // Lossless WebP; the encoder takes 8-bit RGB(A) only
            OutputFormat::WebP => DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut cursor, ImageFormat::WebP),
        };

        result.map_err(|e| {
            ColorizeError::processing_stage_error(
                "image encode",
                &format!("Failed to encode {}: {}", format, e),
                Some(&format!("{}x{}", image.width(), image.height())),
            )
        })?;

        Ok(buffer)
    }

    /// Save an image to a file in the specified format
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    /// - `Io` when the directory or file cannot be written
    /// - Encoding errors as for [`ImageIOService::encode_image`]
    pub fn save_image<P: AsRef<Path>>(
        image: &DynamicImage,
        path: P,
        format: OutputFormat,
        quality: u8,
    ) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ColorizeError::file_io_error("create output directory", parent, &e))?;
            }
        }

        let bytes = Self::encode_image(image, format, quality)?;
        std::fs::write(path_ref, &bytes)
            .map_err(|e| ColorizeError::file_io_error("write output image", path_ref, &e))?;

        log::debug!(
            "Saved {} ({} bytes, {})",
            path_ref.display(),
            bytes.len(),
            format
        );
        Ok(())
    }
}
