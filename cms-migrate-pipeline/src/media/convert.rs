//! Image resizing and re-encoding. Every function here is blocking and is
//! meant to run on `tokio::task::spawn_blocking`.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::config::OutputFormat;
use crate::errors::MediaError;
use crate::media::discovery::extension_of;

/// A file on disk with the facts recorded about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
}

/// Encoder settings shared by every conversion of a run.
#[derive(Debug, Clone, Copy)]
pub struct Encoding {
    pub format: OutputFormat,
    /// Applies to JPEG output; WebP output is lossless.
    pub quality: u8,
}

/// Resizes `source` to exactly `width`×`height`, cropping the overflow, and
/// writes it to `target`. An existing target is left untouched.
pub fn resize_to_fill(
    source: &Path,
    target: &Path,
    width: u32,
    height: u32,
    encoding: Encoding,
) -> Result<WrittenFile, MediaError> {
    if target.exists() {
        return inspect(target);
    }
    let image = open(source)?;
    let resized = image.resize_to_fill(width, height, FilterType::Lanczos3);
    write(&resized, target, encoding)
}

/// Writes a copy of `source` scaled down to fit inside `max_width`×`max_height`,
/// preserving aspect ratio. Smaller images are re-encoded at their own size.
/// An existing target is left untouched.
pub fn fit_inside(
    source: &Path,
    target: &Path,
    max_width: u32,
    max_height: u32,
    encoding: Encoding,
) -> Result<WrittenFile, MediaError> {
    if target.exists() {
        return inspect(target);
    }
    let image = open(source)?;
    let (width, height) = image.dimensions();
    let image = if width > max_width || height > max_height {
        image.resize(max_width, max_height, FilterType::Lanczos3)
    } else {
        image
    };
    write(&image, target, encoding)
}

/// Reads the size and pixel dimensions of an existing file. Dimensions are
/// zero for files that are not decodable raster images.
pub fn inspect(path: &Path) -> Result<WrittenFile, MediaError> {
    let bytes = fs::metadata(path).map_err(|e| MediaError::io(path, e))?.len();
    let (width, height) = match extension_of(path).as_deref() {
        Some("jpg" | "jpeg" | "png" | "gif" | "webp") => {
            image::image_dimensions(path).map_err(|e| MediaError::image(path, e))?
        }
        _ => (0, 0),
    };
    Ok(WrittenFile {
        path: path.to_path_buf(),
        width,
        height,
        bytes,
    })
}

/// Deletes `path` if a sibling with the same stem exists in `extension`.
///
/// # Returns
///
/// The number of bytes freed, zero when nothing was deleted.
pub fn remove_if_superseded(path: &Path, extension: &str) -> Result<u64, MediaError> {
    if extension_of(path).as_deref() == Some(extension) {
        return Ok(0);
    }
    if !path.with_extension(extension).exists() {
        return Ok(0);
    }
    let bytes = fs::metadata(path).map_err(|e| MediaError::io(path, e))?.len();
    fs::remove_file(path).map_err(|e| MediaError::io(path, e))?;
    Ok(bytes)
}

fn open(path: &Path) -> Result<DynamicImage, MediaError> {
    image::open(path).map_err(|e| MediaError::image(path, e))
}

fn write(image: &DynamicImage, target: &Path, encoding: Encoding) -> Result<WrittenFile, MediaError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| MediaError::io(parent, e))?;
    }
    let file = File::create(target).map_err(|e| MediaError::io(target, e))?;
    let mut writer = BufWriter::new(file);

    let result = match encoding.format {
        OutputFormat::WebP => {
            DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(WebPEncoder::new_lossless(&mut writer))
        }
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut writer, encoding.quality)),
        OutputFormat::Png => image.write_with_encoder(PngEncoder::new(&mut writer)),
    };
    result.map_err(|e| MediaError::image(target, e))?;
    writer.flush().map_err(|e| MediaError::io(target, e))?;

    let (width, height) = image.dimensions();
    let bytes = fs::metadata(target).map_err(|e| MediaError::io(target, e))?.len();
    Ok(WrittenFile {
        path: target.to_path_buf(),
        width,
        height,
        bytes,
    })
}
