//! PNG export with embedded run metadata (tEXt chunks).

use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use crate::buffer::RenderBuffer;
use crate::error::RenderError;

/// Metadata to embed in an exported PNG as tEXt chunks.
///
/// `seed` together with `fractal` and `iterations` is enough to reproduce the
/// exact point sequence that produced the image.
#[derive(Debug, Clone)]
pub struct ExportMetadata {
    /// Stable job name, e.g. `barnsley-fern`.
    pub fractal: String,
    /// Human-readable title.
    pub label: String,
    pub map_count: usize,
    pub iterations: usize,
    pub seed: u64,
    pub points_plotted: usize,
}

/// Write an RGBA buffer as a PNG file with embedded run metadata.
///
/// Parent directories are created as needed.
pub fn export_png(
    buffer: &RenderBuffer,
    path: &Path,
    metadata: &ExportMetadata,
) -> crate::Result<()> {
    let expected = buffer.width as usize * buffer.height as usize * 4;
    if buffer.pixels.len() != expected {
        return Err(RenderError::BufferSize {
            expected,
            actual: buffer.pixels.len(),
        });
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, buffer.width, buffer.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder.add_text_chunk("Software".to_string(), "IfsRust".to_string())?;
    encoder.add_text_chunk("Title".to_string(), metadata.label.clone())?;
    encoder.add_text_chunk("Description".to_string(), build_description(metadata))?;
    for (key, value) in build_metadata_pairs(buffer, metadata) {
        encoder.add_text_chunk(key, value)?;
    }

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&buffer.pixels)?;
    png_writer.finish()?;

    debug!(
        "Exported PNG {}x{} to {}",
        buffer.width,
        buffer.height,
        path.display()
    );
    Ok(())
}

fn build_description(meta: &ExportMetadata) -> String {
    format!(
        "{} - {} maps, {} iterations, seed {}",
        meta.label, meta.map_count, meta.iterations, meta.seed
    )
}

fn build_metadata_pairs(buffer: &RenderBuffer, meta: &ExportMetadata) -> Vec<(String, String)> {
    vec![
        ("IfsRust.Fractal".into(), meta.fractal.clone()),
        ("IfsRust.Maps".into(), meta.map_count.to_string()),
        ("IfsRust.Iterations".into(), meta.iterations.to_string()),
        ("IfsRust.Seed".into(), meta.seed.to_string()),
        ("IfsRust.PointsPlotted".into(), meta.points_plotted.to_string()),
        (
            "IfsRust.Resolution".into(),
            format!("{}x{}", buffer.width, buffer.height),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn meta() -> ExportMetadata {
        ExportMetadata {
            fractal: "sierpinski".into(),
            label: "Sierpinski Triangle".into(),
            map_count: 3,
            iterations: 1000,
            seed: 42,
            points_plotted: 1000,
        }
    }

    #[test]
    fn export_creates_valid_png() {
        let buffer = RenderBuffer::filled(4, 4, [128, 128, 128, 255]);
        let dir = std::env::temp_dir().join("ifsrust_test_export");
        let _ = std::fs::remove_dir_all(&dir);
        // Nested path: parent directories are created on demand.
        let path = dir.join("nested").join("test_export.png");
        export_png(&buffer, &path, &meta()).expect("export should succeed");

        let mut file = std::fs::File::open(&path).expect("file should exist");
        let mut header = [0u8; 8];
        file.read_exact(&mut header).expect("should read header");
        assert_eq!(&header, b"\x89PNG\r\n\x1a\n", "valid PNG signature");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn export_embeds_text_chunks() {
        let buffer = RenderBuffer::new(2, 2);
        let dir = std::env::temp_dir().join("ifsrust_test_export_meta");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("test_meta.png");
        export_png(&buffer, &path, &meta()).expect("export should succeed");

        let decoder = png::Decoder::new(std::fs::File::open(&path).expect("file should exist"));
        let reader = decoder.read_info().expect("should read info");
        let texts = &reader.info().uncompressed_latin1_text;
        assert!(
            texts.iter().any(|t| t.keyword == "Software" && t.text == "IfsRust"),
            "Should contain Software text chunk"
        );
        assert!(
            texts.iter().any(|t| t.keyword == "IfsRust.Seed" && t.text == "42"),
            "Should contain seed chunk"
        );
        assert!(
            texts.iter().any(|t| t.keyword == "IfsRust.Resolution" && t.text == "2x2"),
            "Should contain resolution chunk"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn export_rejects_mismatched_buffer() {
        let mut buffer = RenderBuffer::new(2, 2);
        buffer.pixels.pop();
        let path = std::env::temp_dir().join("ifsrust_never_written.png");
        let err = export_png(&buffer, &path, &meta()).unwrap_err();
        assert!(matches!(err, RenderError::BufferSize { expected: 16, actual: 15 }));
        assert!(!path.exists());
    }
}
