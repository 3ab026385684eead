//! Rasterisation: uploaded file → normalised JPEG images.
//!
//! Two input families are accepted:
//!
//! * `application/pdf`: every page is rendered by a [`PdfRenderer`]
//!   (pdfium by default) and then normalised like any other image.
//! * `image/*`: decoded, fitted inside the configured bound and re-encoded
//!   as JPEG. Always exactly one output image.
//!
//! Anything else fails with [`DocumentError::UnsupportedFileType`].
//!
//! ## Why spawn_blocking?
//!
//! Decoding a phone photo, resampling it and rendering PDF pages are all
//! CPU-bound, and pdfium keeps thread-local state that must not be touched
//! from async contexts. Both paths run on tokio's blocking pool so worker
//! threads stay free to drive the other documents' network calls.

use crate::config::AnalysisConfig;
use crate::error::DocumentError;
use crate::pipeline::encode::{self, RasterImage};
use crate::pipeline::input::DocumentFile;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// External PDF-to-image capability.
///
/// Implementations are called from the blocking thread pool.
pub trait PdfRenderer: Send + Sync {
    /// Render the first `max_pages` pages (all pages if `None`), each fitted
    /// within `max_dim` × `max_dim` pixels.
    fn render_pages(
        &self,
        pdf: &[u8],
        max_pages: Option<usize>,
        max_dim: u32,
    ) -> Result<Vec<DynamicImage>, DocumentError>;
}

/// Renders PDFs through the pdfium C++ library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    library_path: Option<PathBuf>,
}

impl PdfiumRenderer {
    /// `library_path` may point at the shared library itself or at the
    /// directory holding it. `None` binds the system library.
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    fn bind(&self) -> Result<Pdfium, DocumentError> {
        let bindings = match &self.library_path {
            Some(path) => {
                let lib = if path.is_dir() {
                    let dir = path.to_string_lossy().into_owned();
                    PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(&dir))
                } else {
                    path.clone()
                };
                Pdfium::bind_to_library(lib.to_string_lossy().into_owned())
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| DocumentError::PdfRender {
            detail: format!("Failed to bind to pdfium library: {e:?}"),
        })?;

        Ok(Pdfium::new(bindings))
    }
}

impl PdfRenderer for PdfiumRenderer {
    fn render_pages(
        &self,
        pdf: &[u8],
        max_pages: Option<usize>,
        max_dim: u32,
    ) -> Result<Vec<DynamicImage>, DocumentError> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| DocumentError::PdfRender {
                detail: format!("{e:?}"),
            })?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        let limit = max_pages.unwrap_or(total_pages).min(total_pages);
        info!("PDF loaded: {} pages, rendering {}", total_pages, limit);

        let render_config = PdfRenderConfig::new()
            .set_target_width(max_dim as i32)
            .set_maximum_height(max_dim as i32);

        let mut images = Vec::with_capacity(limit);
        for (idx, page) in pages.iter().take(limit).enumerate() {
            let bitmap = page
                .render_with_config(&render_config)
                .map_err(|e| DocumentError::PdfRender {
                    detail: format!("page {}: {e:?}", idx + 1),
                })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            images.push(image);
        }

        Ok(images)
    }
}

/// The two input families the rasteriser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
}

/// Classify a declared MIME type.
///
/// Parameters (`; charset=…`) and case are ignored.
pub fn classify(mime_type: &str) -> Result<FileKind, DocumentError> {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence == "application/pdf" {
        Ok(FileKind::Pdf)
    } else if essence.starts_with("image/") {
        Ok(FileKind::Image)
    } else {
        Err(DocumentError::UnsupportedFileType {
            mime: mime_type.to_string(),
        })
    }
}

/// Convert a file into normalised images, one per PDF page.
pub async fn to_images(
    file: DocumentFile,
    config: &AnalysisConfig,
) -> Result<Vec<RasterImage>, DocumentError> {
    rasterise(file, config, None).await
}

/// Like [`to_images`], but asks the PDF renderer for at most `max_pages`
/// pages. Images always yield exactly one buffer.
pub async fn rasterise(
    file: DocumentFile,
    config: &AnalysisConfig,
    max_pages: Option<usize>,
) -> Result<Vec<RasterImage>, DocumentError> {
    let kind = classify(&file.mime_type)?;
    let max_dim = config.max_image_dimension;
    let quality = config.jpeg_quality;
    let bytes = file.bytes;

    let task = match kind {
        FileKind::Image => tokio::task::spawn_blocking(move || -> Result<Vec<RasterImage>, DocumentError> {
            let img = image::load_from_memory(&bytes).map_err(|e| DocumentError::ImageDecode {
                detail: e.to_string(),
            })?;
            Ok(vec![encode::normalise(img, max_dim, quality)?])
        }),
        FileKind::Pdf => {
            let renderer: Arc<dyn PdfRenderer> = match &config.pdf_renderer {
                Some(r) => Arc::clone(r),
                None => Arc::new(PdfiumRenderer::new(config.pdfium_library_path.clone())),
            };
            tokio::task::spawn_blocking(move || -> Result<Vec<RasterImage>, DocumentError> {
                renderer
                    .render_pages(&bytes, max_pages, max_dim)?
                    .into_iter()
                    .map(|page| encode::normalise(page, max_dim, quality))
                    .collect()
            })
        }
    };

    task.await
        .map_err(|e| DocumentError::Internal(format!("Rasterisation task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn jpeg_file(width: u32, height: u32) -> DocumentFile {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 180, 160])));
        let raster = encode::normalise(img, u32::MAX, 90).unwrap();
        DocumentFile::new(raster.jpeg, "image/jpeg")
    }

    struct FakePdf {
        pages: usize,
        calls: AtomicUsize,
    }

    impl PdfRenderer for FakePdf {
        fn render_pages(
            &self,
            _pdf: &[u8],
            max_pages: Option<usize>,
            _max_dim: u32,
        ) -> Result<Vec<DynamicImage>, DocumentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let n = max_pages.unwrap_or(self.pages).min(self.pages);
            Ok((0..n)
                .map(|_| DynamicImage::ImageRgb8(RgbImage::new(850, 1100)))
                .collect())
        }
    }

    #[test]
    fn classify_mime_types() {
        assert_eq!(classify("application/pdf").unwrap(), FileKind::Pdf);
        assert_eq!(classify("Image/PNG").unwrap(), FileKind::Image);
        assert_eq!(classify("image/jpeg; q=0.9").unwrap(), FileKind::Image);
        assert!(matches!(
            classify("text/plain"),
            Err(DocumentError::UnsupportedFileType { ref mime }) if mime == "text/plain"
        ));
        assert!(classify("").is_err());
    }

    #[tokio::test]
    async fn large_photo_is_downscaled_with_aspect_ratio() {
        let images = to_images(jpeg_file(4000, 3000), &AnalysisConfig::default())
            .await
            .unwrap();
        assert_eq!(images.len(), 1);
        let img = &images[0];
        assert!(img.width <= 1024 && img.height <= 1024);
        let ratio = img.width as f64 / img.height as f64;
        assert!((ratio - 4.0 / 3.0).abs() < 0.01, "ratio {ratio}");
    }

    #[test]
    fn small_photo_is_not_upscaled() {
        let images = tokio_test::block_on(to_images(jpeg_file(200, 200), &AnalysisConfig::default()))
            .unwrap();
        assert_eq!((images[0].width, images[0].height), (200, 200));
    }

    #[tokio::test]
    async fn unsupported_type_fails_before_decoding() {
        let file = DocumentFile::new(b"hello".to_vec(), "text/plain");
        let err = to_images(file, &AnalysisConfig::default()).await.unwrap_err();
        assert_eq!(
            err,
            DocumentError::UnsupportedFileType {
                mime: "text/plain".into()
            }
        );
    }

    #[tokio::test]
    async fn corrupt_image_is_a_decode_error() {
        let file = DocumentFile::new(vec![0u8; 32], "image/png");
        let err = to_images(file, &AnalysisConfig::default()).await.unwrap_err();
        assert!(matches!(err, DocumentError::ImageDecode { .. }));
    }

    #[tokio::test]
    async fn pdf_pages_each_become_an_image() {
        let fake = Arc::new(FakePdf {
            pages: 3,
            calls: AtomicUsize::new(0),
        });
        let config = AnalysisConfig::builder()
            .pdf_renderer(fake.clone())
            .build()
            .unwrap();
        let file = DocumentFile::new(b"%PDF-1.7".to_vec(), "application/pdf");

        let all = to_images(file.clone(), &config).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|p| p.width <= 1024 && p.height <= 1024));

        let first = rasterise(file, &config, Some(1)).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 2);
    }
}
