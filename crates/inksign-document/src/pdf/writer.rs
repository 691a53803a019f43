// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF exporter — one page per raster using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use image::imageops;
use image::{DynamicImage, Rgba, RgbaImage};
use inksign_core::PaperSize;
use inksign_core::error::{InksignError, Result};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

/// Margin kept clear on every side of the page.
const MARGIN_MM: f32 = 10.0;

/// Packages rectified (and signed) page rasters into a multi-page PDF.
pub struct PdfExporter {
    /// Paper size of every page.
    paper_size: PaperSize,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
    /// Resolution at which rasters are placed before fitting to the page.
    dpi: f32,
}

impl PdfExporter {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: None,
            dpi: 150.0,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Set the placement resolution. Zero is ignored.
    pub fn set_dpi(&mut self, dpi: u32) {
        if dpi > 0 {
            self.dpi = dpi as f32;
        }
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Build a PDF with one page per raster, each centred and scaled down to
    /// fit inside the margins. Transparent pixels print as white paper.
    #[instrument(skip(self, pages), fields(pages = pages.len()))]
    pub fn export_pages(&self, pages: &[RgbaImage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(InksignError::PdfError("no pages to export".into()));
        }
        let (page_w, page_h) = self.page_dimensions();
        let title = self.title.as_deref().unwrap_or("Inksign Document");
        info!(paper = ?self.paper_size, title, "Exporting signed document");

        let mut doc = PdfDocument::new(title);
        let mut pdf_pages = Vec::with_capacity(pages.len());

        let margin_pt = Mm(MARGIN_MM).into_pt().0;
        let usable_w_pt = Mm(page_w.0 - 2.0 * MARGIN_MM).into_pt().0;
        let usable_h_pt = Mm(page_h.0 - 2.0 * MARGIN_MM).into_pt().0;

        for (index, page) in pages.iter().enumerate() {
            if page.width() == 0 || page.height() == 0 {
                return Err(InksignError::PdfError(format!("page {index} is empty")));
            }
            let rgb = flatten_on_white(page);
            let (img_width, img_height) = (rgb.width() as usize, rgb.height() as usize);
            let raw = RawImage {
                pixels: RawImageData::U8(rgb.into_raw()),
                width: img_width,
                height: img_height,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            // Native size at the placement DPI, scaled to fit; never upscaled.
            let img_w_pt = img_width as f32 / self.dpi * 72.0;
            let img_h_pt = img_height as f32 / self.dpi * 72.0;
            let scale = (usable_w_pt / img_w_pt).min(usable_h_pt / img_h_pt).min(1.0);

            let rendered_w_pt = img_w_pt * scale;
            let rendered_h_pt = img_h_pt * scale;
            let x_offset = margin_pt + (usable_w_pt - rendered_w_pt) / 2.0;
            let y_offset = margin_pt + (usable_h_pt - rendered_h_pt) / 2.0;

            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(x_offset)),
                    translate_y: Some(Pt(y_offset)),
                    scale_x: Some(scale),
                    scale_y: Some(scale),
                    dpi: Some(self.dpi),
                    rotate: None,
                },
            }];
            debug!(index, rendered_w_pt, rendered_h_pt, scale, "Page placed");
            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
        }

        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(bytes = output.len(), warnings = warnings.len(), "PDF serialised");
        Ok(output)
    }

    /// Export and write directly to a file.
    pub fn write_to_file(&self, pages: &[RgbaImage], path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let bytes = self.export_pages(pages)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote signed PDF to {}", path.as_ref().display());
        Ok(bytes)
    }
}

/// Composite a page over white paper and drop the alpha channel.
fn flatten_on_white(page: &RgbaImage) -> image::RgbImage {
    let mut paper = RgbaImage::from_pixel(page.width(), page.height(), Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut paper, page, 0, 0);
    DynamicImage::ImageRgba8(paper).to_rgb8()
}
