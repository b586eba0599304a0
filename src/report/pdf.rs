use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{BuiltinFont, Mm, PdfDocument};
use tracing::info;

use crate::processor::{ProcessorError, statistics::StatisticsRecord};
use crate::report::{DocumentRenderer, REPORT_TITLE, report_lines};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const LINE_HEIGHT_MM: f32 = 10.0;
const FONT_SIZE_PT: f32 = 12.0;

// average Helvetica glyph width as a fraction of the font size
const AVG_GLYPH_WIDTH: f32 = 0.5;
const MM_PER_PT: f32 = 0.352_778;

/// Single-page A4 PDF report
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReport;

impl PdfReport {
    fn centred_x(text: &str) -> f32 {
        let width = text.chars().count() as f32 * FONT_SIZE_PT * AVG_GLYPH_WIDTH * MM_PER_PT;
        ((PAGE_WIDTH_MM - width) / 2.0).max(MARGIN_MM)
    }
}

impl DocumentRenderer for PdfReport {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, stats: &StatisticsRecord, path: &Path) -> Result<(), ProcessorError> {
        let (doc, page, layer) = PdfDocument::new(
            REPORT_TITLE,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ProcessorError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);

        let mut y = PAGE_HEIGHT_MM - MARGIN_MM - LINE_HEIGHT_MM;
        layer.use_text(
            REPORT_TITLE,
            FONT_SIZE_PT,
            Mm(Self::centred_x(REPORT_TITLE)),
            Mm(y),
            &font,
        );
        for line in report_lines(stats) {
            y -= LINE_HEIGHT_MM;
            layer.use_text(line, FONT_SIZE_PT, Mm(MARGIN_MM), Mm(y), &font);
        }

        let mut writer = BufWriter::new(File::create(path)?);
        doc.save(&mut writer)
            .map_err(|e| ProcessorError::Pdf(e.to_string()))?;

        info!(path = %path.display(), "wrote PDF report");
        Ok(())
    }
}
