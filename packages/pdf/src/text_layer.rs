//! Positioned text runs from a PDF's text layer.
//!
//! [`pdf_extract`] reports every glyph through an [`OutputDev`] together
//! with its text rendering matrix. Glyphs of one show-text operation form a
//! word; words that continue each other on the same baseline (kerned `TJ`
//! fragments) are merged back into one run. Runs whose origin falls
//! outside the page's media box are dropped, so a cropped page only
//! reports its own text.
//!
//! [`pdf_extract`] panics on some malformed fonts (unknown encodings,
//! missing widths). Such panics are caught and reported as
//! [`PdfError::Extraction`].

use std::panic::{AssertUnwindSafe, catch_unwind};

use paysplit_document_models::PositionedTextRun;
use pdf_extract::{Document, MediaBox, OutputDev, OutputError, Transform};

use crate::PdfError;

/// Baseline difference under which two words may merge, in points.
const SAME_BASELINE: f64 = 0.5;

/// Horizontal gap, as a fraction of the font size, under which a word
/// continues the previous one.
const MERGE_GAP_EM: f64 = 0.1;

/// Slack allowed around the media box when filtering runs, in points.
const MEDIA_BOX_SLACK: f64 = 1.0;

/// Produces the text runs of a PDF's first page.
pub trait TextLayerReader: Send + Sync {
    /// Reads the runs of the first page of `pdf_bytes`, in content-stream
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the document cannot be parsed or its text
    /// layer cannot be processed.
    fn read_runs(&self, pdf_bytes: &[u8]) -> Result<Vec<PositionedTextRun>, PdfError>;
}

/// [`TextLayerReader`] backed by [`pdf_extract`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextLayer;

impl TextLayerReader for PdfTextLayer {
    fn read_runs(&self, pdf_bytes: &[u8]) -> Result<Vec<PositionedTextRun>, PdfError> {
        let collector = catch_unwind(AssertUnwindSafe(|| collect_runs(pdf_bytes)))
            .map_err(|panic| PdfError::Extraction(panic_message(panic.as_ref())))??;

        let runs = collector.into_runs();
        log::debug!("Read {} text runs from first page", runs.len());
        Ok(runs)
    }
}

fn collect_runs(pdf_bytes: &[u8]) -> Result<RunCollector, PdfError> {
    let doc = Document::load_mem(pdf_bytes)?;
    let mut collector = RunCollector::default();

    pdf_extract::output_doc(&doc, &mut collector)
        .map_err(|e| PdfError::Extraction(e.to_string()))?;

    Ok(collector)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause");
    format!("text extraction panicked: {detail}")
}

#[derive(Debug)]
struct RawRun {
    text: String,
    x: f64,
    y: f64,
    end_x: f64,
    font_size: f64,
}

#[derive(Debug, Clone, Copy)]
struct PageBounds {
    llx: f64,
    lly: f64,
    urx: f64,
    ury: f64,
}

impl PageBounds {
    fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.llx - MEDIA_BOX_SLACK
            && x <= self.urx + MEDIA_BOX_SLACK
            && y >= self.lly - MEDIA_BOX_SLACK
            && y <= self.ury + MEDIA_BOX_SLACK
    }
}

#[derive(Debug, Default)]
struct RunCollector {
    page: u32,
    bounds: Option<PageBounds>,
    word: Option<RawRun>,
    runs: Vec<RawRun>,
}

impl RunCollector {
    const fn on_first_page(&self) -> bool {
        self.page == 1
    }

    /// Appends one glyph at `(x, y)` to the current word. `advance` is the
    /// glyph's horizontal advance in points.
    fn push_glyph(&mut self, text: &str, x: f64, y: f64, advance: f64, font_size: f64) {
        let word = self.word.get_or_insert_with(|| RawRun {
            text: String::new(),
            x,
            y,
            end_x: x,
            font_size,
        });
        word.text.push_str(text);
        word.end_x = x + advance;
    }

    fn flush_word(&mut self) {
        let Some(word) = self.word.take() else {
            return;
        };

        if let Some(last) = self.runs.last_mut()
            && (last.y - word.y).abs() < SAME_BASELINE
            && word.x >= last.x
            && word.x <= last.end_x + MERGE_GAP_EM * last.font_size
        {
            last.text.push_str(&word.text);
            last.end_x = word.end_x;
            return;
        }

        self.runs.push(word);
    }

    fn into_runs(mut self) -> Vec<PositionedTextRun> {
        self.flush_word();
        let bounds = self.bounds;

        self.runs
            .into_iter()
            .filter(|run| bounds.is_none_or(|b| b.contains(run.x, run.y)))
            .map(|run| PositionedTextRun::new(&run.text, run.x, run.y))
            .collect()
    }
}

impl OutputDev for RunCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.page = page_num;
        if self.on_first_page() {
            self.bounds = Some(PageBounds {
                llx: media_box.llx,
                lly: media_box.lly,
                urx: media_box.urx,
                ury: media_box.ury,
            });
        }
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        if self.on_first_page() {
            self.flush_word();
        }
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        spacing: f64,
        font_size: f64,
        char: &str,
    ) -> Result<(), OutputError> {
        if !self.on_first_page() {
            return Ok(());
        }

        let scale = trm.m11.hypot(trm.m12);
        self.push_glyph(
            char,
            trm.m31,
            trm.m32,
            width.mul_add(font_size, spacing) * scale,
            font_size * scale,
        );

        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        if self.on_first_page() {
            self.flush_word();
        }
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        if self.on_first_page() {
            self.flush_word();
        }
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}
