//! Cropping single pages out of a source document.
//!
//! A fragment is the source document reduced to one page whose media box
//! (and crop box) is narrowed to a horizontal band, keeping the full page
//! width. Content outside the band stays in the content stream but is not
//! visible, and the text-layer reader ignores it.
//!
//! Isolating a page copies the whole source document, so the splitter
//! keeps the most recently isolated page and only re-crops its boxes for
//! further bands of the same page.

use std::sync::{Mutex, PoisonError};

use paysplit_document_models::{A4_HEIGHT_MM, A4_WIDTH_MM, PX_PER_MM, PixelBand};
use pdf_extract::{Document, Object, ObjectId};

use crate::PdfError;

/// Page-tree attributes that the crop replaces or invalidates.
const BOX_KEYS: &[&[u8]] = &[b"MediaBox", b"CropBox", b"BleedBox", b"TrimBox", b"ArtBox"];

/// Depth limit when walking `Parent` links for inherited attributes.
const MAX_TREE_DEPTH: usize = 32;

/// Page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub left: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// A4 portrait, used when a page carries no usable media box.
    #[must_use]
    pub const fn a4() -> Self {
        Self {
            left: 0.0,
            bottom: 0.0,
            width: A4_WIDTH_MM * PX_PER_MM,
            height: A4_HEIGHT_MM * PX_PER_MM,
        }
    }
}

/// Produces single-page fragments of a loaded source document.
pub trait PageSplitter {
    fn page_count(&self) -> usize;

    /// Size of the page at zero-based `page_index`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::PageOutOfRange`] for an index past the last
    /// page.
    fn page_size(&self, page_index: usize) -> Result<PageSize, PdfError>;

    /// Crops the page at `page_index` to `band` (full page width) and
    /// returns the fragment as a standalone PDF.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the page does not exist or the fragment
    /// cannot be written.
    fn split_region(&self, page_index: usize, band: PixelBand) -> Result<Vec<u8>, PdfError>;
}

/// [`PageSplitter`] over a document parsed with the `lopdf` object model.
#[derive(Debug)]
pub struct PdfPageSplitter {
    document: Document,
    page_ids: Vec<ObjectId>,
    /// Last isolated page: zero-based index and its single-page document.
    isolated: Mutex<Option<(usize, Document)>>,
}

impl PdfPageSplitter {
    /// Parses `pdf_bytes` and indexes its pages.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Pdf`] if the bytes are not a readable PDF, or
    /// [`PdfError::Extraction`] if the document is encrypted.
    pub fn from_bytes(pdf_bytes: &[u8]) -> Result<Self, PdfError> {
        let document = Document::load_mem(pdf_bytes)?;
        if document.is_encrypted() {
            return Err(PdfError::Extraction(
                "encrypted documents are not supported".to_owned(),
            ));
        }

        let page_ids = document.get_pages().into_values().collect::<Vec<_>>();
        log::debug!("Loaded source document with {} pages", page_ids.len());

        Ok(Self {
            document,
            page_ids,
            isolated: Mutex::new(None),
        })
    }

    /// The source reduced to the page at `page_index`, with unreferenced
    /// objects pruned.
    fn isolate_page(&self, page_index: usize) -> Result<Document, PdfError> {
        let keep = u32::try_from(page_index + 1).map_err(|_| PdfError::PageOutOfRange {
            index: page_index,
            count: self.page_ids.len(),
        })?;

        let mut single = self.document.clone();
        let others = single
            .get_pages()
            .into_keys()
            .filter(|number| *number != keep)
            .collect::<Vec<_>>();
        single.delete_pages(&others);
        single.prune_objects();

        log::trace!("Isolated page {} of {}", page_index + 1, self.page_ids.len());
        Ok(single)
    }

    /// A copy of the isolated page at `page_index`, reusing the cached one
    /// when the previous call was for the same page.
    fn single_page(&self, page_index: usize) -> Result<Document, PdfError> {
        let mut isolated = self.isolated.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some((index, single)) = isolated.as_ref()
            && *index == page_index
        {
            return Ok(single.clone());
        }

        let single = self.isolate_page(page_index)?;
        *isolated = Some((page_index, single.clone()));
        Ok(single)
    }

    fn page_id(&self, page_index: usize) -> Result<ObjectId, PdfError> {
        self.page_ids
            .get(page_index)
            .copied()
            .ok_or(PdfError::PageOutOfRange {
                index: page_index,
                count: self.page_ids.len(),
            })
    }

    /// Looks `key` up on the page, then on its ancestors in the page tree.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut node = self.document.get_object(page_id).ok()?.as_dict().ok()?;

        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = node.get(key) {
                return self.resolve(value);
            }
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            node = self.document.get_object(parent).ok()?.as_dict().ok()?;
        }

        None
    }

    fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(id) => self.document.get_object(*id).ok(),
            other => Some(other),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn media_box(&self, page_id: ObjectId) -> Option<PageSize> {
        let Object::Array(values) = self.inherited(page_id, b"MediaBox")? else {
            return None;
        };

        let numbers = values
            .iter()
            .filter_map(|v| match self.resolve(v)? {
                Object::Integer(i) => Some(*i as f64),
                Object::Real(r) => Some(f64::from(*r)),
                _ => None,
            })
            .collect::<Vec<_>>();

        let [llx, lly, urx, ury] = numbers[..] else {
            return None;
        };

        let size = PageSize {
            left: llx.min(urx),
            bottom: lly.min(ury),
            width: (urx - llx).abs(),
            height: (ury - lly).abs(),
        };
        (size.width > 0.0 && size.height > 0.0).then_some(size)
    }
}

impl PageSplitter for PdfPageSplitter {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_size(&self, page_index: usize) -> Result<PageSize, PdfError> {
        let page_id = self.page_id(page_index)?;
        Ok(self.media_box(page_id).unwrap_or_else(|| {
            log::warn!("Page {} has no usable MediaBox, assuming A4", page_index + 1);
            PageSize::a4()
        }))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn split_region(&self, page_index: usize, band: PixelBand) -> Result<Vec<u8>, PdfError> {
        let page_id = self.page_id(page_index)?;
        let size = self.page_size(page_index)?;

        let bottom = size.bottom + band.bottom as f64;
        let top = (size.bottom + band.top as f64).min(size.bottom + size.height);
        let crop = Object::Array(vec![
            Object::Real(size.left as f32),
            Object::Real(bottom as f32),
            Object::Real((size.left + size.width) as f32),
            Object::Real(top as f32),
        ]);

        let mut fragment = self.single_page(page_index)?;

        let page = fragment.get_object_mut(page_id)?.as_dict_mut()?;
        for key in BOX_KEYS {
            page.remove(key);
        }
        page.set("MediaBox", crop.clone());
        page.set("CropBox", crop);

        let mut bytes = Vec::new();
        fragment
            .save_to(&mut bytes)
            .map_err(|e| PdfError::Save(e.to_string()))?;

        log::debug!(
            "Cropped page {} to band {band} ({} bytes)",
            page_index + 1,
            bytes.len()
        );

        Ok(bytes)
    }
}
