//! Small PDFs built with the object model, for tests in this and
//! downstream crates (enable the `fixtures` feature).

use pdf_extract::content::{Content, Operation};
use pdf_extract::{Dictionary, Document, Object, Stream};

use crate::PdfError;

/// A4 in points.
pub const PAGE_WIDTH: i64 = 595;
pub const PAGE_HEIGHT: i64 = 842;

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

/// One `Tj` per `(text, x, y)` entry, in Helvetica 10pt.
fn page_content(lines: &[(&str, i64, i64)]) -> Result<Vec<u8>, PdfError> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![name("F1"), Object::Integer(10)]),
    ];
    for (text, x, y) in lines {
        operations.push(Operation::new(
            "Tm",
            vec![
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1),
                Object::Integer(*x),
                Object::Integer(*y),
            ],
        ));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
    }
    operations.push(Operation::new("ET", vec![]));

    Ok(Content { operations }.encode()?)
}

/// Builds an A4 document with one page per entry of `pages`. The media
/// box is inherited from the page tree root.
///
/// # Errors
///
/// Returns [`PdfError`] if the document cannot be serialised.
pub fn document(pages: &[&[(&str, i64, i64)]]) -> Result<Vec<u8>, PdfError> {
    build(pages, None)
}

/// Same as [`document`], with `/Encoding` of the page font set to
/// `encoding`. An unknown name yields a font the text extractor cannot
/// decode although the document itself loads.
///
/// # Errors
///
/// Returns [`PdfError`] if the document cannot be serialised.
pub fn document_with_font_encoding(
    pages: &[&[(&str, i64, i64)]],
    encoding: &str,
) -> Result<Vec<u8>, PdfError> {
    build(pages, Some(encoding))
}

fn build(pages: &[&[(&str, i64, i64)]], encoding: Option<&str>) -> Result<Vec<u8>, PdfError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut font = Dictionary::new();
    font.set("Type", name("Font"));
    font.set("Subtype", name("Type1"));
    font.set("BaseFont", name("Helvetica"));
    if let Some(encoding) = encoding {
        font.set("Encoding", name(encoding));
    }
    let font_id = doc.add_object(font);

    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));
    let resources_id = doc.add_object(resources);

    let mut kids = Vec::new();
    for lines in pages {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), page_content(lines)?));
        let mut page = Dictionary::new();
        page.set("Type", name("Page"));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Contents", Object::Reference(content_id));
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut tree = Dictionary::new();
    tree.set("Type", name("Pages"));
    tree.set("Count", Object::Integer(i64::try_from(kids.len()).unwrap_or(i64::MAX)));
    tree.set("Kids", Object::Array(kids));
    tree.set("Resources", Object::Reference(resources_id));
    tree.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ]),
    );
    doc.objects.insert(pages_id, Object::Dictionary(tree));

    let mut catalog = Dictionary::new();
    catalog.set("Type", name("Catalog"));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| PdfError::Save(e.to_string()))?;
    Ok(bytes)
}
