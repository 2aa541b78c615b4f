//! Fragment file names.
//!
//! A fragment is named after the extracted employee name, or otherwise
//! after where it came from:
//! `<prefix>_<position>_p<page>_<start>-<end>mm.pdf`. The prefix is a
//! lowercase document-type token, which keeps fallback names apart from
//! extracted names (always uppercase).

use paysplit_document_models::CutRegion;

/// Deterministic name for a fragment without an extracted name.
/// `page_number` is one-based.
#[must_use]
pub fn fallback_file_name(prefix: &str, cut: &CutRegion, page_number: usize) -> String {
    format!(
        "{prefix}_{}_p{page_number}_{}-{}mm.pdf",
        cut.position(),
        cut.start_top_mm,
        cut.end_top_mm
    )
}

/// `<name>.pdf` when a name was extracted, the fallback name otherwise.
#[must_use]
pub fn resolve_file_name(
    name: Option<&str>,
    prefix: &str,
    cut: &CutRegion,
    page_number: usize,
) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => format!("{name}.pdf"),
        _ => fallback_file_name(prefix, cut, page_number),
    }
}

/// Whether `file_name` was produced by [`fallback_file_name`] for
/// `prefix`.
#[must_use]
pub fn is_fallback_name(file_name: &str, prefix: &str) -> bool {
    file_name
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_name_for_unnamed_receipt() {
        let cut = CutRegion::new(20.0, 106.0);
        assert_eq!(
            resolve_file_name(None, "recibo", &cut, 1),
            "recibo_topo_p1_20-106mm.pdf"
        );
    }

    #[test]
    fn fallback_name_carries_position_and_page() {
        assert_eq!(
            fallback_file_name("contracheque", &CutRegion::new(146.0, 297.0), 3),
            "contracheque_base_p3_146-297mm.pdf"
        );
        assert_eq!(
            fallback_file_name("recibo", &CutRegion::new(106.0, 184.0), 2),
            "recibo_meio_p2_106-184mm.pdf"
        );
        assert_eq!(
            fallback_file_name("recibo", &CutRegion::new(20.5, 106.25), 1),
            "recibo_topo_p1_20.5-106.25mm.pdf"
        );
    }

    #[test]
    fn extracted_name_wins() {
        let cut = CutRegion::new(20.0, 106.0);
        assert_eq!(
            resolve_file_name(Some("MARIA_DOS_SANTOS"), "recibo", &cut, 1),
            "MARIA_DOS_SANTOS.pdf"
        );
        assert_eq!(
            resolve_file_name(Some("  "), "recibo", &cut, 1),
            "recibo_topo_p1_20-106mm.pdf"
        );
    }

    #[test]
    fn recognises_fallback_names() {
        assert!(is_fallback_name("recibo_topo_p1_20-106mm.pdf", "recibo"));
        assert!(!is_fallback_name("MARIA_DOS_SANTOS.pdf", "recibo"));
        assert!(!is_fallback_name("recibos.pdf", "recibo"));
    }
}
