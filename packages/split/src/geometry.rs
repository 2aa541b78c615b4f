//! Millimeter/point conversion and cut-region validation.
//!
//! Cut regions are authored as distances from the page top. The splitter
//! works in PDF points from the page bottom, so a region's upper edge
//! becomes the band's upper bound and its lower edge the band's lower
//! bound.

use paysplit_document_models::{CutRegion, PX_PER_MM, PixelBand};

use crate::SplitError;

/// Flips a distance from the page top into a distance from the page
/// bottom (and back: the mapping is its own inverse).
#[must_use]
pub fn top_to_bottom_mm(mm: f64, page_height_mm: f64) -> f64 {
    page_height_mm - mm
}

/// Millimeters to whole PDF points at 72 DPI.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn mm_to_px(mm: f64) -> i64 {
    (mm * PX_PER_MM).round() as i64
}

/// Whole PDF points back to millimeters, used to report the height a band
/// actually crops after rounding.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn px_to_mm(px: i64) -> f64 {
    px as f64 / PX_PER_MM
}

/// Converts a cut region into the bottom-origin band the splitter crops
/// to.
///
/// `index` is the region's one-based position in the configured list and
/// only serves error reporting.
///
/// # Errors
///
/// Returns [`SplitError::InvalidRegion`] if the bounds are not finite, lie
/// outside `[0, page_height_mm]`, or do not describe a band at least one
/// point high once converted.
pub fn to_pixel_band(
    index: usize,
    cut: &CutRegion,
    page_height_mm: f64,
) -> Result<PixelBand, SplitError> {
    let invalid = |reason: &str| SplitError::InvalidRegion {
        index,
        start_top_mm: cut.start_top_mm,
        end_top_mm: cut.end_top_mm,
        reason: reason.to_owned(),
    };

    if !cut.start_top_mm.is_finite() || !cut.end_top_mm.is_finite() {
        return Err(invalid("bounds must be finite numbers"));
    }
    if cut.start_top_mm >= cut.end_top_mm {
        return Err(invalid("start must be smaller than end"));
    }
    if cut.start_top_mm < 0.0 || cut.end_top_mm > page_height_mm {
        return Err(invalid(&format!(
            "region must lie within the page (0-{page_height_mm}mm)"
        )));
    }

    let band = PixelBand {
        bottom: mm_to_px(top_to_bottom_mm(cut.end_top_mm, page_height_mm)),
        top: mm_to_px(top_to_bottom_mm(cut.start_top_mm, page_height_mm)),
    };
    if band.bottom >= band.top {
        return Err(invalid("region is thinner than one point"));
    }

    Ok(band)
}

#[cfg(test)]
mod tests {
    use paysplit_document_models::A4_HEIGHT_MM;

    use super::*;

    #[test]
    fn top_to_bottom_is_self_inverse() {
        for mm in [0.0, 20.0, 106.0, 148.5, 261.0, 297.0] {
            let flipped = top_to_bottom_mm(mm, A4_HEIGHT_MM);
            assert!((top_to_bottom_mm(flipped, A4_HEIGHT_MM) - mm).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn converts_millimeters_to_points() {
        assert_eq!(mm_to_px(0.0), 0);
        assert_eq!(mm_to_px(297.0), 842);
        assert_eq!(mm_to_px(191.0), 541);
        assert!((px_to_mm(842) - 297.0).abs() < 0.2);
    }

    #[test]
    fn band_swaps_edges() {
        // 20-106mm from the top is 191-277mm from the bottom.
        let band = to_pixel_band(1, &CutRegion::new(20.0, 106.0), A4_HEIGHT_MM).unwrap();
        assert_eq!(band, PixelBand { bottom: 541, top: 785 });
        assert_eq!(band.height(), 244);
        assert!((px_to_mm(band.height()) - 86.0).abs() < 0.2);
    }

    #[test]
    fn full_page_band() {
        let band = to_pixel_band(1, &CutRegion::new(0.0, 297.0), A4_HEIGHT_MM).unwrap();
        assert_eq!(band, PixelBand { bottom: 0, top: 842 });
    }

    #[test]
    fn inverted_region_reports_its_index() {
        let err = to_pixel_band(2, &CutRegion::new(106.0, 20.0), A4_HEIGHT_MM).unwrap_err();
        match err {
            SplitError::InvalidRegion { index, reason, .. } => {
                assert_eq!(index, 2);
                assert!(reason.contains("smaller"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_and_out_of_page_regions_are_rejected() {
        assert!(to_pixel_band(1, &CutRegion::new(50.0, 50.0), A4_HEIGHT_MM).is_err());
        assert!(to_pixel_band(1, &CutRegion::new(-1.0, 50.0), A4_HEIGHT_MM).is_err());
        assert!(to_pixel_band(1, &CutRegion::new(200.0, 300.0), A4_HEIGHT_MM).is_err());
        assert!(to_pixel_band(1, &CutRegion::new(100.0, 100.1), A4_HEIGHT_MM).is_err());
        assert!(to_pixel_band(1, &CutRegion::new(f64::NAN, 100.0), A4_HEIGHT_MM).is_err());
    }
}
