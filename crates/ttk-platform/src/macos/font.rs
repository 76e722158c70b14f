//! CoreText font loading, monospace verification, and cell metrics.

use core_foundation::attributed_string::CFMutableAttributedString;
use core_foundation::base::{CFRange, CFTypeRef, TCFType};
use core_foundation::string::CFString;
use core_text::font::{self as ct_font, CTFont};
use core_text::line::CTLine;
use core_text::string_attributes::kCTFontAttributeName;

use ttk_core::{Error, Result};
use ttk_renderer::CellMetrics;

// CTFontCreateCopyWithSymbolicTraits is not exposed by the core-text crate.
extern "C" {
    fn CTFontCreateCopyWithSymbolicTraits(
        current_font: CFTypeRef,
        size: f64,
        matrix: *const std::ffi::c_void,
        sym_trait_value: u32,
        sym_trait_mask: u32,
    ) -> CFTypeRef;
}

const SYMBOLIC_TRAIT_BOLD: u32 = 1 << 1;

/// Advance agreement tolerance for the monospace check, in points.
const MONOSPACE_TOLERANCE: f64 = 0.5;

/// The base font, its bold variant, and the cell metrics measured from it.
/// Fallback glyphs come from the system cascade during typesetting; the
/// substituted per-run fonts are read back from the typeset line, so only
/// the explicit variants live here.
pub(crate) struct FontCache {
    base: CTFont,
    bold: CTFont,
    metrics: CellMetrics,
}

impl FontCache {
    /// Load `family` at `size`, verify it is monospace, and measure the cell.
    pub fn new(family: &str, size: f64) -> Result<Self> {
        let base = ct_font::new_from_name(family, size)
            .map_err(|_| Error::FontNotFound(family.to_string()))?;
        let metrics = verify_monospace(&base, family)?;
        let bold = bold_variant(&base, size);
        Ok(FontCache { base, bold, metrics })
    }

    pub fn font(&self, bold: bool) -> &CTFont {
        if bold {
            &self.bold
        } else {
            &self.base
        }
    }

    pub fn metrics(&self) -> CellMetrics {
        self.metrics
    }
}

/// Bold variant of the base font; families without one keep the base.
fn bold_variant(base: &CTFont, size: f64) -> CTFont {
    let bold_ref = unsafe {
        CTFontCreateCopyWithSymbolicTraits(
            base.as_CFTypeRef(),
            size,
            std::ptr::null(),
            SYMBOLIC_TRAIT_BOLD,
            SYMBOLIC_TRAIT_BOLD,
        )
    };
    if bold_ref.is_null() {
        base.clone()
    } else {
        unsafe { TCFType::wrap_under_create_rule(bold_ref as _) }
    }
}

/// Measure a handful of deliberately diverse characters; their advances must
/// agree within half a pixel or the grid cannot stay aligned.
fn verify_monospace(font: &CTFont, family: &str) -> Result<CellMetrics> {
    let probes = ["i", "W", "M", "1", " "];
    let mut advances = [0.0f64; 5];
    for (slot, probe) in probes.iter().enumerate() {
        advances[slot] = typeset_advance(font, probe);
    }
    let min = advances.iter().copied().fold(f64::INFINITY, f64::min);
    let max = advances.iter().copied().fold(0.0f64, f64::max);
    if max <= 0.0 || max - min > MONOSPACE_TOLERANCE {
        return Err(Error::FontNotMonospace(family.to_string()));
    }

    let char_height = (font.ascent() + font.descent() + font.leading()).ceil();
    Ok(CellMetrics { char_width: max, char_height, ascent: font.ascent() })
}

/// Typeset width of a short string in the given font.
pub(crate) fn typeset_advance(font: &CTFont, text: &str) -> f64 {
    let line = typeset_plain(font, text);
    line.get_typographic_bounds().width
}

/// Build a typeset line from `text` with only a font attribute.
pub(crate) fn typeset_plain(font: &CTFont, text: &str) -> CTLine {
    let mut attributed = CFMutableAttributedString::new();
    attributed.replace_str(&CFString::new(text), CFRange::init(0, 0));
    let range = CFRange::init(0, attributed.char_len());
    unsafe {
        attributed.set_attribute(range, kCTFontAttributeName, &font.clone());
    }
    CTLine::new_with_attributed_string(attributed.as_concrete_TypeRef())
}
