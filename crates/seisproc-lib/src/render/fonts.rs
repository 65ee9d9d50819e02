//! TrueType font lookup for figure text.
//!
//! The bitmap backend draws text through `ab_glyph`, which needs font bytes
//! registered up front. The first readable font among `$SEISPROC_FONT` and a
//! few common system locations is registered as `sans-serif`.

use std::path::PathBuf;
use std::sync::OnceLock;

use plotters::style::{register_font, FontStyle};

/// Environment variable naming a `.ttf` file to use for figure text.
pub const FONT_ENV: &str = "SEISPROC_FONT";

pub(crate) const FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static REGISTERED: OnceLock<bool> = OnceLock::new();

/// Register a font once per process. `false` means figures are drawn
/// without titles, axis labels or tick values.
pub fn text_available() -> bool {
    *REGISTERED.get_or_init(|| {
        let candidates = std::env::var_os(FONT_ENV)
            .map(PathBuf::from)
            .into_iter()
            .chain(SYSTEM_FONTS.iter().map(PathBuf::from));
        for path in candidates {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            // ab_glyph keeps a 'static borrow for the life of the process.
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            match register_font(FAMILY, FontStyle::Normal, bytes) {
                Ok(()) => {
                    tracing::debug!(font = %path.display(), "registered figure font");
                    return true;
                }
                Err(_) => tracing::warn!(font = %path.display(), "not a usable TrueType font"),
            }
        }
        tracing::warn!("no TrueType font found, figures carry no text; set {FONT_ENV}");
        false
    })
}
