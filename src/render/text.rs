use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec};
use tracing::{debug, info, warn};

use crate::{
    config::{FontConfig, FontFamily},
    error::{RenderError, Result},
};

/// Well-known locations of one font family's four faces
struct FaceCandidate {
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
}

const MONO_CANDIDATES: &[FaceCandidate] = &[
    FaceCandidate {
        regular: "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
        bold: "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf",
        italic: "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Oblique.ttf",
        bold_italic: "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-BoldOblique.ttf",
    },
    FaceCandidate {
        regular: "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
        bold: "/usr/share/fonts/TTF/DejaVuSansMono-Bold.ttf",
        italic: "/usr/share/fonts/TTF/DejaVuSansMono-Oblique.ttf",
        bold_italic: "/usr/share/fonts/TTF/DejaVuSansMono-BoldOblique.ttf",
    },
    FaceCandidate {
        regular: "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
        bold: "/usr/share/fonts/truetype/liberation/LiberationMono-Bold.ttf",
        italic: "/usr/share/fonts/truetype/liberation/LiberationMono-Italic.ttf",
        bold_italic: "/usr/share/fonts/truetype/liberation/LiberationMono-BoldItalic.ttf",
    },
    FaceCandidate {
        regular: "/System/Library/Fonts/Supplemental/Courier New.ttf",
        bold: "/System/Library/Fonts/Supplemental/Courier New Bold.ttf",
        italic: "/System/Library/Fonts/Supplemental/Courier New Italic.ttf",
        bold_italic: "/System/Library/Fonts/Supplemental/Courier New Bold Italic.ttf",
    },
    FaceCandidate {
        regular: "C:\\Windows\\Fonts\\consola.ttf",
        bold: "C:\\Windows\\Fonts\\consolab.ttf",
        italic: "C:\\Windows\\Fonts\\consolai.ttf",
        bold_italic: "C:\\Windows\\Fonts\\consolaz.ttf",
    },
];

const SANS_CANDIDATES: &[FaceCandidate] = &[
    FaceCandidate {
        regular: "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        bold: "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        italic: "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf",
        bold_italic: "/usr/share/fonts/truetype/dejavu/DejaVuSans-BoldOblique.ttf",
    },
    FaceCandidate {
        regular: "/usr/share/fonts/TTF/DejaVuSans.ttf",
        bold: "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
        italic: "/usr/share/fonts/TTF/DejaVuSans-Oblique.ttf",
        bold_italic: "/usr/share/fonts/TTF/DejaVuSans-BoldOblique.ttf",
    },
    FaceCandidate {
        regular: "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        bold: "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        italic: "/usr/share/fonts/truetype/liberation/LiberationSans-Italic.ttf",
        bold_italic: "/usr/share/fonts/truetype/liberation/LiberationSans-BoldItalic.ttf",
    },
    FaceCandidate {
        regular: "/System/Library/Fonts/Supplemental/Arial.ttf",
        bold: "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
        italic: "/System/Library/Fonts/Supplemental/Arial Italic.ttf",
        bold_italic: "/System/Library/Fonts/Supplemental/Arial Bold Italic.ttf",
    },
    FaceCandidate {
        regular: "C:\\Windows\\Fonts\\arial.ttf",
        bold: "C:\\Windows\\Fonts\\arialbd.ttf",
        italic: "C:\\Windows\\Fonts\\ariali.ttf",
        bold_italic: "C:\\Windows\\Fonts\\arialbi.ttf",
    },
];

const SERIF_CANDIDATES: &[FaceCandidate] = &[
    FaceCandidate {
        regular: "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
        bold: "/usr/share/fonts/truetype/dejavu/DejaVuSerif-Bold.ttf",
        italic: "/usr/share/fonts/truetype/dejavu/DejaVuSerif-Italic.ttf",
        bold_italic: "/usr/share/fonts/truetype/dejavu/DejaVuSerif-BoldItalic.ttf",
    },
    FaceCandidate {
        regular: "/usr/share/fonts/TTF/DejaVuSerif.ttf",
        bold: "/usr/share/fonts/TTF/DejaVuSerif-Bold.ttf",
        italic: "/usr/share/fonts/TTF/DejaVuSerif-Italic.ttf",
        bold_italic: "/usr/share/fonts/TTF/DejaVuSerif-BoldItalic.ttf",
    },
    FaceCandidate {
        regular: "/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf",
        bold: "/usr/share/fonts/truetype/liberation/LiberationSerif-Bold.ttf",
        italic: "/usr/share/fonts/truetype/liberation/LiberationSerif-Italic.ttf",
        bold_italic: "/usr/share/fonts/truetype/liberation/LiberationSerif-BoldItalic.ttf",
    },
    FaceCandidate {
        regular: "/System/Library/Fonts/Supplemental/Times New Roman.ttf",
        bold: "/System/Library/Fonts/Supplemental/Times New Roman Bold.ttf",
        italic: "/System/Library/Fonts/Supplemental/Times New Roman Italic.ttf",
        bold_italic: "/System/Library/Fonts/Supplemental/Times New Roman Bold Italic.ttf",
    },
    FaceCandidate {
        regular: "C:\\Windows\\Fonts\\times.ttf",
        bold: "C:\\Windows\\Fonts\\timesbd.ttf",
        italic: "C:\\Windows\\Fonts\\timesi.ttf",
        bold_italic: "C:\\Windows\\Fonts\\timesbi.ttf",
    },
];

fn candidates(family: FontFamily) -> &'static [FaceCandidate] {
    match family {
        FontFamily::Mono => MONO_CANDIDATES,
        FontFamily::Sans => SANS_CANDIDATES,
        FontFamily::Serif => SERIF_CANDIDATES,
    }
}

/// The faces loaded for one family; only `regular` is mandatory
pub struct FontFaces {
    regular: FontVec,
    bold: Option<FontVec>,
    italic: Option<FontVec>,
    bold_italic: Option<FontVec>,
}

impl FontFaces {
    pub fn new(regular: FontVec) -> Self {
        Self {
            regular,
            bold: None,
            italic: None,
            bold_italic: None,
        }
    }
}

/// A face picked for a text style, with the effects that must be faked
pub struct FaceChoice<'a> {
    pub font: &'a FontVec,
    pub synthetic_bold: bool,
    pub synthetic_italic: bool,
}

/// Loaded TrueType faces keyed by family
///
/// An empty book is a valid raster-only drawing context: shapes render, text
/// does not.
#[derive(Default)]
pub struct FontBook {
    faces: HashMap<FontFamily, FontFaces>,
}

impl FontBook {
    /// A book with no faces
    pub fn empty() -> Self {
        Self::default()
    }

    /// Find faces for the configured family (plus monospace for the matrix effect)
    pub fn discover(config: &FontConfig) -> Result<Self> {
        let mut book = Self::empty();

        if let Some(path) = &config.file {
            let font = load_font_file(path)?;
            info!("Using font file {:?} for {:?}", path, config.family);
            book.insert(config.family, FontFaces::new(font));
        }

        for family in [config.family, FontFamily::Mono] {
            if book.faces.contains_key(&family) {
                continue;
            }
            if let Some(faces) = discover_family(family) {
                book.insert(family, faces);
            }
        }

        if book.is_empty() {
            return Err(RenderError::ContextUnavailable {
                reason: "no usable TrueType font found".to_string(),
            }
            .into());
        }

        if !book.faces.contains_key(&config.family) {
            warn!("No {:?} font found, falling back to another family", config.family);
        }

        Ok(book)
    }

    /// Build a single-family book from raw font bytes
    pub fn from_bytes(family: FontFamily, bytes: Vec<u8>) -> Result<Self> {
        let font = FontVec::try_from_vec(bytes).map_err(|e| RenderError::FontLoadFailed {
            path: "<memory>".to_string(),
            reason: e.to_string(),
        })?;
        let mut book = Self::empty();
        book.insert(family, FontFaces::new(font));
        Ok(book)
    }

    pub fn insert(&mut self, family: FontFamily, faces: FontFaces) {
        self.faces.insert(family, faces);
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn families(&self) -> Vec<FontFamily> {
        let mut families: Vec<_> = self.faces.keys().copied().collect();
        families.sort_by_key(|family| *family as u8);
        families
    }

    /// Pick the best face for a style, falling back across families
    pub fn face(&self, family: FontFamily, bold: bool, italic: bool) -> Option<FaceChoice<'_>> {
        let faces = self.faces.get(&family).or_else(|| {
            [FontFamily::Mono, FontFamily::Sans, FontFamily::Serif]
                .iter()
                .find_map(|fallback| self.faces.get(fallback))
        })?;

        let choice = match (bold, italic) {
            (true, true) => faces
                .bold_italic
                .as_ref()
                .map(|font| (font, false, false))
                .or_else(|| faces.bold.as_ref().map(|font| (font, false, true)))
                .or_else(|| faces.italic.as_ref().map(|font| (font, true, false))),
            (true, false) => faces.bold.as_ref().map(|font| (font, false, false)),
            (false, true) => faces.italic.as_ref().map(|font| (font, false, false)),
            (false, false) => Some((&faces.regular, false, false)),
        };

        let (font, synthetic_bold, synthetic_italic) =
            choice.unwrap_or((&faces.regular, bold, italic));

        Some(FaceChoice {
            font,
            synthetic_bold,
            synthetic_italic,
        })
    }

    /// Whether the family's regular face has a real glyph for `ch`
    pub fn has_glyph(&self, family: FontFamily, ch: char) -> bool {
        self.face(family, false, false)
            .map(|choice| choice.font.glyph_id(ch).0 != 0)
            .unwrap_or(false)
    }
}

fn discover_family(family: FontFamily) -> Option<FontFaces> {
    for candidate in candidates(family) {
        let regular_path = Path::new(candidate.regular);
        if !regular_path.exists() {
            continue;
        }

        let regular = match load_font_file(regular_path) {
            Ok(font) => font,
            Err(e) => {
                warn!("Skipping font {}: {}", candidate.regular, e);
                continue;
            }
        };

        debug!("Found {:?} font at {}", family, candidate.regular);

        let optional = |path: &str| {
            let path = PathBuf::from(path);
            if path.exists() {
                load_font_file(&path).ok()
            } else {
                None
            }
        };

        return Some(FontFaces {
            regular,
            bold: optional(candidate.bold),
            italic: optional(candidate.italic),
            bold_italic: optional(candidate.bold_italic),
        });
    }

    None
}

/// Read and parse a TrueType/OpenType file
pub fn load_font_file(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path).map_err(|e| RenderError::FontLoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    FontVec::try_from_vec(bytes).map_err(|e| {
        RenderError::FontLoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;

    /// Fonts from the host, or `None` where the machine has none installed
    pub(crate) fn host_fonts() -> Option<Arc<FontBook>> {
        FontBook::discover(&FontConfig::default()).ok().map(Arc::new)
    }

    #[test]
    fn test_empty_book_has_no_faces() {
        let book = FontBook::empty();
        assert!(book.is_empty());
        assert!(book.face(FontFamily::Mono, false, false).is_none());
        assert!(!book.has_glyph(FontFamily::Mono, 'a'));
    }

    #[test]
    fn test_missing_font_file_is_reported() {
        let config = FontConfig {
            file: Some(PathBuf::from("/definitely/not/here.ttf")),
            ..FontConfig::default()
        };
        assert!(FontBook::discover(&config).is_err());
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(FontBook::from_bytes(FontFamily::Mono, vec![0, 1, 2, 3]).is_err());
    }

    #[test]
    fn test_discovered_faces_cover_ascii() {
        let Some(fonts) = host_fonts() else {
            return;
        };
        let family = fonts.families()[0];
        assert!(fonts.has_glyph(family, 'A'));

        let choice = fonts.face(family, false, false).unwrap();
        assert!(!choice.synthetic_bold);
        assert!(!choice.synthetic_italic);
    }

    #[test]
    fn test_regular_only_family_synthesizes_styles() {
        let Some(bytes) = MONO_CANDIDATES
            .iter()
            .find_map(|candidate| std::fs::read(candidate.regular).ok())
        else {
            return;
        };
        let book = FontBook::from_bytes(FontFamily::Mono, bytes).unwrap();

        let both = book.face(FontFamily::Mono, true, true).unwrap();
        assert!(both.synthetic_bold && both.synthetic_italic);

        let bold = book.face(FontFamily::Mono, true, false).unwrap();
        assert!(bold.synthetic_bold && !bold.synthetic_italic);

        let italic = book.face(FontFamily::Mono, false, true).unwrap();
        assert!(!italic.synthetic_bold && italic.synthetic_italic);

        // Other families fall back to the only loaded one
        let serif = book.face(FontFamily::Serif, false, false).unwrap();
        assert!(!serif.synthetic_bold && !serif.synthetic_italic);
    }
}
