use ab_glyph::{Font, FontVec, PxScale};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{debug, info, warn};
use ttf_parser::Face;
use ttf_parser::name_id;

use super::error::OverlayError;

/// Read-only access to the font files the resolver probes.
pub trait FontSource: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// The local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFonts;

impl FontSource for LocalFonts {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Italic candidates first, then regular faces, for the running platform.
pub fn default_font_candidates() -> Vec<PathBuf> {
    let paths: &[&str] = if cfg!(windows) {
        &["C:/Windows/Fonts/ariali.ttf", "C:/Windows/Fonts/arial.ttf"]
    } else {
        &[
            "/usr/share/fonts/truetype/liberation/LiberationSans-Italic.ttf",
            "/System/Library/Fonts/Arial.ttf",
            "/usr/share/fonts/TTF/arial.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Oblique.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        ]
    };
    paths.iter().map(PathBuf::from).collect()
}

pub enum FontFace {
    Outline {
        font: FontVec,
        path: PathBuf,
        family: Option<String>,
    },
    Builtin,
}

/// A font resolved at one pixel size.
pub struct FontHandle {
    size: u32,
    face: FontFace,
}

impl FontHandle {
    pub fn builtin(size: u32) -> Self {
        Self {
            size,
            face: FontFace::Builtin,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn face(&self) -> &FontFace {
        &self.face
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.face, FontFace::Builtin)
    }

    pub fn describe(&self) -> String {
        match &self.face {
            FontFace::Outline { path, family, .. } => match family {
                Some(family) => format!("{} ({})", family, path.display()),
                None => path.display().to_string(),
            },
            FontFace::Builtin => "built-in mono font".to_string(),
        }
    }

    /// Scale that makes the em square `size` pixels tall.
    ///
    /// `PxScale` measures ascent to descent, not the em, so the size is
    /// stretched by the face's height-to-em ratio.
    pub(crate) fn px_scale(&self) -> PxScale {
        let size = self.size as f32;
        match &self.face {
            FontFace::Outline { font, .. } => match font.units_per_em() {
                Some(units_per_em) if units_per_em > 0.0 => {
                    PxScale::from(size * font.height_unscaled() / units_per_em)
                }
                _ => PxScale::from(size),
            },
            FontFace::Builtin => PxScale::from(size),
        }
    }
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontHandle")
            .field("size", &self.size)
            .field("face", &self.describe())
            .finish()
    }
}

/// Finds a usable font file and hands out per-size handles.
///
/// The candidate list is probed at most once per resolver. Every size that
/// was requested stays cached, including sizes that fell back to the
/// built-in font, so a failing file is never reloaded.
pub struct FontResolver {
    candidates: Vec<PathBuf>,
    source: Arc<dyn FontSource>,
    resolved: OnceLock<Option<PathBuf>>,
    cache: Mutex<HashMap<u32, Arc<FontHandle>>>,
}

impl FontResolver {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self::with_source(candidates, Arc::new(LocalFonts))
    }

    pub fn with_source(candidates: Vec<PathBuf>, source: Arc<dyn FontSource>) -> Self {
        Self {
            candidates,
            source,
            resolved: OnceLock::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate present on disk.
    pub fn resolve_path(&self) -> Option<&Path> {
        self.resolved
            .get_or_init(|| {
                let found = self
                    .candidates
                    .iter()
                    .find(|path| self.source.exists(path))
                    .cloned();
                match &found {
                    Some(path) => info!("description font: {}", path.display()),
                    None => info!("description font: built-in mono font (no candidate found)"),
                }
                found
            })
            .as_deref()
    }

    pub fn get(&self, size_px: u32) -> Arc<FontHandle> {
        if let Some(handle) = self.lock_cache().get(&size_px) {
            return Arc::clone(handle);
        }

        let handle = match self.resolve_path() {
            Some(path) => match self.load(path, size_px) {
                Ok(handle) => handle,
                Err(err) => {
                    warn!("{}; using built-in font at {}px", err, size_px);
                    FontHandle::builtin(size_px)
                }
            },
            None => FontHandle::builtin(size_px),
        };
        debug!("font cache miss: {}px -> {}", size_px, handle.describe());

        let mut cache = self.lock_cache();
        Arc::clone(cache.entry(size_px).or_insert_with(|| Arc::new(handle)))
    }

    pub fn cached_sizes(&self) -> Vec<u32> {
        let mut sizes: Vec<u32> = self.lock_cache().keys().copied().collect();
        sizes.sort_unstable();
        sizes
    }

    fn load(&self, path: &Path, size_px: u32) -> Result<FontHandle, OverlayError> {
        let failure = |reason: String| OverlayError::FontResolution {
            path: path.to_path_buf(),
            reason,
        };
        let data = self
            .source
            .read(path)
            .map_err(|err| failure(err.to_string()))?;
        let family = Face::parse(&data, 0)
            .ok()
            .and_then(|face| extract_family_name(&face));
        let font = FontVec::try_from_vec(data).map_err(|err| failure(err.to_string()))?;
        Ok(FontHandle {
            size: size_px,
            face: FontFace::Outline {
                font,
                path: path.to_path_buf(),
                family,
            },
        })
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<u32, Arc<FontHandle>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for FontResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontResolver")
            .field("candidates", &self.candidates)
            .field("resolved", &self.resolved.get())
            .field("cached_sizes", &self.cached_sizes())
            .finish()
    }
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}
