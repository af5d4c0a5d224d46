use std::path::PathBuf;

use anyhow::{Context, Result};

use va_core::frame::GlyphGrid;
use va_core::traits::RenderTarget;

/// Nom de fichier d'une frame : index zéro-basé, zéro-paddé sur 6 chiffres.
///
/// Le même schéma sert aux fichiers texte, aux PNG persistés et à la
/// séquence temporaire consommée par l'encodeur (`frame_%06d.png`).
///
/// # Example
/// ```
/// use va_render::text::frame_file_name;
/// assert_eq!(frame_file_name(0, "txt"), "frame_000000.txt");
/// assert_eq!(frame_file_name(1234, "png"), "frame_001234.png");
/// ```
#[must_use]
pub fn frame_file_name(index: u64, ext: &str) -> String {
    format!("frame_{index:06}.{ext}")
}

/// Sérialise la grille en texte brut : row-major, lignes séparées par
/// `\n`, glyphes seuls, jamais de séquence d'échappement couleur.
///
/// # Example
/// ```
/// use va_render::text::grid_to_text;
/// use va_core::frame::GlyphGrid;
/// let grid = GlyphGrid::new(4, 2);
/// assert_eq!(grid_to_text(&grid), "    \n    ");
/// ```
#[must_use]
pub fn grid_to_text(grid: &GlyphGrid) -> String {
    let mut out = String::with_capacity((grid.width as usize + 1) * grid.height as usize);
    for y in 0..grid.height {
        if y > 0 {
            out.push('\n');
        }
        for cell in grid.row(y) {
            out.push(cell.ch);
        }
    }
    out
}

/// Cible fichier texte : un `frame_NNNNNN.txt` UTF-8 par frame.
pub struct TextFileTarget {
    frames_dir: PathBuf,
}

impl TextFileTarget {
    /// Crée la cible. `frames_dir` doit exister.
    #[must_use]
    pub fn new(frames_dir: PathBuf) -> Self {
        Self { frames_dir }
    }
}

impl RenderTarget for TextFileTarget {
    fn write_frame(&mut self, index: u64, grid: &GlyphGrid) -> Result<()> {
        let path = self.frames_dir.join(frame_file_name(index, "txt"));
        std::fs::write(&path, grid_to_text(grid))
            .with_context(|| format!("écriture de {}", path.display()))
    }

    fn name(&self) -> &'static str {
        "text"
    }
}
