use std::collections::HashMap;
use std::path::PathBuf;

use ab_glyph::{Font, FontRef, PxScale, point};
use anyhow::{Context, Result};
use rayon::prelude::*;

use va_core::color::Rgb;
use va_core::config::FontQuality;
use va_core::frame::{GlyphGrid, PixelFrame};
use va_core::ramp::GLYPH_RAMP;
use va_core::traits::RenderTarget;

use crate::text::frame_file_name;

/// Taille de cellule en pixels pour le rendu raster.
///
/// `source_width / char_width` scalé par le multiplicateur du palier de
/// qualité, borné à [12, 36] px.
///
/// # Example
/// ```
/// use va_render::raster::cell_size_px;
/// use va_core::config::FontQuality;
/// assert_eq!(cell_size_px(640, 80, FontQuality::High), 16);
/// assert_eq!(cell_size_px(640, 80, FontQuality::Low), 12);
/// assert_eq!(cell_size_px(4000, 40, FontQuality::High), 36);
/// ```
#[must_use]
pub fn cell_size_px(source_width: u32, char_width: u32, quality: FontQuality) -> u32 {
    let base = source_width as f32 / char_width.max(1) as f32;
    ((base * quality.font_multiplier()).round() as u32).clamp(12, 36)
}

/// Convertit une grille de glyphes en pixels à la résolution source.
/// Maintient un atlas de couverture alpha par caractère pour éliminer
/// tout surcoût de rasterisation dans le hot-loop.
pub struct Rasterizer {
    cell_px: u32,
    /// Maps a char to its 1D alpha buffer (size = cell_px * cell_px).
    glyph_cache: HashMap<char, Vec<u8>>,
    /// Pre-allocated fallback glyph (all zeros).
    empty_glyph: Vec<u8>,
}

impl Rasterizer {
    /// Initialise le rasterizer en pré-calculant l'atlas des caractères
    /// de la rampe (plus l'ASCII imprimable, par confort de debug).
    ///
    /// La police doit être monospace pour un alignement de cellules
    /// cohérent.
    ///
    /// # Errors
    /// Retourne une erreur si la police fournie est invalide.
    pub fn new(font_data: &[u8], cell_px: u32) -> Result<Self> {
        let font = FontRef::try_from_slice(font_data).context("Police invalide")?;
        let cell_px = cell_px.max(1);
        let scale = PxScale::from(cell_px as f32);

        let mut rasterizer = Self {
            cell_px,
            glyph_cache: HashMap::new(),
            empty_glyph: vec![0u8; (cell_px * cell_px) as usize],
        };

        for codepoint in 32u32..=126 {
            if let Some(ch) = char::from_u32(codepoint) {
                rasterizer.cache_glyph(&font, scale, ch);
            }
        }
        for ch in GLYPH_RAMP {
            rasterizer.cache_glyph(&font, scale, ch);
        }

        Ok(rasterizer)
    }

    fn cache_glyph(&mut self, font: &FontRef, scale: PxScale, ch: char) {
        if self.glyph_cache.contains_key(&ch) {
            return;
        }
        // Skip characters not in the font (glyph_id 0 = .notdef) to avoid
        // rendering placeholder boxes.
        let gid = font.glyph_id(ch);
        if gid.0 == 0 {
            return;
        }

        let mut buffer = vec![0u8; (self.cell_px * self.cell_px) as usize];

        let ascent_px = font.ascent_unscaled() * scale.y / font.height_unscaled();
        let glyph = gid.with_scale_and_position(scale, point(0.0, ascent_px));

        if let Some(outline) = font.outline_glyph(glyph) {
            let bounds = outline.px_bounds();
            #[allow(clippy::cast_possible_wrap)]
            outline.draw(|x, y, v| {
                let px = (x as i32 + bounds.min.x as i32).max(0) as u32;
                let py = (y as i32 + bounds.min.y as i32).max(0) as u32;
                if px < self.cell_px && py < self.cell_px {
                    let idx = (py * self.cell_px + px) as usize;
                    if idx < buffer.len() {
                        buffer[idx] = (v * 255.0).round() as u8;
                    }
                }
            });
        }
        self.glyph_cache.insert(ch, buffer);
    }

    /// Taille de cellule effective en pixels.
    #[must_use]
    pub fn cell_px(&self) -> u32 {
        self.cell_px
    }

    /// Rendu de la grille sur le canvas, rempli au préalable avec la
    /// couleur de fond. Le canvas garde ses dimensions (résolution
    /// source) quelle que soit la taille de la grille : le bloc de texte
    /// est centré, les cellules hors canvas sont rognées.
    ///
    /// Les cellules sans couleur utilisent blanc sur fond sombre, noir
    /// sur fond clair (classe de luminance du fond). Parallélisé par
    /// scanline.
    pub fn render(&self, grid: &GlyphGrid, canvas: &mut PixelFrame, background: Rgb) {
        canvas.fill(background);

        let default_fg = background.default_foreground();
        let canvas_w = canvas.width;
        let cell = self.cell_px as usize;
        let grid_w = usize::from(grid.width);
        let grid_h = usize::from(grid.height);

        // Centrage du bloc de texte ; peut être négatif si la grille
        // déborde du canvas.
        let start_x = (i64::from(canvas.width) - (grid_w * cell) as i64) / 2;
        let start_y = (i64::from(canvas.height) - (grid_h * cell) as i64) / 2;

        let stride = (canvas_w * 3) as usize;
        canvas
            .data
            .par_chunks_exact_mut(stride)
            .enumerate()
            .for_each(|(y, row)| {
                let gy = y as i64 - start_y;
                if gy < 0 {
                    return;
                }
                let grid_row = gy as usize / cell;
                if grid_row >= grid_h {
                    return;
                }
                let cy = gy as usize % cell;

                for gx in 0..grid_w {
                    let glyph_cell = grid.get(gx as u16, grid_row as u16);
                    if glyph_cell.is_blank() {
                        continue;
                    }
                    let alpha_row_start = cy * cell;
                    let alpha = self
                        .glyph_cache
                        .get(&glyph_cell.ch)
                        .unwrap_or(&self.empty_glyph);
                    let fg = glyph_cell.color.unwrap_or(default_fg);
                    let x0 = start_x + (gx * cell) as i64;

                    for cx in 0..cell {
                        let x = x0 + cx as i64;
                        if x < 0 || x >= i64::from(canvas_w) {
                            continue;
                        }
                        let a = alpha[alpha_row_start + cx];
                        if a == 0 {
                            continue;
                        }
                        let af = f32::from(a) / 255.0;
                        let idx = x as usize * 3;
                        row[idx] = blend(fg.0, row[idx], af);
                        row[idx + 1] = blend(fg.1, row[idx + 1], af);
                        row[idx + 2] = blend(fg.2, row[idx + 2], af);
                    }
                }
            });
    }
}

#[inline(always)]
fn blend(fg: u8, bg: u8, alpha: f32) -> u8 {
    (f32::from(fg) * alpha + f32::from(bg) * (1.0 - alpha)) as u8
}

/// Cible raster : PNG à la résolution source dans `frames/` et/ou la
/// séquence temporaire consommée par l'encodeur.
pub struct RasterTarget {
    rasterizer: Rasterizer,
    canvas: PixelFrame,
    background: Rgb,
    frames_dir: Option<PathBuf>,
    sequence_dir: Option<PathBuf>,
}

impl RasterTarget {
    /// Crée la cible. Le canvas est alloué une fois aux dimensions
    /// source et réutilisé à chaque frame.
    #[must_use]
    pub fn new(
        rasterizer: Rasterizer,
        source_width: u32,
        source_height: u32,
        background: Rgb,
        frames_dir: Option<PathBuf>,
        sequence_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            rasterizer,
            canvas: PixelFrame::new(source_width, source_height),
            background,
            frames_dir,
            sequence_dir,
        }
    }

    fn save_canvas(&self, path: &std::path::Path) -> Result<()> {
        let img = image::RgbImage::from_raw(
            self.canvas.width,
            self.canvas.height,
            self.canvas.data.clone(),
        )
        .context("canvas buffer size mismatch")?;
        img.save(path)
            .with_context(|| format!("écriture de {}", path.display()))
    }
}

impl RenderTarget for RasterTarget {
    fn write_frame(&mut self, index: u64, grid: &GlyphGrid) -> Result<()> {
        self.rasterizer.render(grid, &mut self.canvas, self.background);

        let name = frame_file_name(index, "png");
        let mut saved: Option<PathBuf> = None;
        if let Some(dir) = &self.frames_dir {
            let path = dir.join(&name);
            self.save_canvas(&path)?;
            saved = Some(path);
        }
        if let Some(dir) = &self.sequence_dir {
            let path = dir.join(&name);
            match &saved {
                // Déjà encodée : une copie suffit
                Some(src) => {
                    std::fs::copy(src, &path)
                        .with_context(|| format!("écriture de {}", path.display()))?;
                }
                None => self.save_canvas(&path)?,
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "raster"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use va_core::frame::GlyphCell;

    #[test]
    fn cell_size_formula_and_clamp() {
        // 640/80 = 8 ; Low ×1.0 = 8 → clampé à 12
        assert_eq!(cell_size_px(640, 80, FontQuality::Low), 12);
        // Medium ×1.5 = 12
        assert_eq!(cell_size_px(640, 80, FontQuality::Medium), 12);
        // High ×2.0 = 16
        assert_eq!(cell_size_px(640, 80, FontQuality::High), 16);
        // Lossless partage le multiplicateur High
        assert_eq!(cell_size_px(640, 80, FontQuality::Lossless), 16);
        // 4000/40 = 100 ×2.0 → clampé à 36
        assert_eq!(cell_size_px(4000, 40, FontQuality::High), 36);
    }

    fn try_rasterizer(cell_px: u32) -> Option<Rasterizer> {
        // Les tests raster dépendent d'une police monospace système ;
        // on les saute si aucune n'est disponible sur la machine de CI.
        let data = crate::font::load_font_data(None).ok()?;
        Rasterizer::new(&data, cell_px).ok()
    }

    #[test]
    fn canvas_keeps_source_resolution() {
        let Some(rasterizer) = try_rasterizer(16) else {
            return;
        };
        let mut canvas = PixelFrame::new(640, 480);
        let mut grid = GlyphGrid::new(80, 30);
        for x in 0..80 {
            grid.set(x, 0, GlyphCell { ch: '@', color: None });
        }
        rasterizer.render(&grid, &mut canvas, Rgb::BLACK);
        assert_eq!((canvas.width, canvas.height), (640, 480));
        assert_eq!(canvas.data.len(), 640 * 480 * 3);
    }

    #[test]
    fn render_is_deterministic() {
        let Some(rasterizer) = try_rasterizer(14) else {
            return;
        };
        let mut grid = GlyphGrid::new(12, 6);
        for x in 0..12u16 {
            for y in 0..6u16 {
                grid.set(
                    x,
                    y,
                    GlyphCell {
                        ch: GLYPH_RAMP[(x as usize + y as usize) % 8],
                        color: Some(Rgb(200, 100, 50)),
                    },
                );
            }
        }
        let mut a = PixelFrame::new(200, 120);
        let mut b = PixelFrame::new(200, 120);
        rasterizer.render(&grid, &mut a, Rgb(30, 30, 30));
        rasterizer.render(&grid, &mut b, Rgb(30, 30, 30));
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn dark_background_gets_light_default_foreground() {
        let Some(rasterizer) = try_rasterizer(16) else {
            return;
        };
        let mut grid = GlyphGrid::new(4, 4);
        for x in 0..4u16 {
            for y in 0..4u16 {
                grid.set(x, y, GlyphCell { ch: '@', color: None });
            }
        }
        let mut canvas = PixelFrame::new(64, 64);
        rasterizer.render(&grid, &mut canvas, Rgb::BLACK);
        // Au moins un pixel doit être plus clair que le fond
        assert!(canvas.data.iter().any(|&c| c > 128));
    }

    #[test]
    fn oversized_grid_is_clipped_not_panicking() {
        let Some(rasterizer) = try_rasterizer(12) else {
            return;
        };
        let mut grid = GlyphGrid::new(40, 20);
        for x in 0..40u16 {
            for y in 0..20u16 {
                grid.set(x, y, GlyphCell { ch: '#', color: None });
            }
        }
        // Canvas plus petit que grille×cellule : start_x/start_y négatifs
        let mut canvas = PixelFrame::new(100, 60);
        rasterizer.render(&grid, &mut canvas, Rgb::WHITE);
        assert_eq!(canvas.data.len(), 100 * 60 * 3);
    }
}
