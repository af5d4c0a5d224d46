use va_core::color::PALETTE;
use va_core::config::{ColorSpec, RenderConfig};
use va_core::frame::{GlyphCell, GlyphGrid, IntensityFrame};
use va_core::ramp::{GLYPH_RAMP, ramp_index};

/// Quantise une intensité de cellule en glyphe + couleur.
///
/// Fonction pure de `(intensité, config)` : les mêmes entrées produisent
/// toujours la même cellule, pour tous les front-ends. La politique de
/// couleur est mutuellement exclusive, vérifiée dans cet ordre :
/// 1. `Random` → palette cyclique indexée par le bucket d'intensité
///    (déterministe au sein d'une frame, pas d'état caché) ;
/// 2. `Fixed` → couleur unique ;
/// 3. `None` → aucune couleur (défaut de la cible de rendu).
///
/// # Example
/// ```
/// use va_ascii::glyph::map_cell;
/// use va_core::config::RenderConfig;
/// let config = RenderConfig { transparent: true, threshold: 150, ..RenderConfig::default() };
/// assert_eq!(map_cell(200, &config).ch, ' ');
/// assert_eq!(map_cell(100, &config).ch, '*');
/// ```
#[must_use]
pub fn map_cell(intensity: u8, config: &RenderConfig) -> GlyphCell {
    if config.transparent && intensity > config.threshold {
        return GlyphCell {
            ch: ' ',
            color: None,
        };
    }
    let idx = ramp_index(intensity);
    let color = match config.text_color {
        ColorSpec::Random => Some(PALETTE[idx % PALETTE.len()]),
        ColorSpec::Fixed(c) => Some(c),
        ColorSpec::None => None,
    };
    GlyphCell {
        ch: GLYPH_RAMP[idx],
        color,
    }
}

/// Quantise un plan d'intensité échantillonné en grille de glyphes.
///
/// Les dimensions de la grille sont celles du plan (`grid_h × grid_w`).
///
/// # Panics
/// Panique (debug) si le plan dépasse u16::MAX dans une dimension.
///
/// # Example
/// ```
/// use va_ascii::glyph::map_grid;
/// use va_core::config::RenderConfig;
/// use va_core::frame::IntensityFrame;
/// let plane = IntensityFrame::new(80, 30);
/// let grid = map_grid(&plane, &RenderConfig::default());
/// assert_eq!((grid.width, grid.height), (80, 30));
/// assert_eq!(grid.get(0, 0).ch, '@');
/// ```
#[must_use]
pub fn map_grid(plane: &IntensityFrame, config: &RenderConfig) -> GlyphGrid {
    debug_assert!(plane.width <= u32::from(u16::MAX) && plane.height <= u32::from(u16::MAX));
    let width = plane.width as u16;
    let height = plane.height as u16;
    let mut grid = GlyphGrid::new(width, height);
    for (cell, &p) in grid.cells.iter_mut().zip(plane.data.iter()) {
        *cell = map_cell(p, config);
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use va_core::color::Rgb;

    #[test]
    fn transparency_threshold_blanks_bright_cells() {
        let config = RenderConfig {
            transparent: true,
            threshold: 150,
            text_color: ColorSpec::Random,
            ..RenderConfig::default()
        };
        let cell = map_cell(200, &config);
        assert!(cell.is_blank());
        assert_eq!(cell.color, None);
        // Exactement au seuil : pas transparent
        assert!(!map_cell(150, &config).is_blank());
    }

    #[test]
    fn threshold_irrelevant_without_transparency() {
        let config = RenderConfig {
            transparent: false,
            threshold: 0,
            ..RenderConfig::default()
        };
        assert_eq!(map_cell(200, &config).ch, '-');
    }

    #[test]
    fn ramp_quantization_buckets() {
        let config = RenderConfig::default();
        assert_eq!(map_cell(0, &config).ch, '@');
        assert_eq!(map_cell(31, &config).ch, '@');
        assert_eq!(map_cell(100, &config).ch, '*');
        assert_eq!(map_cell(255, &config).ch, ':');
    }

    #[test]
    fn random_palette_is_intensity_deterministic() {
        let config = RenderConfig {
            text_color: ColorSpec::Random,
            ..RenderConfig::default()
        };
        // Même bucket → même couleur, à chaque appel
        let a = map_cell(100, &config);
        let b = map_cell(100, &config);
        assert_eq!(a, b);
        // index 3 → PALETTE[3] = bleu
        assert_eq!(a.color, Some(Rgb(0, 0, 255)));
        // index 0 → PALETTE[0] = rouge
        assert_eq!(map_cell(10, &config).color, Some(Rgb(255, 0, 0)));
    }

    #[test]
    fn fixed_color_applies_to_all_non_blank_cells() {
        let config = RenderConfig {
            text_color: ColorSpec::Fixed(Rgb(0xbd, 0xf2, 0x82)),
            ..RenderConfig::default()
        };
        for p in [0u8, 100, 255] {
            assert_eq!(map_cell(p, &config).color, Some(Rgb(0xbd, 0xf2, 0x82)));
        }
    }

    #[test]
    fn map_grid_matches_per_cell_mapping() {
        let config = RenderConfig::default();
        let mut plane = IntensityFrame::new(4, 2);
        for (i, p) in plane.data.iter_mut().enumerate() {
            *p = (i * 36) as u8;
        }
        let grid = map_grid(&plane, &config);
        for y in 0..2u16 {
            for x in 0..4u16 {
                let p = plane.sample(u32::from(x), u32::from(y));
                assert_eq!(*grid.get(x, y), map_cell(p, &config));
            }
        }
    }
}
