use anyhow::{Context, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};

use va_core::config::{GridHeight, RenderConfig};
use va_core::frame::IntensityFrame;

/// Hauteur de la grille de caractères pour une source donnée.
///
/// `Auto` préserve les proportions source avec la correction `/2` :
/// une cellule de caractère est environ deux fois plus haute que large,
/// donc une grille « carrée » en cellules rend une image carrée.
/// Le résultat est planché par `min_grid_height` (et jamais < 1).
///
/// # Example
/// ```
/// use va_ascii::sampler::grid_height;
/// use va_core::config::RenderConfig;
/// let config = RenderConfig { char_width: 80, ..RenderConfig::default() };
/// assert_eq!(grid_height(&config, 640, 480), 30);
/// ```
#[must_use]
pub fn grid_height(config: &RenderConfig, src_w: u32, src_h: u32) -> u32 {
    debug_assert!(src_w > 0 && src_h > 0, "source dimensions must be non-zero");
    let cw = config.char_width;
    let h = match config.grid_height {
        GridHeight::Auto => {
            (f64::from(cw) * (f64::from(src_h) / f64::from(src_w)) / 2.0).round() as u32
        }
        GridHeight::Ratio(r) => (cw as f32 * r).round() as u32,
        GridHeight::Fixed(n) => n,
    };
    h.max(config.min_grid_height).max(1)
}

/// Échantillonneur réutilisable wrappant fast_image_resize.
///
/// Filtre boîte (area-averaging) : perte d'information minimale au
/// downsampling, pas d'aliasing sur les détails fins.
///
/// # Example
/// ```
/// use va_ascii::sampler::GridSampler;
/// let s = GridSampler::new();
/// ```
pub struct GridSampler {
    inner: FirResizer,
    options: ResizeOptions,
    /// Scratch buffer source (l'API exige un `&mut` sur la source).
    src_buf: Vec<u8>,
}

impl GridSampler {
    /// Create a new sampler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Box)),
            src_buf: Vec::new(),
        }
    }

    /// Downsample `src` vers une grille de `grid_w × grid_h` échantillons.
    ///
    /// Contrat : les dimensions de sortie sont exactement `grid_h × grid_w`,
    /// jamais de ligne ou colonne partielle.
    ///
    /// # Errors
    /// Returns an error if the resize operation fails.
    ///
    /// # Example
    /// ```
    /// use va_ascii::sampler::GridSampler;
    /// use va_core::frame::IntensityFrame;
    /// let mut s = GridSampler::new();
    /// let src = IntensityFrame::new(640, 480);
    /// let grid = s.sample(&src, 80, 30).unwrap();
    /// assert_eq!((grid.width, grid.height), (80, 30));
    /// ```
    pub fn sample(
        &mut self,
        src: &IntensityFrame,
        grid_w: u32,
        grid_h: u32,
    ) -> Result<IntensityFrame> {
        let mut dst = IntensityFrame::new(grid_w, grid_h);

        if src.width == grid_w && src.height == grid_h {
            dst.data.copy_from_slice(&src.data);
            return Ok(dst);
        }

        self.src_buf.clear();
        self.src_buf.extend_from_slice(&src.data);

        let src_image = Image::from_slice_u8(src.width, src.height, &mut self.src_buf, PixelType::U8)
            .context("Invalid source dimensions")?;

        let mut dst_image = Image::from_slice_u8(grid_w, grid_h, &mut dst.data, PixelType::U8)
            .context("Invalid grid dimensions")?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .context("Downsample failed")?;

        Ok(dst)
    }
}

impl Default for GridSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_height_aspect_corrected() {
        let config = RenderConfig {
            char_width: 80,
            ..RenderConfig::default()
        };
        // round(80 * (480/640) / 2) = 30
        assert_eq!(grid_height(&config, 640, 480), 30);
        // round(100 * (1080/1920) / 2) = 28
        let config = RenderConfig {
            char_width: 100,
            ..RenderConfig::default()
        };
        assert_eq!(grid_height(&config, 1920, 1080), 28);
    }

    #[test]
    fn height_floor_applies() {
        // Source très large : hauteur auto dégénérée, plancher GUI à 20
        let config = RenderConfig {
            char_width: 40,
            min_grid_height: 20,
            ..RenderConfig::default()
        };
        assert_eq!(grid_height(&config, 4000, 100), 20);
        // Plancher par défaut : jamais 0
        let config = RenderConfig {
            char_width: 4,
            ..RenderConfig::default()
        };
        assert_eq!(grid_height(&config, 4000, 100), 1);
    }

    #[test]
    fn ratio_and_fixed_presets() {
        let config = RenderConfig {
            char_width: 250,
            grid_height: GridHeight::Ratio(0.55),
            ..RenderConfig::default()
        };
        assert_eq!(grid_height(&config, 640, 480), 138);

        let config = RenderConfig {
            char_width: 250,
            grid_height: GridHeight::Fixed(42),
            ..RenderConfig::default()
        };
        assert_eq!(grid_height(&config, 640, 480), 42);
    }

    #[test]
    fn sample_exact_output_dimensions() {
        let mut sampler = GridSampler::new();
        // Dimensions non divisibles : la sortie reste exacte
        let src = IntensityFrame::new(101, 37);
        let grid = sampler.sample(&src, 80, 11).unwrap();
        assert_eq!((grid.width, grid.height), (80, 11));
        assert_eq!(grid.data.len(), 80 * 11);
    }

    #[test]
    fn sample_preserves_uniform_intensity() {
        let mut sampler = GridSampler::new();
        let mut src = IntensityFrame::new(64, 64);
        src.data.fill(200);
        let grid = sampler.sample(&src, 8, 4).unwrap();
        assert!(grid.data.iter().all(|&p| p == 200));
    }

    #[test]
    fn sample_same_dims_is_copy() {
        let mut sampler = GridSampler::new();
        let mut src = IntensityFrame::new(8, 4);
        for (i, p) in src.data.iter_mut().enumerate() {
            *p = (i * 7 % 256) as u8;
        }
        let grid = sampler.sample(&src, 8, 4).unwrap();
        assert_eq!(grid.data, src.data);
    }
}
