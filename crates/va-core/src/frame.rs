use crate::color::Rgb;

/// Frame couleur décodée. RGB row-major, 3 bytes par pixel.
///
/// Produite une fois par étape de décodage, consommée par le tone mapper,
/// jamais retenue d'une frame à l'autre.
///
/// # Example
/// ```
/// use va_core::frame::PixelFrame;
/// let f = PixelFrame::new(10, 10);
/// assert_eq!(f.data.len(), 300);
/// ```
pub struct PixelFrame {
    /// Pixels RGB, row-major, 3 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelFrame {
    /// Crée un buffer pré-alloué (noir) aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; (width * height * 3) as usize],
            width,
            height,
        }
    }

    /// Accès au pixel (x, y) → (r, g, b).
    ///
    /// # Example
    /// ```
    /// use va_core::frame::PixelFrame;
    /// let f = PixelFrame::new(4, 4);
    /// assert_eq!(f.pixel(0, 0), (0, 0, 0));
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = ((y * self.width + x) * 3) as usize;
        if idx + 2 >= self.data.len() {
            return (0, 0, 0);
        }
        (self.data[idx], self.data[idx + 1], self.data[idx + 2])
    }

    /// Luminance perceptuelle BT.709.
    ///
    /// # Example
    /// ```
    /// use va_core::frame::PixelFrame;
    /// let mut f = PixelFrame::new(1, 1);
    /// f.data.copy_from_slice(&[255, 255, 255]);
    /// assert_eq!(f.luminance(0, 0), 255);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn luminance(&self, x: u32, y: u32) -> u8 {
        let (r, g, b) = self.pixel(x, y);
        ((u32::from(r) * 2126 + u32::from(g) * 7152 + u32::from(b) * 722) / 10000) as u8
    }

    /// Remplit tout le buffer avec une couleur unie.
    pub fn fill(&mut self, color: Rgb) {
        for px in self.data.chunks_exact_mut(3) {
            px[0] = color.0;
            px[1] = color.1;
            px[2] = color.2;
        }
    }
}

/// Plan d'intensité mono-canal, u8 par échantillon.
///
/// Sortie du tone mapper (résolution source) et du grid sampler
/// (résolution grille).
///
/// # Example
/// ```
/// use va_core::frame::IntensityFrame;
/// let f = IntensityFrame::new(8, 4);
/// assert_eq!(f.data.len(), 32);
/// ```
pub struct IntensityFrame {
    /// Échantillons d'intensité, row-major.
    pub data: Vec<u8>,
    /// Width in samples.
    pub width: u32,
    /// Height in samples.
    pub height: u32,
}

impl IntensityFrame {
    /// Crée un plan pré-alloué (noir) aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; (width * height) as usize],
            width,
            height,
        }
    }

    /// Échantillon à (x, y).
    #[inline(always)]
    #[must_use]
    pub fn sample(&self, x: u32, y: u32) -> u8 {
        debug_assert!(x < self.width && y < self.height, "sample out of bounds");
        self.data[(y * self.width + x) as usize]
    }
}

/// Cellule de la grille de glyphes : caractère + couleur optionnelle.
///
/// `color == None` signifie : pas de séquence d'échappement au terminal,
/// couleur par défaut (classe de luminance du fond) au raster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphCell {
    /// Caractère à afficher.
    pub ch: char,
    /// Couleur du glyphe, ou None pour la couleur par défaut.
    pub color: Option<Rgb>,
}

impl Default for GlyphCell {
    fn default() -> Self {
        Self {
            ch: ' ',
            color: None,
        }
    }
}

impl GlyphCell {
    /// True si la cellule est vide (espace transparent).
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.ch == ' '
    }
}

/// Grille de sortie. Dérivée entièrement d'une frame + config,
/// régénérée à chaque frame, jamais mutée en place après construction.
///
/// # Example
/// ```
/// use va_core::frame::{GlyphGrid, GlyphCell};
/// let mut grid = GlyphGrid::new(80, 30);
/// grid.set(0, 0, GlyphCell { ch: '@', color: None });
/// assert_eq!(grid.get(0, 0).ch, '@');
/// assert_eq!(grid.cells.len(), 80 * 30);
/// ```
#[derive(Clone)]
pub struct GlyphGrid {
    /// Flat array of cells, row-major.
    pub cells: Vec<GlyphCell>,
    /// Width in characters.
    pub width: u16,
    /// Height in characters.
    pub height: u16,
}

impl GlyphGrid {
    /// Crée une grille pré-allouée (espaces).
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            cells: vec![GlyphCell::default(); width as usize * height as usize],
            width,
            height,
        }
    }

    /// Set a cell at position (x, y).
    #[inline(always)]
    pub fn set(&mut self, x: u16, y: u16, cell: GlyphCell) {
        self.cells[y as usize * self.width as usize + x as usize] = cell;
    }

    /// Get a cell reference at position (x, y).
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> &GlyphCell {
        &self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Itère une ligne de cellules.
    ///
    /// # Example
    /// ```
    /// use va_core::frame::GlyphGrid;
    /// let grid = GlyphGrid::new(4, 2);
    /// assert_eq!(grid.row(1).len(), 4);
    /// ```
    #[must_use]
    pub fn row(&self, y: u16) -> &[GlyphCell] {
        let start = y as usize * self.width as usize;
        &self.cells[start..start + self.width as usize]
    }
}
