use va_core::config::RenderConfig;
use va_core::frame::{IntensityFrame, PixelFrame};

/// Courbe de tonalité précalculée : 256 entrées, construite une fois par
/// run depuis le snapshot de config.
///
/// Chaîne appliquée à chaque intensité d'entrée, en flottant :
/// `out = clamp(in·contrast + brightness)`, puis
/// `out = clamp((out/255)^gamma · 255)`, puis inversion éventuelle.
/// Contraste/gamma ≤ 0 sont rejetés à la validation de config, jamais ici.
///
/// # Example
/// ```
/// use va_ascii::tone::ToneCurve;
/// use va_core::config::RenderConfig;
/// let curve = ToneCurve::new(&RenderConfig::default());
/// // Config neutre : la courbe est l'identité.
/// assert_eq!(curve.map(0), 0);
/// assert_eq!(curve.map(128), 128);
/// assert_eq!(curve.map(255), 255);
/// ```
pub struct ToneCurve {
    lut: [u8; 256],
}

impl ToneCurve {
    /// Construit la courbe depuis la config.
    #[must_use]
    pub fn new(config: &RenderConfig) -> Self {
        let mut lut = [0u8; 256];
        for (i, slot) in lut.iter_mut().enumerate() {
            let mut v = i as f32 * config.contrast + config.brightness as f32;
            v = v.clamp(0.0, 255.0);
            v = (v / 255.0).powf(config.gamma) * 255.0;
            v = v.clamp(0.0, 255.0);
            let mut out = v.round() as u8;
            if config.invert {
                out = 255 - out;
            }
            *slot = out;
        }
        Self { lut }
    }

    /// Applique la courbe à une intensité.
    #[inline(always)]
    #[must_use]
    pub fn map(&self, intensity: u8) -> u8 {
        self.lut[intensity as usize]
    }

    /// Extrait la luminance BT.709 d'une frame couleur et applique la
    /// courbe : une frame d'intensité à la résolution source.
    ///
    /// # Example
    /// ```
    /// use va_ascii::tone::ToneCurve;
    /// use va_core::config::RenderConfig;
    /// use va_core::frame::PixelFrame;
    /// let curve = ToneCurve::new(&RenderConfig::default());
    /// let frame = PixelFrame::new(8, 4);
    /// let plane = curve.apply(&frame);
    /// assert_eq!((plane.width, plane.height), (8, 4));
    /// ```
    #[must_use]
    pub fn apply(&self, frame: &PixelFrame) -> IntensityFrame {
        let mut out = IntensityFrame::new(frame.width, frame.height);
        for (dst, px) in out.data.iter_mut().zip(frame.data.chunks_exact(3)) {
            let lum = ((u32::from(px[0]) * 2126 + u32::from(px[1]) * 7152 + u32::from(px[2]) * 722)
                / 10000) as u8;
            *dst = self.lut[lum as usize];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve_with(brightness: i32, contrast: f32, gamma: f32, invert: bool) -> ToneCurve {
        let config = RenderConfig {
            brightness,
            contrast,
            gamma,
            invert,
            ..RenderConfig::default()
        };
        ToneCurve::new(&config)
    }

    #[test]
    fn neutral_curve_is_identity() {
        let curve = curve_with(0, 1.0, 1.0, false);
        for p in 0..=255u8 {
            assert_eq!(curve.map(p), p);
        }
    }

    #[test]
    fn brightness_shifts_and_clamps() {
        let curve = curve_with(100, 1.0, 1.0, false);
        assert_eq!(curve.map(0), 100);
        assert_eq!(curve.map(200), 255);

        let curve = curve_with(-100, 1.0, 1.0, false);
        assert_eq!(curve.map(50), 0);
        assert_eq!(curve.map(150), 50);
    }

    #[test]
    fn contrast_scales_before_brightness() {
        // out = in*2 + 10
        let curve = curve_with(10, 2.0, 1.0, false);
        assert_eq!(curve.map(20), 50);
        assert_eq!(curve.map(200), 255);
    }

    #[test]
    fn gamma_darkens_midtones_when_above_one() {
        let curve = curve_with(0, 1.0, 2.0, false);
        // (128/255)^2 * 255 ≈ 64
        assert_eq!(curve.map(128), 64);
        assert_eq!(curve.map(0), 0);
        assert_eq!(curve.map(255), 255);
    }

    #[test]
    fn invert_flips_after_everything() {
        let curve = curve_with(0, 1.0, 1.0, true);
        assert_eq!(curve.map(0), 255);
        assert_eq!(curve.map(255), 0);
        assert_eq!(curve.map(100), 155);
    }

    #[test]
    fn apply_extracts_bt709_luminance() {
        let curve = curve_with(0, 1.0, 1.0, false);
        let mut frame = PixelFrame::new(2, 1);
        frame.data[0..3].copy_from_slice(&[255, 255, 255]);
        frame.data[3..6].copy_from_slice(&[0, 0, 0]);
        let plane = curve.apply(&frame);
        assert_eq!(plane.sample(0, 0), 255);
        assert_eq!(plane.sample(1, 0), 0);
    }
}
