/// Rampe fixe de 10 glyphes, du plus dense au plus clair.
///
/// La quantisation `p / 32` plafonne à l'index 7 pour p ∈ [0, 255] :
/// les deux derniers glyphes (`.` et l'espace) ne sont atteints que par
/// le seuil de transparence, jamais par l'intensité seule.
/// Avec `invert`, le tone mapper retourne l'intensité en amont ; la rampe
/// elle-même ne change jamais.
pub const GLYPH_RAMP: [char; 10] = ['@', '%', '#', '*', '+', '=', '-', ':', '.', ' '];

/// Index de rampe pour une intensité 8 bits : `min(p / 32, 9)`.
///
/// # Example
/// ```
/// use va_core::ramp::ramp_index;
/// assert_eq!(ramp_index(0), 0);
/// assert_eq!(ramp_index(100), 3);
/// assert_eq!(ramp_index(255), 7);
/// ```
#[inline(always)]
#[must_use]
pub fn ramp_index(intensity: u8) -> usize {
    (intensity as usize / 32).min(GLYPH_RAMP.len() - 1)
}

/// Glyphe pour une intensité 8 bits.
///
/// # Example
/// ```
/// use va_core::ramp::glyph_for;
/// assert_eq!(glyph_for(0), '@');
/// assert_eq!(glyph_for(100), '*');
/// ```
#[inline(always)]
#[must_use]
pub fn glyph_for(intensity: u8) -> char {
    GLYPH_RAMP[ramp_index(intensity)]
}
