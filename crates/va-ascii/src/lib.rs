/// Conversion frame → grille de glyphes pour vidscii.
///
/// Trois étapes pures, dans l'ordre du pipeline :
/// tone mapping (luminosité/contraste/gamma/inversion), échantillonnage
/// vers la grille de caractères (area-averaging), quantisation en glyphes
/// avec politique de couleur.

pub mod glyph;
pub mod sampler;
pub mod tone;

pub use glyph::{map_cell, map_grid};
pub use sampler::{GridSampler, grid_height};
pub use tone::ToneCurve;
