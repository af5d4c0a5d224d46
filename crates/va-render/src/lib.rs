/// Cibles de rendu pour vidscii.
///
/// Trois consommateurs indépendants de la grille de glyphes :
/// fichiers texte bruts, aperçu terminal ANSI, raster PNG à la
/// résolution source. Tous partagent la même grille : la logique
/// glyphe/couleur n'est jamais re-dérivée par cible.

pub mod font;
pub mod raster;
pub mod term;
pub mod text;

pub use font::load_font_data;
pub use raster::{RasterTarget, Rasterizer, cell_size_px};
pub use term::TermPreview;
pub use text::{TextFileTarget, frame_file_name, grid_to_text};
