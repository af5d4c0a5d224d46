use anyhow::Result;

use crate::frame::{GlyphGrid, PixelFrame};

/// Métadonnées d'une source vidéo.
///
/// # Example
/// ```
/// use va_core::traits::SourceInfo;
/// let info = SourceInfo { width: 640, height: 480, fps: 30.0, frame_count: Some(10) };
/// assert_eq!(info.width, 640);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct SourceInfo {
    /// Largeur native en pixels.
    pub width: u32,
    /// Hauteur native en pixels.
    pub height: u32,
    /// Images par seconde (ex: 23.976, 24.0, 30.0, 60.0).
    pub fps: f64,
    /// Nombre total de frames, si le conteneur l'expose.
    pub frame_count: Option<u64>,
}

/// Fournit une séquence ordonnée et finie de frames couleur.
///
/// Implémenté par `VideoSource` (ffmpeg subprocess). L'ouverture est le
/// constructeur du type concret ; la fermeture des handles de décodage
/// est portée par `Drop`.
pub trait FrameSource: Send {
    /// Lit la frame suivante. `Ok(None)` signale la fin du flux.
    ///
    /// # Errors
    /// Retourne une erreur I/O fatale si le flux de décodage est rompu.
    fn read_next(&mut self) -> Result<Option<PixelFrame>>;

    /// Repositionne la lecture sur `frame_index` (0 = début).
    ///
    /// # Errors
    /// Retourne une erreur si le décodeur ne peut pas être repositionné.
    fn seek(&mut self, frame_index: u64) -> Result<()>;

    /// Métadonnées du flux (fps, frame count, dimensions natives).
    fn metadata(&self) -> SourceInfo;
}

/// Consommateur d'une grille de glyphes rendue.
///
/// Trois implémentations : fichier texte, raster PNG, aperçu terminal.
/// Le pipeline en possède un jeu et leur écrit chaque frame dans l'ordre.
pub trait RenderTarget {
    /// Écrit la frame `index` (zéro-basé, croissant de 1).
    ///
    /// # Errors
    /// Une erreur d'écriture est absorbée par le pipeline (frame sautée
    /// pour cette cible uniquement, comptabilisée dans le résumé).
    fn write_frame(&mut self, index: u64, grid: &GlyphGrid) -> Result<()>;

    /// Nom lisible pour le debug et le tally d'erreurs.
    fn name(&self) -> &'static str;
}
