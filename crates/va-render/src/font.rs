use std::path::Path;

use anyhow::{Context, Result, bail};

/// Emplacements usuels de polices monospace, par plateforme.
///
/// L'alignement des cellules du raster suppose une chasse fixe ; ces
/// candidats sont tous monospace.
const FONT_CANDIDATES: &[&str] = &[
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeMono.ttf",
    // macOS
    "/System/Library/Fonts/Menlo.ttc",
    "/System/Library/Fonts/Monaco.ttf",
    "/Library/Fonts/Courier New.ttf",
    // Windows
    "C:\\Windows\\Fonts\\consola.ttf",
    "C:\\Windows\\Fonts\\cour.ttf",
];

/// Charge les bytes d'une police monospace.
///
/// Chemin explicite s'il est fourni (config `font_path`), sinon premier
/// candidat système présent.
///
/// # Errors
/// Retourne une erreur si le chemin explicite est illisible, ou si aucun
/// candidat n'existe : les sorties raster (PNG/vidéo) ne peuvent alors
/// pas être produites.
///
/// # Example
/// ```no_run
/// use va_render::font::load_font_data;
/// let data = load_font_data(None).unwrap();
/// assert!(!data.is_empty());
/// ```
pub fn load_font_data(explicit: Option<&Path>) -> Result<Vec<u8>> {
    if let Some(path) = explicit {
        return std::fs::read(path)
            .with_context(|| format!("Impossible de lire la police {}", path.display()));
    }

    for candidate in FONT_CANDIDATES {
        let path = Path::new(candidate);
        if path.exists() {
            log::info!("Police monospace : {candidate}");
            return std::fs::read(path)
                .with_context(|| format!("Impossible de lire la police {candidate}"));
        }
    }

    bail!(
        "Aucune police monospace trouvée dans les emplacements usuels. \
         Renseignez font_path dans la config ou --font sur la ligne de commande."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = load_font_data(Some(Path::new("/nonexistent/mono.ttf")));
        assert!(err.is_err());
    }
}
