use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::CoreError;

/// Configuration complète d'un run de rendu.
///
/// Snapshot immuable une fois le run démarré : les front-ends construisent
/// une valeur, le pipeline la clone et ne la mute jamais.
///
/// # Example
/// ```
/// use va_core::config::RenderConfig;
/// let config = RenderConfig::default();
/// assert_eq!(config.char_width, 120);
/// assert!(config.validate().is_ok());
/// ```
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RenderConfig {
    // === Grille ===
    /// Largeur de la grille en caractères. ≥ 1.
    pub char_width: u32,
    /// Calcul de la hauteur de grille (auto, ratio explicite, ou fixe).
    pub grid_height: GridHeight,
    /// Plancher de hauteur de grille (préset terminal : 1, préset GUI : 20).
    pub min_grid_height: u32,

    // === Style ===
    /// Inverser l'intensité (pour fond clair).
    pub invert: bool,
    /// Fond transparent : les cellules au-delà du seuil deviennent vides.
    pub transparent: bool,
    /// Seuil de transparence [0, 255]. Sans effet si `transparent` est faux.
    pub threshold: u8,
    /// Politique de couleur du texte.
    pub text_color: ColorSpec,
    /// Couleur de fond du rendu raster.
    pub background: Rgb,

    // === Caméra ===
    /// Décalage de luminosité [-100, 100].
    pub brightness: i32,
    /// Contraste (> 0). 1.0 = neutre.
    pub contrast: f32,
    /// Gamma (> 0). 1.0 = neutre.
    pub gamma: f32,

    // === Export ===
    /// Palier de qualité de la police raster et de l'encodage vidéo.
    pub font_quality: FontQuality,
    /// Cibles de sortie activées.
    pub outputs: Outputs,
    /// Relire la vidéo en boucle jusqu'à annulation.
    pub loop_playback: bool,
    /// Police monospace explicite pour le raster. None = découverte système.
    pub font_path: Option<PathBuf>,
}

/// Calcul de la hauteur de la grille de caractères.
///
/// `Auto` reproduit les proportions source avec la correction `/2`
/// (une cellule de caractère est environ deux fois plus haute que large).
/// `Ratio` et `Fixed` sont les présets des deux front-ends historiques.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum GridHeight {
    /// `round(char_width * (H/W) / 2)`.
    Auto,
    /// `round(char_width * ratio)`.
    Ratio(f32),
    /// Hauteur explicite en caractères.
    Fixed(u32),
}

/// Politique de couleur du texte (mutuellement exclusive).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum ColorSpec {
    /// Pas de couleur : le terminal n'émet aucune séquence, le raster
    /// choisit blanc/noir selon la classe de luminance du fond.
    #[default]
    None,
    /// Palette cyclique déterministe, indexée par le bucket d'intensité.
    Random,
    /// Couleur unique pour toutes les cellules non vides.
    Fixed(Rgb),
}

impl ColorSpec {
    /// Parse `none`, `random`, un nom de couleur ou `#rrggbb`.
    ///
    /// # Errors
    /// Retourne `CoreError::Config` si la chaîne n'est reconnue par aucune
    /// des trois formes.
    ///
    /// # Example
    /// ```
    /// use va_core::config::ColorSpec;
    /// use va_core::color::Rgb;
    /// assert_eq!(ColorSpec::parse("random").unwrap(), ColorSpec::Random);
    /// assert_eq!(ColorSpec::parse("green").unwrap(), ColorSpec::Fixed(Rgb(0, 255, 0)));
    /// ```
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(ColorSpec::None),
            "random" => Ok(ColorSpec::Random),
            other => Ok(ColorSpec::Fixed(Rgb::parse(other)?)),
        }
    }
}

/// Palier de qualité : multiplicateur de taille de police au raster,
/// facteur de qualité constante à l'encodage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum FontQuality {
    /// Petits fichiers, glyphes grossiers.
    Low,
    /// Équilibre taille/netteté.
    Medium,
    /// Glyphes nets, gros fichiers.
    #[default]
    High,
    /// Quasi-lossless à l'encodage, preset le plus rapide.
    Lossless,
}

impl FontQuality {
    /// Multiplicateur appliqué à `source_width / char_width`.
    #[must_use]
    pub fn font_multiplier(self) -> f32 {
        match self {
            FontQuality::Low => 1.0,
            FontQuality::Medium => 1.5,
            FontQuality::High | FontQuality::Lossless => 2.0,
        }
    }

    /// Parse low/medium/high/lossless.
    ///
    /// # Errors
    /// Retourne `CoreError::Config` pour tout autre libellé.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(FontQuality::Low),
            "medium" => Ok(FontQuality::Medium),
            "high" => Ok(FontQuality::High),
            "lossless" => Ok(FontQuality::Lossless),
            other => Err(CoreError::Config(format!(
                "qualité inconnue '{other}' (low|medium|high|lossless)"
            ))),
        }
    }
}

/// Cibles de sortie persistées d'un run.
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
pub struct Outputs {
    /// Fichiers texte `frames/frame_NNNNNN.txt` (glyphes seuls).
    pub text: bool,
    /// PNG `frames/frame_NNNNNN.png` à la résolution source.
    pub image: bool,
    /// Vidéo assemblée `videos/*.mp4` via l'encodeur externe.
    pub video: bool,
}

impl Outputs {
    /// True si au moins une cible nécessite le rendu raster.
    #[must_use]
    pub fn needs_raster(self) -> bool {
        self.image || self.video
    }

    /// True si aucune cible persistée n'est demandée (aperçu seul).
    #[must_use]
    pub fn is_empty(self) -> bool {
        !self.text && !self.image && !self.video
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            char_width: 120,
            grid_height: GridHeight::Auto,
            min_grid_height: 1,
            invert: false,
            transparent: false,
            threshold: 150,
            text_color: ColorSpec::None,
            background: Rgb::BLACK,
            brightness: 0,
            contrast: 1.0,
            gamma: 1.0,
            font_quality: FontQuality::High,
            outputs: Outputs {
                text: true,
                image: false,
                video: false,
            },
            loop_playback: false,
            font_path: None,
        }
    }
}

impl RenderConfig {
    /// Clamp all numeric fields to their operating ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.brightness = self.brightness.clamp(-100, 100);
        self.contrast = self.contrast.clamp(0.1, 3.0);
        self.gamma = self.gamma.clamp(0.1, 3.0);
        self.min_grid_height = self.min_grid_height.max(1);
    }

    /// Rejette les valeurs hors contrat avant tout décodage.
    ///
    /// Le tone mapper et le sampler supposent ces invariants ; c'est ici
    /// (et nulle part ailleurs) que contraste/gamma ≤ 0 sont refusés.
    ///
    /// # Errors
    /// Retourne `CoreError::Config` décrivant le premier champ invalide.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.char_width == 0 {
            return Err(CoreError::Config("char_width doit être ≥ 1".into()));
        }
        if self.char_width > 4096 {
            return Err(CoreError::Config(format!(
                "char_width déraisonnable ({}, max 4096)",
                self.char_width
            )));
        }
        if self.contrast <= 0.0 {
            return Err(CoreError::Config(format!(
                "contrast doit être > 0 (reçu {})",
                self.contrast
            )));
        }
        if self.gamma <= 0.0 {
            return Err(CoreError::Config(format!(
                "gamma doit être > 0 (reçu {})",
                self.gamma
            )));
        }
        match self.grid_height {
            GridHeight::Ratio(r) if r <= 0.0 => {
                Err(CoreError::Config(format!("height_ratio doit être > 0 (reçu {r})")))
            }
            GridHeight::Fixed(0) => Err(CoreError::Config("char_height doit être ≥ 1".into())),
            _ => Ok(()),
        }
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    render: Option<RenderSection>,
    tone: Option<ToneSection>,
    export: Option<ExportSection>,
}

/// Render section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct RenderSection {
    char_width: Option<u32>,
    height_ratio: Option<f32>,
    char_height: Option<u32>,
    min_grid_height: Option<u32>,
    invert: Option<bool>,
    transparent: Option<bool>,
    threshold: Option<u8>,
    text_color: Option<String>,
    background: Option<String>,
}

/// Tone section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct ToneSection {
    brightness: Option<i32>,
    contrast: Option<f32>,
    gamma: Option<f32>,
}

/// Export section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct ExportSection {
    font_quality: Option<String>,
    text: Option<bool>,
    image: Option<bool>,
    video: Option<bool>,
    #[serde(rename = "loop")]
    loop_playback: Option<bool>,
    font_path: Option<PathBuf>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read, parsed, or if the merged
/// configuration fails validation.
///
/// # Example
/// ```no_run
/// use va_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<RenderConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;

    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))?;

    let mut config = RenderConfig::default();

    if let Some(r) = file.render {
        if let Some(v) = r.char_width {
            config.char_width = v;
        }
        // char_height explicite prime sur height_ratio
        if let Some(v) = r.char_height {
            config.grid_height = GridHeight::Fixed(v);
        } else if let Some(v) = r.height_ratio {
            config.grid_height = GridHeight::Ratio(v);
        }
        if let Some(v) = r.min_grid_height {
            config.min_grid_height = v;
        }
        if let Some(v) = r.invert {
            config.invert = v;
        }
        if let Some(v) = r.transparent {
            config.transparent = v;
        }
        if let Some(v) = r.threshold {
            config.threshold = v;
        }
        if let Some(v) = r.text_color {
            config.text_color = ColorSpec::parse(&v)?;
        }
        if let Some(v) = r.background {
            config.background = Rgb::parse(&v)?;
        }
    }

    if let Some(t) = file.tone {
        if let Some(v) = t.brightness {
            config.brightness = v;
        }
        if let Some(v) = t.contrast {
            config.contrast = v;
        }
        if let Some(v) = t.gamma {
            config.gamma = v;
        }
    }

    if let Some(e) = file.export {
        if let Some(v) = e.font_quality {
            config.font_quality = FontQuality::parse(&v)?;
        }
        if let Some(v) = e.text {
            config.outputs.text = v;
        }
        if let Some(v) = e.image {
            config.outputs.image = v;
        }
        if let Some(v) = e.video {
            config.outputs.video = v;
        }
        if let Some(v) = e.loop_playback {
            config.loop_playback = v;
        }
        if let Some(v) = e.font_path {
            config.font_path = Some(v);
        }
    }

    // Valider avant de clamper : contraste/gamma ≤ 0 sont refusés,
    // les valeurs hors plage mais positives sont rattrapées.
    config.validate()?;
    config.clamp_all();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.threshold, 150);
        assert!(config.outputs.text);
        assert!(!config.outputs.needs_raster());
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        let config = RenderConfig {
            char_width: 0,
            ..RenderConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RenderConfig {
            contrast: 0.0,
            ..RenderConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RenderConfig {
            gamma: -1.0,
            ..RenderConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RenderConfig {
            grid_height: GridHeight::Ratio(0.0),
            ..RenderConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn clamp_all_bounds_tone_fields() {
        let mut config = RenderConfig {
            brightness: 400,
            contrast: 50.0,
            gamma: 0.0001,
            ..RenderConfig::default()
        };
        config.clamp_all();
        assert_eq!(config.brightness, 100);
        assert!((config.contrast - 3.0).abs() < f32::EPSILON);
        assert!((config.gamma - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn toml_partial_override_merges_over_defaults() {
        let toml_src = r##"
[render]
char_width = 80
transparent = true
threshold = 150
text_color = "#bdf282"
background = "dark_gray"

[tone]
contrast = 1.5

[export]
font_quality = "lossless"
image = true
video = true
"##;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, toml_src).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.char_width, 80);
        assert!(config.transparent);
        assert_eq!(config.text_color, ColorSpec::Fixed(Rgb(0xbd, 0xf2, 0x82)));
        assert_eq!(config.background, Rgb(64, 64, 64));
        assert!((config.contrast - 1.5).abs() < f32::EPSILON);
        assert_eq!(config.font_quality, FontQuality::Lossless);
        assert!(config.outputs.image && config.outputs.video);
        // Untouched fields keep their defaults
        assert_eq!(config.brightness, 0);
        assert_eq!(config.grid_height, GridHeight::Auto);
        assert!(config.outputs.text);
    }

    #[test]
    fn color_spec_parse_forms() {
        assert_eq!(ColorSpec::parse("none").unwrap(), ColorSpec::None);
        assert_eq!(ColorSpec::parse("RANDOM").unwrap(), ColorSpec::Random);
        assert_eq!(
            ColorSpec::parse("#ff0000").unwrap(),
            ColorSpec::Fixed(Rgb(255, 0, 0))
        );
        assert!(ColorSpec::parse("nonsense").is_err());
    }

    #[test]
    fn font_quality_multipliers() {
        assert!((FontQuality::Low.font_multiplier() - 1.0).abs() < f32::EPSILON);
        assert!((FontQuality::Medium.font_multiplier() - 1.5).abs() < f32::EPSILON);
        assert!((FontQuality::High.font_multiplier() - 2.0).abs() < f32::EPSILON);
        assert!((FontQuality::Lossless.font_multiplier() - 2.0).abs() < f32::EPSILON);
    }
}
