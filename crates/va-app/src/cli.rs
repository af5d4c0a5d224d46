use std::path::PathBuf;

use clap::Parser;

use va_core::color::Rgb;
use va_core::config::{ColorSpec, FontQuality, GridHeight, Outputs, RenderConfig};

/// vidscii : convertisseur vidéo → art ASCII (texte, PNG, MP4).
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Vidéo source (mp4, avi, mov, mkv, webm, ...).
    pub input: PathBuf,

    /// Largeur de la grille en caractères. Défaut : largeur du terminal.
    #[arg(long)]
    pub width: Option<u32>,

    /// Ratio hauteur/largeur de la grille (ex: 0.55). Défaut : proportions
    /// de la source avec la correction /2.
    #[arg(long)]
    pub height_ratio: Option<f32>,

    /// Hauteur de grille explicite en caractères (prime sur --height-ratio).
    #[arg(long)]
    pub char_height: Option<u32>,

    /// Plancher de hauteur de grille.
    #[arg(long)]
    pub min_height: Option<u32>,

    /// Inverser l'intensité (pour fond clair).
    #[arg(long, default_value_t = false)]
    pub invert: bool,

    /// Fond transparent : cellules vides au-delà du seuil.
    #[arg(long, default_value_t = false)]
    pub transparent: bool,

    /// Seuil de transparence [0-255].
    #[arg(long)]
    pub threshold: Option<u8>,

    /// Couleur du texte : none, random, un nom (red, green, ...) ou #rrggbb.
    #[arg(long)]
    pub color: Option<String>,

    /// Couleur de fond du rendu raster : un nom ou #rrggbb.
    #[arg(long)]
    pub background: Option<String>,

    /// Luminosité [-100, 100].
    #[arg(long)]
    pub brightness: Option<i32>,

    /// Contraste (> 0). 1.0 = neutre.
    #[arg(long)]
    pub contrast: Option<f32>,

    /// Gamma (> 0). 1.0 = neutre.
    #[arg(long)]
    pub gamma: Option<f32>,

    /// Qualité police/encodage : low, medium, high, lossless.
    #[arg(long)]
    pub quality: Option<String>,

    /// Cibles de sortie, séparées par des virgules : txt,png,video.
    #[arg(long, value_delimiter = ',')]
    pub save: Option<Vec<String>>,

    /// Relire la vidéo en boucle jusqu'à Ctrl-C.
    #[arg(long = "loop", default_value_t = false)]
    pub loop_playback: bool,

    /// Rendre la première frame dans le terminal puis quitter.
    #[arg(long, default_value_t = false)]
    pub preview: bool,

    /// Désactiver l'aperçu terminal pendant la conversion.
    #[arg(long, default_value_t = false)]
    pub no_preview: bool,

    /// Racine du projet de sortie. Défaut : ascii_output/<nom de la vidéo>.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Nom de la vidéo assemblée (sans extension).
    #[arg(long, default_value = "ascii_video")]
    pub name: String,

    /// Police monospace explicite pour le raster.
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Applique les overrides CLI sur une config chargée (fichier ou
    /// défauts). Les flags absents laissent la config intacte.
    ///
    /// # Errors
    /// Retourne une erreur si une valeur (couleur, qualité, cible de
    /// sauvegarde) ne se parse pas, ou si la config finale est invalide.
    pub fn apply_overrides(&self, config: &mut RenderConfig) -> anyhow::Result<()> {
        if let Some(w) = self.width {
            config.char_width = w;
        }
        if let Some(h) = self.char_height {
            config.grid_height = GridHeight::Fixed(h);
        } else if let Some(r) = self.height_ratio {
            config.grid_height = GridHeight::Ratio(r);
        }
        if let Some(m) = self.min_height {
            config.min_grid_height = m;
        }
        if self.invert {
            config.invert = true;
        }
        if self.transparent {
            config.transparent = true;
        }
        if let Some(t) = self.threshold {
            config.threshold = t;
        }
        if let Some(ref c) = self.color {
            config.text_color = ColorSpec::parse(c)?;
        }
        if let Some(ref b) = self.background {
            config.background = Rgb::parse(b)?;
        }
        if let Some(b) = self.brightness {
            config.brightness = b;
        }
        if let Some(c) = self.contrast {
            config.contrast = c;
        }
        if let Some(g) = self.gamma {
            config.gamma = g;
        }
        if let Some(ref q) = self.quality {
            config.font_quality = FontQuality::parse(q)?;
        }
        if let Some(ref targets) = self.save {
            config.outputs = parse_outputs(targets)?;
        }
        if self.loop_playback {
            config.loop_playback = true;
        }
        if let Some(ref f) = self.font {
            config.font_path = Some(f.clone());
        }

        // Valider avant de clamper : un contraste/gamma ≤ 0 est une erreur,
        // pas une valeur à rattraper.
        config.validate()?;
        config.clamp_all();
        Ok(())
    }
}

/// Parse la liste `--save txt,png,video`.
fn parse_outputs(targets: &[String]) -> anyhow::Result<Outputs> {
    let mut outputs = Outputs::default();
    for t in targets {
        match t.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => outputs.text = true,
            "png" | "image" => outputs.image = true,
            "video" | "mp4" => outputs.video = true,
            "" => {}
            other => anyhow::bail!("cible de sauvegarde inconnue '{other}' (txt|png|video)"),
        }
    }
    Ok(outputs)
}
