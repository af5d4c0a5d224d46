use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::Result;

use va_core::config::FontQuality;
use va_core::error::CoreError;

/// Vérifie la présence de l'encodeur dans le PATH.
///
/// Appelé au démarrage : l'absence de ffmpeg dégrade la sortie VIDEO
/// (warning) et le run continue avec les autres cibles.
#[must_use]
pub fn encoder_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Drapeaux de qualité par palier : facteur de qualité constante x264,
/// le palier Lossless passant en quasi-lossless avec le preset le plus
/// rapide.
#[must_use]
pub fn quality_args(quality: FontQuality) -> &'static [&'static str] {
    match quality {
        FontQuality::Low => &["-crf", "28"],
        FontQuality::Medium => &["-crf", "23"],
        FontQuality::High => &["-crf", "18"],
        FontQuality::Lossless => &["-qp", "0", "-preset", "ultrafast"],
    }
}

/// Construit la ligne de commande d'assemblage (pure, testable).
///
/// Le filtre pad force des dimensions paires : yuv420p sous-échantillonne
/// la chroma en 2×2.
///
/// # Example
/// ```
/// use va_export::encoder::encoder_args;
/// use va_core::config::FontQuality;
/// use std::path::Path;
/// let args = encoder_args(Path::new("temp"), Path::new("out.mp4"), 30.0, FontQuality::High);
/// assert!(args.contains(&"-framerate".to_string()));
/// assert!(args.iter().any(|a| a.ends_with("frame_%06d.png")));
/// ```
#[must_use]
pub fn encoder_args(
    sequence_dir: &Path,
    output: &Path,
    fps: f64,
    quality: FontQuality,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-framerate".into(),
        format!("{fps}"),
        "-i".into(),
        sequence_dir.join("frame_%06d.png").display().to_string(),
        "-c:v".into(),
        "libx264".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
    ];
    args.extend(quality_args(quality).iter().map(|s| (*s).to_string()));
    args.extend([
        "-vf".into(),
        "pad=ceil(iw/2)*2:ceil(ih/2)*2".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        output.display().to_string(),
    ]);
    args
}

/// Assemble la séquence `frame_%06d.png` en une vidéo mp4.
///
/// # Errors
/// Retourne `CoreError::EncoderExit` (stderr capturé) sur sortie non
/// nulle : l'artefact vidéo échoue, les autres artefacts du run restent
/// valides. Retourne `CoreError::EncoderUnavailable` si le binaire ne
/// peut pas être lancé.
pub fn assemble_video(
    sequence_dir: &Path,
    output: &Path,
    fps: f64,
    quality: FontQuality,
) -> Result<()> {
    let args = encoder_args(sequence_dir, output, fps, quality);
    log::info!("Assemblage vidéo : ffmpeg {}", args.join(" "));

    let result = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|_| CoreError::EncoderUnavailable)?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        return Err(CoreError::EncoderExit {
            status: result.status.code().unwrap_or(-1),
            stderr,
        }
        .into());
    }

    log::info!("Vidéo assemblée : {}", output.display());
    Ok(())
}
