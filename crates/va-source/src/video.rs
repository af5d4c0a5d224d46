// Ce module utilise ffmpeg via subprocess (std::process::Command).
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
// Architecture :
//   - `probe_video`  : interroge ffprobe pour width/height/fps/nb_frames
//   - `VideoSource`  : pipe ffmpeg → frames rgb24 brutes sur stdout,
//                      lecture séquentielle, seek par redémarrage du pipe

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use anyhow::Result;

use va_core::error::CoreError;
use va_core::frame::PixelFrame;
use va_core::traits::{FrameSource, SourceInfo};

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne `CoreError::SourceOpen` si `ffprobe` est introuvable, si le
/// fichier n'existe pas, ou s'il ne contient aucun flux vidéo décodable.
///
/// # Example
/// ```no_run
/// use va_source::probe_video;
/// use std::path::Path;
/// let info = probe_video(Path::new("video.mp4")).unwrap();
/// assert!(info.fps > 0.0);
/// ```
pub fn probe_video(path: &Path) -> Result<SourceInfo> {
    let open_err = |reason: String| CoreError::SourceOpen {
        path: path.display().to_string(),
        reason,
    };

    if !path.exists() {
        return Err(open_err("fichier introuvable".into()).into());
    }
    let path_str = path
        .to_str()
        .ok_or_else(|| open_err("chemin non-UTF8".into()))?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate,nb_frames",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| open_err(format!("ffprobe introuvable ou non exécutable : {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(open_err(format!("ffprobe a échoué : {}", stderr.trim())).into());
    }

    let text = String::from_utf8_lossy(&output.stdout);

    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    let mut fps: Option<f64> = None;
    let mut frame_count: Option<u64> = None;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1" ou "30000/1001"
            let val = val.trim();
            let mut parts = val.splitn(2, '/');
            let num: Option<f64> = parts.next().and_then(|s| s.parse().ok());
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 {
                fps = num.map(|n| n / den);
            }
        } else if let Some(val) = line.strip_prefix("nb_frames=") {
            // "N/A" pour les conteneurs qui ne l'exposent pas
            frame_count = val.trim().parse().ok();
        }
    }

    let (width, height, fps) = match (width, height, fps) {
        (Some(w), Some(h), Some(f)) if w > 0 && h > 0 && f > 0.0 => (w, h, f),
        _ => {
            return Err(open_err("aucun flux vidéo décodable (codec non supporté ?)".into()).into());
        }
    };

    log::info!(
        "probe_video: {width}x{height} @ {fps:.3}fps, {} frames : {}",
        frame_count.map_or_else(|| "?".to_string(), |n| n.to_string()),
        path.display()
    );

    Ok(SourceInfo {
        width,
        height,
        fps,
        frame_count,
    })
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur EOF avant
/// complétion, `Err` sur erreur I/O fatale.
///
/// # Errors
/// Propage toute erreur I/O autre que `Interrupted`.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false), // EOF
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Source vidéo séquentielle : un processus ffmpeg écrit des frames rgb24
/// brutes sur stdout, lues une par une à la demande.
///
/// Chaque frame = `w × h × 3` bytes (RGB row-major, sans padding).
/// `seek` redémarre le pipe avec `-ss` (keyframe-based, exact pour 0).
pub struct VideoSource {
    path: PathBuf,
    info: SourceInfo,
    child: Option<Child>,
    frame_bytes: usize,
}

impl VideoSource {
    /// Ouvre la source : probe les métadonnées puis lance le pipe de
    /// décodage positionné sur la frame 0.
    ///
    /// # Errors
    /// Retourne `CoreError::SourceOpen` si le probe ou le spawn échoue.
    pub fn open(path: &Path) -> Result<Self> {
        let info = probe_video(path)?;
        let mut source = Self {
            path: path.to_path_buf(),
            info,
            child: None,
            frame_bytes: (info.width * info.height * 3) as usize,
        };
        source.respawn(0)?;
        Ok(source)
    }

    /// (Re)démarre le processus ffmpeg positionné sur `frame_index`.
    fn respawn(&mut self, frame_index: u64) -> Result<()> {
        self.kill_child();

        let pos_secs = frame_index as f64 / self.info.fps.max(1.0);
        let path_str = self.path.to_str().ok_or_else(|| CoreError::SourceOpen {
            path: self.path.display().to_string(),
            reason: "chemin non-UTF8".into(),
        })?;
        let pos_str = format!("{pos_secs:.3}");

        let child = Command::new("ffmpeg")
            .args([
                "-ss",
                &pos_str, // seek avant -i (keyframe-based, exact à 0)
                "-i",
                path_str,
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24", // 3 bytes/pixel
                "-an",   // pas d'audio dans ce pipe
                "-hide_banner",
                "-loglevel",
                "error",
                "pipe:1",
            ])
            .stdout(Stdio::piped())
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CoreError::SourceOpen {
                path: self.path.display().to_string(),
                reason: format!("impossible de lancer ffmpeg : {e}"),
            })?;

        log::debug!(
            "ffmpeg spawné: {}x{} depuis la frame {frame_index} ({pos_str}s)",
            self.info.width,
            self.info.height
        );
        self.child = Some(child);
        Ok(())
    }

    fn kill_child(&mut self) {
        if let Some(mut c) = self.child.take() {
            let _ = c.kill();
            let _ = c.wait();
        }
    }
}

impl FrameSource for VideoSource {
    fn read_next(&mut self) -> Result<Option<PixelFrame>> {
        let Some(child) = self.child.as_mut() else {
            return Ok(None);
        };
        let Some(stdout) = child.stdout.as_mut() else {
            return Ok(None);
        };

        let mut frame = PixelFrame::new(self.info.width, self.info.height);
        if read_exact_or_eof(stdout, &mut frame.data[..self.frame_bytes])? {
            Ok(Some(frame))
        } else {
            log::debug!("fin de flux vidéo: {}", self.path.display());
            Ok(None)
        }
    }

    fn seek(&mut self, frame_index: u64) -> Result<()> {
        self.respawn(frame_index)
    }

    fn metadata(&self) -> SourceInfo {
        self.info
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.kill_child();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_exact_or_eof_full_read() {
        let mut reader = Cursor::new(vec![1u8, 2, 3, 4]);
        let mut buf = [0u8; 4];
        assert!(read_exact_or_eof(&mut reader, &mut buf).unwrap());
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn read_exact_or_eof_short_read_is_eof() {
        let mut reader = Cursor::new(vec![1u8, 2]);
        let mut buf = [0u8; 4];
        assert!(!read_exact_or_eof(&mut reader, &mut buf).unwrap());
    }

    #[test]
    fn probe_missing_file_is_source_open_error() {
        let err = probe_video(Path::new("/nonexistent/clip.mp4")).unwrap_err();
        let core = err.downcast_ref::<CoreError>();
        assert!(matches!(core, Some(CoreError::SourceOpen { .. })));
    }
}
