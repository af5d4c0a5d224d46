use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Arborescence de sortie d'un run : `frames/`, `videos/`, et à la
/// demande `temp/` (staging de la séquence encodeur).
///
/// Créée une fois au démarrage du run ; possède tous les artefacts
/// par-frame.
///
/// # Example
/// ```no_run
/// use va_export::project::ProjectOutput;
/// use std::path::Path;
/// let project = ProjectOutput::create(Path::new("out/clip")).unwrap();
/// assert!(project.frames_dir().ends_with("frames"));
/// ```
pub struct ProjectOutput {
    root: PathBuf,
    frames_dir: PathBuf,
    videos_dir: PathBuf,
}

impl ProjectOutput {
    /// Crée l'arborescence (idempotent si elle existe déjà).
    ///
    /// # Errors
    /// Retourne une erreur I/O si un répertoire ne peut pas être créé.
    pub fn create(root: &Path) -> Result<Self> {
        let frames_dir = root.join("frames");
        let videos_dir = root.join("videos");
        std::fs::create_dir_all(&frames_dir)
            .with_context(|| format!("création de {}", frames_dir.display()))?;
        std::fs::create_dir_all(&videos_dir)
            .with_context(|| format!("création de {}", videos_dir.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
            frames_dir,
            videos_dir,
        })
    }

    /// Racine du projet.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Répertoire des artefacts par-frame (`.txt`, `.png`).
    #[must_use]
    pub fn frames_dir(&self) -> &Path {
        &self.frames_dir
    }

    /// Répertoire des vidéos assemblées.
    #[must_use]
    pub fn videos_dir(&self) -> &Path {
        &self.videos_dir
    }

    /// Chemin de la vidéo assemblée `videos/<name>.mp4`.
    #[must_use]
    pub fn video_path(&self, name: &str) -> PathBuf {
        self.videos_dir.join(format!("{name}.mp4"))
    }

    /// Crée le répertoire de staging `temp/` et retourne son guard.
    ///
    /// # Errors
    /// Retourne une erreur I/O si le répertoire ne peut pas être créé.
    pub fn temp_sequence(&self) -> Result<TempSequence> {
        let dir = self.root.join("temp");
        std::fs::create_dir_all(&dir).with_context(|| format!("création de {}", dir.display()))?;
        Ok(TempSequence { dir })
    }
}

/// Guard du répertoire de séquence temporaire : supprimé au `Drop`,
/// donc sur tous les chemins de sortie du run : succès, annulation,
/// échec de l'encodeur, ou panique.
pub struct TempSequence {
    dir: PathBuf,
}

impl TempSequence {
    /// Chemin du répertoire de staging.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True si aucune frame n'a été écrite dans la séquence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        std::fs::read_dir(&self.dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }
}

impl Drop for TempSequence {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("suppression de {} : {e}", self.dir.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_builds_the_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("clip");
        let project = ProjectOutput::create(&root).unwrap();
        assert!(project.frames_dir().is_dir());
        assert!(project.videos_dir().is_dir());
        assert_eq!(project.video_path("out"), root.join("videos/out.mp4"));
    }

    #[test]
    fn temp_sequence_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectOutput::create(dir.path()).unwrap();
        let temp_path;
        {
            let temp = project.temp_sequence().unwrap();
            temp_path = temp.dir().to_path_buf();
            std::fs::write(temp_path.join("frame_000000.png"), b"stub").unwrap();
            assert!(!temp.is_empty());
        }
        assert!(!temp_path.exists());
    }

    #[test]
    fn fresh_temp_sequence_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectOutput::create(dir.path()).unwrap();
        let temp = project.temp_sequence().unwrap();
        assert!(temp.is_empty());
    }
}
