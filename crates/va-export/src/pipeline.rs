use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::Result;

use va_ascii::glyph::map_grid;
use va_ascii::sampler::{GridSampler, grid_height};
use va_ascii::tone::ToneCurve;
use va_core::config::RenderConfig;
use va_core::traits::{FrameSource, RenderTarget};

use crate::encoder::assemble_video;
use crate::project::TempSequence;

/// Signal d'annulation partagé (Ctrl-C → pipeline).
///
/// Observé au moins une fois par frontière de frame.
///
/// # Example
/// ```
/// use va_export::pipeline::CancelToken;
/// let token = CancelToken::new();
/// assert!(!token.is_cancelled());
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Crée un token non annulé.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lève le signal. Idempotent, appelable depuis un handler de signal.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True si l'annulation a été demandée.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// États du run d'export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Construit, pas encore démarré.
    Idle,
    /// Boucle de frames en cours.
    Running,
    /// Fin de flux atteinte, toutes les frames traitées.
    Completed,
    /// Interrompu par l'utilisateur ; artefacts partiels conservés.
    Cancelled,
    /// Erreur fatale de run (source rompue).
    Failed,
}

/// Bilan d'un run : état final, compteurs, issue de chaque artefact.
///
/// Chaque échec d'écriture absorbé est comptabilisé ici : rien n'est
/// silencieusement perdu.
#[derive(Debug)]
pub struct RunSummary {
    /// État final du run.
    pub state: RunState,
    /// Frames décodées et rendues.
    pub frames_rendered: u64,
    /// Échecs d'écriture absorbés, toutes cibles confondues.
    pub write_failures: u64,
    /// Échecs par cible (nom de cible, compteur).
    pub failures_by_target: Vec<(&'static str, u64)>,
    /// Vidéo assemblée, si produite.
    pub video_path: Option<PathBuf>,
    /// Diagnostic de l'encodeur si l'artefact vidéo a échoué.
    pub video_error: Option<String>,
    /// Avertissements non fatals accumulés pendant le run.
    pub warnings: Vec<String>,
}

struct TargetSlot {
    target: Box<dyn RenderTarget>,
    failures: u64,
}

/// Pipeline d'export : séquentiel, une frame décodée → transformée →
/// écrite avant de demander la suivante.
///
/// La config est un snapshot pris à la construction ; l'édition en cours
/// de run est impossible par construction. `run` consomme le pipeline :
/// le guard de séquence temporaire est relâché sur tous les chemins de
/// sortie.
pub struct ExportPipeline {
    config: RenderConfig,
    source: Box<dyn FrameSource>,
    targets: Vec<TargetSlot>,
    temp: Option<TempSequence>,
    video_output: Option<PathBuf>,
    progress: Arc<AtomicU64>,
}

impl ExportPipeline {
    /// Assemble le pipeline. `temp` et `video_output` vont de pair :
    /// présents ssi l'export vidéo est actif.
    #[must_use]
    pub fn new(
        config: RenderConfig,
        source: Box<dyn FrameSource>,
        targets: Vec<Box<dyn RenderTarget>>,
        temp: Option<TempSequence>,
        video_output: Option<PathBuf>,
    ) -> Self {
        Self {
            config,
            source,
            targets: targets
                .into_iter()
                .map(|target| TargetSlot {
                    target,
                    failures: 0,
                })
                .collect(),
            temp,
            video_output,
            progress: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Compteur de progression partagé (frames rendues), lisible depuis
    /// un autre thread pendant le run.
    #[must_use]
    pub fn progress_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.progress)
    }

    /// Exécute le run jusqu'à fin de flux, annulation ou erreur fatale.
    ///
    /// Consomme le pipeline : quelle que soit l'issue (y compris un `?`
    /// précoce), le répertoire de séquence temporaire est supprimé.
    ///
    /// # Errors
    /// Retourne une erreur fatale si la source de frames est rompue ou si
    /// l'échantillonnage échoue. Les échecs d'écriture par frame et les
    /// échecs d'encodage ne sont PAS des erreurs : ils sont absorbés dans
    /// le `RunSummary`.
    pub fn run(mut self, cancel: &CancelToken) -> Result<RunSummary> {
        let meta = self.source.metadata();
        let tone = ToneCurve::new(&self.config);
        let mut sampler = GridSampler::new();
        let grid_w = self.config.char_width;
        let grid_h = grid_height(&self.config, meta.width, meta.height);
        log::info!(
            "Run: {}x{} @ {:.3}fps → grille {grid_w}x{grid_h}",
            meta.width,
            meta.height,
            meta.fps
        );

        let mut index: u64 = 0;
        let state = loop {
            // Frontière de frame : point d'observation de l'annulation.
            if cancel.is_cancelled() {
                log::info!("Annulation reçue à la frame {index}.");
                break RunState::Cancelled;
            }

            match self.source.read_next()? {
                Some(frame) => {
                    let plane = tone.apply(&frame);
                    let sampled = sampler.sample(&plane, grid_w, grid_h)?;
                    let grid = map_grid(&sampled, &self.config);

                    for slot in &mut self.targets {
                        if let Err(e) = slot.target.write_frame(index, &grid) {
                            slot.failures += 1;
                            log::warn!(
                                "frame {index}: écriture {} échouée : {e:#}",
                                slot.target.name()
                            );
                        }
                    }

                    index += 1;
                    self.progress.store(index, Ordering::Relaxed);
                    if index % 100 == 0 {
                        match meta.frame_count {
                            Some(total) if total > 0 => log::info!(
                                "Progress: {index}/{total} ({:.1}%)",
                                index as f64 / total as f64 * 100.0
                            ),
                            _ => log::info!("Progress: {index} frames"),
                        }
                    }
                }
                None => {
                    // Rebouclage seulement si la passe a produit des frames,
                    // sinon une source vide tournerait à vide.
                    if self.config.loop_playback && index > 0 {
                        log::debug!("Fin de flux, rebouclage sur la frame 0.");
                        self.source.seek(0)?;
                        continue;
                    }
                    break RunState::Completed;
                }
            }
        };

        let mut summary = RunSummary {
            state,
            frames_rendered: index,
            write_failures: self.targets.iter().map(|s| s.failures).sum(),
            failures_by_target: self
                .targets
                .iter()
                .filter(|s| s.failures > 0)
                .map(|s| (s.target.name(), s.failures))
                .collect(),
            video_path: None,
            video_error: None,
            warnings: Vec::new(),
        };

        // Étape encodeur : sur Completed comme sur Cancelled, une séquence
        // non vide est assemblée (la sortie partielle est conservée, pas
        // jetée). Le guard supprime temp/ quelle que soit l'issue.
        if let Some(temp) = self.temp.take() {
            match &self.video_output {
                Some(output) if !temp.is_empty() => {
                    match assemble_video(temp.dir(), output, meta.fps, self.config.font_quality) {
                        Ok(()) => summary.video_path = Some(output.clone()),
                        Err(e) => {
                            log::error!("Échec de l'assemblage vidéo : {e:#}");
                            summary.video_error = Some(format!("{e:#}"));
                        }
                    }
                }
                Some(_) => {
                    summary
                        .warnings
                        .push("séquence vide : aucune vidéo assemblée".into());
                }
                None => {}
            }
            drop(temp);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::ProjectOutput;
    use std::sync::Mutex;
    use va_core::frame::{GlyphGrid, PixelFrame};
    use va_core::traits::SourceInfo;

    /// Source synthétique : N frames, teinte uniforme croissante.
    struct SyntheticSource {
        info: SourceInfo,
        cursor: u64,
        total: u64,
    }

    impl SyntheticSource {
        fn new(total: u64, width: u32, height: u32) -> Self {
            Self {
                info: SourceInfo {
                    width,
                    height,
                    fps: 30.0,
                    frame_count: Some(total),
                },
                cursor: 0,
                total,
            }
        }
    }

    impl FrameSource for SyntheticSource {
        fn read_next(&mut self) -> Result<Option<PixelFrame>> {
            if self.cursor >= self.total {
                return Ok(None);
            }
            let mut frame = PixelFrame::new(self.info.width, self.info.height);
            let shade = (self.cursor * 20 % 256) as u8;
            frame.data.fill(shade);
            self.cursor += 1;
            Ok(Some(frame))
        }

        fn seek(&mut self, frame_index: u64) -> Result<()> {
            self.cursor = frame_index;
            Ok(())
        }

        fn metadata(&self) -> SourceInfo {
            self.info
        }
    }

    /// Cible d'observation : enregistre les dimensions écrites.
    struct CollectTarget {
        log: Arc<Mutex<Vec<(u64, u16, u16)>>>,
    }

    impl RenderTarget for CollectTarget {
        fn write_frame(&mut self, index: u64, grid: &GlyphGrid) -> Result<()> {
            self.log
                .lock()
                .map_err(|_| anyhow::anyhow!("poisoned"))?
                .push((index, grid.width, grid.height));
            Ok(())
        }

        fn name(&self) -> &'static str {
            "collect"
        }
    }

    /// Cible défaillante : chaque écriture échoue.
    struct FailingTarget;

    impl RenderTarget for FailingTarget {
        fn write_frame(&mut self, _index: u64, _grid: &GlyphGrid) -> Result<()> {
            anyhow::bail!("disque plein")
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    /// Cible qui annule le run après `after` frames écrites.
    struct CancelAfter {
        token: CancelToken,
        after: u64,
        written: u64,
    }

    impl RenderTarget for CancelAfter {
        fn write_frame(&mut self, _index: u64, _grid: &GlyphGrid) -> Result<()> {
            self.written += 1;
            if self.written >= self.after {
                self.token.cancel();
            }
            Ok(())
        }

        fn name(&self) -> &'static str {
            "cancel-after"
        }
    }

    fn base_config(char_width: u32) -> RenderConfig {
        RenderConfig {
            char_width,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn full_run_completes_with_exact_grid_dims() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = ExportPipeline::new(
            base_config(16),
            Box::new(SyntheticSource::new(10, 64, 48)),
            vec![Box::new(CollectTarget {
                log: Arc::clone(&log),
            })],
            None,
            None,
        );
        let summary = pipeline.run(&CancelToken::new()).unwrap();

        assert_eq!(summary.state, RunState::Completed);
        assert_eq!(summary.frames_rendered, 10);
        assert_eq!(summary.write_failures, 0);

        let entries = log.lock().unwrap();
        assert_eq!(entries.len(), 10);
        // round(16 * (48/64) / 2) = 6
        assert!(entries.iter().all(|&(_, w, h)| (w, h) == (16, 6)));
        // Index zéro-basé, croissant de 1
        assert!(entries.iter().enumerate().all(|(i, &(idx, _, _))| idx == i as u64));
    }

    #[test]
    fn pre_cancelled_run_writes_nothing_and_cleans_temp() {
        let dir = tempfile::tempdir().unwrap();
        let project = ProjectOutput::create(dir.path()).unwrap();
        let temp = project.temp_sequence().unwrap();
        let temp_path = temp.dir().to_path_buf();

        let token = CancelToken::new();
        token.cancel();

        let pipeline = ExportPipeline::new(
            base_config(8),
            Box::new(SyntheticSource::new(10, 64, 48)),
            vec![],
            Some(temp),
            Some(project.video_path("ascii")),
        );
        let summary = pipeline.run(&token).unwrap();

        assert_eq!(summary.state, RunState::Cancelled);
        assert_eq!(summary.frames_rendered, 0);
        // Séquence vide → aucune vidéo, temp/ supprimé
        assert!(summary.video_path.is_none());
        assert!(!summary.warnings.is_empty());
        assert!(!temp_path.exists());
    }

    #[test]
    fn write_failures_are_tallied_not_fatal() {
        let pipeline = ExportPipeline::new(
            base_config(8),
            Box::new(SyntheticSource::new(5, 32, 32)),
            vec![Box::new(FailingTarget)],
            None,
            None,
        );
        let summary = pipeline.run(&CancelToken::new()).unwrap();

        assert_eq!(summary.state, RunState::Completed);
        assert_eq!(summary.frames_rendered, 5);
        assert_eq!(summary.write_failures, 5);
        assert_eq!(summary.failures_by_target, vec![("failing", 5)]);
    }

    #[test]
    fn loop_playback_restarts_until_cancelled() {
        let token = CancelToken::new();
        let config = RenderConfig {
            loop_playback: true,
            ..base_config(8)
        };
        let pipeline = ExportPipeline::new(
            config,
            Box::new(SyntheticSource::new(4, 32, 32)),
            vec![Box::new(CancelAfter {
                token: token.clone(),
                after: 11,
                written: 0,
            })],
            None,
            None,
        );
        let summary = pipeline.run(&token).unwrap();

        assert_eq!(summary.state, RunState::Cancelled);
        // 4 frames par passe : l'annulation tombe pendant la 3e passe
        assert!(summary.frames_rendered >= 11);
    }

    #[test]
    fn progress_counter_tracks_frames() {
        let pipeline = ExportPipeline::new(
            base_config(8),
            Box::new(SyntheticSource::new(7, 32, 32)),
            vec![],
            None,
            None,
        );
        let progress = pipeline.progress_handle();
        let summary = pipeline.run(&CancelToken::new()).unwrap();
        assert_eq!(summary.frames_rendered, 7);
        assert_eq!(progress.load(Ordering::Relaxed), 7);
    }
}
