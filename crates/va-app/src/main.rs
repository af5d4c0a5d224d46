use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use va_ascii::glyph::map_grid;
use va_ascii::sampler::{GridSampler, grid_height};
use va_ascii::tone::ToneCurve;
use va_core::config::RenderConfig;
use va_core::error::CoreError;
use va_core::traits::{FrameSource, RenderTarget};
use va_export::pipeline::{CancelToken, ExportPipeline, RunState, RunSummary};
use va_export::project::ProjectOutput;
use va_render::raster::{RasterTarget, Rasterizer, cell_size_px};
use va_render::term::TermPreview;
use va_render::text::TextFileTarget;
use va_source::VideoSource;

pub mod cli;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config (fichier ou défauts) puis les overrides CLI
    let (mut config, from_file) = resolve_config(&cli)?;
    // Largeur auto : sans --width ni fichier de config, caler la grille
    // sur le terminal (comportement du front-end interactif).
    if cli.width.is_none() && !from_file {
        if let Ok((cols, _)) = crossterm::terminal::size() {
            if cols > 1 {
                config.char_width = u32::from(cols - 1);
            }
        }
    }
    cli.apply_overrides(&mut config)?;

    // 4. Ouvrir la source : fatal avant toute sortie si elle est invalide
    let source = VideoSource::open(&cli.input)?;
    let meta = source.metadata();

    // 5. Mode aperçu : une frame, pas de projet
    if cli.preview {
        return preview_first_frame(source, &config);
    }

    // 6. Détection de l'encodeur en amont : dégrade VIDEO, jamais fatal
    let mut pre_warnings: Vec<String> = Vec::new();
    if config.outputs.video && !va_export::encoder_available() {
        let warning = CoreError::EncoderUnavailable.to_string();
        log::warn!("{warning} : export MP4 désactivé, le run continue.");
        pre_warnings.push(warning);
        config.outputs.video = false;
    }

    if config.outputs.is_empty() && cli.no_preview {
        log::warn!("Aucune cible de sortie et aperçu désactivé : rien ne sera produit.");
    }

    // 7. Arborescence projet
    let root = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_root(&cli.input));
    let project = ProjectOutput::create(&root)?;
    log::info!("Sortie : {}", project.root().display());

    // 8. Cibles de rendu
    let temp = if config.outputs.video {
        Some(project.temp_sequence()?)
    } else {
        None
    };
    let video_output = config
        .outputs
        .video
        .then(|| project.video_path(&cli.name));

    let mut targets: Vec<Box<dyn RenderTarget>> = Vec::new();
    if config.outputs.text {
        targets.push(Box::new(TextFileTarget::new(
            project.frames_dir().to_path_buf(),
        )));
    }
    if config.outputs.needs_raster() {
        let font_data = va_render::font::load_font_data(config.font_path.as_deref())?;
        let cell = cell_size_px(meta.width, config.char_width, config.font_quality);
        let rasterizer = Rasterizer::new(&font_data, cell)?;
        targets.push(Box::new(RasterTarget::new(
            rasterizer,
            meta.width,
            meta.height,
            config.background,
            config
                .outputs
                .image
                .then(|| project.frames_dir().to_path_buf()),
            temp.as_ref().map(|t| t.dir().to_path_buf()),
        )));
    }
    let preview_active = !cli.no_preview;
    if preview_active {
        targets.push(Box::new(
            TermPreview::new(display_width(&config)).with_pacing(meta.fps),
        ));
    }

    // 9. Ctrl-C → annulation observée à chaque frontière de frame
    let cancel = CancelToken::new();
    {
        let token = cancel.clone();
        ctrlc::set_handler(move || token.cancel())
            .context("Impossible d'installer le handler Ctrl-C")?;
    }

    // 10. Run, curseur restauré même en cas d'erreur
    let pipeline = ExportPipeline::new(config, Box::new(source), targets, temp, video_output);
    let guard = preview_active.then(TermGuard::enter);
    let outcome = pipeline.run(&cancel);
    drop(guard);
    let mut summary = outcome?;

    // 11. Bilan
    summary.warnings.splice(0..0, pre_warnings);
    print_summary(&summary, project.root());
    Ok(())
}

/// Resolve config: fichier TOML s'il existe, défauts sinon.
fn resolve_config(cli: &cli::Cli) -> Result<(RenderConfig, bool)> {
    if cli.config.exists() {
        Ok((va_core::config::load_config(&cli.config)?, true))
    } else {
        log::info!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok((RenderConfig::default(), false))
    }
}

/// Racine de sortie par défaut : `ascii_output/<nom de la vidéo>`.
fn default_output_root(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("ascii");
    PathBuf::from("ascii_output").join(stem)
}

/// Largeur d'affichage pour le centrage de l'aperçu.
fn display_width(config: &RenderConfig) -> u16 {
    crossterm::terminal::size()
        .map(|(w, _)| w)
        .unwrap_or(config.char_width.min(u32::from(u16::MAX)) as u16)
}

/// Décode la première frame, la rend une fois dans le terminal, quitte.
///
/// Même pipeline que le run complet : la recomputation d'aperçu est
/// idempotente et ne touche pas au disque.
fn preview_first_frame(mut source: VideoSource, config: &RenderConfig) -> Result<()> {
    let meta = source.metadata();
    let Some(frame) = source.read_next()? else {
        anyhow::bail!("la source ne contient aucune frame décodable");
    };
    let tone = ToneCurve::new(config);
    let plane = tone.apply(&frame);
    let mut sampler = GridSampler::new();
    let grid_h = grid_height(config, meta.width, meta.height);
    let sampled = sampler.sample(&plane, config.char_width, grid_h)?;
    let grid = map_grid(&sampled, config);

    let preview = TermPreview::new(display_width(config));
    println!("{}", preview.render_to_string(&grid));
    Ok(())
}

/// Cache le curseur et nettoie l'écran pendant l'aperçu live ;
/// restaure TOUJOURS le curseur au drop, même en cas d'erreur.
struct TermGuard;

impl TermGuard {
    fn enter() -> Self {
        let mut stdout = std::io::stdout();
        let _ = crossterm::execute!(
            stdout,
            crossterm::cursor::Hide,
            crossterm::terminal::Clear(crossterm::terminal::ClearType::All),
            crossterm::cursor::MoveTo(0, 0)
        );
        Self
    }
}

impl Drop for TermGuard {
    fn drop(&mut self) {
        let mut stdout = std::io::stdout();
        let _ = crossterm::execute!(stdout, crossterm::cursor::Show);
        println!();
    }
}

/// Bilan lisible du run : état, compteurs, artefacts, avertissements.
fn print_summary(summary: &RunSummary, root: &Path) {
    let state = match summary.state {
        RunState::Completed => "terminée",
        RunState::Cancelled => "interrompue, artefacts partiels conservés",
        RunState::Failed => "échouée",
        RunState::Idle | RunState::Running => "dans un état inattendu",
    };
    println!("Conversion {state} : {} frames rendues.", summary.frames_rendered);
    if summary.write_failures > 0 {
        println!(
            "  {} écriture(s) échouée(s), frames sautées pour la cible concernée :",
            summary.write_failures
        );
        for (name, count) in &summary.failures_by_target {
            println!("    {name}: {count}");
        }
    }
    for warning in &summary.warnings {
        println!("  avertissement : {warning}");
    }
    if let Some(path) = &summary.video_path {
        println!("  vidéo : {}", path.display());
    }
    if let Some(err) = &summary.video_error {
        println!("  échec de l'artefact vidéo : {err}");
    }
    println!("  artefacts : {}", root.display());
}
