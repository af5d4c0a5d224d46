/// Pipeline d'export pour vidscii.
///
/// Orchestre les écritures par frame vers les cibles actives, collecte la
/// séquence d'images temporaire quand l'export vidéo est demandé, invoque
/// l'encodeur externe, et garantit le nettoyage des artefacts temporaires
/// sur tous les chemins de sortie (succès, annulation, erreur).

pub mod encoder;
pub mod pipeline;
pub mod project;

pub use encoder::{assemble_video, encoder_available};
pub use pipeline::{CancelToken, ExportPipeline, RunState, RunSummary};
pub use project::{ProjectOutput, TempSequence};
