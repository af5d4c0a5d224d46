/// Sources de frames pour vidscii.
///
/// Le décodage vidéo passe par ffmpeg/ffprobe en subprocess
/// (`std::process::Command`) : aucune liaison C, prérequis runtime
/// uniquement (les deux binaires en PATH).

pub mod video;

pub use video::{VideoSource, probe_video};
