/// Configuration, types, and shared structures for vidscii.
///
/// This crate contains all shared types, traits, and configuration logic
/// used across the vidscii workspace.

pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod ramp;
pub mod traits;

pub use color::Rgb;
pub use config::RenderConfig;
pub use error::CoreError;
pub use frame::{GlyphCell, GlyphGrid, IntensityFrame, PixelFrame};
pub use ramp::GLYPH_RAMP;
pub use traits::{FrameSource, RenderTarget, SourceInfo};
