use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::QueueableCommand;
use crossterm::cursor::MoveTo;
use crossterm::style::Print;

use va_core::frame::GlyphGrid;
use va_core::traits::RenderTarget;

const SGR_RESET: &str = "\u{1b}[0m";

/// Aperçu terminal : même traversée que le sérialiseur texte, mais chaque
/// cellule colorée est encadrée par sa séquence SGR truecolor, et chaque
/// ligne est centrée horizontalement dans la largeur d'affichage.
///
/// # Example
/// ```
/// use va_render::term::TermPreview;
/// use va_core::frame::{GlyphGrid, GlyphCell};
/// let preview = TermPreview::new(10);
/// let mut grid = GlyphGrid::new(4, 1);
/// grid.set(0, 0, GlyphCell { ch: '@', color: None });
/// // (10 - 4) / 2 = 3 espaces de padding
/// assert_eq!(preview.render_to_string(&grid), "   @   ");
/// ```
pub struct TermPreview {
    display_width: u16,
    /// Période de frame pour caler l'aperçu sur le fps source.
    pace: Option<Duration>,
    last_frame: Option<Instant>,
}

impl TermPreview {
    /// Crée l'aperçu pour une largeur d'affichage donnée (en colonnes).
    #[must_use]
    pub fn new(display_width: u16) -> Self {
        Self {
            display_width,
            pace: None,
            last_frame: None,
        }
    }

    /// Cale l'affichage sur `fps` frames par seconde.
    #[must_use]
    pub fn with_pacing(mut self, fps: f64) -> Self {
        if fps > 0.0 {
            self.pace = Some(Duration::from_secs_f64(1.0 / fps));
        }
        self
    }

    /// Rend la grille en une chaîne ANSI prête à afficher.
    ///
    /// Identique au sérialiseur texte pour les glyphes ; seules les
    /// séquences de couleur et le centrage diffèrent.
    #[must_use]
    pub fn render_to_string(&self, grid: &GlyphGrid) -> String {
        let padding = usize::from(self.display_width.saturating_sub(grid.width)) / 2;
        let mut out = String::with_capacity(
            (usize::from(grid.width) * 16 + padding + 1) * usize::from(grid.height),
        );
        for y in 0..grid.height {
            if y > 0 {
                out.push('\n');
            }
            for _ in 0..padding {
                out.push(' ');
            }
            for cell in grid.row(y) {
                match cell.color {
                    Some(c) if !cell.is_blank() => {
                        out.push_str(&format!("\u{1b}[38;2;{};{};{}m", c.0, c.1, c.2));
                        out.push(cell.ch);
                        out.push_str(SGR_RESET);
                    }
                    _ => out.push(cell.ch),
                }
            }
        }
        out
    }

    fn pace_frame(&mut self) {
        if let Some(period) = self.pace {
            if let Some(last) = self.last_frame {
                let elapsed = last.elapsed();
                if let Some(remaining) = period.checked_sub(elapsed) {
                    std::thread::sleep(remaining);
                }
            }
            self.last_frame = Some(Instant::now());
        }
    }
}

impl RenderTarget for TermPreview {
    fn write_frame(&mut self, _index: u64, grid: &GlyphGrid) -> Result<()> {
        self.pace_frame();
        let rendered = self.render_to_string(grid);
        let mut stdout = std::io::stdout();
        stdout.queue(MoveTo(0, 0))?.queue(Print(rendered))?;
        stdout.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "preview"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use va_core::color::Rgb;
    use va_core::frame::GlyphCell;

    #[test]
    fn centering_pads_half_the_slack() {
        let preview = TermPreview::new(80);
        let mut grid = GlyphGrid::new(10, 2);
        for x in 0..10 {
            grid.set(x, 0, GlyphCell { ch: '#', color: None });
        }
        let s = preview.render_to_string(&grid);
        let lines: Vec<&str> = s.split('\n').collect();
        // (80 - 10) / 2 = 35
        assert!(lines[0].starts_with(&" ".repeat(35)));
        assert_eq!(lines[0].len(), 45);
    }

    #[test]
    fn no_padding_when_grid_exceeds_display() {
        let preview = TermPreview::new(8);
        let grid = GlyphGrid::new(16, 1);
        let s = preview.render_to_string(&grid);
        assert_eq!(s.len(), 16);
    }

    #[test]
    fn colored_cells_are_wrapped_in_sgr() {
        let preview = TermPreview::new(1);
        let mut grid = GlyphGrid::new(1, 1);
        grid.set(
            0,
            0,
            GlyphCell {
                ch: '@',
                color: Some(Rgb(255, 0, 0)),
            },
        );
        assert_eq!(
            preview.render_to_string(&grid),
            "\u{1b}[38;2;255;0;0m@\u{1b}[0m"
        );
    }

    #[test]
    fn blank_cells_carry_no_escape() {
        let preview = TermPreview::new(4);
        let grid = GlyphGrid::new(4, 1);
        assert_eq!(preview.render_to_string(&grid), "    ");
    }
}
