use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Couleur RGB 8 bits par canal.
///
/// # Example
/// ```
/// use va_core::color::Rgb;
/// let c = Rgb::parse("#bdf282").unwrap();
/// assert_eq!(c, Rgb(0xbd, 0xf2, 0x82));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Luminance perceptuelle BT.709, arrondie en 8 bits.
    ///
    /// # Example
    /// ```
    /// use va_core::color::Rgb;
    /// assert_eq!(Rgb(255, 255, 255).luminance(), 255);
    /// assert_eq!(Rgb(0, 0, 0).luminance(), 0);
    /// ```
    #[must_use]
    pub fn luminance(self) -> u8 {
        ((u32::from(self.0) * 2126 + u32::from(self.1) * 7152 + u32::from(self.2) * 722) / 10000)
            as u8
    }

    /// Classe de luminance du fond : sombre si luminance < 128.
    ///
    /// Détermine la couleur de texte par défaut du rendu raster
    /// (blanc sur fond sombre, noir sur fond clair).
    #[must_use]
    pub fn is_dark(self) -> bool {
        self.luminance() < 128
    }

    /// Couleur de premier plan par défaut pour ce fond.
    #[must_use]
    pub fn default_foreground(self) -> Rgb {
        if self.is_dark() { Rgb::WHITE } else { Rgb::BLACK }
    }

    /// Parse `#rrggbb` ou un nom de couleur (red, green, yellow, blue,
    /// magenta, cyan, white, black, gray, dark_gray, light_gray).
    ///
    /// # Errors
    /// Retourne `CoreError::Config` si la chaîne n'est ni un hex valide
    /// ni un nom connu.
    ///
    /// # Example
    /// ```
    /// use va_core::color::Rgb;
    /// assert_eq!(Rgb::parse("#bdf282").unwrap(), Rgb(0xbd, 0xf2, 0x82));
    /// assert_eq!(Rgb::parse("red").unwrap(), Rgb(255, 0, 0));
    /// ```
    pub fn parse(s: &str) -> Result<Rgb, CoreError> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 {
                return Err(CoreError::Config(format!(
                    "couleur hex invalide '{s}' (attendu #rrggbb)"
                )));
            }
            let parse2 = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|_| CoreError::Config(format!("couleur hex invalide '{s}'")))
            };
            return Ok(Rgb(parse2(0)?, parse2(2)?, parse2(4)?));
        }
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(Rgb(255, 0, 0)),
            "green" => Ok(Rgb(0, 255, 0)),
            "yellow" => Ok(Rgb(255, 255, 0)),
            "blue" => Ok(Rgb(0, 0, 255)),
            "magenta" => Ok(Rgb(255, 0, 255)),
            "cyan" => Ok(Rgb(0, 255, 255)),
            "white" => Ok(Rgb(255, 255, 255)),
            "black" => Ok(Rgb(0, 0, 0)),
            "gray" | "grey" => Ok(Rgb(128, 128, 128)),
            "dark_gray" | "dark_grey" => Ok(Rgb(64, 64, 64)),
            "light_gray" | "light_grey" => Ok(Rgb(192, 192, 192)),
            _ => Err(CoreError::Config(format!("couleur inconnue '{s}'"))),
        }
    }
}

/// Palette fixe du mode "couleurs aléatoires".
///
/// L'index du glyphe (bucket d'intensité) sélectionne la couleur via
/// `index % PALETTE.len()` : une même intensité produit toujours la même
/// couleur au sein d'une frame. Le mode est déterministe, pas aléatoire.
pub const PALETTE: [Rgb; 7] = [
    Rgb(255, 0, 0),
    Rgb(0, 255, 0),
    Rgb(255, 255, 0),
    Rgb(0, 0, 255),
    Rgb(255, 0, 255),
    Rgb(0, 255, 255),
    Rgb(255, 255, 255),
];
