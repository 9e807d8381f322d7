//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::arena::Cell;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Block colours for cell values 1..=7.
const DEFAULT_BLOCKS: [Color; 7] = [
    Color::from_u32(0x00ff_0d72),
    Color::from_u32(0x000d_c2ff),
    Color::from_u32(0x000d_ff72),
    Color::from_u32(0x00f5_38ff),
    Color::from_u32(0x00ff_8e0d),
    Color::from_u32(0x00ff_e138),
    Color::from_u32(0x0038_77ff),
];

/// Block palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Block colours, indexed by cell value - 1.
    pub blocks: [Color; 7],
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, difficulty).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Key help and other secondary text.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            blocks: DEFAULT_BLOCKS,
            bg: Color::from_u32(0x0031_353F),
            div_line: Color::from_u32(0x003F_444F),
            main_fg: Color::from_u32(0x00AB_B2BF),
            title: Color::from_u32(0x00E5_C07B),
            inactive_fg: Color::from_u32(0x005C_6370),
        }
    }
}

impl Theme {
    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to defaults if path is None or the file is missing; keys that are
    /// absent or unparsable keep their default.
    /// `palette` selects the block colour variant.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            _ => Self::default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override block colours for high-contrast or colorblind.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.blocks = [
                    Color::from_u32(0x00FF_0000),
                    Color::from_u32(0x0000_FFFF),
                    Color::from_u32(0x0000_FF00),
                    Color::from_u32(0x00FF_00FF),
                    Color::from_u32(0x00FF_8800),
                    Color::from_u32(0x00FF_FF00),
                    Color::from_u32(0x0000_88FF),
                ];
            }
            crate::Palette::Colorblind => {
                // Okabe-Ito
                self.blocks = [
                    Color::from_u32(0x00D5_5E00),
                    Color::from_u32(0x0056_B4E9),
                    Color::from_u32(0x0000_9E73),
                    Color::from_u32(0x00CC_79A7),
                    Color::from_u32(0x00E6_9F00),
                    Color::from_u32(0x00F0_E442),
                    Color::from_u32(0x0000_72B2),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let defaults = Self::default();
        let mut blocks = defaults.blocks;
        for (i, block) in blocks.iter_mut().enumerate() {
            if let Some(c) = get(&format!("block{}", i + 1)) {
                *block = c;
            }
        }
        Self {
            blocks,
            bg: get("main_bg").or_else(|| get("meter_bg")).unwrap_or(defaults.bg),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
            inactive_fg: get("inactive_fg").unwrap_or(defaults.inactive_fg),
        }
    }

    /// Colour for a non-empty cell value; empty cells use the background.
    #[inline]
    pub fn cell_color(&self, cell: Cell) -> Color {
        match cell {
            0 => self.bg,
            n => self.blocks[(n as usize - 1) % self.blocks.len()],
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |hex: &str| u8::from_str_radix(hex, 16).map_err(|_| invalid());
    if !s.is_ascii() {
        return Err(invalid());
    }
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Palette;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#ff0d72").unwrap();
        assert!(matches!(c, Color::Rgb(0xff, 0x0d, 0x72)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(parse_hex("#12345"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#GGGGGG"), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[main_bg]="#31353F""##);
        assert_eq!(map.get("main_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_from_map_overrides_blocks_and_keeps_defaults() {
        let map = parse_theme_file("# comment\ntheme[block4]='#010203'\ntheme[title]=\"#FFFFFF\"\n");
        let theme = Theme::from_map(&map);
        assert_eq!(theme.cell_color(4), Color::Rgb(1, 2, 3));
        assert_eq!(theme.cell_color(1), DEFAULT_BLOCKS[0]);
        assert_eq!(theme.title, Color::Rgb(255, 255, 255));
    }

    #[test]
    fn test_cell_color_maps_values() {
        let theme = Theme::default();
        assert_eq!(theme.cell_color(0), theme.bg);
        assert_eq!(theme.cell_color(1), Color::Rgb(0xff, 0x0d, 0x72));
        assert_eq!(theme.cell_color(7), Color::Rgb(0x38, 0x77, 0xff));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let theme = Theme::load(Some(Path::new("/nonexistent/blockfall.theme")), Palette::Colorblind).unwrap();
        assert_ne!(theme.blocks, DEFAULT_BLOCKS);
        assert_eq!(theme.bg, Theme::default().bg);
    }
}
