//! Blockfall: a falling-block puzzle game in the terminal.

mod app;
mod arena;
mod input;
mod piece;
mod session;
mod sweep;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Options derived from CLI that affect the session (board size, speed, piece order).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub width: u16,
    pub height: u16,
    pub difficulty: Difficulty,
    pub seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette)
        .context("failed to load theme")?;
    let config = GameConfig {
        width: args.width,
        height: args.height,
        difficulty: args.difficulty,
        seed: args.seed,
    };
    let mut app = App::new(&args, config, theme);
    app.run()?;
    if let Some(score) = app.final_score() {
        println!("Game Over! Your score: {score}");
    }
    Ok(())
}

/// Falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockfall",
    version,
    about = "Falling-block puzzle in the terminal. Fill rows to clear them; don't let the stack reach the top.",
    long_about = "Blockfall is a small falling-block puzzle game.\n\n\
        Pieces fall at a fixed speed chosen by the difficulty. A full row is cleared and \
        rows above it shift down. Each row cleared by the same piece is worth twice the \
        previous one (10, 20, 40, ...). Locking a piece in the top two rows ends the game.\n\n\
        CONTROLS:\n  Left/Right  Move      Down       Soft drop\n  W / Up      Rotate CW Q          Rotate CCW\n  Enter / S   Start     P / Space  Pause\n  X           Stop      Esc        Quit\n\n\
        On the start screen Left/Right picks the difficulty."
)]
pub struct Args {
    /// Difficulty: easy (250 ms per row), normal (120 ms), hard (60 ms) or default (every frame).
    /// Unknown names fall back to default.
    #[arg(short, long, default_value = "normal")]
    pub difficulty: Difficulty,

    /// Board width in cells.
    #[arg(long, default_value = "12", value_name = "COLS", value_parser = clap::value_parser!(u16).range(4..=40))]
    pub width: u16,

    /// Board height in cells.
    #[arg(long, default_value = "20", value_name = "ROWS", value_parser = clap::value_parser!(u16).range(4..=40))]
    pub height: u16,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses the built-in palette if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Seed for the piece generator (random if not set).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Skip the start screen and begin immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Disable the score flash effect.
    #[arg(long)]
    pub no_animation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

/// Drop speed selection, read when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    /// Fastest: a row every frame.
    #[default]
    Default,
}

impl Difficulty {
    pub const ALL: [Self; 4] = [Self::Easy, Self::Normal, Self::Hard, Self::Default];

    /// Time between forced drops.
    pub fn drop_interval(self) -> Duration {
        Duration::from_millis(match self {
            Self::Easy => 250,
            Self::Normal => 120,
            Self::Hard => 60,
            Self::Default => 0,
        })
    }

    /// Unrecognised keys degrade to `Default`.
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "easy" => Self::Easy,
            "normal" => Self::Normal,
            "hard" => Self::Hard,
            _ => Self::Default,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
            Self::Default => "default",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|&d| d == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|&d| d == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl FromStr for Difficulty {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_key(s))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_intervals() {
        assert_eq!(Difficulty::Easy.drop_interval(), Duration::from_millis(250));
        assert_eq!(Difficulty::Normal.drop_interval(), Duration::from_millis(120));
        assert_eq!(Difficulty::Hard.drop_interval(), Duration::from_millis(60));
        assert_eq!(Difficulty::Default.drop_interval(), Duration::ZERO);
    }

    #[test]
    fn test_unknown_difficulty_is_fastest() {
        assert_eq!(Difficulty::from_key("nightmare"), Difficulty::Default);
        assert_eq!(Difficulty::from_key(""), Difficulty::Default);
        assert_eq!(Difficulty::from_key(" HARD "), Difficulty::Hard);
    }

    #[test]
    fn test_difficulty_cycle() {
        assert_eq!(Difficulty::Easy.next(), Difficulty::Normal);
        assert_eq!(Difficulty::Default.next(), Difficulty::Easy);
        assert_eq!(Difficulty::Easy.prev(), Difficulty::Default);
        for d in Difficulty::ALL {
            assert_eq!(d.next().prev(), d);
            assert_eq!(Difficulty::from_key(d.key()), d);
        }
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["blockfall"]).unwrap();
        assert_eq!(args.difficulty, Difficulty::Normal);
        assert_eq!((args.width, args.height), (12, 20));
        assert_eq!(args.palette, Palette::Normal);
        assert!(!args.no_menu);
    }

    #[test]
    fn test_args_accept_unknown_difficulty() {
        let args = Args::try_parse_from(["blockfall", "--difficulty", "insane"]).unwrap();
        assert_eq!(args.difficulty, Difficulty::Default);
    }

    #[test]
    fn test_args_reject_tiny_board() {
        assert!(Args::try_parse_from(["blockfall", "--width", "2"]).is_err());
    }
}
