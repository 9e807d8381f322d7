//! App: terminal init, main loop, tick and key handling.

use crate::input::{Action, key_to_action};
use crate::piece::RandomPieces;
use crate::session::{GameSession, SessionState};
use crate::theme::Theme;
use crate::ui::{self, Display};
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};

const DEFAULT_FRAME_RATE: f64 = 60.0;
const MAX_FRAME_RATE: f64 = 240.0;

pub struct App {
    theme: Theme,
    session: GameSession<RandomPieces>,
    display: Display,
    frame_interval: Duration,
    /// When the session was last ticked.
    last_frame: Instant,
}

/// Time between frames for a requested rate; non-positive or non-finite rates use the default.
fn frame_interval(rate: f64) -> Duration {
    let rate = if rate.is_finite() && rate > 0.0 {
        rate.min(MAX_FRAME_RATE)
    } else {
        DEFAULT_FRAME_RATE
    };
    Duration::from_secs_f64(1.0 / rate)
}

/// Alternate screen and ratatui terminal, on top of raw mode.
fn enter_terminal() -> Result<DefaultTerminal> {
    let mut stdout = std::io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
    let mut terminal = DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
    let _ = terminal.hide_cursor();
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    crossterm::terminal::disable_raw_mode()?;
    Ok(())
}

/// Pass `result` through, running `restore` first if it failed.
fn or_restore<T>(result: Result<T>, restore: impl FnOnce() -> Result<()>) -> Result<T> {
    if result.is_err() {
        let _ = restore();
    }
    result
}

impl App {
    pub fn new(args: &Args, config: GameConfig, theme: Theme) -> Self {
        let source = config.seed.map_or_else(RandomPieces::new, RandomPieces::seeded);
        let session = GameSession::new(&config, source);
        let display = Display::new(&config, &theme, !args.no_animation);
        let mut app = Self {
            theme,
            session,
            display,
            frame_interval: frame_interval(args.frame_rate),
            last_frame: Instant::now(),
        };
        if args.no_menu {
            app.session.start(&mut app.display);
        }
        app
    }

    /// Score of the last game that ended, if any.
    pub fn final_score(&self) -> Option<u32> {
        self.display.final_score()
    }

    pub fn run(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        let mut terminal = or_restore(enter_terminal(), restore_terminal)?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = terminal.show_cursor();
        result.and(restore_terminal())
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        self.last_frame = Instant::now();
        loop {
            let now = Instant::now();
            terminal.draw(|f| ui::draw(f, &self.session, &mut self.display, &self.theme, now))?;

            let timeout = self.frame_interval.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        // Only the first press counts; repeats and releases are dropped.
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_action(key_to_action(key)).is_break() {
                            return Ok(());
                        }
                    }
                }
            }

            let tick_at = Instant::now();
            let elapsed = tick_at.saturating_duration_since(self.last_frame);
            self.last_frame = tick_at;
            self.session.tick(elapsed, &mut self.display);
        }
    }

    fn handle_action(&mut self, action: Action) -> ControlFlow<()> {
        let idle = self.session.state() == SessionState::Idle;
        match action {
            Action::Quit => return ControlFlow::Break(()),
            Action::Start => self.session.start(&mut self.display),
            Action::Pause => self.session.toggle_pause(),
            Action::Stop => self.session.stop(&mut self.display),
            Action::MoveLeft if idle => {
                let prev = self.session.difficulty().prev();
                self.session.set_difficulty(prev);
            }
            Action::MoveRight if idle => {
                let next = self.session.difficulty().next();
                self.session.set_difficulty(next);
            }
            other => {
                if let Some(command) = other.command() {
                    self.session.apply(command, &mut self.display);
                }
            }
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Difficulty;
    use clap::Parser;

    fn app(extra: &[&str]) -> App {
        let argv = std::iter::once("blockfall").chain(extra.iter().copied());
        let args = Args::try_parse_from(argv).unwrap();
        let config = GameConfig {
            width: args.width,
            height: args.height,
            difficulty: args.difficulty,
            seed: Some(7),
        };
        App::new(&args, config, Theme::default())
    }

    #[test]
    fn test_frame_interval_guards_bad_rates() {
        assert_eq!(frame_interval(50.0), Duration::from_millis(20));
        assert_eq!(frame_interval(0.0), frame_interval(DEFAULT_FRAME_RATE));
        assert_eq!(frame_interval(f64::NAN), frame_interval(DEFAULT_FRAME_RATE));
        assert_eq!(frame_interval(10_000.0), frame_interval(MAX_FRAME_RATE));
    }

    #[test]
    fn test_failed_setup_restores_terminal() {
        let mut restored = 0;
        let failed: Result<()> = or_restore(Err(anyhow::anyhow!("no tty")), || {
            restored += 1;
            Ok(())
        });
        assert!(failed.is_err());
        assert_eq!(restored, 1);

        let ok = or_restore(Ok(5), || {
            restored += 1;
            Ok(())
        });
        assert_eq!(ok.unwrap(), 5);
        assert_eq!(restored, 1);
    }

    #[test]
    fn test_starts_idle_unless_no_menu() {
        assert_eq!(app(&[]).session.state(), SessionState::Idle);
        assert_eq!(app(&["--no-menu"]).session.state(), SessionState::Running);
    }

    #[test]
    fn test_idle_arrows_cycle_difficulty() {
        let mut app = app(&[]);
        assert_eq!(app.session.difficulty(), Difficulty::Normal);
        let _ = app.handle_action(Action::MoveRight);
        assert_eq!(app.session.difficulty(), Difficulty::Normal.next());
        let _ = app.handle_action(Action::MoveLeft);
        let _ = app.handle_action(Action::MoveLeft);
        assert_eq!(app.session.difficulty(), Difficulty::Normal.prev());
    }

    #[test]
    fn test_running_arrows_move_piece() {
        let mut app = app(&["--no-menu", "--difficulty", "easy"]);
        let x = app.session.player().pos.x;
        let _ = app.handle_action(Action::MoveLeft);
        assert_eq!(app.session.player().pos.x, x - 1);
        assert_eq!(app.session.difficulty(), Difficulty::Easy);
    }

    #[test]
    fn test_lifecycle_actions() {
        let mut app = app(&[]);
        assert!(app.handle_action(Action::Start).is_continue());
        assert_eq!(app.session.state(), SessionState::Running);
        let _ = app.handle_action(Action::Pause);
        assert_eq!(app.session.state(), SessionState::Paused);
        let _ = app.handle_action(Action::Pause);
        assert_eq!(app.session.state(), SessionState::Running);
        let _ = app.handle_action(Action::Stop);
        assert_eq!(app.session.state(), SessionState::Idle);
        assert!(app.handle_action(Action::Quit).is_break());
        assert_eq!(app.final_score(), None);
    }
}
