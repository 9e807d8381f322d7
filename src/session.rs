//! Session: the game loop controller. Owns the grid, the player and the timing,
//! and reports to a [`Presenter`].

use crate::arena::{Grid, Position};
use crate::piece::{Piece, PieceSource, RandomPieces, Rotation, create_piece};
use crate::{Difficulty, GameConfig};
use std::time::Duration;

/// A lock at or above this row ends the game.
const TOP_OUT_ROW: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    /// Only observable from `Presenter::game_over`; the session then stops and returns to Idle.
    GameOver,
}

/// Player input, accepted only while running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    RotateCw,
    RotateCcw,
}

/// What one drop step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Fell,
    Locked,
    GameOver,
}

/// Borrowed view of everything needed to draw a frame.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    pub grid: &'a Grid,
    pub piece: &'a Piece,
    pub position: Position,
    pub score: u32,
    pub state: SessionState,
}

/// What the session reports to the presentation layer.
pub trait Presenter {
    /// Once per tick while running.
    fn render(&mut self, view: View<'_>);
    /// After any change to the score.
    fn score_changed(&mut self, score: u32);
    /// Once per game over, before the board is wiped. `view.score` is the
    /// score reached and `view.state` is `GameOver`.
    fn game_over(&mut self, view: View<'_>);
}

/// The active piece, its position and the score.
#[derive(Debug, Clone)]
pub struct Player {
    pub piece: Piece,
    pub pos: Position,
    pub score: u32,
}

/// Game state: grid, player, lifecycle and drop timing.
#[derive(Debug)]
pub struct GameSession<S = RandomPieces> {
    grid: Grid,
    player: Player,
    state: SessionState,
    /// Applied on the next start.
    difficulty: Difficulty,
    drop_interval: Duration,
    /// Time since the last forced drop.
    drop_counter: Duration,
    source: S,
}

impl<S: PieceSource> GameSession<S> {
    pub fn new(config: &GameConfig, mut source: S) -> Self {
        let grid = Grid::new(config.width, config.height);
        let piece = create_piece(source.next_kind());
        let pos = spawn_position(&grid, &piece);
        Self {
            grid,
            player: Player {
                piece,
                pos,
                score: 0,
            },
            state: SessionState::Idle,
            difficulty: config.difficulty,
            drop_interval: config.difficulty.drop_interval(),
            drop_counter: Duration::ZERO,
            source,
        }
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[cfg(test)]
    pub fn score(&self) -> u32 {
        self.player.score
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Takes effect on the next start.
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Drop interval of the current session.
    pub fn drop_interval(&self) -> Duration {
        self.drop_interval
    }

    pub fn view(&self) -> View<'_> {
        View {
            grid: &self.grid,
            piece: &self.player.piece,
            position: self.player.pos,
            score: self.player.score,
            state: self.state,
        }
    }

    /// Start a session from Idle. While running or paused this restarts the
    /// board instead: the grid is emptied and the difficulty re-read, but the
    /// piece and score carry over.
    pub fn start(&mut self, out: &mut impl Presenter) {
        if matches!(self.state, SessionState::Idle | SessionState::GameOver) {
            self.reset_piece(out);
            self.player.score = 0;
            out.score_changed(self.player.score);
            self.drop_counter = Duration::ZERO;
            self.state = SessionState::Running;
        }
        self.grid.clear();
        self.drop_interval = self.difficulty.drop_interval();
    }

    pub fn pause(&mut self) {
        if self.state == SessionState::Running {
            self.state = SessionState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == SessionState::Paused {
            self.state = SessionState::Running;
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            SessionState::Running => self.pause(),
            SessionState::Paused => self.resume(),
            _ => {}
        }
    }

    /// Empty the board, zero the score and go back to Idle.
    pub fn stop(&mut self, out: &mut impl Presenter) {
        self.grid.clear();
        self.reset_piece(out);
        self.player.score = 0;
        out.score_changed(self.player.score);
        self.drop_counter = Duration::ZERO;
        self.state = SessionState::Idle;
    }

    /// Advance time by `elapsed`; drops the piece once the interval is exceeded, then renders.
    pub fn tick(&mut self, elapsed: Duration, out: &mut impl Presenter) {
        if self.state != SessionState::Running {
            return;
        }
        self.drop_counter += elapsed;
        if self.drop_counter > self.drop_interval {
            self.drop_piece(out);
        }
        out.render(self.view());
    }

    pub fn apply(&mut self, command: Command, out: &mut impl Presenter) {
        if self.state != SessionState::Running {
            return;
        }
        match command {
            Command::MoveLeft => self.move_horizontal(-1),
            Command::MoveRight => self.move_horizontal(1),
            Command::SoftDrop => {
                self.drop_piece(out);
            }
            Command::RotateCw => {
                self.rotate_piece(Rotation::Clockwise);
            }
            Command::RotateCcw => {
                self.rotate_piece(Rotation::CounterClockwise);
            }
        }
    }

    /// Move the piece down one row, locking it if it can't.
    pub fn drop_piece(&mut self, out: &mut impl Presenter) -> DropOutcome {
        self.drop_counter = Duration::ZERO;
        self.player.pos.y += 1;
        if !self.grid.collides(&self.player.piece, self.player.pos) {
            return DropOutcome::Fell;
        }
        self.player.pos.y -= 1;
        self.grid.merge(&self.player.piece, self.player.pos);
        if self.player.pos.y <= TOP_OUT_ROW {
            self.state = SessionState::GameOver;
            out.game_over(self.view());
            self.stop(out);
            return DropOutcome::GameOver;
        }
        self.reset_piece(out);
        self.grid.sweep(&mut self.player.score);
        out.score_changed(self.player.score);
        DropOutcome::Locked
    }

    /// Spawn the next piece at the top, centred. If it has no room the board
    /// and score are wiped.
    pub fn reset_piece(&mut self, out: &mut impl Presenter) {
        self.player.piece = create_piece(self.source.next_kind());
        self.player.pos = spawn_position(&self.grid, &self.player.piece);
        if self.grid.collides(&self.player.piece, self.player.pos) {
            self.grid.clear();
            self.player.score = 0;
            out.score_changed(self.player.score);
        }
    }

    /// Shift the piece one column; stays put if blocked.
    pub fn move_horizontal(&mut self, dir: i32) {
        self.player.pos.x += dir;
        if self.grid.collides(&self.player.piece, self.player.pos) {
            self.player.pos.x -= dir;
        }
    }

    /// Rotate with a simple wall kick: shift by +1, -2, +3, -4, ... (so x+1,
    /// x-1, x+2, ...) until the piece fits. Gives up and undoes the rotation
    /// as soon as the next offset would exceed the matrix width, even if the
    /// last shift was never tested. Returns whether the rotation stuck.
    pub fn rotate_piece(&mut self, rotation: Rotation) -> bool {
        let x = self.player.pos.x;
        let width = self.player.piece.size() as i32;
        let mut offset = 1i32;
        self.player.piece.rotate(rotation);
        while self.grid.collides(&self.player.piece, self.player.pos) {
            self.player.pos.x += offset;
            offset = -(offset + offset.signum());
            if offset > width {
                self.player.piece.rotate(rotation.inverse());
                self.player.pos.x = x;
                return false;
            }
        }
        true
    }
}

/// Top row, horizontally centred (rounded toward the left).
fn spawn_position(grid: &Grid, piece: &Piece) -> Position {
    Position::new((grid.width() / 2) as i32 - (piece.size() / 2) as i32, 0)
}
