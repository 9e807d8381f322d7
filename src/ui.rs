//! Layout and drawing: board, sidebar, start screen, pause overlay, score flash.
//!
//! [`Display`] is the terminal side of the session: it receives the session's
//! reports and keeps the last rendered frame, which is what gets drawn while
//! a game is running or paused.

use crate::GameConfig;
use crate::arena::Grid;
use crate::piece::PieceSource;
use crate::session::{GameSession, Presenter, SessionState, View};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::time::{Duration, Instant};
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Terminal columns per board cell (cells are roughly square that way).
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 24;
/// Duration of the score flash (TachyonFX fade) in ms.
const SCORE_FLASH_MS: u32 = 350;

/// Receives session reports and holds what the next frame draws.
pub struct Display {
    /// Last rendered frame: locked cells with the active piece merged in.
    board: Grid,
    score: u32,
    final_score: Option<u32>,
    animate: bool,
    flash_fg: Color,
    flash_bg: Color,
    score_flash: Option<Effect>,
    /// Last time the flash effect was processed (for delta).
    flash_clock: Option<Instant>,
}

impl Display {
    pub fn new(config: &GameConfig, theme: &Theme, animate: bool) -> Self {
        Self {
            board: Grid::new(config.width, config.height),
            score: 0,
            final_score: None,
            animate,
            flash_fg: theme.title,
            flash_bg: theme.div_line,
            score_flash: None,
            flash_clock: None,
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Score of the most recent game over, if any game has ended.
    pub fn final_score(&self) -> Option<u32> {
        self.final_score
    }

    #[cfg(test)]
    pub fn is_flashing(&self) -> bool {
        self.score_flash.is_some()
    }
}

impl Presenter for Display {
    fn render(&mut self, view: View<'_>) {
        self.board.clone_from(view.grid);
        if view.state == SessionState::Running {
            self.board.merge(view.piece, view.position);
        }
    }

    fn score_changed(&mut self, score: u32) {
        if self.animate && score > self.score {
            self.score_flash = Some(fx::fade_to(
                self.flash_fg,
                self.flash_bg,
                (SCORE_FLASH_MS, Interpolation::Linear),
            ));
            self.flash_clock = None;
        }
        self.score = score;
    }

    fn game_over(&mut self, view: View<'_>) {
        self.final_score = Some(view.score);
    }
}

/// Board size in terminal cells, border included.
fn board_size(grid: &Grid) -> (u16, u16) {
    (
        grid.width() as u16 * CELL_WIDTH + 2,
        grid.height() as u16 + 2,
    )
}

/// Draw the current screen: board + sidebar, with the start panel when idle
/// and the pause overlay when paused.
pub fn draw<S: PieceSource>(
    frame: &mut Frame,
    session: &GameSession<S>,
    display: &mut Display,
    theme: &Theme,
    now: Instant,
) {
    let area = frame.area();
    let state = session.state();
    // Idle shows the (empty) live grid; otherwise the last rendered frame, frozen while paused.
    let grid = if state == SessionState::Idle {
        session.grid()
    } else {
        &display.board
    };
    let (pw, ph) = board_size(grid);
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let (board_area, sidebar_area) = (inner[0], inner[1]);

    draw_board(frame, grid, theme, board_area);
    let score_area = draw_sidebar(frame, session, display.score(), theme, sidebar_area);
    apply_score_flash(frame, display, score_area, now);

    match state {
        SessionState::Idle => draw_start_panel(frame, session, display.final_score, theme, board_area),
        SessionState::Paused => draw_pause_overlay(frame, theme, board_area),
        SessionState::Running | SessionState::GameOver => {}
    }
}

fn draw_board(frame: &mut Frame, grid: &Grid, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Blockfall ", theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    for (y, row) in grid.rows().enumerate() {
        let ry = inner.y + y as u16;
        if ry >= inner.bottom() {
            break;
        }
        for (x, &cell) in row.iter().enumerate() {
            let rx = inner.x + x as u16 * CELL_WIDTH;
            if rx + CELL_WIDTH > inner.right() {
                break;
            }
            let style = Style::default().fg(theme.div_line).bg(theme.cell_color(cell));
            let symbol = if cell == 0 { "·" } else { " " };
            buf[(rx, ry)].set_symbol(symbol).set_style(style);
            buf[(rx + 1, ry)].set_symbol(" ").set_style(style);
        }
    }
}

/// Draws the sidebar and returns the rect of the score value (flash target).
fn draw_sidebar<S: PieceSource>(
    frame: &mut Frame,
    session: &GameSession<S>,
    score: u32,
    theme: &Theme,
    area: Rect,
) -> Rect {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Score
            Constraint::Length(1), // gap
            Constraint::Length(6), // Session
            Constraint::Length(1), // gap
            Constraint::Length(9), // Keys
        ])
        .split(area);

    // --- Score ---
    let score_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Score ", title_style));
    let score_inner = score_block.inner(chunks[0]);
    score_block.render(chunks[0], frame.buffer_mut());
    Paragraph::new(Line::from(Span::styled(score.to_string(), fg_style.bold())))
        .alignment(Alignment::Center)
        .render(score_inner, frame.buffer_mut());

    // --- Session ---
    let state_label = match session.state() {
        SessionState::Idle => "Idle",
        SessionState::Running => "Running",
        SessionState::Paused => "Paused",
        SessionState::GameOver => "Game over",
    };
    let piece = session.player().piece.kind;
    let row = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(label, title_style), Span::styled(value, fg_style)])
    };
    let session_lines = vec![
        row("State: ", state_label.to_string()),
        row("Difficulty: ", session.difficulty().to_string()),
        row("Drop: ", format!("{} ms", session.drop_interval().as_millis())),
        Line::from(vec![
            Span::styled("Piece: ", title_style),
            Span::styled(
                piece.symbol().to_string(),
                Style::default().fg(theme.cell_color(piece.color_index())),
            ),
        ]),
    ];
    let session_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let session_inner = session_block.inner(chunks[2]);
    session_block.render(chunks[2], frame.buffer_mut());
    Paragraph::new(Text::from(session_lines)).render(session_inner, frame.buffer_mut());

    // --- Keys ---
    let help = Style::default().fg(theme.inactive_fg);
    let keys = key_help(session.state());
    let keys_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let keys_inner = keys_block.inner(chunks[4]);
    keys_block.render(chunks[4], frame.buffer_mut());
    Paragraph::new(Text::from(
        keys.iter()
            .map(|k| Line::from(Span::styled(*k, help)))
            .collect::<Vec<_>>(),
    ))
    .render(keys_inner, frame.buffer_mut());

    score_inner
}

/// Key help lines; Enter restarts the board once a game is under way.
fn key_help(state: SessionState) -> [&'static str; 7] {
    let start = if state == SessionState::Idle {
        "Enter Start"
    } else {
        "Enter Restart"
    };
    [
        "←/→   Move",
        "↓     Soft drop",
        "W/↑   Rotate CW",
        "Q     Rotate CCW",
        start,
        "P     Pause",
        "X     Stop",
    ]
}

/// Advance the score flash effect (TachyonFX) by the time since the last frame.
fn apply_score_flash(frame: &mut Frame, display: &mut Display, area: Rect, now: Instant) {
    let Some(effect) = display.score_flash.as_mut() else {
        return;
    };
    let delta = display
        .flash_clock
        .map_or(Duration::ZERO, |t| now.saturating_duration_since(t));
    display.flash_clock = Some(now);
    let delta_ms = u32::try_from(delta.as_millis()).unwrap_or(u32::MAX);
    frame.render_effect(effect, area, TfxDuration::from_millis(delta_ms));
    let done = effect.done();
    if done {
        display.score_flash = None;
        display.flash_clock = None;
    }
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_start_panel<S: PieceSource>(
    frame: &mut Frame,
    session: &GameSession<S>,
    final_score: Option<u32>,
    theme: &Theme,
    area: Rect,
) {
    let popup_h = if final_score.is_some() { 9 } else { 7 };
    let popup = centered_popup(area, 22, popup_h);
    let mut lines = vec![Line::from("")];
    if let Some(score) = final_score {
        lines.push(Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )));
        lines.push(Line::from(Span::styled(
            format!("Score: {score}"),
            Style::default().fg(theme.main_fg),
        )));
    }
    lines.extend([
        Line::from(vec![
            Span::styled("◀ ", Style::default().fg(theme.inactive_fg)),
            Span::styled(
                session.difficulty().key().to_uppercase(),
                Style::default().fg(theme.title).bold(),
            ),
            Span::styled(" ▶", Style::default().fg(theme.inactive_fg)),
        ]),
        Line::from(""),
        Line::from(Span::styled("Enter — Start", Style::default().fg(theme.main_fg))),
        Line::from(Span::styled("Esc — Quit", Style::default().fg(theme.main_fg))),
    ]);
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 20, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(Span::styled("P — Resume", Style::default().fg(theme.main_fg))),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}
