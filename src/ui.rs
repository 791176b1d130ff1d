//! Layout and drawing: menu, board, sidebar, pause and game-over overlays.

use crate::app::Screen;
use crate::game::{self, GameState, Phase};
use crate::highscores::HighScoreEntry;
use crate::theme::Theme;
use crate::tower::Block as TowerBlock;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// World units per terminal cell.
const X_SCALE: f64 = 10.0;
const Y_SCALE: f64 = 20.0;

const BOARD_COLS: u16 = (game::WORLD_WIDTH / X_SCALE) as u16;
const BOARD_ROWS: u16 = 32; // WORLD_HEIGHT / Y_SCALE, floored

const SIDEBAR_WIDTH: u16 = 26;

/// Duration of the game-over fade (TachyonFX).
const LOSS_FADE_MS: u32 = 600;

/// Board inner rect (no border), centred with the sidebar to its right.
fn board_rect(area: Rect) -> Rect {
    let total_w = BOARD_COLS + 2 + SIDEBAR_WIDTH;
    let total_h = BOARD_ROWS + 2;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(total_h) / 2;
    Rect {
        x: x + 1,
        y: y + 1,
        width: BOARD_COLS.min(area.width.saturating_sub(2)),
        height: BOARD_ROWS.min(area.height.saturating_sub(2)),
    }
}

fn sidebar_rect(area: Rect, board: Rect) -> Rect {
    Rect {
        x: board.x + board.width + 1,
        y: board.y.saturating_sub(1),
        width: SIDEBAR_WIDTH.min(area.width.saturating_sub(board.width + 2)),
        height: (BOARD_ROWS + 2).min(area.height),
    }
}

/// Project a world-space block into a cell rect inside `board`, clipped.
/// World y is up; rows grow down.
fn project(block: &TowerBlock, dx: f64, dy: f64, board: Rect) -> Option<Rect> {
    let x = block.x + dx;
    let y = block.y + dy;
    let col = (x / X_SCALE).round() as i32;
    let w = (block.width / X_SCALE).round().max(1.0) as i32;
    let h = (block.height / Y_SCALE).round().max(1.0) as i32;
    let row = ((game::WORLD_HEIGHT - (y + block.height)) / Y_SCALE).round() as i32;

    let x0 = col.max(0);
    let x1 = (col + w).min(i32::from(board.width));
    let y0 = row.max(0);
    let y1 = (row + h).min(i32::from(board.height));
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some(Rect {
        x: board.x + x0 as u16,
        y: board.y + y0 as u16,
        width: (x1 - x0) as u16,
        height: (y1 - y0) as u16,
    })
}

fn fill_rect(frame: &mut Frame, rect: Rect, style: Style) {
    let buf = frame.buffer_mut();
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_char(' ');
                cell.set_style(style);
            }
        }
    }
}

fn draw_board(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let board = board_rect(area);
    let outer = Rect {
        x: board.x.saturating_sub(1),
        y: board.y.saturating_sub(1),
        width: board.width + 2,
        height: board.height + 2,
    };
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line))
            .title(" Stack 'Em ")
            .title_style(Style::default().fg(theme.title)),
        outer,
    );
    fill_rect(frame, board, Style::default().bg(theme.bg));

    // Landing guide line just below the spawn zone.
    let guide_row = ((game::WORLD_HEIGHT - game::SPAWN_Y) / Y_SCALE).round() as u16;
    if guide_row < board.height {
        let buf = frame.buffer_mut();
        for x in board.x..board.x + board.width {
            if let Some(cell) = buf.cell_mut((x, board.y + guide_row)) {
                cell.set_char('─');
                cell.set_style(Style::default().fg(theme.div_line).bg(theme.bg));
            }
        }
    }

    // Tower, with the transient failure-sequence offset applied at draw
    // time only.
    let (fx_dx, fx_dy) = state.visual_offset();
    for block in state.tower.blocks() {
        if let Some(rect) = project(block, fx_dx, fx_dy, board) {
            fill_rect(frame, rect, Style::default().bg(theme.block_color(block.color)));
        }
    }

    // Falling block (drawn without the failure offset).
    let falling = &state.drop.falling;
    if let Some(rect) = project(falling, 0.0, 0.0, board) {
        fill_rect(
            frame,
            rect,
            Style::default().bg(theme.block_color(falling.color)),
        );
    }
}

fn draw_sidebar(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    leaderboard: &[HighScoreEntry],
    player_name: &str,
    area: Rect,
) {
    let board = board_rect(area);
    let rect = sidebar_rect(area, board);
    if rect.width < 10 {
        return;
    }
    let label = Style::default().fg(theme.inactive_fg);
    let value = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(Span::styled(
            format!("  {}", player_name),
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled("  score ", label),
            Span::styled(state.score.score.to_string(), value),
        ]),
        Line::from(vec![
            Span::styled("  speed ", label),
            Span::styled(format!("{:.2}x", state.score.speed_factor), value),
        ]),
        Line::from(vec![
            Span::styled("  sway  ", label),
            Span::styled(format!("{:.1}", state.tower_osc.coeff()), value),
        ]),
        Line::from(vec![
            Span::styled("  last  ", label),
            Span::styled(
                state.last_outcome.map_or("-", |o| o.label()),
                Style::default().fg(theme.title),
            ),
        ]),
        Line::default(),
        Line::from(Span::styled("  best", label)),
    ];
    for entry in leaderboard.iter().take(8) {
        lines.push(Line::from(Span::styled(
            format!("  {:<12} {:>5}", truncate(&entry.name, 12), entry.score),
            value,
        )));
    }
    if leaderboard.is_empty() {
        lines.push(Line::from(Span::styled("  (no scores yet)", label)));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled("  space  drop", label)));
    lines.push(Line::from(Span::styled("  r      restart", label)));
    lines.push(Line::from(Span::styled("  q      menu", label)));

    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line)),
        ),
        rect,
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_menu(
    frame: &mut Frame,
    theme: &Theme,
    leaderboard: &[HighScoreEntry],
    area: Rect,
) {
    let rect = centered_rect(40, 16, area);
    let title = Style::default().fg(theme.title).add_modifier(Modifier::BOLD);
    let text = Style::default().fg(theme.main_fg);
    let dim = Style::default().fg(theme.inactive_fg);
    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled("Welcome to Stack 'Em!", title)).alignment(Alignment::Center),
        Line::default(),
        Line::from(Span::styled(
            "Drop the drifting block onto the tower.",
            text,
        ))
        .alignment(Alignment::Center),
        Line::from(Span::styled(
            "Land centred to calm the sway; miss and",
            text,
        ))
        .alignment(Alignment::Center),
        Line::from(Span::styled("the tower comes down.", text)).alignment(Alignment::Center),
        Line::default(),
    ];
    if let Some(best) = leaderboard.first() {
        lines.push(
            Line::from(Span::styled(
                format!("best: {} ({})", best.score, best.name),
                dim,
            ))
            .alignment(Alignment::Center),
        );
        lines.push(Line::default());
    }
    lines.push(
        Line::from(Span::styled("space  play      q  quit", dim)).alignment(Alignment::Center),
    );
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line)),
        ),
        rect,
    );
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let rect = centered_rect(20, 3, area);
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            "PAUSED",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line)),
        ),
        rect,
    );
}

fn draw_game_over(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    leaderboard: &[HighScoreEntry],
    area: Rect,
) {
    let rect = centered_rect(32, 9, area);
    frame.render_widget(Clear, rect);
    let title = Style::default().fg(theme.title).add_modifier(Modifier::BOLD);
    let text = Style::default().fg(theme.main_fg);
    let dim = Style::default().fg(theme.inactive_fg);
    let best = leaderboard.first().map_or(0, |e| e.score);
    let lines = vec![
        Line::default(),
        Line::from(Span::styled("GAME OVER", title)).alignment(Alignment::Center),
        Line::default(),
        Line::from(Span::styled(format!("score  {}", state.score.score), text))
            .alignment(Alignment::Center),
        Line::from(Span::styled(format!("best   {}", best), text)).alignment(Alignment::Center),
        Line::default(),
        Line::from(Span::styled("r  play again    q  menu", dim)).alignment(Alignment::Center),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line)),
        ),
        rect,
    );
}

/// Create or update the game-over fade and process it (fade the board
/// toward the background while the tower "comes down").
fn apply_loss_effect(
    frame: &mut Frame,
    theme: &Theme,
    area: Rect,
    loss_effect: &mut Option<Effect>,
    loss_effect_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let board = board_rect(area);
    let delta = loss_effect_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let tfx_delta = TfxDuration::from_millis(delta.as_millis().min(u128::from(u32::MAX)) as u32);
    *loss_effect_process_time = Some(now);

    if loss_effect.is_none() {
        let bg = theme.bg;
        let effect = fx::fade_to(bg, bg, (LOSS_FADE_MS, Interpolation::Linear)).with_area(board);
        *loss_effect = Some(effect);
    }
    if let Some(effect) = loss_effect {
        frame.render_effect(effect, board, tfx_delta);
    }
}

/// Draw current screen (menu, game, game over) with overlays.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    paused: bool,
    leaderboard: &[HighScoreEntry],
    player_name: &str,
    loss_effect: &mut Option<Effect>,
    loss_effect_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = frame.area();
    match screen {
        Screen::Menu => draw_menu(frame, theme, leaderboard, area),
        Screen::Playing => {
            draw_board(frame, state, theme, area);
            draw_sidebar(frame, state, theme, leaderboard, player_name, area);
            if state.phase == Phase::Lost {
                apply_loss_effect(
                    frame,
                    theme,
                    area,
                    loss_effect,
                    loss_effect_process_time,
                    now,
                );
            }
            if paused {
                draw_pause_overlay(frame, theme, area);
            }
        }
        Screen::GameOver => {
            draw_board(frame, state, theme, area);
            draw_sidebar(frame, state, theme, leaderboard, player_name, area);
            draw_game_over(frame, state, theme, leaderboard, area);
        }
    }
}
