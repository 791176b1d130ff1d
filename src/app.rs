//! App: terminal init, main loop, tick and key handling.

use crate::game::{GameState, Phase};
use crate::highscores::{self, HighScoreEntry};
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Render cadence: events are polled with this timeout, ~60 FPS.
const FRAME_DURATION: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    last_tick: Instant,
    /// Edge-triggered input latches, consumed at the next simulation tick
    /// (never mid-tick).
    pending_drop: bool,
    pending_restart: bool,
    /// TachyonFX fade for the game-over overlay (created when it starts).
    loss_effect: Option<Effect>,
    /// Last time the loss effect was processed (for delta).
    loss_effect_process_time: Option<Instant>,
    leaderboard: Vec<HighScoreEntry>,
    /// Guards against recording the same game's score twice.
    score_recorded: bool,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let state = GameState::new(&config);
        let screen = if args.no_menu {
            Screen::Playing
        } else {
            Screen::Menu
        };
        let leaderboard = highscores::load();
        let mut app = Self {
            config,
            theme,
            state,
            screen,
            paused: false,
            last_tick: Instant::now(),
            pending_drop: false,
            pending_restart: false,
            loss_effect: None,
            loss_effect_process_time: None,
            leaderboard,
            score_recorded: false,
        };
        if args.no_menu {
            app.state.begin();
        }
        Ok(app)
    }

    /// Start (or restart) a session and switch to the playing screen.
    fn start_game(&mut self) {
        if self.state.phase == Phase::Idle {
            self.state.begin();
        } else {
            self.state.restart();
        }
        self.screen = Screen::Playing;
        self.paused = false;
        self.pending_drop = false;
        self.pending_restart = false;
        self.loss_effect = None;
        self.loss_effect_process_time = None;
        self.score_recorded = false;
        self.last_tick = Instant::now();
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn handle_key(&mut self, action: Action) -> bool {
        match self.screen {
            Screen::Menu => match action {
                Action::Quit => return true,
                Action::Drop | Action::Restart => self.start_game(),
                _ => {}
            },
            Screen::Playing => match action {
                Action::Quit => {
                    self.screen = Screen::Menu;
                    self.paused = false;
                }
                Action::Pause => self.paused = !self.paused,
                Action::Drop if !self.paused => self.pending_drop = true,
                Action::Restart if !self.paused => self.pending_restart = true,
                _ => {}
            },
            Screen::GameOver => match action {
                Action::Quit => self.screen = Screen::Menu,
                Action::Drop | Action::Restart => self.start_game(),
                _ => {}
            },
        }
        false
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    self.paused,
                    &self.leaderboard,
                    &self.config.player_name,
                    &mut self.loss_effect,
                    &mut self.loss_effect_process_time,
                    now,
                );
            })?;

            let rate = (self.config.tick_rate * self.state.score.speed_factor).max(1.0);
            let tick_interval = Duration::from_secs_f64(1.0 / rate);
            let timeout = FRAME_DURATION.saturating_sub(now.elapsed());

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_key(key_to_action(key)) {
                            return Ok(());
                        }
                    }
                }
            }

            if self.screen == Screen::Playing && !self.paused {
                if self.last_tick.elapsed() >= tick_interval {
                    self.last_tick = Instant::now();
                    // Queued edge signals are consumed at the tick boundary.
                    if self.pending_restart {
                        self.pending_restart = false;
                        self.pending_drop = false;
                        self.start_game();
                    } else if self.pending_drop {
                        self.pending_drop = false;
                        self.state.command_drop();
                    }
                    self.state.tick().context("simulation tick failed")?;
                }

                if self.state.phase == Phase::Lost {
                    if !self.score_recorded {
                        self.score_recorded = true;
                        // Persistence failures degrade to the in-memory view.
                        self.leaderboard = highscores::record(
                            &self.config.player_name,
                            self.state.score.score,
                        )
                        .unwrap_or_else(|_| highscores::load());
                    }
                    if self.state.fail_sequence_done() {
                        self.screen = Screen::GameOver;
                    }
                }
            }
        }
    }
}
