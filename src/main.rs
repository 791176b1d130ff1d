//! Stack 'Em — drop oscillating blocks onto a swaying tower, in the terminal.

mod app;
mod game;
mod highscores;
mod input;
mod stepper;
mod theme;
mod tower;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};

/// Options derived from CLI that affect game behaviour.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Tower eviction window: maximum number of stacked blocks.
    pub capacity: usize,
    /// Multiplier applied to the falling block's oscillator output,
    /// in (0, 1]. Lower = tamer drift than the tower sway.
    pub drag_factor: f64,
    /// Base simulation ticks per second (scaled by the speed factor).
    pub tick_rate: f64,
    /// Name recorded on the leaderboard.
    pub player_name: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let player_name = args
        .name
        .clone()
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "player".to_string());
    let config = GameConfig {
        capacity: args.capacity.max(1),
        drag_factor: args.drag_factor.clamp(0.05, 1.0),
        tick_rate: args.tick_rate,
        player_name,
    };
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Stack 'Em in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "stackem-tui",
    version,
    about = "Stack 'Em: drop an oscillating block onto the swaying tower. Accurate landings slow the sway down; sloppy ones speed it up.",
    long_about = "Stack 'Em is a terminal arcade game. A block drifts left and right above a \
        swaying tower of blocks. Drop it as close to the centre of the top block as you can: \
        a Great landing calms the sway, a Bad one makes everything faster, and landing more \
        than a block-width off loses the game. The tower keeps only the last few blocks.\n\n\
        CONTROLS:\n  Space/Enter/Down  Drop    R    Restart    P    Pause    Q / Esc    Quit\n\n\
        Your best score per name is kept in a plain-text leaderboard. Use --theme to load a \
        btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Player name for the leaderboard (defaults to $USER).
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Tower eviction window: how many blocks the tower keeps before the
    /// oldest is evicted.
    #[arg(long, default_value = "5", value_name = "N")]
    pub capacity: usize,

    /// Drag applied to the falling block's drift (0-1; 1 = full oscillator
    /// amplitude).
    #[arg(long, default_value = "0.7", value_name = "FACTOR")]
    pub drag_factor: f64,

    /// Base simulation ticks per second. Landing accuracy scales this up
    /// and down during play.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Skip the start screen and begin playing immediately.
    #[arg(long)]
    pub no_menu: bool,
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
