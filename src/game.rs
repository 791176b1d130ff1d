//! Game state: tower, oscillators, drop control, scoring, lifecycle.

use crate::GameConfig;
use crate::stepper::{ColorCycle, MAX_COEFF, MIN_COEFF, Oscillator, Stepper};
use crate::tower::{Block, Tower, TowerError};
use thiserror::Error;

/// World units, y-up. The field matches the original 500x650 window.
pub const WORLD_WIDTH: f64 = 500.0;
pub const WORLD_HEIGHT: f64 = 650.0;
pub const BLOCK_WIDTH: f64 = 40.0;
pub const BLOCK_HEIGHT: f64 = 60.0;
/// Fixed spawn point for each new falling block.
pub const SPAWN_X: f64 = 230.0;
pub const SPAWN_Y: f64 = 570.0;
/// Base block position at game start.
const BASE_X: f64 = 230.0;
const BASE_Y: f64 = 0.0;
/// Vertical descent per tick once a drop is commanded.
const DESCENT_STEP: f64 = 5.0;
/// The tower sways once every this many simulation ticks; the falling block
/// drifts every tick, so the two difficulties stay decoupled.
const TOWER_SWAY_PERIOD: u64 = 2;

/// Initial amplitude coefficients (restored on restart).
pub const DEFAULT_TOWER_COEFF: f64 = 4.0;
pub const DEFAULT_BLOCK_COEFF: f64 = 6.0;

// Scoring tunables: worse landings steepen difficulty, a perfect landing
// eases it.
const BAD_GROWTH: f64 = 1.15;
const BAD_SPEEDUP: f64 = 0.15;
const GOOD_GROWTH: f64 = 1.05;
const GOOD_SPEEDUP: f64 = 0.05;
const GREAT_SHRINK: f64 = 0.9;
const GREAT_SLOWDOWN: f64 = 0.1;
const MIN_SPEED_FACTOR: f64 = 0.5;

// Failure sequence timing (cosmetic; see `FailEffect`).
const VIBRATE_TICKS: u32 = 12;
const COLLAPSE_TICKS: u32 = 20;
const VIBRATE_AMPLITUDE: f64 = 3.0;
const COLLAPSE_STEP: f64 = 14.0;

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Tower(#[from] TowerError),
}

/// Landing accuracy tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Great,
    Good,
    Bad,
    Miss,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Self::Great => "GREAT!",
            Self::Good => "good",
            Self::Bad => "bad...",
            Self::Miss => "MISS",
        }
    }
}

/// Classify a landing offset against the top block's width. Thresholds are
/// nested absolute-offset bands, widest first.
pub fn classify(offset: f64, width: f64) -> Outcome {
    let off = offset.abs();
    if off > width {
        Outcome::Miss
    } else if off > 0.5 * width {
        Outcome::Bad
    } else if off > 0.1 * width {
        Outcome::Good
    } else {
        Outcome::Great
    }
}

/// Score plus the tick-rate multiplier the app loop applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreState {
    pub score: u32,
    pub speed_factor: f64,
}

impl ScoreState {
    pub fn new() -> Self {
        Self {
            score: 0,
            speed_factor: 1.0,
        }
    }
}

impl Default for ScoreState {
    fn default() -> Self {
        Self::new()
    }
}

/// Feed a classified landing back into score and both oscillators.
/// Returns true when the landing was a miss (lifecycle should go Lost).
pub fn apply_outcome(
    outcome: Outcome,
    tower_osc: &mut Oscillator,
    block_osc: &mut Oscillator,
    score: &mut ScoreState,
) -> bool {
    match outcome {
        Outcome::Miss => return true,
        Outcome::Bad => {
            score.score += 1;
            if tower_osc.coeff() <= MAX_COEFF {
                tower_osc.scale_coeff(BAD_GROWTH);
                block_osc.scale_coeff(BAD_GROWTH);
                score.speed_factor += BAD_SPEEDUP;
            }
        }
        Outcome::Good => {
            score.score += 1;
            if tower_osc.coeff() <= MAX_COEFF {
                tower_osc.scale_coeff(GOOD_GROWTH);
                block_osc.scale_coeff(GOOD_GROWTH);
                score.speed_factor += GOOD_SPEEDUP;
            }
        }
        Outcome::Great => {
            score.score += 1;
            if tower_osc.coeff() > MIN_COEFF {
                tower_osc.scale_coeff(GREAT_SHRINK);
                block_osc.scale_coeff(GREAT_SHRINK);
                score.speed_factor =
                    (score.speed_factor - GREAT_SLOWDOWN).max(MIN_SPEED_FACTOR);
            }
        }
    }
    false
}

/// The currently falling block and its descent flag.
#[derive(Debug, Clone)]
pub struct DropController {
    pub falling: Block,
    pub dropping: bool,
}

impl DropController {
    fn new(falling: Block) -> Self {
        Self {
            falling,
            dropping: false,
        }
    }

    /// One descent step toward `land_y`. Clamps rather than overshoots:
    /// the landing y must be exact for scoring. Returns true on contact.
    fn descend(&mut self, land_y: f64) -> bool {
        self.falling.y -= DESCENT_STEP;
        if self.falling.y <= land_y {
            self.falling.y = land_y;
            self.dropping = false;
            return true;
        }
        false
    }
}

/// Vibrate-then-collapse sequence shown while Lost. Purely cosmetic: it
/// yields a transient visual offset and never touches Tower content. The
/// generation tag makes a tick that arrives after a restart a no-op.
#[derive(Debug, Clone)]
pub struct FailEffect {
    generation: u64,
    ticks: u32,
}

impl FailEffect {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            ticks: 0,
        }
    }

    #[cfg(test)]
    fn with_generation(generation: u64) -> Self {
        Self::new(generation)
    }

    /// Transient (dx, dy) to add to tower blocks when drawing.
    pub fn offset(&self) -> (f64, f64) {
        if self.ticks < VIBRATE_TICKS {
            let dx = if self.ticks % 2 == 0 {
                VIBRATE_AMPLITUDE
            } else {
                -VIBRATE_AMPLITUDE
            };
            (dx, 0.0)
        } else {
            let fallen = (self.ticks - VIBRATE_TICKS).min(COLLAPSE_TICKS);
            (0.0, -f64::from(fallen) * COLLAPSE_STEP)
        }
    }

    /// Advance one tick; ignores ticks carrying a stale generation.
    pub fn tick(&mut self, generation: u64) {
        if generation != self.generation || self.is_finished() {
            return;
        }
        self.ticks += 1;
    }

    pub fn is_finished(&self) -> bool {
        self.ticks >= VIBRATE_TICKS + COLLAPSE_TICKS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Playing,
    Lost,
}

/// Whole-game state. Owns the tower, both oscillators, the colour cycle and
/// the falling block; everything is mutated only from `tick()` and the
/// explicit command methods.
#[derive(Debug)]
pub struct GameState {
    pub phase: Phase,
    pub tower: Tower,
    pub tower_osc: Oscillator,
    pub block_osc: Oscillator,
    colors: ColorCycle,
    pub drop: DropController,
    pub score: ScoreState,
    pub last_outcome: Option<Outcome>,
    fail_fx: Option<FailEffect>,
    /// Bumped on every restart; cosmetic ticks from before the bump are
    /// stale and must not run.
    generation: u64,
    tick_count: u64,
    capacity: usize,
    drag_factor: f64,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        let mut colors = ColorCycle::new();
        let seed = Self::make_block(BASE_X, BASE_Y, &mut colors);
        let falling = Self::make_block(SPAWN_X, SPAWN_Y, &mut colors);
        Self {
            phase: Phase::Idle,
            tower: Tower::new(config.capacity, seed),
            tower_osc: Oscillator::new(DEFAULT_TOWER_COEFF),
            block_osc: Oscillator::new(DEFAULT_BLOCK_COEFF),
            colors,
            drop: DropController::new(falling),
            score: ScoreState::new(),
            last_outcome: None,
            fail_fx: None,
            generation: 0,
            tick_count: 0,
            capacity: config.capacity,
            drag_factor: config.drag_factor,
        }
    }

    fn make_block(x: f64, y: f64, colors: &mut ColorCycle) -> Block {
        Block {
            x,
            y,
            width: BLOCK_WIDTH,
            height: BLOCK_HEIGHT,
            color: colors.step(),
        }
    }

    /// Leave Idle and begin play.
    pub fn begin(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Playing;
        }
    }

    /// Drop command (edge signal). Ignored unless playing and not already
    /// dropping.
    pub fn command_drop(&mut self) {
        if self.phase == Phase::Playing && !self.drop.dropping {
            self.drop.dropping = true;
        }
    }

    /// Reinitialise everything for a fresh session. Cancels any pending
    /// cosmetic sequence first so a stale tick cannot touch the new state.
    pub fn restart(&mut self) {
        self.generation += 1;
        self.fail_fx = None;
        self.colors.start();
        let seed = Self::make_block(BASE_X, BASE_Y, &mut self.colors);
        self.tower = Tower::new(self.capacity, seed);
        self.tower_osc.set_coeff(DEFAULT_TOWER_COEFF);
        self.tower_osc.start();
        self.block_osc.set_coeff(DEFAULT_BLOCK_COEFF);
        self.block_osc.start();
        let falling = Self::make_block(SPAWN_X, SPAWN_Y, &mut self.colors);
        self.drop = DropController::new(falling);
        self.score = ScoreState::new();
        self.last_outcome = None;
        self.tick_count = 0;
        self.phase = Phase::Playing;
    }

    /// One simulation tick. All state transitions are synchronous and
    /// complete within the call.
    pub fn tick(&mut self) -> Result<(), GameError> {
        match self.phase {
            Phase::Idle => Ok(()),
            Phase::Lost => {
                // Tower oscillation is suspended; only the cosmetic
                // sequence advances.
                let generation = self.generation;
                if let Some(fx) = &mut self.fail_fx {
                    fx.tick(generation);
                }
                Ok(())
            }
            Phase::Playing => self.tick_playing(),
        }
    }

    fn tick_playing(&mut self) -> Result<(), GameError> {
        self.tick_count += 1;
        if self.tick_count % TOWER_SWAY_PERIOD == 0 {
            let dx = self.tower_osc.step();
            self.tower.apply_offset(dx);
        }
        if !self.drop.dropping {
            self.drop.falling.x += self.block_osc.step() * self.drag_factor;
            return Ok(());
        }

        let top = *self.tower.top()?;
        if self.drop.descend(top.y + top.height) {
            self.land(&top);
        }
        Ok(())
    }

    /// Landing: classify the offset, feed the result back, append the
    /// landed block (a missed block still joins the tower for the failure
    /// sequence) and spawn the next one.
    fn land(&mut self, top: &Block) {
        let offset = self.drop.falling.x - top.x;
        let outcome = classify(offset, top.width);
        let lost = apply_outcome(
            outcome,
            &mut self.tower_osc,
            &mut self.block_osc,
            &mut self.score,
        );
        self.last_outcome = Some(outcome);
        self.tower.append(self.drop.falling);

        let falling = Self::make_block(SPAWN_X, SPAWN_Y, &mut self.colors);
        self.drop = DropController::new(falling);
        self.block_osc.start();

        if lost {
            self.phase = Phase::Lost;
            self.fail_fx = Some(FailEffect::new(self.generation));
        }
    }

    /// Transient draw offset for the tower while the failure sequence runs.
    pub fn visual_offset(&self) -> (f64, f64) {
        self.fail_fx.as_ref().map_or((0.0, 0.0), FailEffect::offset)
    }

    /// True once the failure sequence has played out (or never started).
    pub fn fail_sequence_done(&self) -> bool {
        self.fail_fx.as_ref().is_none_or(FailEffect::is_finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GameConfig {
        GameConfig {
            capacity: 5,
            drag_factor: 1.0,
            tick_rate: 50.0,
            player_name: "test".to_string(),
        }
    }

    fn playing_state() -> GameState {
        let mut s = GameState::new(&config());
        s.begin();
        s
    }

    /// Put the falling block one descent step above the tower top at the
    /// given x, with the drop already commanded.
    fn about_to_land(state: &mut GameState, x: f64) {
        let top = *state.tower.top().unwrap();
        state.drop.falling.x = x;
        state.drop.falling.y = top.y + top.height + 4.0;
        state.command_drop();
    }

    #[test]
    fn great_landing_scenario() {
        // top x = 230, width = 40; landing at 232 is within 0.1 * width.
        let mut s = playing_state();
        let coeff_before = s.tower_osc.coeff();
        about_to_land(&mut s, 232.0);
        s.tick().unwrap();

        assert_eq!(s.last_outcome, Some(Outcome::Great));
        assert_eq!(s.score.score, 1);
        assert_eq!(s.phase, Phase::Playing);
        assert!((s.tower_osc.coeff() - coeff_before * GREAT_SHRINK).abs() < 1e-9);
    }

    #[test]
    fn miss_scenario_transitions_to_lost() {
        // offset 60 > width 40
        let mut s = playing_state();
        about_to_land(&mut s, 290.0);
        s.tick().unwrap();

        assert_eq!(s.last_outcome, Some(Outcome::Miss));
        assert_eq!(s.score.score, 0);
        assert_eq!(s.phase, Phase::Lost);
        // The missed block still joined the tower.
        assert_eq!(s.tower.len(), 2);
    }

    #[test]
    fn landing_y_is_clamped_exactly() {
        let mut s = playing_state();
        let top = *s.tower.top().unwrap();
        s.drop.falling.x = top.x;
        // 3.0 above the threshold: one 5.0 step would overshoot.
        s.drop.falling.y = top.y + top.height + 3.0;
        s.command_drop();
        s.tick().unwrap();
        let landed = *s.tower.top().unwrap();
        assert_eq!(landed.y, top.y + top.height);
    }

    #[test]
    fn landing_spawns_fresh_block_at_spawn_point() {
        let mut s = playing_state();
        about_to_land(&mut s, 230.0);
        s.tick().unwrap();
        assert!(!s.drop.dropping);
        assert_eq!(s.drop.falling.x, SPAWN_X);
        assert_eq!(s.drop.falling.y, SPAWN_Y);
    }

    #[test]
    fn classify_tiers() {
        assert_eq!(classify(2.0, 40.0), Outcome::Great);
        assert_eq!(classify(-4.0, 40.0), Outcome::Great);
        assert_eq!(classify(10.0, 40.0), Outcome::Good);
        assert_eq!(classify(-30.0, 40.0), Outcome::Bad);
        assert_eq!(classify(60.0, 40.0), Outcome::Miss);
        assert_eq!(classify(-41.0, 40.0), Outcome::Miss);
    }

    #[test]
    fn miss_leaves_score_and_coeffs_unchanged() {
        let mut tower_osc = Oscillator::new(DEFAULT_TOWER_COEFF);
        let mut block_osc = Oscillator::new(DEFAULT_BLOCK_COEFF);
        let mut score = ScoreState::new();
        let lost = apply_outcome(Outcome::Miss, &mut tower_osc, &mut block_osc, &mut score);
        assert!(lost);
        assert_eq!(score.score, 0);
        assert!((tower_osc.coeff() - DEFAULT_TOWER_COEFF).abs() < 1e-12);
        assert!((block_osc.coeff() - DEFAULT_BLOCK_COEFF).abs() < 1e-12);
    }

    #[test]
    fn every_non_miss_increments_score_by_one() {
        let mut tower_osc = Oscillator::new(DEFAULT_TOWER_COEFF);
        let mut block_osc = Oscillator::new(DEFAULT_BLOCK_COEFF);
        let mut score = ScoreState::new();
        for (i, outcome) in [Outcome::Great, Outcome::Good, Outcome::Bad]
            .into_iter()
            .enumerate()
        {
            let lost = apply_outcome(outcome, &mut tower_osc, &mut block_osc, &mut score);
            assert!(!lost);
            assert_eq!(score.score, i as u32 + 1);
        }
    }

    #[test]
    fn speed_factor_never_drops_below_floor() {
        let mut tower_osc = Oscillator::new(DEFAULT_TOWER_COEFF);
        let mut block_osc = Oscillator::new(DEFAULT_BLOCK_COEFF);
        let mut score = ScoreState::new();
        for _ in 0..50 {
            // Keep the coefficient above MIN so the slowdown branch runs.
            tower_osc.set_coeff(DEFAULT_TOWER_COEFF);
            apply_outcome(Outcome::Great, &mut tower_osc, &mut block_osc, &mut score);
        }
        assert!(score.speed_factor >= MIN_SPEED_FACTOR - 1e-12);
    }

    #[test]
    fn capacity_eviction_during_play() {
        let mut s = playing_state();
        for _ in 0..7 {
            let top_x = s.tower.top().unwrap().x;
            about_to_land(&mut s, top_x);
            s.tick().unwrap();
            assert_eq!(s.phase, Phase::Playing);
            assert!(s.tower.len() <= 5);
        }
        assert_eq!(s.tower.len(), 5);
    }

    #[test]
    fn restart_is_idempotent() {
        let mut s = playing_state();
        about_to_land(&mut s, 290.0);
        s.tick().unwrap();
        assert_eq!(s.phase, Phase::Lost);

        s.restart();
        let once = (
            s.tower.len(),
            s.score,
            s.tower_osc.coeff(),
            s.block_osc.coeff(),
            s.phase,
        );
        s.restart();
        let twice = (
            s.tower.len(),
            s.score,
            s.tower_osc.coeff(),
            s.block_osc.coeff(),
            s.phase,
        );
        assert_eq!(once, twice);
        assert_eq!(s.tower.len(), 1);
        assert_eq!(s.score.score, 0);
        assert!((s.score.speed_factor - 1.0).abs() < 1e-12);
        assert!((s.tower_osc.coeff() - DEFAULT_TOWER_COEFF).abs() < 1e-12);
    }

    #[test]
    fn drift_ignored_while_dropping() {
        let mut s = playing_state();
        about_to_land(&mut s, 230.0);
        let x_before = s.drop.falling.x;
        let y_before = s.drop.falling.y;
        // Far from landing still: move it up so this tick only descends.
        s.drop.falling.y = y_before + 100.0;
        s.tick().unwrap();
        assert_eq!(s.drop.falling.x, x_before);
        assert!(s.drop.falling.y < y_before + 100.0);
    }

    #[test]
    fn drop_command_ignored_when_not_playing() {
        let mut s = GameState::new(&config());
        s.command_drop();
        assert!(!s.drop.dropping);
    }

    #[test]
    fn stale_fail_effect_tick_is_a_no_op() {
        let mut fx = FailEffect::with_generation(3);
        let before = fx.offset();
        fx.tick(4); // stale generation
        assert_eq!(fx.offset(), before);
        fx.tick(3);
        assert_ne!(fx.offset(), before);
    }

    #[test]
    fn fail_sequence_self_terminates() {
        let mut s = playing_state();
        about_to_land(&mut s, 290.0);
        s.tick().unwrap();
        assert_eq!(s.phase, Phase::Lost);
        let tower_before: Vec<_> = s.tower.blocks().to_vec();
        for _ in 0..(VIBRATE_TICKS + COLLAPSE_TICKS + 5) {
            s.tick().unwrap();
        }
        assert!(s.fail_sequence_done());
        // Cosmetic only: logical tower content untouched.
        assert_eq!(s.tower.blocks(), &tower_before[..]);
    }

    #[test]
    fn tower_frozen_while_lost() {
        let mut s = playing_state();
        about_to_land(&mut s, 290.0);
        s.tick().unwrap();
        let xs: Vec<f64> = s.tower.blocks().iter().map(|b| b.x).collect();
        for _ in 0..10 {
            s.tick().unwrap();
        }
        let after: Vec<f64> = s.tower.blocks().iter().map(|b| b.x).collect();
        assert_eq!(xs, after);
    }
}
