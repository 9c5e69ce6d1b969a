//! Fixed timestep stage tick
//!
//! One call advances the stage by one frame. The phase machine decides
//! which subsystems run; the draw pass mirrors it.

use glam::Vec2;

use super::bullet::{draw_bullets, expire_enemy_bullets, update_bullets};
use super::crates::{draw_crates, spawn_crates, update_crates};
use super::enemy::{clear_enemies, draw_enemies, tick_enemy_spawner, update_enemies};
use super::particle::{draw_particles, expire_level_pickups, update_particles};
use super::player::{PlayerState, draw_player, update_player};
use super::sprite::Canvas;
use super::state::{GameEvent, MusicCue, SoundChannel, SoundEffect, Stage, StagePhase, crate_count};
use crate::consts::*;
use crate::error::{Error, Result};
use crate::screen_center;

/// A digital button as seen by one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Button {
    /// Currently down
    pub held: bool,
    /// Went down since the last time the press was consumed
    pub pressed: bool,
}

impl Button {
    /// Clear the press latch and the held state until the host reports
    /// the button again
    pub fn consume(&mut self) {
        self.held = false;
        self.pressed = false;
    }

    pub fn is_active(&self) -> bool {
        self.held || self.pressed
    }

    /// Read and clear the press latch
    pub fn take_press(&mut self) -> bool {
        std::mem::take(&mut self.pressed)
    }
}

/// Input for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    /// Movement stick or keys, any length
    pub movement: Vec2,
    /// Aim stick; ignored while a pointer is present
    pub aim: Vec2,
    /// Pointer position in screen coordinates
    pub pointer: Option<Vec2>,
    pub fire: Button,
    pub pause: Button,
}

/// Advance the stage by one frame
pub fn tick(stage: &mut Stage, input: &mut InputSnapshot) {
    match stage.phase {
        StagePhase::Beginning => tick_beginning(stage),
        StagePhase::Gameplay => tick_gameplay(stage, input),
        StagePhase::End => tick_end(stage, input),
        StagePhase::GameOver => tick_game_over(stage, input),
        // Menus are driven by the host through submit_highscore/try_again
        StagePhase::InputHighscore | StagePhase::HighscoreTable => {}
        StagePhase::Paused => {
            if input.pause.take_press() {
                stage.phase = StagePhase::Gameplay;
                log::info!("Resumed");
            }
        }
    }
}

fn tick_beginning(stage: &mut Stage) {
    stage.stage_start_timer += 1;
    // Clears leftovers from the previous level
    update_particles(stage);

    if stage.stage_start_timer < START_STAGE {
        return;
    }

    let level_bonus = stage.level.saturating_sub(1) as i32;
    stage.enemy_spawn_timer = (FPS * 20 - level_bonus * FPS * 2).max(FPS * 5);
    if stage.level == 1 {
        stage.events.push(GameEvent::Music(MusicCue::Gameplay));
    }
    stage.events.push(GameEvent::LevelStarted { level: stage.level });
    stage.phase = StagePhase::Gameplay;
    log::info!(
        "Level {} started, first enemy in {} frames",
        stage.level,
        stage.enemy_spawn_timer
    );
}

fn tick_gameplay(stage: &mut Stage, input: &mut InputSnapshot) {
    update_player(stage, input);
    update_particles(stage);
    update_crates(stage);
    update_bullets(stage);
    update_enemies(stage);
    tick_enemy_spawner(stage);
    stage.timer += 1;

    if stage.player.state == PlayerState::Destroyed {
        stage.highscore_timer = 0;
        stage.events.push(GameEvent::Music(MusicCue::Stop));
        stage.events.push(GameEvent::GameOver {
            level: stage.level,
            score: stage.score,
        });
        stage.phase = StagePhase::GameOver;
        log::info!("Game over on level {} with score {}", stage.level, stage.score);
    } else if stage.is_level_cleared() {
        stage.events.push(GameEvent::sound(
            SoundEffect::BigAccept,
            SoundChannel::Ui,
            PAN_CENTER,
        ));
        expire_enemy_bullets(&mut stage.bullets);
        stage.events.push(GameEvent::LevelCleared {
            level: stage.level,
            score: stage.score,
        });
        stage.phase = StagePhase::End;
        log::info!("Level {} cleared, score {}", stage.level, stage.score);
    }

    if stage.phase == StagePhase::Gameplay && input.pause.take_press() {
        stage.phase = StagePhase::Paused;
        log::info!("Paused");
    }
}

fn tick_end(stage: &mut Stage, input: &mut InputSnapshot) {
    // Keep things moving so leftover pickups can still be collected
    update_player(stage, input);
    update_particles(stage);
    update_bullets(stage);

    if input.fire.take_press() {
        advance_level(stage);
    }
}

fn tick_game_over(stage: &mut Stage, input: &mut InputSnapshot) {
    update_player(stage, input);
    update_particles(stage);
    update_crates(stage);
    update_bullets(stage);
    update_enemies(stage);

    stage.highscore_timer += 1;
    if stage.highscore_timer < GO_TO_HIGHSCORES {
        return;
    }

    stage.latest_highscore_rank = None;
    stage.phase = if stage.highscores.qualifies(stage.score) {
        StagePhase::InputHighscore
    } else {
        StagePhase::HighscoreTable
    };
    log::info!("Game over screen done, moving to {:?}", stage.phase);
}

/// Tear down the current level and set up the next one
pub fn advance_level(stage: &mut Stage) {
    stage.bullets.clear();
    clear_enemies(&mut stage.enemies, &mut stage.particles);
    stage.crates.clear();
    expire_level_pickups(&mut stage.particles);

    stage.level += 1;
    stage.phase = StagePhase::Beginning;
    stage.stage_start_timer = 0;
    stage.player.recenter(screen_center());

    spawn_crates(stage, crate_count(stage.level));
    log::info!("Advancing to level {}", stage.level);
}

/// Start a new run from level 1, keeping the leaderboard
pub fn try_again(stage: &mut Stage) -> Result<()> {
    match stage.phase {
        StagePhase::HighscoreTable | StagePhase::GameOver => {}
        actual => {
            log::warn!("Try again requested during {:?}", actual);
            return Err(Error::WrongPhase {
                expected: StagePhase::HighscoreTable,
                actual,
            });
        }
    }

    stage.level = 0;
    stage.score = 0;
    stage.timer = 0;
    stage.latest_highscore_rank = None;
    stage.player.reset(screen_center());
    advance_level(stage);
    Ok(())
}

/// Record the finished run under `name`; returns the 1-indexed rank
pub fn submit_highscore(stage: &mut Stage, name: &str) -> Result<usize> {
    if stage.phase != StagePhase::InputHighscore {
        log::warn!("Highscore submitted during {:?}", stage.phase);
        return Err(Error::WrongPhase {
            expected: StagePhase::InputHighscore,
            actual: stage.phase,
        });
    }

    let rank = stage.highscores.add_score(name, stage.score, stage.level)?;
    stage.latest_highscore_rank = Some(rank);
    stage.phase = StagePhase::HighscoreTable;
    Ok(rank)
}

/// Leave the pause menu
pub fn resume(stage: &mut Stage) -> Result<()> {
    if stage.phase != StagePhase::Paused {
        return Err(Error::WrongPhase {
            expected: StagePhase::Paused,
            actual: stage.phase,
        });
    }
    stage.phase = StagePhase::Gameplay;
    Ok(())
}

fn draw_field(stage: &Stage, canvas: &mut dyn Canvas, debug: bool) {
    draw_particles(&stage.particles, canvas, stage.timer);
    draw_crates(&stage.crates, canvas, debug);
    draw_enemies(&stage.enemies, canvas, debug);
    draw_bullets(&stage.bullets, canvas, debug);
    draw_player(&stage.player, canvas, debug);
}

fn draw_hud(stage: &Stage, canvas: &mut dyn Canvas) {
    let margin = 10.0;
    canvas.text(
        &format!("HP: {}/{}", stage.player.hp.max(0), PLAYER_HP_MAX),
        Vec2::new(margin, margin),
    );
    canvas.text(
        &format!("Score: {}", stage.score),
        Vec2::new(SCREEN_WIDTH - margin, margin),
    );
    canvas.text(
        &format!("WEAPON: {}", stage.player.weapon.label()),
        Vec2::new(margin, SCREEN_HEIGHT - margin * 2.0),
    );
    canvas.text(
        &format!("STAGE: {}", stage.level),
        Vec2::new(SCREEN_WIDTH - margin, SCREEN_HEIGHT - margin * 2.0),
    );
}

/// Draw the stage back to front for its current phase
pub fn draw(stage: &Stage, canvas: &mut dyn Canvas, debug: bool) {
    let center = screen_center();
    let line = Vec2::new(0.0, 30.0);
    let score_line = format!("YOUR SCORE: {}", stage.score);

    match stage.phase {
        StagePhase::Beginning => {
            draw_field(stage, canvas, debug);
            canvas.text("GET READY...", center - line);
        }
        StagePhase::Gameplay => {
            draw_field(stage, canvas, debug);
            draw_hud(stage, canvas);
        }
        StagePhase::End => {
            draw_field(stage, canvas, debug);
            canvas.text("WELL DONE!", center - line);
            canvas.text(&score_line, center);
            canvas.text("PRESS FIRE TO PLAY NEXT STAGE", center + line);
        }
        StagePhase::GameOver => {
            draw_field(stage, canvas, debug);
            canvas.text("GAME OVER", center - line * 0.5);
            canvas.text(&score_line, center + line * 0.5);
        }
        StagePhase::InputHighscore => {
            canvas.text("Congratulations! You just got a top score.", center - line);
            canvas.text("Enter your name below:", center);
        }
        StagePhase::HighscoreTable => {
            for (i, entry) in stage.highscores.entries.iter().enumerate() {
                let marker = if stage.latest_highscore_rank == Some(i + 1) { ">" } else { " " };
                let row = format!("{marker}{:>2}. {:<16} {:>8}", i + 1, entry.name, entry.score);
                canvas.text(&row, Vec2::new(center.x, 60.0 + i as f32 * 20.0));
            }
        }
        StagePhase::Paused => {
            draw_field(stage, canvas, debug);
            canvas.text("PAUSED", center);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::sprite::{DrawCommand, DrawList};

    fn press(button: &mut Button) {
        button.held = true;
        button.pressed = true;
    }

    fn run_until_gameplay(stage: &mut Stage) {
        let mut input = InputSnapshot::default();
        for _ in 0..START_STAGE {
            tick(stage, &mut input);
        }
        assert_eq!(stage.phase, StagePhase::Gameplay);
    }

    fn texts(list: &DrawList) -> Vec<String> {
        list.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_beginning_waits_then_arms_spawner() {
        let mut stage = Stage::new(12345);
        stage.drain_events();
        let crates_before: Vec<Vec2> = stage.crates.iter().map(|c| c.pos).collect();
        let mut input = InputSnapshot::default();

        for _ in 0..START_STAGE - 1 {
            tick(&mut stage, &mut input);
        }
        assert_eq!(stage.phase, StagePhase::Beginning);
        // Crates hold still while the player gets ready
        let crates_now: Vec<Vec2> = stage.crates.iter().map(|c| c.pos).collect();
        assert_eq!(crates_before, crates_now);

        tick(&mut stage, &mut input);
        assert_eq!(stage.phase, StagePhase::Gameplay);
        assert_eq!(stage.enemy_spawn_timer, FPS * 20);
        let events = stage.drain_events();
        assert!(events.contains(&GameEvent::Music(MusicCue::Gameplay)));
        assert!(events.contains(&GameEvent::LevelStarted { level: 1 }));
    }

    #[test]
    fn test_tick_pause() {
        let mut stage = Stage::new(12345);
        run_until_gameplay(&mut stage);

        let mut input = InputSnapshot::default();
        press(&mut input.pause);
        tick(&mut stage, &mut input);
        assert_eq!(stage.phase, StagePhase::Paused);
        assert!(!input.pause.pressed);

        // Nothing moves while paused
        let timer = stage.timer;
        let player = stage.player.pos;
        tick(&mut stage, &mut InputSnapshot {
            movement: Vec2::X,
            ..Default::default()
        });
        assert_eq!(stage.timer, timer);
        assert_eq!(stage.player.pos, player);

        press(&mut input.pause);
        tick(&mut stage, &mut input);
        assert_eq!(stage.phase, StagePhase::Gameplay);
    }

    #[test]
    fn test_resume_requires_pause() {
        let mut stage = Stage::new(1);
        assert!(matches!(resume(&mut stage), Err(Error::WrongPhase { .. })));
        stage.phase = StagePhase::Paused;
        resume(&mut stage).unwrap();
        assert_eq!(stage.phase, StagePhase::Gameplay);
    }

    #[test]
    fn test_clearing_crates_ends_level_then_fire_advances() {
        let mut stage = Stage::new(777);
        run_until_gameplay(&mut stage);
        stage.crates.clear();
        crate::sim::bullet::fire_enemy_bullet(&mut stage.bullets, Vec2::new(10.0, 10.0), 0.0);

        let mut input = InputSnapshot::default();
        tick(&mut stage, &mut input);
        assert_eq!(stage.phase, StagePhase::End);
        assert!(stage.bullets.iter().all(|b| b.ttl <= 0));
        let events = stage.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::Sound(cue) if cue.effect == SoundEffect::BigAccept && cue.pan == PAN_CENTER
        )));

        // Held fire alone does not advance; a fresh press does
        input.fire.held = true;
        tick(&mut stage, &mut input);
        assert_eq!(stage.phase, StagePhase::End);

        press(&mut input.fire);
        tick(&mut stage, &mut input);
        assert_eq!(stage.phase, StagePhase::Beginning);
        assert_eq!(stage.level, 2);
        assert_eq!(stage.crates.len(), 5);
        assert!(stage.bullets.is_empty());
        assert_eq!(stage.player.pos, screen_center());
        assert_eq!(stage.player.momentum, Vec2::ZERO);
    }

    #[test]
    fn test_second_level_spawn_timer_is_shorter() {
        let mut stage = Stage::new(8);
        stage.level = 4;
        run_until_gameplay(&mut stage);
        assert_eq!(stage.enemy_spawn_timer, FPS * 14);
        // Music only starts with the first level
        assert!(!stage.drain_events().contains(&GameEvent::Music(MusicCue::Gameplay)));
    }

    #[test]
    fn test_death_leads_to_highscore_entry() {
        let mut stage = Stage::new(31);
        run_until_gameplay(&mut stage);
        stage.score = 250;
        stage.player.hp = 0;

        let mut input = InputSnapshot::default();
        tick(&mut stage, &mut input);
        assert_eq!(stage.phase, StagePhase::GameOver);
        assert!(stage.drain_events().contains(&GameEvent::Music(MusicCue::Stop)));

        for _ in 0..GO_TO_HIGHSCORES {
            tick(&mut stage, &mut input);
        }
        assert_eq!(stage.phase, StagePhase::InputHighscore);

        assert!(matches!(submit_highscore(&mut stage, "   "), Err(Error::HighscoreNameEmpty)));
        assert_eq!(submit_highscore(&mut stage, "ACE").unwrap(), 1);
        assert_eq!(stage.phase, StagePhase::HighscoreTable);
        assert_eq!(stage.latest_highscore_rank, Some(1));
        assert_eq!(stage.highscores.top_score(), Some(250));
    }

    #[test]
    fn test_try_again_restarts_at_level_one() {
        let mut stage = Stage::new(99);
        assert!(try_again(&mut stage).is_err());

        stage.phase = StagePhase::HighscoreTable;
        stage.level = 6;
        stage.score = 1200;
        stage.player.hp = 0;
        stage.player.state = PlayerState::Destroyed;

        try_again(&mut stage).unwrap();

        assert_eq!(stage.phase, StagePhase::Beginning);
        assert_eq!(stage.level, 1);
        assert_eq!(stage.score, 0);
        assert_eq!(stage.timer, 0);
        assert_eq!(stage.player.hp, PLAYER_HP_MAX);
        assert_eq!(stage.player.state, PlayerState::Normal);
        assert_eq!(stage.crates.len(), 3);
    }

    #[test]
    fn test_submit_highscore_wrong_phase() {
        let mut stage = Stage::new(5);
        let err = submit_highscore(&mut stage, "ACE").unwrap_err();
        assert!(matches!(
            err,
            Error::WrongPhase {
                expected: StagePhase::InputHighscore,
                actual: StagePhase::Beginning
            }
        ));
    }

    #[test]
    fn test_draw_layers_and_hud() {
        let mut stage = Stage::new(4);
        let mut list = DrawList::new();
        draw(&stage, &mut list, false);
        assert_eq!(texts(&list), vec!["GET READY...".to_string()]);

        run_until_gameplay(&mut stage);
        list.clear();
        draw(&stage, &mut list, true);
        let hud = texts(&list);
        assert!(hud.contains(&"Score: 0".to_string()));
        assert!(hud.contains(&"WEAPON: NORMAL".to_string()));
        assert!(hud.contains(&"STAGE: 1".to_string()));
        // Crates come before the player ship
        let cells = list.blitted_cells();
        let ship = cells.iter().position(|c| *c == (0, 11)).unwrap();
        let large_crate = cells.iter().position(|c| *c == (0, 0)).unwrap();
        assert!(large_crate < ship);
        assert!(list.commands.iter().any(|c| matches!(c, DrawCommand::DebugBox { .. })));
    }

    #[test]
    fn test_determinism() {
        let mut a = Stage::new(99999);
        let mut b = Stage::new(99999);

        for frame in 0..600 {
            let mut input = InputSnapshot {
                movement: Vec2::new((frame as f32 * 0.05).sin(), (frame as f32 * 0.03).cos()),
                aim: Vec2::new((frame as f32 * 0.1).cos(), (frame as f32 * 0.1).sin()),
                fire: Button {
                    held: frame % 3 == 0,
                    pressed: frame % 7 == 0,
                },
                ..Default::default()
            };
            let mut input_b = input;
            tick(&mut a, &mut input);
            tick(&mut b, &mut input_b);
        }

        assert_eq!(a.phase, b.phase);
        assert_eq!(a.score, b.score);
        assert_eq!(a.timer, b.timer);
        assert_eq!(a.player.pos, b.player.pos);
        assert_eq!(a.bullets.len(), b.bullets.len());
        assert_eq!(a.particles.len(), b.particles.len());
        let crates_a: Vec<Vec2> = a.crates.iter().map(|c| c.pos).collect();
        let crates_b: Vec<Vec2> = b.crates.iter().map(|c| c.pos).collect();
        assert_eq!(crates_a, crates_b);
    }
}
