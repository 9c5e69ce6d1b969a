//! Crate Buster headless runner
//!
//! Plays the simulation with a simple autopilot and logs what happens.
//!
//! Usage: `crate-buster [seed] [frames]`. Settings JSON may be passed in
//! the `CRATE_BUSTER_SETTINGS` environment variable. Set `RUST_LOG=debug`
//! to see spawns and sounds.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use crate_buster::Settings;
    use crate_buster::consts::*;
    use crate_buster::sim::{
        AudioSink, DrawList, GameEvent, InputSnapshot, MusicCue, SoundCue, Stage, StagePhase, draw,
        submit_highscore, tick, try_again,
    };

    /// Keep this far from anything that hurts
    const DANGER_RADIUS: f32 = 90.0;

    /// Audio sink that only logs
    struct LogSink {
        settings: Settings,
    }

    impl AudioSink for LogSink {
        fn play_sound(&mut self, cue: &SoundCue) {
            log::debug!(
                "sound {:?} on {:?} pan {} gain {:.1}",
                cue.effect,
                cue.channel,
                cue.pan,
                self.settings.sound_gain()
            );
        }

        fn play_music(&mut self, cue: MusicCue) {
            log::debug!("music {:?} gain {:.1}", cue, self.settings.music_gain());
        }
    }

    fn load_settings() -> Settings {
        match std::env::var("CRATE_BUSTER_SETTINGS") {
            Ok(json) => Settings::from_json(&json).unwrap_or_else(|err| {
                log::warn!("Ignoring CRATE_BUSTER_SETTINGS: {}", err);
                Settings::default()
            }),
            Err(_) => Settings::default(),
        }
    }

    /// Shoot at the nearest target and back away from whatever is close
    fn autopilot(stage: &Stage, frame: u64) -> InputSnapshot {
        let me = stage.player.pos;
        let targets = stage
            .crates
            .iter()
            .map(|c| c.pos)
            .chain(stage.enemies.iter().map(|e| e.pos));
        let nearest = targets.min_by(|a, b| a.distance_squared(me).total_cmp(&b.distance_squared(me)));

        let mut input = InputSnapshot {
            pointer: nearest,
            ..Default::default()
        };
        input.fire.held = true;

        if let Some(target) = nearest {
            if target.distance(me) < DANGER_RADIUS {
                input.movement = (me - target).normalize_or_zero();
            }
        } else {
            // Idle drift so scrap can catch up
            let t = frame as f32 * 0.02;
            input.movement = Vec2::new(t.cos(), t.sin()) * 0.5;
        }

        if stage.phase == StagePhase::End {
            input.fire.pressed = true;
        }
        input
    }

    pub fn run() {
        let mut args = std::env::args().skip(1);
        let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(1u64);
        let frames = args
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(FPS as u64 * 120);

        let settings = load_settings();
        log::info!("Crate Buster headless run: seed {}, {} frames", seed, frames);

        let mut stage = Stage::new(seed);
        let mut sink = LogSink {
            settings: settings.clone(),
        };
        let mut canvas = DrawList::new();
        let mut runs = 1;

        for frame in 0..frames {
            let mut input = autopilot(&stage, frame);
            tick(&mut stage, &mut input);

            for event in stage.dispatch_audio(&mut sink) {
                match event {
                    GameEvent::LevelCleared { level, score } => {
                        log::info!("Run {}: cleared level {} at {} points", runs, level, score)
                    }
                    GameEvent::GameOver { level, score } => {
                        log::info!("Run {}: game over on level {} with {} points", runs, level, score)
                    }
                    other => log::trace!("{:?}", other),
                }
            }

            match stage.phase {
                StagePhase::InputHighscore => {
                    if let Err(err) = submit_highscore(&mut stage, "AUTOPILOT") {
                        log::warn!("Highscore rejected: {}", err);
                    }
                }
                StagePhase::HighscoreTable => {
                    if let Err(err) = try_again(&mut stage) {
                        log::warn!("Could not restart: {}", err);
                        break;
                    }
                    runs += 1;
                }
                _ => {}
            }

            if frame % FPS as u64 == 0 {
                canvas.clear();
                draw(&stage, &mut canvas, settings.debug_hitboxes);
                log::trace!("frame {}: {} draw calls", frame, canvas.commands.len());
            }
        }

        log::info!(
            "Finished after {} runs: level {}, score {}, best {:?}",
            runs,
            stage.level,
            stage.score,
            stage.highscores.top_score()
        );
        for (i, entry) in stage.highscores.entries.iter().enumerate() {
            println!("{:>2}. {:<16} {:>8}  (level {})", i + 1, entry.name, entry.score, entry.level);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser front end; the library is the product on wasm
}
