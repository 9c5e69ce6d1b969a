//! Stage state and the events it emits
//!
//! `Stage` is the whole simulation context: the four entity pools, the
//! player, counters, timers and the seeded RNG. Subsystems take it by
//! `&mut` and borrow the fields they need.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bullet::{Bullet, WeaponKind};
use super::crates::{Crate, spawn_crates};
use super::enemy::Enemy;
use super::particle::{MuzzleAnchor, Particle};
use super::player::Player;
use super::pool::Pool;
use super::sprite::atlas;
use crate::consts::*;
use crate::highscores::HighScores;
use crate::{screen_center, within_screen};

/// Current phase of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StagePhase {
    /// Short pause so the player can see where the crates are
    #[default]
    Beginning,
    Gameplay,
    /// Level cleared, waiting for fire to continue
    End,
    /// Player destroyed; the field keeps moving for a few seconds
    GameOver,
    /// Score qualified; host collects a name
    InputHighscore,
    HighscoreTable,
    Paused,
}

/// Sound effects the simulation can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEffect {
    EnemyHit,
    EnemyKill,
    PlayerHit,
    PlayerKill,
    /// Player weapon discharge, one sound per weapon
    Shot(WeaponKind),
    PowerUp,
    BigAccept,
}

/// Mixer channel a sound is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundChannel {
    /// First free channel
    Any,
    Player,
    PlayerFire,
    HitSounds,
    Ui,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundCue {
    pub effect: SoundEffect,
    pub channel: SoundChannel,
    pub looping: bool,
    /// 0 = hard left, 255 = hard right
    pub pan: u8,
    /// Cut whatever is already playing on the channel
    pub isolated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicCue {
    /// Looping gameplay theme
    Gameplay,
    Stop,
}

/// Events emitted during a tick, drained by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Sound(SoundCue),
    Music(MusicCue),
    /// Player lost a hit point
    PlayerHurt,
    PowerupCollected(WeaponKind),
    LevelStarted { level: u32 },
    LevelCleared { level: u32, score: u64 },
    GameOver { level: u32, score: u64 },
}

impl SoundCue {
    fn one_shot(effect: SoundEffect, channel: SoundChannel, pan: u8, isolated: bool) -> Self {
        Self {
            effect,
            channel,
            looping: false,
            pan,
            isolated,
        }
    }
}

impl GameEvent {
    /// One-shot sound mixed with whatever is playing
    pub fn sound(effect: SoundEffect, channel: SoundChannel, pan: u8) -> Self {
        Self::Sound(SoundCue::one_shot(effect, channel, pan, false))
    }

    /// One-shot sound that replaces the channel's current sound
    pub fn sound_isolated(effect: SoundEffect, channel: SoundChannel, pan: u8) -> Self {
        Self::Sound(SoundCue::one_shot(effect, channel, pan, true))
    }
}

/// Audio backend the host plugs in
pub trait AudioSink {
    fn play_sound(&mut self, cue: &SoundCue);
    fn play_music(&mut self, cue: MusicCue);
}

/// Complete simulation context
#[derive(Debug, Clone)]
pub struct Stage {
    pub phase: StagePhase,
    /// Current level (1-based once play starts)
    pub level: u32,
    pub score: u64,
    /// Gameplay frames since the session started
    pub timer: u64,
    pub player: Player,
    pub bullets: Pool<Bullet>,
    pub crates: Pool<Crate>,
    pub enemies: Pool<Enemy>,
    pub particles: Pool<Particle>,
    /// Pending events, oldest first
    pub events: Vec<GameEvent>,
    pub rng: Pcg32,
    pub highscores: HighScores,
    /// Frames until the next enemy appears
    pub enemy_spawn_timer: i32,
    /// Frames spent in `Beginning`
    pub stage_start_timer: i32,
    /// Frames spent in `GameOver`
    pub highscore_timer: i32,
    /// Rank of the last submitted score, for highlighting in the table
    pub latest_highscore_rank: Option<usize>,
}

impl Stage {
    /// A fresh session on level 1, waiting in `Beginning`
    pub fn new(seed: u64) -> Self {
        Self::with_highscores(seed, HighScores::new())
    }

    /// Like `new`, keeping a leaderboard loaded by the host
    pub fn with_highscores(seed: u64, highscores: HighScores) -> Self {
        let mut stage = Self {
            phase: StagePhase::Beginning,
            level: 1,
            score: 0,
            timer: 0,
            player: Player::new(screen_center()),
            bullets: Pool::new(),
            crates: Pool::new(),
            enemies: Pool::new(),
            particles: Pool::new(),
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            highscores,
            enemy_spawn_timer: FPS * 15,
            stage_start_timer: 0,
            highscore_timer: 0,
            latest_highscore_rank: None,
        };

        let muzzle = Particle::muzzle_flash(
            atlas::player_muzzle(stage.player.weapon),
            MuzzleAnchor::Player,
        );
        stage.player.muzzle = Some(stage.particles.push_back(muzzle));

        let count = crate_count(stage.level);
        spawn_crates(&mut stage, count);
        stage.events.push(GameEvent::Music(MusicCue::Stop));

        log::info!("Stage created with seed {}", seed);
        stage
    }

    /// Take every pending event
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Send pending audio events to `sink` and return the rest
    pub fn dispatch_audio(&mut self, sink: &mut dyn AudioSink) -> Vec<GameEvent> {
        let mut rest = Vec::new();
        for event in self.drain_events() {
            match event {
                GameEvent::Sound(cue) => sink.play_sound(&cue),
                GameEvent::Music(cue) => sink.play_music(cue),
                other => rest.push(other),
            }
        }
        rest
    }

    /// Whether any enemy is inside the screen grown by half its sprite
    /// plus a pixel
    pub fn enemy_on_screen(&self) -> bool {
        self.enemies.iter().any(|enemy| {
            let margin = enemy.sprite.size * SCREENWRAP_MARGIN + Vec2::ONE;
            within_screen(enemy.pos, margin)
        })
    }

    /// No crates left and nothing hostile in view
    pub fn is_level_cleared(&self) -> bool {
        self.crates.is_empty() && !self.enemy_on_screen()
    }
}

/// Large crates placed at the start of `level`
pub fn crate_count(level: u32) -> u32 {
    1 + 2 * level
}
