//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (one tick per frame)
//! - Seeded RNG only
//! - Stable iteration order (pool order = spawn order)
//! - No rendering or platform dependencies; drawing goes through `Canvas`

pub mod bullet;
pub mod collision;
pub mod crates;
pub mod enemy;
pub mod particle;
pub mod player;
pub mod pool;
pub mod sprite;
pub mod state;
pub mod tick;
pub mod vector;

pub use bullet::{Bullet, BulletKind, Damageable, WeaponKind};
pub use collision::{ObbCollider, intersects};
pub use crates::{Crate, CrateTier};
pub use enemy::{Enemy, EnemyState};
pub use particle::{Particle, ParticleBehavior, spawn_particle};
pub use player::{Player, PlayerState};
pub use pool::{Handle, Pool};
pub use sprite::{BlitStyle, Canvas, DrawCommand, DrawList, Sprite};
pub use state::{
    AudioSink, GameEvent, MusicCue, SoundChannel, SoundCue, SoundEffect, Stage, StagePhase,
};
pub use tick::{Button, InputSnapshot, advance_level, draw, resume, submit_highscore, tick, try_again};
