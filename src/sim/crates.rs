//! Drifting crates that split when destroyed

use std::f32::consts::TAU;
use std::ops::RangeInclusive;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bullet::Damageable;
use super::collision::ObbCollider;
use super::particle::Particle;
use super::pool::Pool;
use super::sprite::{BlitStyle, Canvas, Sprite, atlas};
use super::state::Stage;
use crate::consts::*;
use crate::{direction_from_angle, wrap_position};

/// Half-size of the keep-out band around the player's spawn point
const SPACE_FOR_PLAYER: f32 = 50.0;
/// Extra speed per level above the first
const SPEED_PER_LEVEL: f32 = 0.2;
/// Maximum spin per frame (degrees)
const MAX_SPIN_DEGREES: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrateTier {
    Large,
    Medium,
    Small,
}

impl CrateTier {
    pub fn max_hp(self) -> i32 {
        match self {
            CrateTier::Large => 100,
            CrateTier::Medium => 50,
            CrateTier::Small => 25,
        }
    }

    fn base_speed(self) -> (f32, f32) {
        match self {
            CrateTier::Large => (1.0, 1.5),
            CrateTier::Medium => (1.5, 2.0),
            CrateTier::Small => (2.0, 2.5),
        }
    }

    /// The tier of the two crates left behind
    pub fn split(self) -> Option<CrateTier> {
        match self {
            CrateTier::Large => Some(CrateTier::Medium),
            CrateTier::Medium => Some(CrateTier::Small),
            CrateTier::Small => None,
        }
    }

    pub fn scrap_count(self) -> RangeInclusive<u32> {
        match self {
            CrateTier::Large => 7..=9,
            CrateTier::Medium => 3..=5,
            CrateTier::Small => 1..=3,
        }
    }

    /// How far from the centre scrap is scattered
    fn scrap_spread(self) -> f32 {
        match self {
            CrateTier::Large => 20.0,
            CrateTier::Medium => 15.0,
            CrateTier::Small => 10.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Crate {
    pub pos: Vec2,
    pub speed: f32,
    /// Unit travel direction
    pub dir: Vec2,
    /// Rotation in radians
    pub angle: f32,
    /// Spin per frame in radians
    pub angle_speed: f32,
    pub hp: i32,
    pub tier: CrateTier,
    pub time_since_damaged: i32,
    pub sprite: Sprite,
    pub flash_sprite: Sprite,
    pub collider: ObbCollider,
}

impl Crate {
    /// A fresh crate that never starts out heading at `player_pos`
    pub fn new(tier: CrateTier, pos: Vec2, level: u32, player_pos: Vec2, rng: &mut Pcg32) -> Self {
        let bonus = level.saturating_sub(1) as f32 * SPEED_PER_LEVEL;
        let (lo, hi) = tier.base_speed();
        let speed = rng.random_range(lo + bonus..hi + bonus);
        let angle = rng.random_range(0.0..TAU);
        let spin = MAX_SPIN_DEGREES.to_radians();
        let angle_speed = rng.random_range(-spin..spin);

        // Away from or tangential to the player
        let mut dir = direction_from_angle(rng.random_range(0.0..TAU));
        if dir.dot(pos - player_pos) < 0.0 {
            dir = -dir;
        }

        let sprite = atlas::crate_body(tier);
        let half = sprite.size * 0.45;
        Self {
            pos,
            speed,
            dir,
            angle,
            angle_speed,
            hp: tier.max_hp(),
            tier,
            time_since_damaged: END_OF_FLASH,
            collider: ObbCollider::new(half.x, half.y, pos, angle),
            flash_sprite: atlas::crate_flash(tier),
            sprite,
        }
    }
}

impl Damageable for Crate {
    fn collider(&self) -> &ObbCollider {
        &self.collider
    }

    fn take_hit(&mut self, damage: i32) {
        self.hp -= damage;
        self.time_since_damaged = 0;
    }
}

/// Random spawn point in one screen quadrant, clear of the centre band
fn spawn_point(rng: &mut Pcg32) -> Vec2 {
    let half_w = SCREEN_WIDTH * 0.5;
    let half_h = SCREEN_HEIGHT * 0.5;
    let x = if rng.random_bool(0.5) {
        rng.random_range(0.0..half_w - SPACE_FOR_PLAYER)
    } else {
        rng.random_range(half_w + SPACE_FOR_PLAYER..SCREEN_WIDTH)
    };
    let y = if rng.random_bool(0.5) {
        rng.random_range(0.0..half_h - SPACE_FOR_PLAYER)
    } else {
        rng.random_range(half_h + SPACE_FOR_PLAYER..SCREEN_HEIGHT)
    };
    Vec2::new(x, y)
}

/// Add `count` large crates for the current level
pub fn spawn_crates(stage: &mut Stage, count: u32) {
    for _ in 0..count {
        let pos = spawn_point(&mut stage.rng);
        let c = Crate::new(CrateTier::Large, pos, stage.level, stage.player.pos, &mut stage.rng);
        stage.crates.push_back(c);
    }
    log::debug!("Spawned {} crates for level {}", count, stage.level);
}

/// Scatter `count` pieces of scrap around `center`
pub fn drop_scrap(particles: &mut Pool<Particle>, rng: &mut Pcg32, center: Vec2, count: u32, spread: f32) {
    for _ in 0..count {
        let jitter = Vec2::new(
            rng.random_range(-spread..spread),
            rng.random_range(-spread..spread),
        );
        particles.push_back(Particle::scrap(rng, center + jitter));
    }
}

/// Move, spin and wrap crates; split the ones out of hit points
pub fn update_crates(stage: &mut Stage) {
    let Stage {
        crates,
        particles,
        player,
        rng,
        level,
        ..
    } = stage;
    let level = *level;

    // Children join the pool once the walk is done
    let mut children = Vec::new();

    crates.retain_mut(|c| {
        c.angle += c.angle_speed;
        c.pos += c.dir * c.speed;
        c.pos = wrap_position(c.pos, c.sprite.size * SCREENWRAP_MARGIN);
        c.collider.update(c.pos, Some(c.angle), None);
        c.time_since_damaged = c.time_since_damaged.saturating_add(1);

        if c.hp > 0 {
            return true;
        }

        if let Some(child) = c.tier.split() {
            for _ in 0..2 {
                children.push(Crate::new(child, c.pos, level, player.pos, rng));
            }
        }
        let scrap = rng.random_range(c.tier.scrap_count());
        drop_scrap(particles, rng, c.pos, scrap, c.tier.scrap_spread());
        particles.push_back(Particle::explosion(rng, c.pos));

        log::debug!("{:?} crate destroyed at {:?}, {} scrap", c.tier, c.pos, scrap);
        false
    });

    crates.extend(children);
}

pub fn draw_crates(crates: &Pool<Crate>, canvas: &mut dyn Canvas, debug: bool) {
    for c in crates.iter() {
        canvas.blit(&c.sprite, c.pos, c.angle, BlitStyle::default());
        if c.time_since_damaged < END_OF_FLASH {
            // Flash fades out over END_OF_FLASH frames
            let alpha = 255 * (END_OF_FLASH - c.time_since_damaged) / END_OF_FLASH;
            canvas.blit(&c.flash_sprite, c.pos, c.angle, BlitStyle::alpha(alpha as u8));
        }
        if debug {
            canvas.debug_box(c.collider.corners());
        }
    }
}
