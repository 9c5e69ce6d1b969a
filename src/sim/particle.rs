//! Particles: one pool for every short-lived visual and pickup
//!
//! Behaviour is a closed enum rather than per-particle callbacks. `step`
//! runs during the update pass and may spawn more particles into the
//! context's `spawned` buffer; `render` is read-only.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::bullet::WeaponKind;
use super::player::{Player, PlayerState};
use super::pool::{Handle, Pool};
use super::sprite::{BlitStyle, Canvas, Flip, Sprite, atlas};
use super::state::{GameEvent, SoundChannel, SoundEffect, Stage};
use super::vector::squared_distance;
use crate::consts::*;
use crate::{direction_from_angle, pan_for, wrap_position};

const SCRAP_ACCEL: f32 = 0.3;
const SCRAP_MAX_SPEED: f32 = 5.0;
const SCRAP_VALUE: u64 = 5;
const SCRAP_WRAP_MARGIN: f32 = 8.0;
const SCRAP_COLLECT_DISTANCE: f32 = 25.0;

/// Powerups only drift toward a player this close
const POWERUP_MOVE_DISTANCE: f32 = 100.0;
const POWERUP_ACCEL: f32 = 0.5;
const POWERUP_MAX_SPEED: f32 = 5.0;
const POWERUP_WRAP_MARGIN: f32 = 16.0;
const POWERUP_COLLECT_DISTANCE: f32 = 25.0;
/// Scrap showered on a player already at full health
const POWERUP_BONUS_SCRAP: u32 = 20;
const POWERUP_BONUS_SPREAD: f32 = 40.0;

/// Height of the reward text above the player
const INFO_TEXT_OFFSET: f32 = 50.0;

/// Who positions a muzzle flash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuzzleAnchor {
    /// Follows the player's nose
    Player,
    /// Placed by the owning enemy each frame
    Enemy,
}

/// What a collected powerup paid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reward {
    Hp,
    Scrap,
}

impl Reward {
    pub fn label(self) -> &'static str {
        match self {
            Reward::Hp => "+HP!",
            Reward::Scrap => "+SCRAP!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleBehavior {
    /// Bullet impact: drifts by its delta until the animation ends
    Impact,
    /// Crate, enemy or player explosion
    Explosion,
    /// Homes in on the player and scores when touched
    Scrap,
    /// Weapon pickup that drifts toward a nearby player
    Powerup(WeaponKind),
    /// Ring around the player after a pickup
    CollectShockwave,
    /// Floating reward text
    InfoText(Reward),
    MuzzleFlash(MuzzleAnchor),
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    /// Per-frame movement
    pub delta: Vec2,
    pub angle: f32,
    /// Removed once this reaches zero; only behaviours change it
    pub ttl: i32,
    pub sprite: Option<Sprite>,
    pub behavior: ParticleBehavior,
}

/// Everything a particle may touch while stepping
pub struct ParticleContext<'a> {
    pub player: &'a mut Player,
    pub score: &'a mut u64,
    pub events: &'a mut Vec<GameEvent>,
    pub rng: &'a mut Pcg32,
    /// Particles created mid-walk, appended after it
    pub spawned: &'a mut Vec<Particle>,
}

impl Particle {
    fn with_sprite(sprite: Sprite, pos: Vec2, angle: f32, behavior: ParticleBehavior) -> Self {
        Self {
            pos,
            delta: Vec2::ZERO,
            angle,
            ttl: 1,
            sprite: Some(sprite),
            behavior,
        }
    }

    pub fn impact(sprite: Sprite, pos: Vec2, angle: f32) -> Self {
        Self::with_sprite(sprite, pos, angle, ParticleBehavior::Impact)
    }

    /// Explosion at a random right-angle rotation
    pub fn explosion(rng: &mut Pcg32, pos: Vec2) -> Self {
        let angle = rng.random_range(0..4) as f32 * FRAC_PI_2;
        Self::with_sprite(atlas::explosion(), pos, angle, ParticleBehavior::Explosion)
    }

    pub fn scrap(rng: &mut Pcg32, pos: Vec2) -> Self {
        let sprite = atlas::scrap(rng.random_range(0..4), rng.random_range(0.1..0.5));
        let angle = rng.random_range(0.0..TAU);
        Self::with_sprite(sprite, pos, angle, ParticleBehavior::Scrap)
    }

    /// A powerup for any weapon other than `current`, kept on screen
    pub fn powerup(rng: &mut Pcg32, pos: Vec2, current: WeaponKind) -> Self {
        let choices: Vec<WeaponKind> = WeaponKind::ALL
            .into_iter()
            .filter(|&w| w != current)
            .collect();
        let weapon = choices[rng.random_range(0..choices.len())];

        let half = atlas::powerup_cell().size * 0.5;
        let pos = pos.clamp(half, Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT) - half);
        Self::with_sprite(atlas::powerup(weapon), pos, 0.0, ParticleBehavior::Powerup(weapon))
    }

    pub fn collect_shockwave(pos: Vec2) -> Self {
        Self::with_sprite(atlas::collect_shockwave(), pos, 0.0, ParticleBehavior::CollectShockwave)
    }

    pub fn info_text(reward: Reward, player_pos: Vec2) -> Self {
        Self {
            pos: player_pos - Vec2::new(0.0, INFO_TEXT_OFFSET),
            delta: Vec2::ZERO,
            angle: 0.0,
            ttl: FPS,
            sprite: None,
            behavior: ParticleBehavior::InfoText(reward),
        }
    }

    pub fn muzzle_flash(sprite: Sprite, anchor: MuzzleAnchor) -> Self {
        Self::with_sprite(sprite, Vec2::ZERO, 0.0, ParticleBehavior::MuzzleFlash(anchor))
    }

    /// Scrap and powerups are cleared between levels
    pub fn is_level_pickup(&self) -> bool {
        matches!(
            self.behavior,
            ParticleBehavior::Scrap | ParticleBehavior::Powerup(_)
        )
    }

    fn animation_done(&self) -> bool {
        self.sprite.as_ref().is_none_or(Sprite::is_finished)
    }

    fn advance_animation(&mut self) {
        if let Some(sprite) = self.sprite.as_mut() {
            sprite.advance();
        }
    }

    pub fn step(&mut self, ctx: &mut ParticleContext<'_>) {
        match self.behavior {
            ParticleBehavior::Impact => {
                self.pos += self.delta;
                self.advance_animation();
                if self.animation_done() {
                    self.ttl = 0;
                }
            }
            ParticleBehavior::Explosion | ParticleBehavior::CollectShockwave => {
                if self.behavior == ParticleBehavior::CollectShockwave {
                    self.pos = ctx.player.pos;
                }
                self.advance_animation();
                if self.animation_done() {
                    self.ttl = 0;
                }
            }
            ParticleBehavior::Scrap => self.step_scrap(ctx),
            ParticleBehavior::Powerup(weapon) => self.step_powerup(weapon, ctx),
            ParticleBehavior::InfoText(_) => {
                self.pos = ctx.player.pos - Vec2::new(0.0, INFO_TEXT_OFFSET);
                self.ttl -= 1;
            }
            ParticleBehavior::MuzzleFlash(anchor) => {
                self.advance_animation();
                if anchor == MuzzleAnchor::Player && !self.animation_done() {
                    self.angle = ctx.player.angle;
                    self.pos = ctx.player.pos
                        + direction_from_angle(ctx.player.angle) * (BULLET_OFFSET_PLAYER + 4.0);
                }
            }
        }
    }

    fn step_scrap(&mut self, ctx: &mut ParticleContext<'_>) {
        let target = ctx.player.pos;
        self.delta.x = home_axis(self.delta.x, self.pos.x, target.x, SCRAP_ACCEL, SCRAP_MAX_SPEED);
        self.delta.y = home_axis(self.delta.y, self.pos.y, target.y, SCRAP_ACCEL, SCRAP_MAX_SPEED);
        self.pos = wrap_position(self.pos + self.delta, Vec2::splat(SCRAP_WRAP_MARGIN));
        self.advance_animation();

        if ctx.player.state != PlayerState::Destroyed
            && squared_distance(self.pos, target) < SCRAP_COLLECT_DISTANCE * SCRAP_COLLECT_DISTANCE
        {
            *ctx.score += SCRAP_VALUE;
            self.ttl = 0;
        }
    }

    fn step_powerup(&mut self, weapon: WeaponKind, ctx: &mut ParticleContext<'_>) {
        let target = ctx.player.pos;
        let alive = ctx.player.state != PlayerState::Destroyed;
        let dist_sq = squared_distance(self.pos, target);

        if alive && dist_sq < POWERUP_MOVE_DISTANCE * POWERUP_MOVE_DISTANCE {
            self.delta.x = home_axis(self.delta.x, self.pos.x, target.x, POWERUP_ACCEL, POWERUP_MAX_SPEED);
            self.delta.y = home_axis(self.delta.y, self.pos.y, target.y, POWERUP_ACCEL, POWERUP_MAX_SPEED);
        } else {
            self.delta.x = brake(self.delta.x, POWERUP_ACCEL);
            self.delta.y = brake(self.delta.y, POWERUP_ACCEL);
        }
        self.pos = wrap_position(self.pos + self.delta, Vec2::splat(POWERUP_WRAP_MARGIN));

        if !alive
            || squared_distance(self.pos, target)
                >= POWERUP_COLLECT_DISTANCE * POWERUP_COLLECT_DISTANCE
        {
            return;
        }

        let player = &mut *ctx.player;
        ctx.spawned.push(Particle::collect_shockwave(player.pos));
        ctx.events.push(GameEvent::sound(
            SoundEffect::PowerUp,
            SoundChannel::Any,
            pan_for(self.pos.x),
        ));
        ctx.events.push(GameEvent::PowerupCollected(weapon));

        player.weapon = weapon;
        player.time_since_powerup = 0;

        let reward = if player.hp < PLAYER_HP_MAX {
            player.hp += 1;
            Reward::Hp
        } else {
            for _ in 0..POWERUP_BONUS_SCRAP {
                let jitter = Vec2::new(
                    ctx.rng.random_range(-POWERUP_BONUS_SPREAD..POWERUP_BONUS_SPREAD),
                    ctx.rng.random_range(-POWERUP_BONUS_SPREAD..POWERUP_BONUS_SPREAD),
                );
                ctx.spawned.push(Particle::scrap(ctx.rng, player.pos + jitter));
            }
            Reward::Scrap
        };
        ctx.spawned.push(Particle::info_text(reward, player.pos));
        log::debug!("Powerup collected: {:?} ({:?})", weapon, reward);

        self.ttl = 0;
    }

    pub fn render(&self, canvas: &mut dyn Canvas, timer: u64) {
        match self.behavior {
            ParticleBehavior::Impact
            | ParticleBehavior::Explosion
            | ParticleBehavior::MuzzleFlash(_) => {
                if let Some(sprite) = self.sprite.as_ref().filter(|s| !s.is_finished()) {
                    canvas.blit(sprite, self.pos, self.angle, BlitStyle::default());
                }
            }
            ParticleBehavior::Scrap => {
                if let Some(sprite) = &self.sprite {
                    canvas.blit(sprite, self.pos, self.angle, BlitStyle::default());
                }
            }
            ParticleBehavior::Powerup(_) => {
                canvas.blit(&atlas::powerup_cell(), self.pos, 0.0, BlitStyle::default());
                let blink = ((timer as f32 / 5.0).sin() * 127.0 + 127.0) as u8;
                canvas.blit(&atlas::powerup_shine(), self.pos, 0.0, BlitStyle::alpha(blink));
                if let Some(sprite) = &self.sprite {
                    canvas.blit(sprite, self.pos, self.angle, BlitStyle::default());
                }
            }
            ParticleBehavior::CollectShockwave => {
                let Some(sprite) = self.sprite.as_ref().filter(|s| !s.is_finished()) else {
                    return;
                };
                // One quadrant mirrored into a full ring around `pos`
                let half = sprite.size * 0.5;
                let quadrants = [
                    (Vec2::new(-half.x, -half.y), Flip::None),
                    (Vec2::new(half.x, -half.y), Flip::Horizontal),
                    (Vec2::new(-half.x, half.y), Flip::Vertical),
                    (Vec2::new(half.x, half.y), Flip::Both),
                ];
                for (offset, flip) in quadrants {
                    let style = BlitStyle {
                        flip,
                        ..Default::default()
                    };
                    canvas.blit(sprite, self.pos + offset, self.angle, style);
                }
            }
            ParticleBehavior::InfoText(reward) => {
                if self.ttl % 20 > 5 {
                    canvas.text(reward.label(), self.pos);
                }
            }
        }
    }
}

/// Accelerate one velocity component toward `target`
fn home_axis(delta: f32, pos: f32, target: f32, accel: f32, max: f32) -> f32 {
    if target < pos {
        (delta - accel).max(-max)
    } else {
        (delta + accel).min(max)
    }
}

/// Slow one velocity component toward zero
fn brake(delta: f32, accel: f32) -> f32 {
    if delta < 0.0 {
        (delta + accel).min(0.0)
    } else {
        (delta - accel).max(0.0)
    }
}

/// Append a particle to the pool
pub fn spawn_particle(
    particles: &mut Pool<Particle>,
    sprite: Option<Sprite>,
    pos: Vec2,
    delta: Vec2,
    angle: f32,
    ttl: i32,
    behavior: ParticleBehavior,
) -> Handle {
    particles.push_back(Particle {
        pos,
        delta,
        angle,
        ttl,
        sprite,
        behavior,
    })
}

pub fn update_particles(stage: &mut Stage) {
    let Stage {
        particles,
        player,
        score,
        events,
        rng,
        ..
    } = stage;

    let mut spawned = Vec::new();
    let mut ctx = ParticleContext {
        player,
        score,
        events,
        rng,
        spawned: &mut spawned,
    };
    particles.retain_mut(|p| {
        p.step(&mut ctx);
        p.ttl > 0
    });
    particles.extend(spawned);
}

pub fn draw_particles(particles: &Pool<Particle>, canvas: &mut dyn Canvas, timer: u64) {
    for particle in particles.iter() {
        particle.render(canvas, timer);
    }
}

/// Drop leftover scrap and powerups before a new level
pub fn expire_level_pickups(particles: &mut Pool<Particle>) {
    particles.for_each_mut(|p| {
        if p.is_level_pickup() {
            p.ttl = 0;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::sprite::{DrawCommand, DrawList};
    use rand::SeedableRng;

    fn bare_stage() -> Stage {
        let mut stage = Stage::new(21);
        stage.crates.clear();
        stage.particles.clear();
        stage.player.muzzle = None;
        stage
    }

    #[test]
    fn test_scrap_homes_and_scores() {
        let mut stage = bare_stage();
        let start = stage.player.pos + Vec2::new(60.0, 0.0);
        let mut rng = Pcg32::seed_from_u64(1);
        stage.particles.push_back(Particle::scrap(&mut rng, start));

        update_particles(&mut stage);
        let scrap = stage.particles.iter().next().unwrap();
        assert!(scrap.pos.x < start.x);
        assert!((scrap.delta.x + SCRAP_ACCEL).abs() < 1e-6);

        for _ in 0..60 {
            update_particles(&mut stage);
        }
        assert!(stage.particles.is_empty());
        assert_eq!(stage.score, SCRAP_VALUE);
    }

    #[test]
    fn test_scrap_ignored_by_destroyed_player() {
        let mut stage = bare_stage();
        stage.player.state = PlayerState::Destroyed;
        let mut rng = Pcg32::seed_from_u64(1);
        stage.particles.push_back(Particle::scrap(&mut rng, stage.player.pos));
        update_particles(&mut stage);
        assert_eq!(stage.particles.len(), 1);
        assert_eq!(stage.score, 0);
    }

    #[test]
    fn test_powerup_is_never_current_weapon_and_on_screen() {
        let mut rng = Pcg32::seed_from_u64(4);
        for _ in 0..100 {
            let p = Particle::powerup(&mut rng, Vec2::new(-50.0, 1000.0), WeaponKind::Bouncer);
            assert_ne!(p.behavior, ParticleBehavior::Powerup(WeaponKind::Bouncer));
            assert_eq!(p.pos, Vec2::new(16.0, SCREEN_HEIGHT - 16.0));
        }
    }

    #[test]
    fn test_powerup_heals_damaged_player() {
        let mut stage = bare_stage();
        stage.player.hp = 1;
        let pos = stage.player.pos;
        stage.particles.push_back(Particle::with_sprite(
            atlas::powerup(WeaponKind::Shotgun),
            pos,
            0.0,
            ParticleBehavior::Powerup(WeaponKind::Shotgun),
        ));

        update_particles(&mut stage);

        assert_eq!(stage.player.hp, 2);
        assert_eq!(stage.player.weapon, WeaponKind::Shotgun);
        assert_eq!(stage.player.time_since_powerup, 0);
        let kinds: Vec<ParticleBehavior> = stage.particles.iter().map(|p| p.behavior).collect();
        assert_eq!(
            kinds,
            vec![
                ParticleBehavior::CollectShockwave,
                ParticleBehavior::InfoText(Reward::Hp)
            ]
        );
        assert!(stage.events.contains(&GameEvent::PowerupCollected(WeaponKind::Shotgun)));
    }

    #[test]
    fn test_powerup_pays_scrap_at_full_health() {
        let mut stage = bare_stage();
        let pos = stage.player.pos + Vec2::new(10.0, 0.0);
        stage.particles.push_back(Particle::with_sprite(
            atlas::powerup(WeaponKind::Erratic),
            pos,
            0.0,
            ParticleBehavior::Powerup(WeaponKind::Erratic),
        ));

        update_particles(&mut stage);

        assert_eq!(stage.player.hp, PLAYER_HP_MAX);
        let scrap = stage
            .particles
            .iter()
            .filter(|p| p.behavior == ParticleBehavior::Scrap)
            .count();
        assert_eq!(scrap, POWERUP_BONUS_SCRAP as usize);
        assert!(
            stage
                .particles
                .iter()
                .any(|p| p.behavior == ParticleBehavior::InfoText(Reward::Scrap))
        );
    }

    #[test]
    fn test_powerup_brakes_when_far() {
        let mut stage = bare_stage();
        let mut p = Particle::powerup(&mut stage.rng, Vec2::new(30.0, 30.0), WeaponKind::Normal);
        p.delta = Vec2::new(1.2, -0.3);
        stage.particles.push_back(p);
        update_particles(&mut stage);
        let p = stage.particles.iter().next().unwrap();
        assert!((p.delta.x - 0.7).abs() < 1e-6);
        assert_eq!(p.delta.y, 0.0);
    }

    #[test]
    fn test_info_text_blinks_and_expires() {
        let mut stage = bare_stage();
        stage.particles.push_back(Particle::info_text(Reward::Hp, stage.player.pos));

        let mut shown = 0;
        for _ in 0..FPS {
            let mut list = DrawList::new();
            draw_particles(&stage.particles, &mut list, 0);
            if list
                .commands
                .iter()
                .any(|c| matches!(c, DrawCommand::Text { text, .. } if text == "+HP!"))
            {
                shown += 1;
            }
            update_particles(&mut stage);
        }
        assert!(stage.particles.is_empty());
        assert!(shown > 0 && shown < FPS);
    }

    #[test]
    fn test_explosion_expires_after_animation() {
        let mut stage = bare_stage();
        let mut rng = Pcg32::seed_from_u64(2);
        stage.particles.push_back(Particle::explosion(&mut rng, Vec2::new(10.0, 10.0)));
        for _ in 0..13 {
            update_particles(&mut stage);
        }
        assert_eq!(stage.particles.len(), 1);
        update_particles(&mut stage);
        assert!(stage.particles.is_empty());
    }

    #[test]
    fn test_expire_level_pickups() {
        let mut stage = bare_stage();
        let mut rng = Pcg32::seed_from_u64(3);
        stage.particles.push_back(Particle::scrap(&mut rng, Vec2::new(500.0, 50.0)));
        stage.particles.push_back(Particle::explosion(&mut rng, Vec2::new(10.0, 10.0)));
        stage
            .particles
            .push_back(Particle::powerup(&mut rng, Vec2::new(30.0, 300.0), WeaponKind::Normal));
        expire_level_pickups(&mut stage.particles);
        let ttls: Vec<i32> = stage.particles.iter().map(|p| p.ttl).collect();
        assert_eq!(ttls, vec![0, 1, 0]);
    }

    #[test]
    fn test_spawn_particle_returns_live_handle() {
        let mut pool = Pool::new();
        let handle = spawn_particle(
            &mut pool,
            None,
            Vec2::ONE,
            Vec2::X,
            0.0,
            3,
            ParticleBehavior::Impact,
        );
        assert_eq!(pool.get(handle).map(|p| p.ttl), Some(3));
    }
}
