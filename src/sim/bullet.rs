//! Bullets: per-weapon spawning, motion, hits and expiry

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{ObbCollider, bounce_normal, intersects, reflect_velocity};
use super::particle::Particle;
use super::player::PlayerState;
use super::pool::Pool;
use super::sprite::{BlitStyle, Canvas, Sprite, atlas};
use super::state::{GameEvent, SoundChannel, SoundEffect, Stage};
use crate::consts::*;
use crate::{angle_of, direction_from_angle, pan_for, wrap_position};

/// Per-frame speed gain for erratic bullets
const ERRATIC_ACCEL: f32 = 0.08;
/// Per-frame speed loss for shotgun pellets
const SHOTGUN_DECEL: f32 = 0.12;
/// Shotgun pellets vanish at or below this speed
const SHOTGUN_DESPAWN_SPEED: f32 = 1.0;
/// Spread for erratic and shotgun fire (degrees either side)
const SPREAD_DEGREES: f32 = 30.0;

/// Weapons the player can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeaponKind {
    #[default]
    Normal,
    Erratic,
    Bouncer,
    Shotgun,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 4] = [
        WeaponKind::Normal,
        WeaponKind::Erratic,
        WeaponKind::Bouncer,
        WeaponKind::Shotgun,
    ];

    /// Name shown on the HUD
    pub fn label(self) -> &'static str {
        match self {
            WeaponKind::Normal => "NORMAL",
            WeaponKind::Erratic => "ERRATIC",
            WeaponKind::Bouncer => "BOUNCER",
            WeaponKind::Shotgun => "SHOTGUN",
        }
    }

    pub fn bullet_kind(self) -> BulletKind {
        match self {
            WeaponKind::Normal => BulletKind::Normal,
            WeaponKind::Erratic => BulletKind::Erratic,
            WeaponKind::Bouncer => BulletKind::Bouncer,
            WeaponKind::Shotgun => BulletKind::Shotgun,
        }
    }
}

/// What fired a bullet, and so how it behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletKind {
    Normal,
    Erratic,
    Bouncer,
    Shotgun,
    Enemy,
}

impl BulletKind {
    /// Damage dealt to crates and enemies. Enemy bullets only ever hurt the
    /// player, for one hit point.
    pub fn damage(self) -> i32 {
        match self {
            BulletKind::Normal => 20,
            BulletKind::Erratic => 8,
            BulletKind::Bouncer => 12,
            BulletKind::Shotgun => 15,
            BulletKind::Enemy => 25,
        }
    }

    pub fn is_enemy(self) -> bool {
        self == BulletKind::Enemy
    }

    /// Collider size as a fraction of the sprite
    fn collider_scale(self) -> f32 {
        if self.is_enemy() { 0.4 } else { 0.5 }
    }

    /// Rotation of the impact sprite relative to the bullet
    fn impact_angle_offset(self) -> f32 {
        match self {
            BulletKind::Normal | BulletKind::Enemy => 90f32.to_radians(),
            BulletKind::Erratic => 45f32.to_radians(),
            BulletKind::Bouncer => (-45f32).to_radians(),
            BulletKind::Shotgun => 0.0,
        }
    }
}

/// Something a player bullet can damage
pub trait Damageable {
    fn collider(&self) -> &ObbCollider;
    fn take_hit(&mut self, damage: i32);
    /// Whether bullets may currently hit this
    fn targetable(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct Bullet {
    pub pos: Vec2,
    pub speed: f32,
    /// Sprite rotation in radians
    pub angle: f32,
    /// Unit travel direction
    pub dir: Vec2,
    pub ttl: i32,
    pub kind: BulletKind,
    pub sprite: Sprite,
    pub collider: ObbCollider,
}

impl Bullet {
    /// A bullet leaving `origin` along `dir`, spawned `offset` pixels out
    pub fn new(kind: BulletKind, origin: Vec2, dir: Vec2, offset: f32, speed: f32, ttl: i32) -> Self {
        let pos = origin + dir * offset;
        let angle = angle_of(dir);
        let sprite = atlas::bullet(kind);
        let half = sprite.size * kind.collider_scale();
        Self {
            pos,
            speed,
            angle,
            dir,
            ttl,
            kind,
            collider: ObbCollider::new(half.x, half.y, pos, angle),
            sprite,
        }
    }

    pub fn velocity(&self) -> Vec2 {
        self.dir * self.speed
    }

    /// Mirror off `target` and step clear of it
    fn bounce_off(&mut self, target: &ObbCollider) {
        let normal = bounce_normal(target, self.collider.origin);
        let reflected = reflect_velocity(self.velocity(), normal);
        let dir = reflected.normalize_or_zero();
        if dir != Vec2::ZERO {
            self.dir = dir;
            self.angle = angle_of(dir);
        }
        self.pos += self.velocity();
        self.collider.update(self.pos, Some(self.angle), None);
    }

    fn impact_particle(&self) -> Particle {
        Particle::impact(
            atlas::impact(self.kind),
            self.pos,
            self.angle + self.kind.impact_angle_offset(),
        )
    }
}

fn spread(rng: &mut Pcg32, angle: f32) -> f32 {
    angle + rng.random_range(-SPREAD_DEGREES..SPREAD_DEGREES).to_radians()
}

/// Fire the player's weapon from `origin` toward `angle`; returns the
/// reload the player must wait
pub fn fire_player_weapon(
    bullets: &mut Pool<Bullet>,
    rng: &mut Pcg32,
    weapon: WeaponKind,
    origin: Vec2,
    angle: f32,
) -> i32 {
    let kind = weapon.bullet_kind();
    match weapon {
        WeaponKind::Normal => {
            let dir = direction_from_angle(angle);
            bullets.push_back(Bullet::new(kind, origin, dir, BULLET_OFFSET_PLAYER, 6.0, FPS * 3));
            10
        }
        WeaponKind::Erratic => {
            let dir = direction_from_angle(spread(rng, angle));
            let speed = 4.0 + rng.random_range(-2.0..2.0);
            let mut bullet = Bullet::new(kind, origin, dir, BULLET_OFFSET_PLAYER, speed, FPS * 2);
            bullet.angle = rng.random_range(0.0..TAU);
            bullet.collider.update(bullet.pos, Some(bullet.angle), None);
            bullets.push_back(bullet);
            4
        }
        WeaponKind::Bouncer => {
            let dir = direction_from_angle(angle);
            bullets.push_back(Bullet::new(kind, origin, dir, BULLET_OFFSET_PLAYER, 8.0, FPS * 4));
            30
        }
        WeaponKind::Shotgun => {
            let pellets = rng.random_range(8..=10);
            for _ in 0..pellets {
                let dir = direction_from_angle(spread(rng, angle));
                let speed = 10.0 + rng.random_range(-1.0..1.0);
                bullets.push_back(Bullet::new(kind, origin, dir, BULLET_OFFSET_PLAYER, speed, FPS * 5));
            }
            40
        }
    }
}

/// Fire an enemy bullet; returns the enemy's reload
pub fn fire_enemy_bullet(bullets: &mut Pool<Bullet>, origin: Vec2, angle: f32) -> i32 {
    let dir = direction_from_angle(angle);
    bullets.push_back(Bullet::new(BulletKind::Enemy, origin, dir, BULLET_OFFSET_ENEMY, 3.0, FPS * 4));
    FPS * 3
}

/// Apply a player bullet to one target if they overlap
fn strike<T: Damageable>(
    bullet: &mut Bullet,
    target: &mut T,
    particles: &mut Pool<Particle>,
    events: &mut Vec<GameEvent>,
) {
    if !target.targetable() || !intersects(&bullet.collider, target.collider()) {
        return;
    }

    target.take_hit(bullet.kind.damage());
    match bullet.kind {
        BulletKind::Bouncer => {
            particles.push_back(bullet.impact_particle());
            bullet.bounce_off(target.collider());
        }
        _ => bullet.ttl = 0,
    }
    events.push(GameEvent::sound_isolated(
        SoundEffect::EnemyHit,
        SoundChannel::HitSounds,
        pan_for(bullet.pos.x),
    ));
}

/// Advance every bullet one frame, resolve hits and drop expired ones
pub fn update_bullets(stage: &mut Stage) {
    let Stage {
        bullets,
        crates,
        enemies,
        particles,
        player,
        events,
        ..
    } = stage;

    bullets.retain_mut(|bullet| {
        bullet.pos += bullet.velocity();

        match bullet.kind {
            BulletKind::Erratic => bullet.speed += ERRATIC_ACCEL,
            BulletKind::Shotgun => {
                bullet.speed -= SHOTGUN_DECEL;
                if bullet.speed <= SHOTGUN_DESPAWN_SPEED {
                    bullet.ttl = 0;
                }
            }
            _ => {}
        }

        bullet.pos = wrap_position(bullet.pos, bullet.sprite.size * SCREENWRAP_MARGIN);
        bullet.collider.update(bullet.pos, Some(bullet.angle), None);
        bullet.sprite.advance();

        if bullet.kind.is_enemy() {
            if player.state != PlayerState::Destroyed
                && intersects(&bullet.collider, &player.collider)
            {
                player.take_hit(events, bullet.pos.x);
                bullet.ttl = 0;
            }
        } else {
            crates.for_each_mut(|target| strike(bullet, target, particles, events));
            enemies.for_each_mut(|target| strike(bullet, target, particles, events));
        }

        bullet.ttl -= 1;
        if bullet.ttl <= 0 {
            particles.push_back(bullet.impact_particle());
            return false;
        }
        true
    });
}

/// Mark every enemy bullet for removal on the next update
pub fn expire_enemy_bullets(bullets: &mut Pool<Bullet>) {
    bullets.for_each_mut(|bullet| {
        if bullet.kind.is_enemy() {
            bullet.ttl = 0;
        }
    });
}

pub fn draw_bullets(bullets: &Pool<Bullet>, canvas: &mut dyn Canvas, debug: bool) {
    for bullet in bullets.iter() {
        // Player bullets are drawn semi-transparent
        let alpha = if bullet.kind.is_enemy() { 255 } else { 127 };
        canvas.blit(&bullet.sprite, bullet.pos, bullet.angle, BlitStyle::alpha(alpha));
        if debug {
            canvas.debug_box(bullet.collider.corners());
        }
    }
}
