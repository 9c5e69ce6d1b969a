//! Enemy gunships: fly in from off screen, then hunt the player

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::bullet::{Damageable, fire_enemy_bullet};
use super::collision::ObbCollider;
use super::crates::drop_scrap;
use super::particle::{MuzzleAnchor, Particle};
use super::pool::{Handle, Pool};
use super::sprite::{BlitStyle, Canvas, Sprite, atlas};
use super::state::{GameEvent, SoundChannel, SoundEffect, Stage};
use crate::consts::*;
use crate::{angle_of, direction_from_angle, pan_for, within_screen, wrap_position};

pub const ENEMY_HP_MAX: i32 = 125;
/// How far outside the screen enemies appear
pub const SPAWN_DISTANCE: f32 = 200.0;
const SCRAP_ON_DEATH: u32 = 10;
const SCRAP_SPREAD: f32 = 20.0;
/// Flame sits this far behind the hull centre
const FLAME_OFFSET: f32 = 28.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyState {
    /// Flying in from off screen; cannot be hit and does not shoot
    Entering,
    Engaging,
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub pos: Vec2,
    pub speed: f32,
    /// Facing in radians
    pub angle: f32,
    pub state: EnemyState,
    /// Unit travel direction, fixed at spawn
    pub dir: Vec2,
    pub reload: i32,
    pub hp: i32,
    pub time_since_damaged: i32,
    pub sprite: Sprite,
    pub flash_sprite: Sprite,
    pub flame_sprite: Sprite,
    pub muzzle: Option<Handle>,
    pub collider: ObbCollider,
}

impl Enemy {
    fn new(pos: Vec2, dir: Vec2, speed: f32, muzzle: Option<Handle>) -> Self {
        let dir = dir.normalize_or_zero();
        let angle = angle_of(dir);
        let sprite = atlas::enemy();
        let half = sprite.size * 0.35;
        Self {
            pos,
            speed,
            angle,
            state: EnemyState::Entering,
            dir,
            reload: FPS * 3,
            hp: ENEMY_HP_MAX,
            time_since_damaged: END_OF_FLASH,
            collider: ObbCollider::new(half.x, half.y, pos, angle),
            flash_sprite: atlas::enemy_flash(),
            flame_sprite: atlas::engine_flame(),
            sprite,
            muzzle,
        }
    }

    fn wrap_margin(&self) -> Vec2 {
        self.sprite.size * SCREENWRAP_MARGIN
    }
}

impl Damageable for Enemy {
    fn collider(&self) -> &ObbCollider {
        &self.collider
    }

    fn take_hit(&mut self, damage: i32) {
        self.hp -= damage;
        self.time_since_damaged = 0;
    }

    fn targetable(&self) -> bool {
        self.state == EnemyState::Engaging
    }
}

/// A point on the rectangle `SPAWN_DISTANCE` outside the screen
fn spawn_point(rng: &mut Pcg32) -> Vec2 {
    let (min, max_x, max_y) = (-SPAWN_DISTANCE, SCREEN_WIDTH + SPAWN_DISTANCE, SCREEN_HEIGHT + SPAWN_DISTANCE);
    match rng.random_range(0..4) {
        0 => Vec2::new(min, rng.random_range(min..max_y)),
        1 => Vec2::new(max_x, rng.random_range(min..max_y)),
        2 => Vec2::new(rng.random_range(min..max_x), min),
        _ => Vec2::new(rng.random_range(min..max_x), max_y),
    }
}

/// Spawn an enemy off screen, heading for the player
pub fn spawn_enemy(stage: &mut Stage) -> Handle {
    let pos = spawn_point(&mut stage.rng);
    let dir = stage.player.pos - pos;
    spawn_enemy_at(stage, pos, dir)
}

/// Spawn an entering enemy at `pos` travelling along `dir`
pub fn spawn_enemy_at(stage: &mut Stage, pos: Vec2, dir: Vec2) -> Handle {
    let speed = stage.rng.random_range(1.0..2.0);
    let muzzle = stage
        .particles
        .push_back(Particle::muzzle_flash(atlas::enemy_muzzle(), MuzzleAnchor::Enemy));
    let enemy = Enemy::new(pos, dir, speed, Some(muzzle));
    log::debug!("Enemy spawned at {:?}, speed {:.2}", pos, speed);
    stage.enemies.push_back(enemy)
}

/// Retire an enemy's muzzle flash along with it
fn retire_muzzle(particles: &mut Pool<Particle>, muzzle: Option<Handle>) {
    if let Some(flash) = muzzle.and_then(|h| particles.get_mut(h)) {
        flash.ttl = 0;
    }
}

pub fn update_enemies(stage: &mut Stage) {
    let Stage {
        enemies,
        bullets,
        particles,
        player,
        events,
        rng,
        ..
    } = stage;

    enemies.retain_mut(|enemy| {
        match enemy.state {
            EnemyState::Entering => {
                enemy.pos += enemy.dir * enemy.speed;
                if within_screen(enemy.pos, enemy.wrap_margin()) {
                    enemy.state = EnemyState::Engaging;
                    log::trace!("Enemy engaging at {:?}", enemy.pos);
                }
            }
            EnemyState::Engaging => {
                enemy.angle = angle_of(player.pos - enemy.pos);
                enemy.pos = wrap_position(enemy.pos + enemy.dir * enemy.speed, enemy.wrap_margin());

                enemy.reload -= 1;
                if enemy.reload <= 0 {
                    enemy.reload = fire_enemy_bullet(bullets, enemy.pos, enemy.angle);
                    if let Some(flash) = enemy.muzzle.and_then(|h| particles.get_mut(h)) {
                        if let Some(sprite) = flash.sprite.as_mut() {
                            sprite.restart();
                        }
                    }
                }
            }
        }
        enemy.collider.update(enemy.pos, Some(enemy.angle), None);
        enemy.flame_sprite.advance();

        if let Some(flash) = enemy.muzzle.and_then(|h| particles.get_mut(h)) {
            if flash.sprite.as_ref().is_some_and(|s| !s.is_finished()) {
                flash.pos = enemy.pos
                    + direction_from_angle(enemy.angle) * BULLET_OFFSET_ENEMY
                    + Vec2::splat(4.0);
                flash.angle = enemy.angle;
            }
        }

        enemy.time_since_damaged = enemy.time_since_damaged.saturating_add(1);

        if enemy.hp > 0 {
            return true;
        }

        particles.push_back(Particle::explosion(rng, enemy.pos));
        drop_scrap(particles, rng, enemy.pos, SCRAP_ON_DEATH, SCRAP_SPREAD);
        if rng.random_bool(0.5) {
            particles.push_back(Particle::powerup(rng, enemy.pos, player.weapon));
        }
        events.push(GameEvent::sound(
            SoundEffect::EnemyKill,
            SoundChannel::Any,
            pan_for(enemy.pos.x),
        ));
        retire_muzzle(particles, enemy.muzzle);
        log::debug!("Enemy destroyed at {:?}", enemy.pos);
        false
    });
}

/// Count down to the next enemy; the interval shrinks the longer the
/// stage has been running
pub fn tick_enemy_spawner(stage: &mut Stage) {
    stage.enemy_spawn_timer -= 1;
    if stage.enemy_spawn_timer > 0 {
        return;
    }

    spawn_enemy(stage);
    let shrinking = (FPS * 10) as f32 - stage.timer as f32 * 0.05;
    stage.enemy_spawn_timer = shrinking.max((FPS * 3) as f32) as i32;
}

/// Remove every enemy and its muzzle flash
pub fn clear_enemies(enemies: &mut Pool<Enemy>, particles: &mut Pool<Particle>) {
    enemies.for_each_mut(|enemy| retire_muzzle(particles, enemy.muzzle));
    enemies.clear();
}

pub fn draw_enemies(enemies: &Pool<Enemy>, canvas: &mut dyn Canvas, debug: bool) {
    for enemy in enemies.iter() {
        canvas.blit(&enemy.sprite, enemy.pos, enemy.angle, BlitStyle::default());
        if enemy.time_since_damaged < END_OF_FLASH {
            let alpha = 255 * (END_OF_FLASH - enemy.time_since_damaged) / END_OF_FLASH;
            canvas.blit(&enemy.flash_sprite, enemy.pos, enemy.angle, BlitStyle::alpha(alpha as u8));
        }

        let flame_pos = enemy.pos - direction_from_angle(enemy.angle) * FLAME_OFFSET;
        canvas.blit(&enemy.flame_sprite, flame_pos, enemy.angle, BlitStyle::default());

        if debug {
            canvas.debug_box(enemy.collider.corners());
        }
    }
}
