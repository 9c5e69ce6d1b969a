//! The player's ship

use glam::Vec2;

use super::bullet::{WeaponKind, fire_player_weapon};
use super::collision::{ObbCollider, intersects};
use super::particle::Particle;
use super::pool::Handle;
use super::sprite::{BlitStyle, Canvas, Sprite, atlas};
use super::state::{GameEvent, SoundChannel, SoundEffect, Stage, StagePhase};
use super::tick::InputSnapshot;
use super::vector::{approach, normalize};
use crate::consts::*;
use crate::{angle_of, direction_from_angle, pan_for, wrap_position};

const PLAYER_SPEED_MAX: f32 = 3.0;
/// Momentum change per frame while a direction is held
const PLAYER_ACCEL: f32 = 0.075;
/// Momentum change per frame once input is released
const PLAYER_DECEL: f32 = 0.025;
const DASH_TIME_MAX: i32 = 20;
const DASH_SPEED_DECAY: f32 = 0.3;
const DASH_SPEED_MAX: f32 = 10.0;
/// Flame sits this far behind the hull centre
const FLAME_OFFSET: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Normal,
    /// Short burst along a fixed direction
    Dashing,
    Destroyed,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    /// Only used while dashing
    pub speed: f32,
    /// Facing in radians
    pub angle: f32,
    pub state: PlayerState,
    /// Unit movement intent, zero when idle
    pub dir: Vec2,
    pub momentum: Vec2,
    pub dash_timer: i32,
    pub reload: i32,
    pub i_frames: i32,
    pub hp: i32,
    pub weapon: WeaponKind,
    pub sprite: Sprite,
    pub flame_sprite: Sprite,
    pub powerup_flash_sprite: Sprite,
    pub show_flame: bool,
    pub time_since_powerup: i32,
    /// Muzzle flash particle, positioned by the particle itself
    pub muzzle: Option<Handle>,
    pub collider: ObbCollider,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        let sprite = atlas::ship();
        let half = sprite.size * 0.2;
        Self {
            pos,
            speed: 0.0,
            angle: 0.0,
            state: PlayerState::Normal,
            dir: Vec2::ZERO,
            momentum: Vec2::ZERO,
            dash_timer: 0,
            reload: 0,
            i_frames: 0,
            hp: PLAYER_HP_MAX,
            weapon: WeaponKind::Normal,
            collider: ObbCollider::new(half.x, half.y, pos, 0.0),
            sprite,
            flame_sprite: atlas::engine_flame(),
            powerup_flash_sprite: atlas::ship_powerup_flash(),
            show_flame: false,
            time_since_powerup: END_OF_FLASH,
            muzzle: None,
        }
    }

    /// Respawn at `pos` with full health and the default weapon
    pub fn reset(&mut self, pos: Vec2) {
        self.pos = pos;
        self.angle = 0.0;
        self.speed = 0.0;
        self.dir = Vec2::ZERO;
        self.momentum = Vec2::ZERO;
        self.dash_timer = 0;
        self.reload = 0;
        self.hp = PLAYER_HP_MAX;
        self.i_frames = 0;
        self.weapon = WeaponKind::Normal;
        self.state = PlayerState::Normal;
        self.show_flame = false;
        self.collider.update(pos, Some(0.0), None);
    }

    /// Move the ship without touching health or weapon
    pub fn recenter(&mut self, pos: Vec2) {
        self.pos = pos;
        self.momentum = Vec2::ZERO;
        self.collider.update(pos, Some(self.angle), None);
    }

    /// Start a dash along the movement intent, or the facing when idle
    pub fn begin_dash(&mut self) {
        if self.state == PlayerState::Destroyed {
            return;
        }
        if self.dir == Vec2::ZERO {
            self.dir = direction_from_angle(self.angle);
        }
        self.speed = DASH_SPEED_MAX;
        self.dash_timer = DASH_TIME_MAX;
        self.state = PlayerState::Dashing;
    }

    /// Lose one hit point unless invincibility frames are running.
    /// Returns whether damage was taken.
    pub fn take_hit(&mut self, events: &mut Vec<GameEvent>, x: f32) -> bool {
        if self.i_frames > 0 {
            return false;
        }
        self.i_frames = PLAYER_I_FRAMES_MAX;
        self.hp -= 1;
        events.push(GameEvent::sound(SoundEffect::PlayerHit, SoundChannel::Player, pan_for(x)));
        events.push(GameEvent::PlayerHurt);
        log::debug!("Player hit, {} hp left", self.hp);
        true
    }

    fn aim(&mut self, input: &InputSnapshot) {
        if let Some(pointer) = input.pointer {
            self.angle = angle_of(pointer - self.pos);
        } else if input.aim != Vec2::ZERO {
            self.angle = angle_of(input.aim);
        } else if input.movement != Vec2::ZERO {
            self.angle = angle_of(input.movement);
        }
    }

    fn wrap_and_sync(&mut self) {
        self.pos = wrap_position(self.pos, self.sprite.size * SCREENWRAP_MARGIN);
        self.collider.update(self.pos, Some(self.angle), None);
    }
}

/// Ram every crate and enemy the ship overlaps
fn check_contacts(stage: &mut Stage) {
    let Stage {
        player,
        crates,
        enemies,
        events,
        ..
    } = stage;

    crates.for_each_mut(|c| {
        if intersects(&player.collider, &c.collider) {
            let x = player.pos.x;
            player.take_hit(events, x);
            c.hp = 0;
        }
    });
    enemies.for_each_mut(|enemy| {
        if intersects(&player.collider, &enemy.collider) {
            let x = player.pos.x;
            player.take_hit(events, x);
            enemy.hp = 0;
        }
    });
}

fn fire(stage: &mut Stage, input: &mut InputSnapshot) {
    let Stage {
        player,
        bullets,
        particles,
        rng,
        events,
        phase,
        ..
    } = stage;

    player.reload = player.reload.saturating_sub(1);
    if player.reload > 0 || !input.fire.is_active() || *phase != StagePhase::Gameplay {
        return;
    }

    player.reload = fire_player_weapon(bullets, rng, player.weapon, player.pos, player.angle);
    if let Some(flash) = player.muzzle.and_then(|h| particles.get_mut(h)) {
        let mut sprite = atlas::player_muzzle(player.weapon);
        sprite.restart();
        flash.sprite = Some(sprite);
    }
    events.push(GameEvent::sound_isolated(
        SoundEffect::Shot(player.weapon),
        SoundChannel::PlayerFire,
        pan_for(player.pos.x),
    ));
    input.fire.consume();
}

fn check_death(stage: &mut Stage) {
    if stage.player.hp > 0 {
        return;
    }
    let pos = stage.player.pos;
    stage.particles.push_back(Particle::explosion(&mut stage.rng, pos));
    stage
        .events
        .push(GameEvent::sound(SoundEffect::PlayerKill, SoundChannel::Player, pan_for(pos.x)));
    stage.player.state = PlayerState::Destroyed;
    log::info!("Player destroyed at level {} with score {}", stage.level, stage.score);
}

pub fn update_player(stage: &mut Stage, input: &mut InputSnapshot) {
    match stage.player.state {
        PlayerState::Normal => {
            let player = &mut stage.player;
            player.aim(input);

            let held = input.movement != Vec2::ZERO;
            player.dir = normalize(input.movement);
            player.show_flame = held;

            let step = if held { PLAYER_ACCEL } else { PLAYER_DECEL };
            player.momentum.x = approach(player.momentum.x, player.dir.x, step);
            player.momentum.y = approach(player.momentum.y, player.dir.y, step);
            player.pos += player.momentum * PLAYER_SPEED_MAX;
            player.wrap_and_sync();

            check_contacts(stage);
            stage.player.i_frames = stage.player.i_frames.saturating_sub(1);
            fire(stage, input);
            check_death(stage);
        }
        PlayerState::Dashing => {
            let player = &mut stage.player;
            player.aim(input);
            player.speed -= DASH_SPEED_DECAY;
            player.pos += player.dir * player.speed;
            player.wrap_and_sync();

            check_contacts(stage);
            let player = &mut stage.player;
            player.i_frames = player.i_frames.saturating_sub(1);
            player.dash_timer -= 1;
            if player.dash_timer <= 0 {
                player.state = PlayerState::Normal;
            }
            check_death(stage);
        }
        PlayerState::Destroyed => {}
    }

    let player = &mut stage.player;
    if player.show_flame {
        player.flame_sprite.advance();
    }
    player.time_since_powerup = player.time_since_powerup.saturating_add(1);
}

pub fn draw_player(player: &Player, canvas: &mut dyn Canvas, debug: bool) {
    if player.state == PlayerState::Destroyed {
        return;
    }

    // Blink at half opacity while invincible
    let alpha = if player.i_frames <= 0 || player.i_frames % 10 > 5 { 255 } else { 127 };
    canvas.blit(&player.sprite, player.pos, player.angle, BlitStyle::alpha(alpha));
    if player.show_flame {
        let flame_pos = player.pos - direction_from_angle(player.angle) * FLAME_OFFSET;
        canvas.blit(&player.flame_sprite, flame_pos, player.angle, BlitStyle::alpha(alpha));
    }

    if player.time_since_powerup < END_OF_FLASH {
        let flash = 255 * (END_OF_FLASH - player.time_since_powerup) / END_OF_FLASH;
        canvas.blit(&player.powerup_flash_sprite, player.pos, player.angle, BlitStyle::alpha(flash as u8));
    }

    if debug {
        canvas.debug_box(player.collider.corners());
    }
}
