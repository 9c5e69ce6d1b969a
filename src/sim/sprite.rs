//! Drawable handles and the canvas they are drawn onto
//!
//! The simulation never touches textures. A `Sprite` names a region of the
//! shared gameplay atlas plus its animation state; the host implements
//! `Canvas` to turn draw calls into pixels.

use glam::Vec2;

use super::bullet::{BulletKind, WeaponKind};
use super::crates::CrateTier;
use crate::consts::ATLAS_CELL;

/// How an animation behaves after its last frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationLoop {
    /// Stops on the final frame. One-shot strips carry a trailing blank
    /// frame so reaching it means "done".
    OneShot,
    Loop,
}

/// A region of the gameplay atlas with its animation cursor
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    /// Top-left atlas cell
    pub cell: (u32, u32),
    /// Size in pixels
    pub size: Vec2,
    pub frames: u32,
    pub current_frame: f32,
    /// Frames advanced per tick
    pub speed: f32,
    pub looping: AnimationLoop,
}

impl Sprite {
    /// A single-frame sprite
    pub fn still(cell_x: u32, cell_y: u32, cells_w: u32, cells_h: u32) -> Self {
        Self::animated(cell_x, cell_y, cells_w, cells_h, 1, 0.0, AnimationLoop::OneShot)
    }

    pub fn animated(
        cell_x: u32,
        cell_y: u32,
        cells_w: u32,
        cells_h: u32,
        frames: u32,
        speed: f32,
        looping: AnimationLoop,
    ) -> Self {
        Self {
            cell: (cell_x, cell_y),
            size: Vec2::new(cells_w as f32, cells_h as f32) * ATLAS_CELL,
            frames: frames.max(1),
            current_frame: 0.0,
            speed,
            looping,
        }
    }

    pub fn width(&self) -> f32 {
        self.size.x
    }

    pub fn height(&self) -> f32 {
        self.size.y
    }

    pub fn frame(&self) -> u32 {
        (self.current_frame as u32).min(self.frames - 1)
    }

    pub fn advance(&mut self) {
        self.current_frame += self.speed;
        let frames = self.frames as f32;
        match self.looping {
            AnimationLoop::Loop => {
                if self.current_frame >= frames {
                    self.current_frame %= frames;
                }
            }
            AnimationLoop::OneShot => {
                self.current_frame = self.current_frame.min(frames - 1.0);
            }
        }
    }

    /// A one-shot that has reached its trailing frame
    pub fn is_finished(&self) -> bool {
        self.looping == AnimationLoop::OneShot && self.frame() + 1 >= self.frames
    }

    pub fn restart(&mut self) {
        self.current_frame = 0.0;
    }

    /// Park a one-shot on its trailing frame so it draws nothing
    pub fn finish(&mut self) {
        self.current_frame = (self.frames - 1) as f32;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlitStyle {
    pub alpha: u8,
    pub flip: Flip,
    /// Rotation pivot relative to the sprite's top-left; centre when `None`
    pub pivot: Option<Vec2>,
}

impl Default for BlitStyle {
    fn default() -> Self {
        Self {
            alpha: 255,
            flip: Flip::None,
            pivot: None,
        }
    }
}

impl BlitStyle {
    pub fn alpha(alpha: u8) -> Self {
        Self {
            alpha,
            ..Default::default()
        }
    }
}

/// Draw target implemented by the host renderer
pub trait Canvas {
    /// Draw `sprite` centred at `pos`, rotated by `angle` radians
    fn blit(&mut self, sprite: &Sprite, pos: Vec2, angle: f32, style: BlitStyle);
    /// Centred text with a drop shadow
    fn text(&mut self, text: &str, pos: Vec2);
    /// Collider outline, only called when hitbox debugging is on
    fn debug_box(&mut self, corners: [Vec2; 4]);
}

/// A recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Blit {
        cell: (u32, u32),
        frame: u32,
        pos: Vec2,
        angle: f32,
        style: BlitStyle,
    },
    Text {
        text: String,
        pos: Vec2,
    },
    DebugBox {
        corners: [Vec2; 4],
    },
}

/// Canvas that just records what it was asked to draw
#[derive(Debug, Default)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Atlas cells blitted, in draw order
    pub fn blitted_cells(&self) -> Vec<(u32, u32)> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Blit { cell, .. } => Some(*cell),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for DrawList {
    fn blit(&mut self, sprite: &Sprite, pos: Vec2, angle: f32, style: BlitStyle) {
        self.commands.push(DrawCommand::Blit {
            cell: sprite.cell,
            frame: sprite.frame(),
            pos,
            angle,
            style,
        });
    }

    fn text(&mut self, text: &str, pos: Vec2) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            pos,
        });
    }

    fn debug_box(&mut self, corners: [Vec2; 4]) {
        self.commands.push(DrawCommand::DebugBox { corners });
    }
}

/// Sprite definitions for the gameplay atlas
pub mod atlas {
    use super::{AnimationLoop, Sprite};
    use super::{BulletKind, CrateTier, WeaponKind};

    pub fn bullet(kind: BulletKind) -> Sprite {
        match kind {
            BulletKind::Normal => Sprite::animated(16, 0, 2, 1, 4, 0.25, AnimationLoop::Loop),
            BulletKind::Erratic => Sprite::animated(16, 3, 1, 1, 4, 0.5, AnimationLoop::Loop),
            BulletKind::Bouncer => Sprite::animated(16, 6, 2, 1, 4, 0.25, AnimationLoop::Loop),
            BulletKind::Shotgun => Sprite::animated(16, 9, 1, 1, 4, 0.25, AnimationLoop::Loop),
            BulletKind::Enemy => Sprite::animated(16, 12, 2, 1, 4, 0.25, AnimationLoop::Loop),
        }
    }

    pub fn impact(kind: BulletKind) -> Sprite {
        let (row, frames) = match kind {
            BulletKind::Normal => (1, 4),
            BulletKind::Erratic => (4, 5),
            BulletKind::Bouncer => (7, 4),
            BulletKind::Shotgun => (10, 4),
            BulletKind::Enemy => (13, 4),
        };
        Sprite::animated(16, row, 1, 1, frames, 0.25, AnimationLoop::OneShot)
    }

    pub fn explosion() -> Sprite {
        Sprite::animated(0, 18, 4, 4, 5, 0.3, AnimationLoop::OneShot)
    }

    pub fn crate_body(tier: CrateTier) -> Sprite {
        match tier {
            CrateTier::Large => Sprite::still(0, 0, 4, 4),
            CrateTier::Medium => Sprite::still(0, 4, 3, 3),
            CrateTier::Small => Sprite::still(0, 7, 2, 2),
        }
    }

    pub fn crate_flash(tier: CrateTier) -> Sprite {
        match tier {
            CrateTier::Large => Sprite::still(4, 0, 4, 4),
            CrateTier::Medium => Sprite::still(3, 4, 3, 3),
            CrateTier::Small => Sprite::still(2, 7, 2, 2),
        }
    }

    pub fn enemy() -> Sprite {
        Sprite::still(6, 7, 4, 4)
    }

    pub fn enemy_flash() -> Sprite {
        Sprite::still(10, 7, 4, 4)
    }

    pub fn engine_flame() -> Sprite {
        Sprite::animated(16, 16, 1, 1, 4, 0.25, AnimationLoop::Loop)
    }

    /// Starts parked on its blank frame
    pub fn enemy_muzzle() -> Sprite {
        let mut sprite = Sprite::animated(16, 14, 2, 2, 5, 0.2, AnimationLoop::OneShot);
        sprite.finish();
        sprite
    }

    pub fn ship() -> Sprite {
        Sprite::still(0, 11, 3, 3)
    }

    pub fn ship_powerup_flash() -> Sprite {
        Sprite::still(3, 11, 3, 3)
    }

    /// Starts parked on its blank frame
    pub fn player_muzzle(weapon: WeaponKind) -> Sprite {
        let row = match weapon {
            WeaponKind::Normal => 2,
            WeaponKind::Erratic => 5,
            WeaponKind::Bouncer => 8,
            WeaponKind::Shotgun => 11,
        };
        let mut sprite = Sprite::animated(16, row, 1, 1, 5, 0.5, AnimationLoop::OneShot);
        sprite.finish();
        sprite
    }

    pub fn scrap(variant: u32, speed: f32) -> Sprite {
        Sprite::animated(16, 17 + variant % 4, 1, 1, 4, speed, AnimationLoop::Loop)
    }

    pub fn powerup(weapon: WeaponKind) -> Sprite {
        let col = match weapon {
            WeaponKind::Normal => 0,
            WeaponKind::Erratic => 2,
            WeaponKind::Bouncer => 4,
            WeaponKind::Shotgun => 6,
        };
        Sprite::still(col, 14, 2, 2)
    }

    pub fn powerup_cell() -> Sprite {
        Sprite::still(8, 14, 2, 2)
    }

    pub fn powerup_shine() -> Sprite {
        Sprite::still(10, 14, 2, 2)
    }

    /// One quadrant; drawn four times with flips
    pub fn collect_shockwave() -> Sprite {
        Sprite::animated(0, 16, 2, 2, 5, 0.05, AnimationLoop::OneShot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_wraps() {
        let mut sprite = Sprite::animated(0, 0, 1, 1, 4, 1.5, AnimationLoop::Loop);
        for _ in 0..3 {
            sprite.advance();
        }
        // 4.5 wraps to 0.5
        assert_eq!(sprite.frame(), 0);
        assert!(!sprite.is_finished());
    }

    #[test]
    fn test_one_shot_finishes_on_trailing_frame() {
        let mut sprite = atlas::explosion();
        let mut ticks = 0;
        while !sprite.is_finished() {
            sprite.advance();
            ticks += 1;
            assert!(ticks < 100);
        }
        // 4 visible frames at 0.3 per tick
        assert_eq!(ticks, 14);
        sprite.advance();
        assert_eq!(sprite.frame(), 4);
    }

    #[test]
    fn test_muzzle_starts_hidden_and_restarts() {
        let mut sprite = atlas::player_muzzle(WeaponKind::Bouncer);
        assert!(sprite.is_finished());
        sprite.restart();
        assert!(!sprite.is_finished());
    }

    #[test]
    fn test_sprite_sizes_follow_cells() {
        assert_eq!(atlas::crate_body(CrateTier::Large).width(), 64.0);
        assert_eq!(atlas::crate_body(CrateTier::Medium).width(), 48.0);
        assert_eq!(atlas::bullet(BulletKind::Normal).size, Vec2::new(32.0, 16.0));
        assert_eq!(atlas::ship().height(), 48.0);
    }

    #[test]
    fn test_draw_list_records_blits() {
        let mut list = DrawList::new();
        list.blit(&atlas::enemy(), Vec2::ZERO, 0.0, BlitStyle::default());
        list.text("+HP!", Vec2::ZERO);
        assert_eq!(list.blitted_cells(), vec![(6, 7)]);
        assert_eq!(list.commands.len(), 2);
    }
}
