//! Crate Buster - a top-down arcade shooter simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entity pools, OBB collisions, stage flow)
//! - `settings`: Player preferences (volume, debug hitboxes)
//! - `highscores`: Top-10 leaderboard
//! - `error`: Errors surfaced to the host

pub mod error;
pub mod highscores;
pub mod settings;
pub mod sim;

pub use error::Error;
pub use highscores::HighScores;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Logical screen dimensions
    pub const SCREEN_WIDTH: f32 = 640.0;
    pub const SCREEN_HEIGHT: f32 = 360.0;

    /// Fixed simulation rate (one tick per frame)
    pub const FPS: i32 = 60;

    /// Screen-wrap margin as a fraction of a sprite's footprint
    pub const SCREENWRAP_MARGIN: f32 = 0.5;

    /// Frames a hit-flash overlay stays visible
    pub const END_OF_FLASH: i32 = 10;

    /// Distance from the firer's centre at which bullets appear
    pub const BULLET_OFFSET_PLAYER: f32 = 24.0;
    pub const BULLET_OFFSET_ENEMY: f32 = 32.0;

    /// Invincibility frames granted after the player is hurt
    pub const PLAYER_I_FRAMES_MAX: i32 = 90;
    pub const PLAYER_HP_MAX: i32 = 3;

    /// Pause before a level starts
    pub const START_STAGE: i32 = FPS * 2;
    /// Delay between game over and the highscore screens
    pub const GO_TO_HIGHSCORES: i32 = FPS * 3;

    /// Side of one atlas cell in pixels
    pub const ATLAS_CELL: f32 = 16.0;

    /// Stereo pan for sounds without a position
    pub const PAN_CENTER: u8 = 127;
}

/// Screen centre in world coordinates
#[inline]
pub fn screen_center() -> Vec2 {
    Vec2::new(consts::SCREEN_WIDTH * 0.5, consts::SCREEN_HEIGHT * 0.5)
}

/// Wrap a position to the opposite edge once it leaves the screen by more
/// than `margin`
#[inline]
pub fn wrap_position(mut pos: Vec2, margin: Vec2) -> Vec2 {
    use consts::{SCREEN_HEIGHT, SCREEN_WIDTH};

    if pos.x < -margin.x {
        pos.x = SCREEN_WIDTH + margin.x;
    }
    if pos.x > SCREEN_WIDTH + margin.x {
        pos.x = -margin.x;
    }
    if pos.y < -margin.y {
        pos.y = SCREEN_HEIGHT + margin.y;
    }
    if pos.y > SCREEN_HEIGHT + margin.y {
        pos.y = -margin.y;
    }
    pos
}

/// True when `pos` lies within the screen grown by `margin` on every side
#[inline]
pub fn within_screen(pos: Vec2, margin: Vec2) -> bool {
    use consts::{SCREEN_HEIGHT, SCREEN_WIDTH};

    pos.x >= -margin.x
        && pos.x <= SCREEN_WIDTH + margin.x
        && pos.y >= -margin.y
        && pos.y <= SCREEN_HEIGHT + margin.y
}

/// Unit vector pointing along `angle` (radians)
#[inline]
pub fn direction_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle (radians) of a vector, measured from +X
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Stereo pan (0 = left, 255 = right) for a sound emitted at `x`
#[inline]
pub fn pan_for(x: f32) -> u8 {
    (x / consts::SCREEN_WIDTH * 255.0).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use consts::*;

    #[test]
    fn test_wrap_position_each_edge() {
        let margin = Vec2::new(10.0, 5.0);
        assert_eq!(wrap_position(Vec2::new(-11.0, 100.0), margin).x, SCREEN_WIDTH + 10.0);
        assert_eq!(wrap_position(Vec2::new(SCREEN_WIDTH + 11.0, 100.0), margin).x, -10.0);
        assert_eq!(wrap_position(Vec2::new(100.0, -6.0), margin).y, SCREEN_HEIGHT + 5.0);
        assert_eq!(wrap_position(Vec2::new(100.0, SCREEN_HEIGHT + 6.0), margin).y, -5.0);

        // Inside the margin nothing moves
        let p = Vec2::new(-9.0, SCREEN_HEIGHT + 4.0);
        assert_eq!(wrap_position(p, margin), p);
    }

    #[test]
    fn test_within_screen_inclusive_bounds() {
        let margin = Vec2::splat(32.0);
        assert!(within_screen(Vec2::new(-32.0, 0.0), margin));
        assert!(!within_screen(Vec2::new(-32.01, 0.0), margin));
        assert!(within_screen(Vec2::new(SCREEN_WIDTH + 32.0, SCREEN_HEIGHT), margin));
    }

    #[test]
    fn test_angle_roundtrip() {
        let angle = 1.2;
        let dir = direction_from_angle(angle);
        assert!((dir.length() - 1.0).abs() < 1e-6);
        assert!((angle_of(dir) - angle).abs() < 1e-6);
    }

    #[test]
    fn test_pan_for_clamps() {
        assert_eq!(pan_for(-100.0), 0);
        assert_eq!(pan_for(SCREEN_WIDTH * 2.0), 255);
        assert_eq!(pan_for(SCREEN_WIDTH * 0.5), 127);
    }
}
