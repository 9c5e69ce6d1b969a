//! End-to-end checks against the public simulation API

use glam::Vec2;

use crate_buster::consts::*;
use crate_buster::sim::bullet::update_bullets;
use crate_buster::sim::crates::update_crates;
use crate_buster::sim::enemy::{SPAWN_DISTANCE, spawn_enemy_at, update_enemies};
use crate_buster::sim::{
    Bullet, BulletKind, Button, Crate, CrateTier, EnemyState, InputSnapshot, Stage, StagePhase,
    tick,
};
use crate_buster::{screen_center, within_screen};

use rand::SeedableRng;
use rand_pcg::Pcg32;

fn empty_stage(seed: u64) -> Stage {
    let mut stage = Stage::new(seed);
    stage.crates.clear();
    stage.particles.clear();
    stage.player.muzzle = None;
    stage
}

#[test]
fn test_expired_bullet_leaves_pool() {
    let mut stage = empty_stage(1);
    let mut dying = Bullet::new(BulletKind::Normal, Vec2::new(40.0, 40.0), Vec2::X, 0.0, 6.0, FPS);
    dying.ttl = 1;
    stage.bullets.push_back(dying);
    stage
        .bullets
        .push_back(Bullet::new(BulletKind::Normal, Vec2::new(40.0, 300.0), Vec2::X, 0.0, 6.0, FPS));
    assert_eq!(stage.bullets.len(), 2);

    update_bullets(&mut stage);

    assert_eq!(stage.bullets.len(), 1);
    assert!(stage.bullets.is_consistent());
    assert_eq!(stage.bullets.iter().next().map(|b| b.ttl), Some(FPS - 1));
}

#[test]
fn test_one_hp_crate_splits_after_normal_hit() {
    let mut stage = empty_stage(2);
    let mut rng = Pcg32::seed_from_u64(2);
    let mut target = Crate::new(CrateTier::Large, Vec2::new(200.0, 200.0), 1, Vec2::ZERO, &mut rng);
    target.speed = 0.0;
    target.angle = 0.0;
    target.angle_speed = 0.0;
    target.hp = 1;
    target.collider.update(target.pos, Some(0.0), None);
    stage.crates.push_back(target);
    stage
        .bullets
        .push_back(Bullet::new(BulletKind::Normal, Vec2::new(190.0, 200.0), Vec2::X, 0.0, 6.0, FPS));

    update_bullets(&mut stage);
    assert!(stage.bullets.is_empty());
    assert!(stage.crates.iter().all(|c| c.hp <= 0));

    update_crates(&mut stage);
    let tiers: Vec<CrateTier> = stage.crates.iter().map(|c| c.tier).collect();
    assert_eq!(tiers, vec![CrateTier::Medium, CrateTier::Medium]);
    assert!(stage.crates.is_consistent());
    for child in stage.crates.iter() {
        assert_eq!(child.hp, CrateTier::Medium.max_hp());
    }
}

#[test]
fn test_entering_enemy_engages_on_first_inbound_frame() {
    for seed in 0..10 {
        let mut stage = empty_stage(seed);
        let start = Vec2::new(-SPAWN_DISTANCE, SCREEN_HEIGHT * 0.5);
        spawn_enemy_at(&mut stage, start, screen_center() - start);
        let margin = Vec2::splat(64.0 * SCREENWRAP_MARGIN);

        let mut frames = 0;
        loop {
            update_enemies(&mut stage);
            frames += 1;
            let enemy = stage.enemies.iter().next().unwrap();
            let inside = within_screen(enemy.pos, margin);
            match enemy.state {
                EnemyState::Entering => assert!(!inside, "seed {seed}: inside but still entering"),
                EnemyState::Engaging => {
                    assert!(inside);
                    let previous = enemy.pos - enemy.dir * enemy.speed;
                    assert!(!within_screen(previous, margin));
                    break;
                }
            }
            assert!(frames < 1000);
        }
    }
}

#[test]
fn test_long_run_keeps_pools_and_directions_sound() {
    let mut stage = Stage::new(2024);
    for frame in 0..FPS * 90 {
        let t = frame as f32;
        let mut input = InputSnapshot {
            movement: Vec2::new((t * 0.013).sin(), (t * 0.021).cos()),
            pointer: stage.crates.iter().next().map(|c| c.pos),
            fire: Button {
                held: true,
                pressed: frame % 90 == 0,
            },
            ..Default::default()
        };
        if frame % 900 == 450 {
            stage.player.begin_dash();
        }
        tick(&mut stage, &mut input);

        assert!(stage.bullets.is_consistent());
        assert!(stage.crates.is_consistent());
        assert!(stage.enemies.is_consistent());
        assert!(stage.particles.is_consistent());

        for b in stage.bullets.iter() {
            assert!((b.dir.length() - 1.0).abs() < 1e-4);
        }
        for c in stage.crates.iter() {
            assert!((c.dir.length() - 1.0).abs() < 1e-4);
        }
        for e in stage.enemies.iter() {
            assert!((e.dir.length() - 1.0).abs() < 1e-4);
        }
        let d = stage.player.dir.length();
        assert!(d == 0.0 || (d - 1.0).abs() < 1e-4);

        match stage.phase {
            StagePhase::InputHighscore | StagePhase::HighscoreTable => break,
            _ => {}
        }
    }
    assert!(stage.timer > 0);
}
