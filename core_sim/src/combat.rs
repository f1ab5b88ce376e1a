//! Combat resolution: target validity, damage, line of sight, acquisition,
//! and the discrete facing-angle math shared by movement and weapons.
//!
//! Everything here is a pure function over plain data, safe to call
//! speculatively from UI previews; the only state that ever changes hands is
//! the seeded RNG passed into [`calculate_damage`].

use bevy::math::Vec2;
use rand::{rngs::SmallRng, Rng};
use sim_runtime::{LifeCode, OccupancyGrid, Team, Uid, UnitCategory};

use crate::components::{Combat, Unit};

/// Wraps a facing into `[0, directions)`. Idempotent.
pub fn wrap_direction(mut direction: f32, directions: u32) -> f32 {
    let directions = directions as f32;
    while direction < 0.0 {
        direction += directions;
    }
    while direction >= directions {
        direction -= directions;
    }
    direction
}

/// Bearing from `from` toward `to`, rescaled to the discrete facing system
/// where 0 points up the map and facings increase clockwise.
pub fn find_angle(from: Vec2, to: Vec2, directions: u32) -> f32 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let d = directions as f32;
    wrap_direction(
        d / 2.0 - dx.atan2(dy) * d / (2.0 * std::f32::consts::PI),
        directions,
    )
}

/// Signed shortest rotation from `a` to `b`, in `(-directions/2, directions/2]`.
pub fn angle_diff(mut a: f32, mut b: f32, directions: u32) -> f32 {
    let d = directions as f32;
    let half = d / 2.0;
    if a >= half {
        a -= d;
    }
    if b >= half {
        b -= d;
    }
    let mut diff = b - a;
    while diff <= -half {
        diff += d;
    }
    while diff > half {
        diff -= d;
    }
    diff
}

/// The point a weapon actually aims at (or fires from) for a given entity.
///
/// Buildings aim at their footprint center; aircraft are offset to the ground
/// point under their shadow. Everything else aims center-of-position.
#[derive(Debug, Clone, Copy)]
pub struct AimProfile {
    pub position: Vec2,
    pub category: UnitCategory,
    /// Buildable footprint size for buildings/terrain.
    pub footprint: Option<(u32, u32)>,
    /// Aircraft shadow offset in grid units.
    pub shadow: f32,
}

impl AimProfile {
    pub fn aim_point(&self) -> Vec2 {
        match self.category {
            UnitCategory::Building | UnitCategory::Terrain => {
                let (w, h) = self.footprint.unwrap_or((1, 1));
                self.position + Vec2::new(w as f32 / 2.0, h as f32 / 2.0)
            }
            UnitCategory::Aircraft => Vec2::new(self.position.x, self.position.y - self.shadow),
            _ => self.position,
        }
    }
}

/// Facing `source` must hold to fire at `target`, with category offsets
/// applied to both endpoints.
pub fn find_firing_angle(target: &AimProfile, source: &AimProfile, directions: u32) -> f32 {
    find_angle(source.aim_point(), target.aim_point(), directions)
}

/// Whether `attacker` may engage `target` at all. Pure; no range check.
pub fn is_valid_target(
    attacker: &Unit,
    weapon: Option<&Combat>,
    target: &Unit,
    target_life: LifeCode,
) -> bool {
    let Some(weapon) = weapon else {
        return false;
    };
    if attacker.team == target.team {
        return false;
    }
    if target_life.is_dead() || !target.is_selectable() {
        return false;
    }
    weapon.can_target(target.category)
}

/// Randomized damage: uniform multiplier in `[0.9, 1.1]`, armor subtracted,
/// floored at 1, truncated to an integer. Zero or negative power deals zero.
pub fn calculate_damage(rng: &mut SmallRng, power: f32, armor: f32) -> i32 {
    if power <= 0.0 {
        return 0;
    }
    let multiplier = rng.gen_range(0.9..=1.1);
    (power * multiplier - armor).max(1.0).floor() as i32
}

/// Samples the segment between `from` and `to` at one-cell resolution and
/// reports whether every interior sample is passable. Zero distance is clear.
pub fn has_line_of_sight(passable: &OccupancyGrid, from: Vec2, to: Vec2) -> bool {
    let delta = to - from;
    let distance = delta.length();
    let steps = distance.floor().max(1.0) as u32;
    for step in 1..steps {
        let t = step as f32 / steps as f32;
        let sample = from + delta * t;
        if passable.is_obstructed(sample.x.floor() as u32, sample.y.floor() as u32) {
            return false;
        }
    }
    true
}

/// Snapshot of a potential target used by acquisition scans.
#[derive(Debug, Clone, Copy)]
pub struct SightedUnit {
    pub uid: Uid,
    pub team: Team,
    pub category: UnitCategory,
    pub position: Vec2,
    pub selectable: bool,
    pub life: LifeCode,
}

/// Enemies of `team` within `sight` of `origin` with a clear line of sight.
///
/// Ordering is part of the contract: nearest first, ties broken by ascending
/// uid, so auto-acquisition is deterministic regardless of registry insertion
/// order.
pub fn find_targets_in_sight(
    origin: Vec2,
    team: Team,
    sight: f32,
    passable: &OccupancyGrid,
    candidates: &[SightedUnit],
) -> Vec<Uid> {
    let mut found: Vec<(f32, Uid)> = candidates
        .iter()
        .filter(|candidate| {
            candidate.team != team && !candidate.life.is_dead() && candidate.selectable
        })
        .filter_map(|candidate| {
            let distance = origin.distance(candidate.position);
            (distance <= sight && has_line_of_sight(passable, origin, candidate.position))
                .then_some((distance, candidate.uid))
        })
        .collect();
    found.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });
    found.into_iter().map(|(_, uid)| uid).collect()
}
