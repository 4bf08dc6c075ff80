use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::color::{Rgb, hsl, rgb_hex};
use crate::config::*;
use crate::physics::{jump_apex, max_jump_distance};
use crate::platform::{Platform, PlatformRegistry};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    #[default]
    Rainbow,
    Glass,
    Space,
    Lava,
}

impl LevelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelKind::Rainbow => "rainbow",
            LevelKind::Glass => "glass",
            LevelKind::Space => "space",
            LevelKind::Lava => "lava",
        }
    }

    /// Unknown identifiers fall back to the rainbow course.
    pub fn from_id(id: &str) -> Self {
        id.parse().unwrap_or_else(|_| {
            log::warn!("Unknown level '{}', loading rainbow", id);
            LevelKind::Rainbow
        })
    }

    pub fn theme(&self) -> LevelTheme {
        match self {
            LevelKind::Rainbow => LevelTheme {
                sky: rgb_hex(0x87ceeb),
                gravity_scale: 1.0,
            },
            LevelKind::Glass => LevelTheme {
                sky: rgb_hex(0xb8d8e8),
                gravity_scale: 1.0,
            },
            LevelKind::Space => LevelTheme {
                sky: rgb_hex(0x0b0b2a),
                gravity_scale: 0.6,
            },
            LevelKind::Lava => LevelTheme {
                sky: rgb_hex(0x3a0d05),
                gravity_scale: 1.0,
            },
        }
    }
}

impl FromStr for LevelKind {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rainbow" => Ok(LevelKind::Rainbow),
            "glass" => Ok(LevelKind::Glass),
            "space" => Ok(LevelKind::Space),
            "lava" => Ok(LevelKind::Lava),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LevelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown level identifier '{0}'")]
pub struct UnknownLevel(pub String);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelTheme {
    /// Background and fog color.
    pub sky: Rgb,
    pub gravity_scale: f32,
}

/// A built level instance.
#[derive(Clone, Debug)]
pub struct Level {
    pub kind: LevelKind,
    pub theme: LevelTheme,
    pub checkpoint: Vec3,
    /// Registry indices of the intended path, start to victory.
    pub route: Vec<usize>,
}

impl Level {
    pub fn gravity(&self) -> f32 {
        GRAVITY * self.theme.gravity_scale
    }
}

const START_COLOR: u32 = 0x555555;
const VICTORY_COLOR: u32 = 0xffd700;
const GLASS_COLOR: u32 = 0xa8e6ff;
const STEP_SIZE: Vec3 = Vec3::new(5.0, 1.0, 5.0);
const VICTORY_SIZE: Vec3 = Vec3::new(15.0, 1.0, 15.0);
const LATERAL_SPREAD: f32 = 2.5;
const GLASS_LANE_X: f32 = 3.0;
const FIRST_STEP_Z: f32 = -8.0;
const VICTORY_RUNUP: f32 = 5.0;

/// Center-to-center spacing before step `index`.
fn step_gap(index: usize) -> f32 {
    6.0 + (index % 3) as f32
}

fn step_height(index: usize) -> f32 {
    if index % 5 == 0 { 1.0 } else { 0.0 }
}

fn step_color(kind: LevelKind, index: usize) -> Rgb {
    match kind {
        LevelKind::Rainbow | LevelKind::Glass => hsl(index as f32 / 30.0, 1.0, 0.5),
        LevelKind::Space => hsl(0.6 + index as f32 / 120.0, 0.7, 0.55),
        LevelKind::Lava => {
            if index % 2 == 0 {
                rgb_hex(0x3b3b3b)
            } else {
                rgb_hex(0x5a4a42)
            }
        }
    }
}

/// Clear `platforms` and lay out a fresh instance of `kind`.
///
/// The shape (counts, gaps, heights) is fixed per kind; only lateral offsets
/// and which glass pane is tempered are randomized.
pub fn generate(kind: LevelKind, rng: &mut impl Rng, platforms: &mut PlatformRegistry) -> Level {
    let released = platforms.clear();
    if released > 0 {
        log::debug!("Released {} platforms from previous level", released);
    }

    let mut route = Vec::with_capacity(STEP_PLATFORM_COUNT + 2);
    route.push(platforms.add(Platform::new(
        Vec3::new(0.0, -2.0, 0.0),
        Vec3::new(10.0, 1.0, 10.0),
        rgb_hex(START_COLOR),
    )));

    let mut z = FIRST_STEP_Z;
    for i in 0..STEP_PLATFORM_COUNT {
        let color = step_color(kind, i);
        let y = step_height(i);
        match kind {
            LevelKind::Glass => {
                let tempered_left = rng.random_bool(0.5);
                for left in [true, false] {
                    let x = if left { -GLASS_LANE_X } else { GLASS_LANE_X };
                    let pane = Platform::new(Vec3::new(x, 0.0, z), STEP_SIZE, rgb_hex(GLASS_COLOR));
                    if left == tempered_left {
                        route.push(platforms.add(pane.tinted(GLASS_OPACITY)));
                    } else {
                        platforms.add(pane.glass());
                    }
                }
            }
            _ => {
                let x = rng.random_range(-LATERAL_SPREAD..LATERAL_SPREAD);
                route.push(platforms.add(Platform::new(Vec3::new(x, y, z), STEP_SIZE, color)));
            }
        }
        z -= step_gap(i);
    }

    route.push(
        platforms.add(
            Platform::new(
                Vec3::new(0.0, 0.0, z - VICTORY_RUNUP),
                VICTORY_SIZE,
                rgb_hex(VICTORY_COLOR),
            )
            .victory(),
        ),
    );

    let level = Level {
        kind,
        theme: kind.theme(),
        checkpoint: Vec3::from_array(CHECKPOINT),
        route,
    };
    if !route_is_reachable(platforms, &level.route, level.gravity()) {
        log::error!("Level '{}' generated an unreachable gap", kind);
    }
    log::info!(
        "Loaded level '{}': {} platforms, route of {}",
        kind,
        platforms.len(),
        level.route.len()
    );
    level
}

/// Every hop along `route` fits inside one jump arc.
pub fn route_is_reachable(platforms: &PlatformRegistry, route: &[usize], gravity: f32) -> bool {
    let reach = max_jump_distance(gravity);
    let apex = jump_apex(gravity);
    route.windows(2).all(|hop| {
        let (Some(from), Some(to)) = (platforms.get(hop[0]), platforms.get(hop[1])) else {
            return false;
        };
        from.edge_distance(to) <= reach && to.top() - from.top() < apex
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn build(kind: LevelKind, seed: u64) -> (PlatformRegistry, Level) {
        let mut registry = PlatformRegistry::new();
        let mut rng = SmallRng::seed_from_u64(seed);
        let level = generate(kind, &mut rng, &mut registry);
        (registry, level)
    }

    #[test]
    fn rainbow_has_start_fifty_steps_and_victory() {
        let (registry, level) = build(LevelKind::Rainbow, 7);
        assert_eq!(registry.len(), STEP_PLATFORM_COUNT + 2);
        assert_eq!(level.route.len(), STEP_PLATFORM_COUNT + 2);
        assert_eq!(registry.victory_index(), Some(registry.len() - 1));
        assert_eq!(registry.iter().filter(|p| p.is_victory()).count(), 1);
        assert_eq!(level.checkpoint, Vec3::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn gaps_never_exceed_jump_reach() {
        let reach = max_jump_distance(GRAVITY);
        for i in 0..STEP_PLATFORM_COUNT {
            assert!(step_gap(i) <= reach);
        }
        for kind in [LevelKind::Rainbow, LevelKind::Glass, LevelKind::Space, LevelKind::Lava] {
            for seed in 0..64 {
                let (registry, level) = build(kind, seed);
                assert!(
                    route_is_reachable(&registry, &level.route, level.gravity()),
                    "{kind} seed {seed}"
                );
            }
        }
    }

    #[test]
    fn same_identifier_reproduces_layout_shape() {
        let (a, _) = build(LevelKind::Rainbow, 1);
        let (b, _) = build(LevelKind::Rainbow, 99);
        assert_eq!(a.len(), b.len());
        for (pa, pb) in a.iter().zip(b.iter()) {
            assert_eq!(pa.center().z, pb.center().z);
            assert_eq!(pa.top(), pb.top());
            assert_eq!(pa.size(), pb.size());
        }
    }

    #[test]
    fn reload_replaces_previous_registry() {
        let mut registry = PlatformRegistry::new();
        let mut rng = SmallRng::seed_from_u64(3);
        generate(LevelKind::Glass, &mut rng, &mut registry);
        let glass_count = registry.len();
        assert_eq!(glass_count, 2 * STEP_PLATFORM_COUNT + 2);
        generate(LevelKind::Rainbow, &mut rng, &mut registry);
        assert_eq!(registry.len(), STEP_PLATFORM_COUNT + 2);
        assert!(registry.iter().all(|p| !p.is_glass()));
    }

    #[test]
    fn glass_rows_pair_one_fragile_with_one_tempered() {
        let (registry, level) = build(LevelKind::Glass, 11);
        let fragile = registry.iter().filter(|p| p.is_glass()).count();
        assert_eq!(fragile, STEP_PLATFORM_COUNT);
        for &index in &level.route {
            assert!(!registry.get(index).unwrap().is_glass());
        }
    }

    #[test]
    fn level_ids_parse_with_fallback() {
        assert_eq!("space".parse::<LevelKind>(), Ok(LevelKind::Space));
        assert_eq!(" Lava ".parse::<LevelKind>(), Ok(LevelKind::Lava));
        assert!("moon".parse::<LevelKind>().is_err());
        assert_eq!(LevelKind::from_id("moon"), LevelKind::Rainbow);
        assert!(LevelKind::Space.theme().gravity_scale < 1.0);
    }
}
