use crate::config::*;
use crate::platform::PlatformRegistry;
use crate::player::Player;

/// What happened during one vertical step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Index of the platform the player is standing on after the step.
    pub landed_on: Option<usize>,
    /// The victory platform was reached for the first time this step.
    pub won: bool,
    /// The player dropped below the death plane and must respawn.
    pub fell_out: bool,
}

/// Gravity, integration and landing resolution for one fixed step.
pub fn step_vertical(
    player: &mut Player,
    platforms: &mut PlatformRegistry,
    gravity: f32,
    dt: f32,
) -> StepOutcome {
    let prev_feet = player.feet_y();

    player.velocity.y = (player.velocity.y - gravity * dt).max(-TERMINAL_FALL_SPEED);
    player.position.y += player.velocity.y * dt;

    let mut outcome = StepOutcome::default();
    player.grounded = false;
    if let Some(index) = resolve_landing(player, platforms, prev_feet) {
        outcome.landed_on = Some(index);
        let reached_victory = platforms.get(index).is_some_and(|p| p.is_victory());
        if reached_victory && player.mark_won() {
            outcome.won = true;
        }
    }

    outcome.fell_out = player.position.y < DEATH_Y;
    outcome
}

/// First platform whose top was crossed this step wins; no averaging.
fn resolve_landing(
    player: &mut Player,
    platforms: &mut PlatformRegistry,
    prev_feet: f32,
) -> Option<usize> {
    if player.velocity.y > 0.0 {
        return None;
    }
    let (x, z) = (player.position.x, player.position.z);
    let feet = player.feet_y();

    for (index, platform) in platforms.iter_mut().enumerate() {
        if !platform.overlaps_footprint(x, z, PLAYER_RADIUS) {
            continue;
        }
        let top = platform.top();
        let crossed =
            feet <= top + LANDING_TOLERANCE_ABOVE && prev_feet >= top - LANDING_TOLERANCE_BELOW;
        if !crossed {
            continue;
        }
        if platform.is_glass() && !platform.is_safe() {
            continue;
        }
        platform.crack();
        player.land_on(top);
        return Some(index);
    }
    None
}

/// Seconds between take-off and touching down at the same height.
pub fn jump_airtime(gravity: f32) -> f32 {
    let mut vy = JUMP_VELOCITY;
    let mut height = 0.0;
    let mut elapsed = 0.0;
    loop {
        vy = (vy - gravity * SIM_DT).max(-TERMINAL_FALL_SPEED);
        height += vy * SIM_DT;
        elapsed += SIM_DT;
        if vy <= 0.0 && height <= LANDING_TOLERANCE_ABOVE {
            return elapsed;
        }
    }
}

/// Peak height of a standing jump.
pub fn jump_apex(gravity: f32) -> f32 {
    JUMP_VELOCITY * JUMP_VELOCITY / (2.0 * gravity)
}

/// Farthest horizontal distance a jump can carry the player.
pub fn max_jump_distance(gravity: f32) -> f32 {
    jump_airtime(gravity) * MOVE_SPEED
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use glam::Vec3;

    fn registry_with(platforms: Vec<Platform>) -> PlatformRegistry {
        let mut registry = PlatformRegistry::new();
        for p in platforms {
            registry.add(p);
        }
        registry
    }

    fn slab(y: f32) -> Platform {
        Platform::new(Vec3::new(0.0, y, 0.0), Vec3::new(5.0, 1.0, 5.0), [1.0; 3])
    }

    fn settle(player: &mut Player, registry: &mut PlatformRegistry, steps: usize) -> StepOutcome {
        let mut last = StepOutcome::default();
        for _ in 0..steps {
            last = step_vertical(player, registry, GRAVITY, SIM_DT);
        }
        last
    }

    #[test]
    fn falling_player_lands_and_stays_pinned() {
        let mut registry = registry_with(vec![slab(0.0)]);
        let mut player = Player::new(Vec3::new(0.0, 5.0, 0.0));
        let outcome = settle(&mut player, &mut registry, 120);
        assert_eq!(outcome.landed_on, Some(0));
        assert!(player.grounded);

        let top = registry.get(0).unwrap().top();
        for _ in 0..300 {
            let outcome = step_vertical(&mut player, &mut registry, GRAVITY, SIM_DT);
            assert_eq!(outcome.landed_on, Some(0));
            assert_eq!(player.position.y, top + FEET_OFFSET);
            assert_eq!(player.velocity.y, 0.0);
        }
    }

    #[test]
    fn terminal_speed_does_not_tunnel_through_thin_platform() {
        let mut registry = registry_with(vec![Platform::new(
            Vec3::ZERO,
            Vec3::new(5.0, 0.1, 5.0),
            [1.0; 3],
        )]);
        let mut player = Player::new(Vec3::new(0.0, 25.0, 0.0));
        player.velocity.y = -TERMINAL_FALL_SPEED;
        let outcome = settle(&mut player, &mut registry, 60);
        assert_eq!(outcome.landed_on, Some(0));
        assert!((player.feet_y() - 0.05).abs() < 1e-4);
    }

    #[test]
    fn fall_speed_is_clamped() {
        let mut registry = PlatformRegistry::new();
        let mut player = Player::new(Vec3::new(0.0, 1000.0, 0.0));
        settle(&mut player, &mut registry, 600);
        assert_eq!(player.velocity.y, -TERMINAL_FALL_SPEED);
    }

    #[test]
    fn rising_player_passes_through_from_below() {
        let mut registry = registry_with(vec![slab(3.0)]);
        let mut player = Player::new(Vec3::new(0.0, 2.0, 0.0));
        player.jump();
        let outcome = step_vertical(&mut player, &mut registry, GRAVITY, SIM_DT);
        assert_eq!(outcome.landed_on, None);
        assert!(player.velocity.y > 0.0);
    }

    #[test]
    fn glass_holds_once_then_gives_way() {
        let mut registry = registry_with(vec![slab(0.0).glass()]);
        let mut player = Player::new(Vec3::new(0.0, 4.0, 0.0));
        let mut first = None;
        for step in 0..120 {
            let outcome = step_vertical(&mut player, &mut registry, GRAVITY, SIM_DT);
            if outcome.landed_on.is_some() {
                first = Some(step);
                break;
            }
        }
        assert!(first.is_some());
        let pane = registry.get(0).unwrap();
        assert!(!pane.is_safe());
        assert_eq!(pane.opacity, BROKEN_GLASS_OPACITY);

        let outcome = step_vertical(&mut player, &mut registry, GRAVITY, SIM_DT);
        assert_eq!(outcome.landed_on, None);
        assert!(!player.grounded);
        settle(&mut player, &mut registry, 30);
        assert!(player.feet_y() < 0.0);
    }

    #[test]
    fn broken_glass_lets_scan_reach_the_next_candidate() {
        let mut registry = registry_with(vec![slab(0.0).glass(), slab(0.0)]);
        registry.get_mut(0).unwrap().crack();
        let mut player = Player::new(Vec3::new(0.0, 3.0, 0.0));
        let outcome = settle(&mut player, &mut registry, 60);
        assert_eq!(outcome.landed_on, Some(1));
    }

    #[test]
    fn victory_reported_exactly_once() {
        let mut registry = registry_with(vec![slab(0.0).victory()]);
        let mut player = Player::new(Vec3::new(0.0, 3.0, 0.0));
        let mut wins = 0;
        for _ in 0..400 {
            if step_vertical(&mut player, &mut registry, GRAVITY, SIM_DT).won {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert!(player.has_won());
    }

    #[test]
    fn missing_the_platform_reports_fall_out() {
        let mut registry = registry_with(vec![slab(0.0)]);
        let mut player = Player::new(Vec3::new(10.0, 3.0, 0.0));
        let mut fell = false;
        for _ in 0..600 {
            if step_vertical(&mut player, &mut registry, GRAVITY, SIM_DT).fell_out {
                fell = true;
                break;
            }
        }
        assert!(fell);
    }

    #[test]
    fn jump_arc_matches_tuned_reach() {
        let apex = jump_apex(GRAVITY);
        assert!((apex - 6.875).abs() < 1e-3);
        let reach = max_jump_distance(GRAVITY);
        assert!(reach > 9.5 && reach < 10.5, "reach was {reach}");
        assert!(max_jump_distance(GRAVITY * 0.6) > reach);
    }
}
