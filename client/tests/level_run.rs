use glam::Vec3;
use obby::config::{MOVE_SPEED, PLAYER_RADIUS, SIM_DT};
use obby::platform::Platform;
use obby::{FrameDriver, GameEvent, GameState, LevelKind};
use rand::SeedableRng;
use rand::rngs::SmallRng;

const LAUNCH_INSET: f32 = 1.0;
const ARRIVED: f32 = 0.05;
const STEP_BUDGET: usize = 20_000;

/// Closest point on `platform`'s top to `target`, kept `inset` from the edges.
fn launch_point(platform: &Platform, target: Vec3, inset: f32) -> Vec3 {
    let center = platform.center();
    let half = platform.size() / 2.0 - Vec3::splat(inset);
    Vec3::new(
        target.x.clamp(center.x - half.x, center.x + half.x),
        0.0,
        target.z.clamp(center.z - half.z, center.z + half.z),
    )
}

/// Face `target` and push the stick just hard enough not to overshoot.
fn steer(game: &mut GameState, target: Option<Vec3>) {
    let Some(target) = target else {
        game.set_joystick(0.0, 0.0);
        return;
    };
    let offset = Vec3::new(
        target.x - game.player.position.x,
        0.0,
        target.z - game.player.position.z,
    );
    let distance = offset.length();
    if distance < ARRIVED {
        game.set_joystick(0.0, 0.0);
        return;
    }
    game.camera.yaw = (-offset.x).atan2(-offset.z);
    game.set_joystick(0.0, (distance / (MOVE_SPEED * SIM_DT)).min(1.0));
}

/// Route position of the platform the player is standing on.
fn standing_on(game: &GameState) -> Option<usize> {
    if !game.player.grounded {
        return None;
    }
    let level = game.level()?;
    let (x, z) = (game.player.position.x, game.player.position.z);
    let feet = game.player.feet_y();
    level.route.iter().position(|&index| {
        game.platforms.get(index).is_some_and(|p| {
            p.overlaps_footprint(x, z, PLAYER_RADIUS) && (p.top() - feet).abs() < 1e-3
        })
    })
}

/// Hop along the route until the victory platform is reached. Returns every
/// event the frames produced and the number of steps taken.
fn autopilot(driver: &mut FrameDriver) -> (Vec<GameEvent>, usize) {
    let route = driver.game.level().map(|l| l.route.clone()).unwrap_or_default();
    let mut events = Vec::new();
    let mut leg = 0;
    let mut flight_target: Option<Vec3> = None;
    let mut clock = 0.0;

    for steps in 0..STEP_BUDGET {
        if driver.game.player.has_won() {
            return (events, steps);
        }
        if let Some(on) = standing_on(&driver.game) {
            leg = on;
            flight_target = None;
        }

        let next = route.get(leg + 1).and_then(|&i| driver.game.platforms.get(i)).cloned();
        let here = route.get(leg).and_then(|&i| driver.game.platforms.get(i)).cloned();
        match (driver.game.player.grounded, here, next) {
            (true, Some(here), Some(next)) => {
                let launch = launch_point(&here, next.center(), LAUNCH_INSET);
                let at = driver.game.player.position;
                if Vec3::new(at.x - launch.x, 0.0, at.z - launch.z).length() < ARRIVED * 2.0 {
                    driver.game.set_joystick(0.0, 0.0);
                    driver.game.request_jump();
                    flight_target = Some(next.center());
                } else {
                    steer(&mut driver.game, Some(launch));
                }
            }
            (true, _, _) => steer(&mut driver.game, None),
            (false, _, _) => steer(&mut driver.game, flight_target),
        }

        clock += SIM_DT as f64;
        events.extend(driver.advance(SIM_DT, clock).events);
    }
    (events, STEP_BUDGET)
}

fn driver(seed: u64) -> FrameDriver {
    let mut game = GameState::with_rng("runner", "Runner", SmallRng::seed_from_u64(seed));
    game.load_level(LevelKind::Rainbow);
    let mut driver = FrameDriver::new(game);
    driver.start();
    driver
}

#[test]
fn autopilot_reaches_victory_on_rainbow() {
    for seed in [1, 7, 42] {
        let mut driver = driver(seed);
        let (mut events, steps) = autopilot(&mut driver);
        assert!(steps < STEP_BUDGET, "seed {seed}: never reached victory");
        assert!(driver.game.player.has_won());

        // Celebrate for a few seconds; nothing fires twice.
        let mut clock = steps as f64 * SIM_DT as f64;
        for _ in 0..180 {
            driver.game.set_joystick(0.0, 1.0);
            driver.game.request_jump();
            clock += SIM_DT as f64;
            events.extend(driver.advance(SIM_DT, clock).events);
        }

        let wins = events.iter().filter(|e| **e == GameEvent::Won).count();
        assert_eq!(wins, 1, "seed {seed}");
        assert!(
            !events.contains(&GameEvent::Sound(obby::SoundCue::Death)),
            "seed {seed}: autopilot fell"
        );
    }
}

#[test]
fn reloading_after_a_win_allows_another() {
    let mut driver = driver(3);
    let (events, _) = autopilot(&mut driver);
    assert_eq!(events.iter().filter(|e| **e == GameEvent::Won).count(), 1);

    driver.game.load_level(LevelKind::Rainbow);
    assert!(!driver.game.player.has_won());
    let (events, steps) = autopilot(&mut driver);
    assert!(steps < STEP_BUDGET);
    assert_eq!(events.iter().filter(|e| **e == GameEvent::Won).count(), 1);
}
