//! Native entry point: lays out a course headlessly and reports on it.
//! The browser build is driven through the library's `ObbyEngine`.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use obby::config::SIM_DT;
    use obby::level::route_is_reachable;
    use obby::physics::{jump_apex, max_jump_distance};
    use obby::{FrameDriver, GameState, LevelKind};
    use web_time::Instant;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let kinds: Vec<LevelKind> = match std::env::args().nth(1) {
        Some(id) => match id.parse::<LevelKind>() {
            Ok(kind) => vec![kind],
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(2);
            }
        },
        None => vec![
            LevelKind::Rainbow,
            LevelKind::Glass,
            LevelKind::Space,
            LevelKind::Lava,
        ],
    };

    for kind in kinds {
        let mut driver = FrameDriver::new(GameState::new("local", "Player"));
        driver.game.load_level(kind);
        let Some(level) = driver.game.level().cloned() else {
            continue;
        };
        let gravity = level.gravity();
        log::info!(
            "{}: reach {:.2}, apex {:.2}, route reachable: {}",
            kind,
            max_jump_distance(gravity),
            jump_apex(gravity),
            route_is_reachable(&driver.game.platforms, &level.route, gravity)
        );

        // Let the player drop onto the start pad.
        driver.start();
        let started = Instant::now();
        let mut syncs = 0;
        for frame in 0..180 {
            let report = driver.advance(SIM_DT, frame as f64 * SIM_DT as f64);
            syncs += report.sync.is_some() as u32;
        }
        log::info!(
            "{}: settled at {:?} (grounded: {}), {} position syncs, simulated in {:?}",
            kind,
            driver.game.player.position,
            driver.game.player.grounded,
            syncs,
            started.elapsed()
        );
        driver.shutdown();
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
