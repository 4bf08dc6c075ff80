use std::cell::Cell;
use std::rc::Rc;

use winit::keyboard::KeyCode;

use crate::config::{MAX_FRAME_DT, MAX_STEPS_PER_FRAME, POSITION_SYNC_INTERVAL, SIM_DT};
use crate::game::{GameEvent, GameState};
use crate::presence::PositionSample;

/// Cancellation token for a running frame loop. Clones share the flag.
#[derive(Clone, Debug)]
pub struct LoopHandle(Rc<Cell<bool>>);

impl LoopHandle {
    fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn cancel(&self) {
        self.0.set(false);
    }

    pub fn is_active(&self) -> bool {
        self.0.get()
    }
}

/// Fires once per `POSITION_SYNC_INTERVAL` of accumulated frame time.
#[derive(Debug, Default)]
pub struct SyncTimer {
    elapsed: f32,
}

impl SyncTimer {
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed < POSITION_SYNC_INTERVAL {
            return false;
        }
        self.elapsed %= POSITION_SYNC_INTERVAL;
        true
    }
}

/// Everything one frame produced for the host, in emission order.
#[derive(Debug, Default)]
pub struct FrameReport {
    pub steps: u32,
    pub sync: Option<PositionSample>,
    pub events: Vec<GameEvent>,
}

/// Turns variable frame times into fixed simulation steps.
pub struct FrameDriver {
    pub game: GameState,
    accumulator: f32,
    sync: SyncTimer,
    handle: Option<LoopHandle>,
    disposed: bool,
}

impl FrameDriver {
    pub fn new(game: GameState) -> Self {
        Self {
            game,
            accumulator: 0.0,
            sync: SyncTimer::default(),
            handle: None,
            disposed: false,
        }
    }

    /// Start (or keep) the loop. Time spent stopped is not replayed.
    pub fn start(&mut self) -> Option<LoopHandle> {
        if self.disposed {
            log::warn!("Ignoring start on a disposed engine");
            return None;
        }
        if let Some(handle) = self.handle.as_ref().filter(|h| h.is_active()) {
            return Some(handle.clone());
        }
        self.accumulator = 0.0;
        let stale = self.game.take_events();
        if !stale.is_empty() {
            log::debug!("Discarding {} events queued while stopped", stale.len());
        }
        let handle = LoopHandle::new();
        self.handle = Some(handle.clone());
        log::debug!("Frame loop started");
        Some(handle)
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
            log::debug!("Frame loop stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(LoopHandle::is_active)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Key presses only count while the loop runs. Releases always pass so
    /// nothing sticks across a pause.
    pub fn handle_key_press(&mut self, key: KeyCode) {
        if self.is_running() {
            self.game.handle_key_press(key);
        }
    }

    pub fn handle_key_release(&mut self, key: KeyCode) {
        self.game.handle_key_release(key);
    }

    pub fn request_jump(&mut self) {
        if self.is_running() {
            self.game.request_jump();
        }
    }

    /// Run one frame. `elapsed` is real time since the previous frame and
    /// `clock` the current wall time, both in seconds.
    pub fn advance(&mut self, elapsed: f32, clock: f64) -> FrameReport {
        if !self.is_running() {
            return FrameReport::default();
        }
        let dt = elapsed.clamp(0.0, MAX_FRAME_DT);
        self.accumulator += dt;

        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_STEPS_PER_FRAME {
            self.game.step(clock);
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        if self.accumulator >= SIM_DT {
            log::debug!("Dropping {:.3}s of simulation backlog", self.accumulator);
            self.accumulator = 0.0;
        }

        FrameReport {
            steps,
            sync: self.sync.tick(dt).then(|| self.game.position_sample()),
            events: self.game.take_events(),
        }
    }

    /// Stop for good. Returns false when already disposed.
    pub fn shutdown(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.stop();
        self.disposed = true;
        self.game.take_events();
        log::info!("Engine disposed");
        true
    }
}
