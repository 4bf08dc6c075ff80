use std::collections::{HashMap, HashSet};

use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use winit::keyboard::KeyCode;

use crate::animation::Animator;
use crate::camera::{CameraAngles, CameraPose};
use crate::color::Rgb;
use crate::config::*;
use crate::input::{InputState, TouchAction, TouchControls};
use crate::level::{Level, LevelKind, generate};
use crate::physics::step_vertical;
use crate::platform::PlatformRegistry;
use crate::player::Player;
use crate::presence::{Appearance, PositionSample, RemotePlayer};
use crate::rig::{CharacterRig, RigBox};
use crate::settings::GameSettings;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoundCue {
    Jump,
    Step,
    Death,
}

/// Things the host or the audio layer must react to, drained once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Won,
    PauseRequested,
    PointerReleased,
    Sound(SoundCue),
}

/// Another player's avatar. Drawn only, never collided with.
pub struct RemoteAvatar {
    pub rig: CharacterRig,
    pub position: Vec3,
}

pub struct GameState {
    pub player: Player,
    pub camera: CameraAngles,
    pub input: InputState,
    pub touch: TouchControls,
    pub platforms: PlatformRegistry,
    pub rig: CharacterRig,
    pub settings: GameSettings,
    animator: Animator,
    level: Option<Level>,
    remote_players: HashMap<String, RemoteAvatar>,
    local_id: String,
    events: Vec<GameEvent>,
    /// No level has placed the player yet.
    first_spawn: bool,
    last_step_sound: Option<f64>,
    rng: SmallRng,
}

impl GameState {
    pub fn new(local_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self::with_rng(local_id, username, SmallRng::from_rng(&mut rand::rng()))
    }

    /// Deterministic lateral offsets, for tests and replays.
    pub fn with_rng(
        local_id: impl Into<String>,
        username: impl Into<String>,
        rng: SmallRng,
    ) -> Self {
        let checkpoint = Vec3::from_array(CHECKPOINT);
        let mut rig = CharacterRig::new(username);
        rig.set_appearance(&Appearance::default());
        Self {
            player: Player::new(checkpoint),
            camera: CameraAngles::default(),
            input: InputState::new(),
            touch: TouchControls::new(),
            platforms: PlatformRegistry::new(),
            rig,
            settings: GameSettings::default(),
            animator: Animator::new(),
            level: None,
            remote_players: HashMap::new(),
            local_id: local_id.into(),
            events: Vec::new(),
            first_spawn: true,
            last_step_sound: None,
            rng,
        }
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn sky_color(&self) -> Rgb {
        self.level
            .as_ref()
            .map_or(LevelKind::default().theme().sky, |level| level.theme.sky)
    }

    fn gravity(&self) -> f32 {
        self.level.as_ref().map_or(GRAVITY, Level::gravity)
    }

    /// Replace the current level and place the player at its checkpoint.
    pub fn load_level(&mut self, kind: LevelKind) {
        let level = generate(kind, &mut self.rng, &mut self.platforms);
        self.player.reset_for_level(level.checkpoint);
        self.camera.reset_pitch();
        self.level = Some(level);
        self.first_spawn = false;
    }

    fn respawn(&mut self) {
        if !self.first_spawn && !self.player.has_won() {
            self.events.push(GameEvent::Sound(SoundCue::Death));
        }
        log::debug!("Respawning at {:?}", self.player.checkpoint());
        self.player.respawn();
        self.camera.reset_pitch();
    }

    /// One fixed simulation step. `clock` is wall time in seconds.
    pub fn step(&mut self, clock: f64) {
        let intent = self.input.take_intent();
        self.camera.apply_look(intent.look);

        let gravity = self.gravity();
        let outcome = step_vertical(&mut self.player, &mut self.platforms, gravity, SIM_DT);
        if outcome.won {
            log::info!("Victory platform reached");
            self.events.push(GameEvent::Won);
            self.release_pointer();
        }
        if outcome.fell_out {
            self.respawn();
        }

        let moving = self.apply_movement(intent.forward, intent.strafe, clock);

        let pose = *self.animator.update(
            self.player.grounded,
            moving,
            self.player.has_won(),
            clock,
        );
        self.rig.apply_pose(&pose);
        self.rig.yaw = self.player.facing;
    }

    /// Instant-stop horizontal motion relative to camera yaw.
    fn apply_movement(&mut self, forward: f32, strafe: f32, clock: f64) -> bool {
        if self.player.has_won() {
            self.player.facing += VICTORY_SPIN_RATE;
            return false;
        }
        if forward.abs() <= MOVE_DEADZONE && strafe.abs() <= MOVE_DEADZONE {
            return false;
        }

        let (ahead, right) = self.camera.ground_axes();
        let motion = ahead * forward + right * strafe;
        self.player.position += motion * MOVE_SPEED * SIM_DT;
        if motion.length_squared() > 1e-6 {
            self.player.facing = motion.x.atan2(motion.z);
        }

        if self.player.grounded {
            let due = self
                .last_step_sound
                .is_none_or(|last| clock - last > STEP_SOUND_INTERVAL as f64);
            if due {
                self.events.push(GameEvent::Sound(SoundCue::Step));
                self.last_step_sound = Some(clock);
            }
        }
        true
    }

    pub fn handle_key_press(&mut self, key: KeyCode) {
        match key {
            KeyCode::Space => self.request_jump(),
            // Escape while locked only leaves the focused host widget.
            KeyCode::Escape if !self.input.controls_active() => {}
            KeyCode::Escape => {
                self.events.push(GameEvent::PauseRequested);
                self.release_pointer();
            }
            _ => self.input.handle_key_press(key),
        }
    }

    pub fn handle_key_release(&mut self, key: KeyCode) {
        self.input.handle_key_release(key);
    }

    /// Jump now if allowed; dropped requests are not buffered.
    pub fn request_jump(&mut self) {
        if !self.input.controls_active() || self.player.has_won() || !self.player.grounded {
            return;
        }
        self.player.jump();
        self.events.push(GameEvent::Sound(SoundCue::Jump));
    }

    pub fn set_controls_active(&mut self, active: bool) {
        self.input.set_controls_active(active);
    }

    pub fn set_joystick(&mut self, x: f32, y: f32) {
        self.input.set_joystick(x, y);
    }

    /// Touch-drag look delta in CSS pixels.
    pub fn move_camera(&mut self, dx: f32, dy: f32) {
        self.input.handle_touch_look(dx, dy);
    }

    pub fn handle_mouse_move(&mut self, dx: f32, dy: f32) {
        self.input.handle_mouse_move(dx, dy);
    }

    pub fn handle_touch_action(&mut self, action: TouchAction) {
        match action {
            TouchAction::Move(stick) => self.set_joystick(stick.x, stick.y),
            TouchAction::Look(delta) => self.move_camera(delta.x, delta.y),
        }
    }

    pub fn set_pointer_captured(&mut self, captured: bool) {
        self.input.pointer_captured = captured;
    }

    fn release_pointer(&mut self) {
        self.input.pointer_captured = false;
        self.events.push(GameEvent::PointerReleased);
    }

    pub fn set_appearance(&mut self, appearance: &Appearance) {
        self.rig.set_appearance(appearance);
    }

    /// Sync avatars with a presence snapshot. Rigs persist across updates so
    /// labels and colors are only rebuilt for new players.
    pub fn update_remote_players(&mut self, players: Vec<RemotePlayer>) {
        let mut seen = HashSet::with_capacity(players.len());
        for remote in players {
            if remote.id == self.local_id {
                continue;
            }
            let Some(position) = remote.position.filter(|_| remote.online) else {
                continue;
            };
            let avatar = self
                .remote_players
                .entry(remote.id.clone())
                .or_insert_with(|| {
                    log::debug!("Remote player {} appeared", remote.username);
                    RemoteAvatar {
                        rig: CharacterRig::new(remote.username.clone()),
                        position,
                    }
                });
            avatar.position = position;
            avatar.rig.yaw = remote.rotation.unwrap_or(0.0);
            avatar.rig.label = remote.username;
            avatar.rig.set_appearance(&remote.appearance);
            seen.insert(remote.id);
        }
        self.remote_players.retain(|id, _| seen.contains(id));
    }

    pub fn remote_players(&self) -> impl Iterator<Item = (&String, &RemoteAvatar)> {
        self.remote_players.iter()
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn position_sample(&self) -> PositionSample {
        PositionSample::new(self.player.position, self.player.facing)
    }

    pub fn camera_pose(&self) -> CameraPose {
        CameraPose::orbit(self.player.position, &self.camera)
    }

    /// Every character box to draw this frame, local rig first.
    pub fn character_boxes(&self) -> Vec<RigBox> {
        let mut boxes = self.rig.boxes(self.player.position);
        for avatar in self.remote_players.values() {
            boxes.extend(avatar.rig.boxes(avatar.position));
        }
        boxes
    }

    /// Name labels as (text, world anchor).
    pub fn labels(&self) -> Vec<(&str, Vec3)> {
        std::iter::once((self.rig.label.as_str(), self.rig.label_anchor(self.player.position)))
            .chain(
                self.remote_players
                    .values()
                    .map(|a| (a.rig.label.as_str(), a.rig.label_anchor(a.position))),
            )
            .collect()
    }

    /// `pad_center` is the virtual stick's on-screen center.
    pub fn touch_start(&mut self, id: i32, point: Vec2, surface_width: f32, pad_center: Vec2) {
        if let Some(action) = self.touch.touch_start(id, point, surface_width, pad_center) {
            self.handle_touch_action(action);
        }
    }

    pub fn touch_move(&mut self, id: i32, point: Vec2) {
        if let Some(action) = self.touch.touch_move(id, point) {
            self.handle_touch_action(action);
        }
    }

    pub fn touch_end(&mut self, id: i32) {
        if let Some(action) = self.touch.touch_end(id) {
            self.handle_touch_action(action);
        }
    }
}
