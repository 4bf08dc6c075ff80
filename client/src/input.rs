use std::collections::HashSet;

use glam::Vec2;
use winit::keyboard::KeyCode;

use crate::config::{JOYSTICK_RADIUS, MOUSE_SENSITIVITY, TOUCH_LOOK_SENSITIVITY};

const MOVE_KEYS: [KeyCode; 4] = [KeyCode::KeyW, KeyCode::KeyA, KeyCode::KeyS, KeyCode::KeyD];

/// Movement and look collected since the previous step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameIntent {
    pub forward: f32,
    pub strafe: f32,
    /// Yaw and pitch deltas in radians.
    pub look: Vec2,
}

pub struct InputState {
    pressed_keys: HashSet<KeyCode>,
    joystick: Vec2,
    look_delta: Vec2,
    controls_active: bool,
    pub pointer_captured: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            pressed_keys: HashSet::new(),
            joystick: Vec2::ZERO,
            look_delta: Vec2::ZERO,
            controls_active: true,
            pointer_captured: false,
        }
    }

    pub fn controls_active(&self) -> bool {
        self.controls_active
    }

    /// Engaging the lock (e.g. chat focus) forgets every held movement key.
    pub fn set_controls_active(&mut self, active: bool) {
        self.controls_active = active;
        if !active {
            self.pressed_keys.clear();
        }
    }

    pub fn handle_key_press(&mut self, key: KeyCode) {
        if self.controls_active && MOVE_KEYS.contains(&key) {
            self.pressed_keys.insert(key);
        }
    }

    /// Releases are honoured even while locked so no key sticks.
    pub fn handle_key_release(&mut self, key: KeyCode) {
        self.pressed_keys.remove(&key);
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Raw pointer motion; ignored unless the pointer is captured.
    pub fn handle_mouse_move(&mut self, dx: f32, dy: f32) {
        if self.pointer_captured {
            self.look_delta -= Vec2::new(dx, dy) * MOUSE_SENSITIVITY;
        }
    }

    /// Touch-drag look. Allowed while locked.
    pub fn handle_touch_look(&mut self, dx: f32, dy: f32) {
        self.look_delta -= Vec2::new(dx, dy) * TOUCH_LOOK_SENSITIVITY;
    }

    /// Virtual stick in [-1, 1] per axis, +y forward. Recentering is always accepted.
    pub fn set_joystick(&mut self, x: f32, y: f32) {
        let vector = Vec2::new(x, y).clamp(Vec2::NEG_ONE, Vec2::ONE);
        if self.controls_active || vector == Vec2::ZERO {
            self.joystick = vector;
        }
    }

    pub fn joystick(&self) -> Vec2 {
        self.joystick
    }

    /// Fold every source into this step's intent and consume look deltas.
    pub fn take_intent(&mut self) -> FrameIntent {
        let look = std::mem::take(&mut self.look_delta);
        if !self.controls_active {
            return FrameIntent {
                look,
                ..FrameIntent::default()
            };
        }

        let axis = |positive: KeyCode, negative: KeyCode| {
            self.is_pressed(positive) as i32 as f32 - self.is_pressed(negative) as i32 as f32
        };
        let forward = axis(KeyCode::KeyW, KeyCode::KeyS) + self.joystick.y;
        let strafe = axis(KeyCode::KeyD, KeyCode::KeyA) + self.joystick.x;

        FrameIntent {
            forward: forward.clamp(-1.0, 1.0),
            strafe: strafe.clamp(-1.0, 1.0),
            look,
        }
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

/// What a touch contributed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TouchAction {
    Move(Vec2),
    Look(Vec2),
}

/// Splits touches between the virtual stick (left half) and look (right half).
///
/// Each source is owned by at most one touch id at a time and a touch never
/// owns both.
#[derive(Default)]
pub struct TouchControls {
    move_touch: Option<i32>,
    pad_center: Vec2,
    look_touch: Option<i32>,
    last_look: Vec2,
}

impl TouchControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch_start(
        &mut self,
        id: i32,
        point: Vec2,
        surface_width: f32,
        pad_center: Vec2,
    ) -> Option<TouchAction> {
        if self.move_touch.is_none() && point.x < surface_width / 2.0 {
            self.move_touch = Some(id);
            self.pad_center = pad_center;
            return Some(TouchAction::Move(self.stick_vector(point)));
        }
        if self.look_touch.is_none() && point.x > surface_width / 2.0 {
            self.look_touch = Some(id);
            self.last_look = point;
        }
        None
    }

    pub fn touch_move(&mut self, id: i32, point: Vec2) -> Option<TouchAction> {
        if self.move_touch == Some(id) {
            return Some(TouchAction::Move(self.stick_vector(point)));
        }
        if self.look_touch == Some(id) {
            let delta = point - self.last_look;
            self.last_look = point;
            return Some(TouchAction::Look(delta));
        }
        None
    }

    /// Lifting the stick touch recenters it.
    pub fn touch_end(&mut self, id: i32) -> Option<TouchAction> {
        if self.move_touch == Some(id) {
            self.move_touch = None;
            return Some(TouchAction::Move(Vec2::ZERO));
        }
        if self.look_touch == Some(id) {
            self.look_touch = None;
        }
        None
    }

    /// Offset from the pad center clamped to the pad radius, screen y flipped.
    fn stick_vector(&self, point: Vec2) -> Vec2 {
        let offset = (point - self.pad_center).clamp_length_max(JOYSTICK_RADIUS);
        Vec2::new(offset.x, -offset.y) / JOYSTICK_RADIUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_forward_and_strafe() {
        let mut input = InputState::new();
        input.handle_key_press(KeyCode::KeyW);
        input.handle_key_press(KeyCode::KeyD);
        let intent = input.take_intent();
        assert_eq!(intent.forward, 1.0);
        assert_eq!(intent.strafe, 1.0);
        input.handle_key_press(KeyCode::KeyS);
        assert_eq!(input.take_intent().forward, 0.0);
    }

    #[test]
    fn release_while_locked_clears_key() {
        let mut input = InputState::new();
        input.handle_key_press(KeyCode::KeyW);
        input.controls_active = false;
        input.handle_key_release(KeyCode::KeyW);
        input.controls_active = true;
        assert!(!input.is_pressed(KeyCode::KeyW));
        assert_eq!(input.take_intent().forward, 0.0);
    }

    #[test]
    fn lock_clears_keys_and_blocks_new_presses() {
        let mut input = InputState::new();
        input.handle_key_press(KeyCode::KeyA);
        input.set_controls_active(false);
        assert!(!input.is_pressed(KeyCode::KeyA));
        input.handle_key_press(KeyCode::KeyW);
        assert!(!input.is_pressed(KeyCode::KeyW));
        input.set_controls_active(true);
        assert_eq!(input.take_intent(), FrameIntent::default());
    }

    #[test]
    fn lock_keeps_look_but_zeroes_movement() {
        let mut input = InputState::new();
        input.set_joystick(0.0, 1.0);
        input.set_controls_active(false);
        input.handle_touch_look(10.0, 0.0);
        let intent = input.take_intent();
        assert_eq!(intent.forward, 0.0);
        assert!((intent.look.x + 10.0 * TOUCH_LOOK_SENSITIVITY).abs() < 1e-6);
    }

    #[test]
    fn mouse_look_requires_capture() {
        let mut input = InputState::new();
        input.handle_mouse_move(100.0, 0.0);
        assert_eq!(input.take_intent().look, Vec2::ZERO);
        input.pointer_captured = true;
        input.handle_mouse_move(100.0, 50.0);
        let look = input.take_intent().look;
        assert!((look.x + 0.3).abs() < 1e-6);
        assert!((look.y + 0.15).abs() < 1e-6);
        assert_eq!(input.take_intent().look, Vec2::ZERO);
    }

    #[test]
    fn joystick_and_keys_saturate() {
        let mut input = InputState::new();
        input.set_joystick(0.0, 5.0);
        assert_eq!(input.joystick(), Vec2::new(0.0, 1.0));
        input.handle_key_press(KeyCode::KeyW);
        assert_eq!(input.take_intent().forward, 1.0);
    }

    #[test]
    fn stick_is_radius_clamped_and_recenters() {
        let mut touches = TouchControls::new();
        let center = Vec2::new(100.0, 500.0);
        let action = touches.touch_start(1, Vec2::new(100.0, 400.0), 800.0, center);
        assert_eq!(action, Some(TouchAction::Move(Vec2::new(0.0, 1.0))));
        let Some(TouchAction::Move(v)) = touches.touch_move(1, Vec2::new(120.0, 500.0)) else {
            panic!("expected move");
        };
        assert!((v - Vec2::new(0.5, 0.0)).length() < 1e-6);
        assert_eq!(touches.touch_end(1), Some(TouchAction::Move(Vec2::ZERO)));
        assert_eq!(touches.touch_move(1, Vec2::new(0.0, 0.0)), None);
    }

    #[test]
    fn look_touch_is_exclusive_from_move_touch() {
        let mut touches = TouchControls::new();
        let center = Vec2::new(100.0, 500.0);
        assert!(touches.touch_start(1, Vec2::new(90.0, 500.0), 800.0, center).is_some());
        assert_eq!(touches.touch_start(2, Vec2::new(600.0, 300.0), 800.0, center), None);
        assert_eq!(
            touches.touch_move(2, Vec2::new(610.0, 295.0)),
            Some(TouchAction::Look(Vec2::new(10.0, -5.0)))
        );
        // a second touch on the left does not steal the stick
        assert_eq!(touches.touch_start(3, Vec2::new(50.0, 500.0), 800.0, center), None);
        assert_eq!(touches.touch_move(3, Vec2::new(60.0, 500.0)), None);
        touches.touch_end(2);
        assert_eq!(touches.touch_move(2, Vec2::new(700.0, 300.0)), None);
    }

    #[test]
    fn recenter_is_accepted_while_locked() {
        let mut input = InputState::new();
        input.set_joystick(0.5, 0.5);
        input.set_controls_active(false);
        input.set_joystick(1.0, 1.0);
        assert_eq!(input.joystick(), Vec2::new(0.5, 0.5));
        input.set_joystick(0.0, 0.0);
        assert_eq!(input.joystick(), Vec2::ZERO);
    }
}
