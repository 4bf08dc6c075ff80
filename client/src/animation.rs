use std::f32::consts::PI;
use std::f64::consts::TAU;

use crate::config::{ANIM_BLEND_RATE, WALK_SWING, WALK_TIMER_STEP};

/// Limb swing angles (radians about X) and vertical body offset.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose {
    pub leg_left: f32,
    pub leg_right: f32,
    pub arm_left: f32,
    pub arm_right: f32,
    pub body_bob: f32,
}

impl Pose {
    fn lerp_toward(&mut self, target: &Pose, amount: f32) {
        let ease = |from: &mut f32, to: f32| *from += (to - *from) * amount;
        ease(&mut self.leg_left, target.leg_left);
        ease(&mut self.leg_right, target.leg_right);
        ease(&mut self.arm_left, target.arm_left);
        ease(&mut self.arm_right, target.arm_right);
        ease(&mut self.body_bob, target.body_bob);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimationMode {
    Victory,
    Airborne,
    Walk,
    Idle,
}

impl AnimationMode {
    pub fn select(grounded: bool, moving: bool, has_won: bool) -> Self {
        if has_won {
            AnimationMode::Victory
        } else if !grounded {
            AnimationMode::Airborne
        } else if moving {
            AnimationMode::Walk
        } else {
            AnimationMode::Idle
        }
    }
}

/// Wall-clock phase wrapped on a whole number of periods to keep f32 precision.
fn phase(clock: f64, rate: f64) -> f32 {
    (clock * rate).rem_euclid(TAU * 1024.0) as f32
}

/// Target pose for `mode`. `clock` is wall time in seconds.
pub fn target_pose(mode: AnimationMode, walk_timer: f32, clock: f64) -> Pose {
    match mode {
        AnimationMode::Victory => {
            let t = phase(clock, 10.0);
            Pose {
                arm_left: t.sin() * 2.5,
                arm_right: (t + PI).sin() * 2.5,
                body_bob: (t * 0.5).sin().abs() * 0.5,
                ..Pose::default()
            }
        }
        AnimationMode::Airborne => Pose {
            leg_left: -0.5,
            leg_right: 0.2,
            arm_left: 2.8,
            arm_right: 2.8,
            body_bob: 0.1,
        },
        AnimationMode::Walk => Pose {
            leg_left: walk_timer.sin() * WALK_SWING,
            leg_right: (walk_timer + PI).sin() * WALK_SWING,
            arm_left: (walk_timer + PI).sin() * WALK_SWING,
            arm_right: walk_timer.sin() * WALK_SWING,
            body_bob: walk_timer.sin().abs() * 0.1,
        },
        AnimationMode::Idle => {
            let t = phase(clock, 2.0);
            Pose {
                arm_left: t.sin() * 0.05,
                arm_right: (t + PI).sin() * 0.05,
                body_bob: (t * 2.0).sin() * 0.02,
                ..Pose::default()
            }
        }
    }
}

/// Eases the rig toward the pose of the current motion state.
#[derive(Clone, Debug, Default)]
pub struct Animator {
    current: Pose,
    walk_timer: f32,
    mode: Option<AnimationMode>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pose(&self) -> &Pose {
        &self.current
    }

    pub fn mode(&self) -> Option<AnimationMode> {
        self.mode
    }

    pub fn walk_timer(&self) -> f32 {
        self.walk_timer
    }

    pub fn update(&mut self, grounded: bool, moving: bool, has_won: bool, clock: f64) -> &Pose {
        let mode = AnimationMode::select(grounded, moving, has_won);
        if mode == AnimationMode::Walk {
            self.walk_timer += WALK_TIMER_STEP;
        }
        let target = target_pose(mode, self.walk_timer, clock);
        self.current.lerp_toward(&target, ANIM_BLEND_RATE);
        self.mode = Some(mode);
        &self.current
    }
}
