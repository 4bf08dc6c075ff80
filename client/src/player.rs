use glam::Vec3;

use crate::config::*;

/// The local avatar's simulated state.
///
/// Only `velocity.y` is integrated. Horizontal motion is applied straight to
/// `position` each step, so there is no sliding or momentum.
pub struct Player {
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
    /// Facing around +Y, reported to presence as the player's rotation.
    pub facing: f32,
    has_won: bool,
    checkpoint: Vec3,
}

impl Player {
    pub fn new(checkpoint: Vec3) -> Self {
        Self {
            position: checkpoint,
            velocity: Vec3::ZERO,
            grounded: false,
            facing: 0.0,
            has_won: false,
            checkpoint,
        }
    }

    pub fn feet_y(&self) -> f32 {
        self.position.y - FEET_OFFSET
    }

    pub fn has_won(&self) -> bool {
        self.has_won
    }

    /// Latch the win. Returns true only on the transition.
    pub fn mark_won(&mut self) -> bool {
        let first = !self.has_won;
        self.has_won = true;
        first
    }

    pub fn checkpoint(&self) -> Vec3 {
        self.checkpoint
    }

    /// Start a fresh level instance anchored at `checkpoint`.
    pub fn reset_for_level(&mut self, checkpoint: Vec3) {
        self.checkpoint = checkpoint;
        self.has_won = false;
        self.facing = 0.0;
        self.respawn();
    }

    pub fn respawn(&mut self) {
        self.position = self.checkpoint;
        self.velocity = Vec3::ZERO;
        self.grounded = false;
    }

    pub fn land_on(&mut self, top: f32) {
        self.position.y = top + FEET_OFFSET;
        self.velocity.y = 0.0;
        self.grounded = true;
    }

    pub fn jump(&mut self) {
        self.velocity.y = JUMP_VELOCITY;
        self.grounded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_latch_reports_first_transition_only() {
        let mut player = Player::new(Vec3::ZERO);
        assert!(player.mark_won());
        assert!(!player.mark_won());
        assert!(player.has_won());
    }

    #[test]
    fn respawn_returns_to_checkpoint_with_zero_velocity() {
        let mut player = Player::new(Vec3::new(0.0, 5.0, 0.0));
        player.position = Vec3::new(3.0, -500.0, -40.0);
        player.velocity = Vec3::new(0.0, -60.0, 0.0);
        player.grounded = true;
        player.respawn();
        assert_eq!(player.position, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(player.velocity, Vec3::ZERO);
        assert!(!player.grounded);
    }

    #[test]
    fn level_reset_clears_win() {
        let mut player = Player::new(Vec3::ZERO);
        player.mark_won();
        player.reset_for_level(Vec3::Y);
        assert!(!player.has_won());
        assert_eq!(player.checkpoint(), Vec3::Y);
        assert_eq!(player.position, Vec3::Y);
    }
}
