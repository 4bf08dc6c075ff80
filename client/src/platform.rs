use glam::{Vec2, Vec3};

use crate::config::{BROKEN_GLASS_OPACITY, GLASS_OPACITY};

/// An axis-aligned box collider the player can stand on.
#[derive(Clone, Debug, PartialEq)]
pub struct Platform {
    center: Vec3,
    size: Vec3,
    top: f32,
    pub color: [f32; 3],
    pub opacity: f32,
    is_glass: bool,
    is_safe: bool,
    is_victory: bool,
}

impl Platform {
    pub fn new(center: Vec3, size: Vec3, color: [f32; 3]) -> Self {
        Self {
            center,
            size,
            top: center.y + size.y / 2.0,
            color,
            opacity: 1.0,
            is_glass: false,
            is_safe: true,
            is_victory: false,
        }
    }

    /// Fragile pane: holds for the first landing only.
    pub fn glass(mut self) -> Self {
        self.is_glass = true;
        self.opacity = GLASS_OPACITY;
        self
    }

    /// Solid platform that looks like glass.
    pub fn tinted(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn victory(mut self) -> Self {
        self.is_victory = true;
        self
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn size(&self) -> Vec3 {
        self.size
    }

    pub fn top(&self) -> f32 {
        self.top
    }

    pub fn is_glass(&self) -> bool {
        self.is_glass
    }

    pub fn is_safe(&self) -> bool {
        self.is_safe
    }

    pub fn is_victory(&self) -> bool {
        self.is_victory
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }

    /// Whether a disc of `radius` centered at (x, z) overlaps the top face.
    pub fn overlaps_footprint(&self, x: f32, z: f32, radius: f32) -> bool {
        let half = self.size / 2.0;
        x + radius > self.center.x - half.x
            && x - radius < self.center.x + half.x
            && z + radius > self.center.z - half.z
            && z - radius < self.center.z + half.z
    }

    /// Horizontal distance between the closest edges of two platforms.
    pub fn edge_distance(&self, other: &Platform) -> f32 {
        let flat = |v: Vec3| Vec2::new(v.x, v.z);
        let reach = (flat(self.size) + flat(other.size)) / 2.0;
        let apart = (flat(self.center) - flat(other.center)).abs() - reach;
        apart.max(Vec2::ZERO).length()
    }

    /// One-way transition taken on the first landing of a glass pane.
    pub fn crack(&mut self) {
        if self.is_glass && self.is_safe {
            self.is_safe = false;
            self.opacity = BROKEN_GLASS_OPACITY;
        }
    }
}

/// Every collider of the loaded level. Rebuilt wholesale on each load.
#[derive(Default)]
pub struct PlatformRegistry {
    platforms: Vec<Platform>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, platform: Platform) -> usize {
        self.platforms.push(platform);
        self.platforms.len() - 1
    }

    /// Drop every platform, returning how many were released.
    pub fn clear(&mut self) -> usize {
        let count = self.platforms.len();
        self.platforms.clear();
        count
    }

    pub fn get(&self, index: usize) -> Option<&Platform> {
        self.platforms.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Platform> {
        self.platforms.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Platform> {
        self.platforms.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Platform> {
        self.platforms.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    pub fn victory_index(&self) -> Option<usize> {
        self.platforms.iter().position(Platform::is_victory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_is_derived_from_center_and_height() {
        let p = Platform::new(Vec3::new(1.0, -2.0, 3.0), Vec3::new(10.0, 1.0, 10.0), [0.3; 3]);
        assert_eq!(p.top(), -1.5);
        assert!(p.is_safe());
        assert!(!p.is_glass());
    }

    #[test]
    fn footprint_overlap_includes_radius() {
        let p = Platform::new(Vec3::ZERO, Vec3::new(5.0, 1.0, 5.0), [1.0; 3]);
        assert!(p.overlaps_footprint(2.9, 0.0, 0.5));
        assert!(!p.overlaps_footprint(3.0, 0.0, 0.5));
        assert!(!p.overlaps_footprint(0.0, -3.1, 0.5));
    }

    #[test]
    fn crack_is_one_shot_and_only_for_glass() {
        let mut solid = Platform::new(Vec3::ZERO, Vec3::ONE, [1.0; 3]);
        solid.crack();
        assert!(solid.is_safe());

        let mut pane = Platform::new(Vec3::ZERO, Vec3::ONE, [1.0; 3]).glass();
        assert_eq!(pane.opacity, GLASS_OPACITY);
        pane.crack();
        assert!(!pane.is_safe());
        assert_eq!(pane.opacity, BROKEN_GLASS_OPACITY);
        pane.crack();
        assert!(!pane.is_safe());
    }

    #[test]
    fn edge_distance_between_offset_boxes() {
        let a = Platform::new(Vec3::ZERO, Vec3::new(5.0, 1.0, 5.0), [1.0; 3]);
        let b = Platform::new(Vec3::new(0.0, 0.0, -8.0), Vec3::new(5.0, 1.0, 5.0), [1.0; 3]);
        assert!((a.edge_distance(&b) - 3.0).abs() < 1e-6);
        let c = Platform::new(Vec3::new(1.0, 0.0, -2.0), Vec3::new(5.0, 1.0, 5.0), [1.0; 3]);
        assert_eq!(a.edge_distance(&c), 0.0);
    }

    #[test]
    fn clear_reports_released_count() {
        let mut registry = PlatformRegistry::new();
        registry.add(Platform::new(Vec3::ZERO, Vec3::ONE, [1.0; 3]));
        registry.add(Platform::new(Vec3::X, Vec3::ONE, [1.0; 3]).victory());
        assert_eq!(registry.victory_index(), Some(1));
        assert_eq!(registry.clear(), 2);
        assert!(registry.is_empty());
    }
}
