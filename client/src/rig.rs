use glam::{Mat4, Vec3};

use crate::animation::Pose;
use crate::color::{Rgb, parse_css_hex};
use crate::presence::Appearance;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyPart {
    Root,
    Torso,
    Head,
    ArmLeft,
    ArmRight,
    LegLeft,
    LegRight,
    NameLabel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialSlot {
    Skin,
    Shirt,
    Pants,
}

/// Colors shared by every body part using the slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigMaterials {
    pub skin: Rgb,
    pub shirt: Rgb,
    pub pants: Rgb,
}

impl Default for RigMaterials {
    fn default() -> Self {
        Self {
            skin: [1.0, 0.804, 0.22],
            shirt: [0.0, 0.533, 1.0],
            pants: [0.133, 0.545, 0.133],
        }
    }
}

impl RigMaterials {
    pub fn color(&self, slot: MaterialSlot) -> Rgb {
        match slot {
            MaterialSlot::Skin => self.skin,
            MaterialSlot::Shirt => self.shirt,
            MaterialSlot::Pants => self.pants,
        }
    }

    /// Apply an appearance in place. Unparseable colors keep their old value.
    pub fn apply(&mut self, appearance: &Appearance) {
        let slots = [
            (&mut self.skin, &appearance.skin),
            (&mut self.shirt, &appearance.shirt),
            (&mut self.pants, &appearance.pants),
        ];
        for (slot, text) in slots {
            match parse_css_hex(text) {
                Some(rgb) => *slot = rgb,
                None => log::warn!("Ignoring invalid color '{}'", text),
            }
        }
    }
}

/// A box hung off a node, offset from the node's pivot.
#[derive(Clone, Copy, Debug)]
pub struct PartShape {
    pub size: Vec3,
    pub offset: Vec3,
    pub material: MaterialSlot,
}

#[derive(Clone, Debug)]
pub struct RigNode {
    pub part: BodyPart,
    /// Pivot position relative to the parent.
    pub offset: Vec3,
    /// Rotation about the pivot's X axis (limb swing).
    pub swing: f32,
    pub shape: Option<PartShape>,
    pub children: Vec<RigNode>,
}

impl RigNode {
    fn new(part: BodyPart, offset: Vec3) -> Self {
        Self {
            part,
            offset,
            swing: 0.0,
            shape: None,
            children: Vec::new(),
        }
    }

    fn with_shape(mut self, size: Vec3, offset: Vec3, material: MaterialSlot) -> Self {
        self.shape = Some(PartShape {
            size,
            offset,
            material,
        });
        self
    }

    fn find_mut(&mut self, part: BodyPart) -> Option<&mut RigNode> {
        if self.part == part {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(part))
    }

    fn find(&self, part: BodyPart) -> Option<&RigNode> {
        if self.part == part {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(part))
    }

    fn collect_boxes(&self, parent: Mat4, materials: &RigMaterials, out: &mut Vec<RigBox>) {
        let local = Mat4::from_translation(self.offset) * Mat4::from_rotation_x(self.swing);
        let world = parent * local;
        if let Some(shape) = &self.shape {
            out.push(RigBox {
                model: world * Mat4::from_translation(shape.offset) * Mat4::from_scale(shape.size),
                color: materials.color(shape.material),
            });
        }
        for child in &self.children {
            child.collect_boxes(world, materials, out);
        }
    }
}

/// A unit-cube instance ready to draw.
#[derive(Clone, Copy, Debug)]
pub struct RigBox {
    pub model: Mat4,
    pub color: Rgb,
}

const TORSO_Y: f32 = 1.0;
const HEAD_Y: f32 = 2.6;
const ARM_Y: f32 = 2.0;
const LABEL_Y: f32 = 4.2;

/// Blocky humanoid: torso, head, two arms and two legs under one root.
/// Limbs pivot at the shoulder/hip and hang down from it.
#[derive(Clone, Debug)]
pub struct CharacterRig {
    pub root: RigNode,
    pub materials: RigMaterials,
    pub label: String,
    /// Rotation of the whole rig about +Y.
    pub yaw: f32,
}

impl CharacterRig {
    pub fn new(label: impl Into<String>) -> Self {
        let limb = Vec3::new(1.0, 2.0, 1.0);
        let hang = Vec3::new(0.0, -1.0, 0.0);

        let mut root = RigNode::new(BodyPart::Root, Vec3::ZERO);
        root.children = vec![
            RigNode::new(BodyPart::Torso, Vec3::Y * TORSO_Y).with_shape(
                Vec3::new(2.0, 2.0, 1.0),
                Vec3::ZERO,
                MaterialSlot::Shirt,
            ),
            RigNode::new(BodyPart::Head, Vec3::Y * HEAD_Y).with_shape(
                Vec3::splat(1.2),
                Vec3::ZERO,
                MaterialSlot::Skin,
            ),
            RigNode::new(BodyPart::ArmLeft, Vec3::new(-1.5, ARM_Y, 0.0)).with_shape(
                limb,
                hang,
                MaterialSlot::Skin,
            ),
            RigNode::new(BodyPart::ArmRight, Vec3::new(1.5, ARM_Y, 0.0)).with_shape(
                limb,
                hang,
                MaterialSlot::Skin,
            ),
            RigNode::new(BodyPart::LegLeft, Vec3::new(-0.5, 0.0, 0.0)).with_shape(
                limb,
                hang,
                MaterialSlot::Pants,
            ),
            RigNode::new(BodyPart::LegRight, Vec3::new(0.5, 0.0, 0.0)).with_shape(
                limb,
                hang,
                MaterialSlot::Pants,
            ),
            RigNode::new(BodyPart::NameLabel, Vec3::Y * LABEL_Y),
        ];

        Self {
            root,
            materials: RigMaterials::default(),
            label: label.into(),
            yaw: 0.0,
        }
    }

    pub fn set_appearance(&mut self, appearance: &Appearance) {
        self.materials.apply(appearance);
    }

    /// Write eased animation values into the limb pivots.
    pub fn apply_pose(&mut self, pose: &Pose) {
        let swings = [
            (BodyPart::LegLeft, pose.leg_left),
            (BodyPart::LegRight, pose.leg_right),
            (BodyPart::ArmLeft, pose.arm_left),
            (BodyPart::ArmRight, pose.arm_right),
        ];
        for (part, swing) in swings {
            if let Some(node) = self.root.find_mut(part) {
                node.swing = swing;
            }
        }
        let lifts = [
            (BodyPart::Torso, TORSO_Y),
            (BodyPart::Head, HEAD_Y),
            (BodyPart::ArmLeft, ARM_Y),
            (BodyPart::ArmRight, ARM_Y),
        ];
        for (part, base) in lifts {
            if let Some(node) = self.root.find_mut(part) {
                node.offset.y = base + pose.body_bob;
            }
        }
    }

    pub fn node(&self, part: BodyPart) -> Option<&RigNode> {
        self.root.find(part)
    }

    /// World-space boxes for a rig standing at `position`.
    pub fn boxes(&self, position: Vec3) -> Vec<RigBox> {
        let mut out = Vec::with_capacity(6);
        let base = Mat4::from_translation(position) * Mat4::from_rotation_y(self.yaw);
        self.root.collect_boxes(base, &self.materials, &mut out);
        out
    }

    /// Where the floating name label is anchored.
    pub fn label_anchor(&self, position: Vec3) -> Vec3 {
        let offset = self.node(BodyPart::NameLabel).map_or(Vec3::ZERO, |n| n.offset);
        position + offset
    }
}
