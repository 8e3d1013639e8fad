//! The hand-authored teacher figure.
//!
//! A fixed hierarchy of named segments. Nodes are stored parent-first, and a
//! segment's discriminant is its node index, so lookups never search.

use glam::{Mat4, Quat, Vec3};
use serde::Serialize;

/// Every node of the rig, in parent-before-child order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Root,
    Torso,
    Head,
    LeftEye,
    RightEye,
    Glasses,
    HairFront,
    HairLeft,
    HairRight,
    Headwear,
    LeftUpperArm,
    LeftForearm,
    LeftHand,
    RightUpperArm,
    RightForearm,
    RightHand,
    Book,
    LeftLeg,
    LeftShoe,
    RightLeg,
    RightShoe,
    SpeechBubble,
}

impl Segment {
    pub const COUNT: usize = 22;

    pub const ALL: [Segment; Self::COUNT] = [
        Segment::Root,
        Segment::Torso,
        Segment::Head,
        Segment::LeftEye,
        Segment::RightEye,
        Segment::Glasses,
        Segment::HairFront,
        Segment::HairLeft,
        Segment::HairRight,
        Segment::Headwear,
        Segment::LeftUpperArm,
        Segment::LeftForearm,
        Segment::LeftHand,
        Segment::RightUpperArm,
        Segment::RightForearm,
        Segment::RightHand,
        Segment::Book,
        Segment::LeftLeg,
        Segment::LeftShoe,
        Segment::RightLeg,
        Segment::RightShoe,
        Segment::SpeechBubble,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn role(self) -> SegmentRole {
        match self {
            Segment::Root => SegmentRole::Group,
            Segment::LeftEye | Segment::RightEye => SegmentRole::Eye,
            Segment::HairFront | Segment::HairLeft | Segment::HairRight => SegmentRole::Hair,
            Segment::Glasses | Segment::Headwear | Segment::Book => SegmentRole::Accessory,
            Segment::SpeechBubble => SegmentRole::Overlay,
            _ => SegmentRole::Body,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentRole {
    Group,
    Body,
    Eye,
    Hair,
    Accessory,
    /// Shown only in certain behavior states
    Overlay,
}

/// Untessellated shape. Segment counts come from the quality tier at draw time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    None,
    Sphere { radius: f32 },
    Cuboid { size: [f32; 3] },
    Cylinder { radius: f32, height: f32 },
    Panel { width: f32, height: f32, depth: f32 },
}

impl Shape {
    /// Half extents of the local bounding box.
    pub fn half_extents(&self) -> Vec3 {
        match *self {
            Shape::None => Vec3::ZERO,
            Shape::Sphere { radius } => Vec3::splat(radius),
            Shape::Cuboid { size } => Vec3::from(size) * 0.5,
            Shape::Cylinder { radius, height } => Vec3::new(radius, height * 0.5, radius),
            Shape::Panel {
                width,
                height,
                depth,
            } => Vec3::new(width, height, depth) * 0.5,
        }
    }
}

/// PBR material parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Material {
    pub base_color: [f32; 4],
    pub roughness: f32,
    pub metalness: f32,
    pub emissive_intensity: f32,
}

impl Material {
    pub fn new(hex: u32, roughness: f32) -> Self {
        Self {
            base_color: sensei3d_fx::rgb_hex(hex),
            roughness,
            metalness: 0.0,
            emissive_intensity: 0.0,
        }
    }

    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness;
        self
    }
}

/// Translation / rotation / scale relative to the parent node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation_z(mut self, angle: f32) -> Self {
        self.rotation = Quat::from_rotation_z(angle);
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One segment of the figure.
#[derive(Debug, Clone)]
pub struct RigNode {
    pub segment: Segment,
    pub parent: Option<usize>,
    /// Authored pose, restored before every frame's motion is applied
    pub rest: Transform,
    /// Current pose
    pub local: Transform,
    pub shape: Shape,
    /// Shape offset from the joint pivot (limbs hang below their joint)
    pub shape_offset: Vec3,
    pub material: Material,
    pub visible: bool,
    pub cast_shadow: bool,
    /// Eye segments only: 1.0 open, 0.0 shut
    pub openness: Option<f32>,
}

/// The fixed teacher hierarchy.
#[derive(Debug, Clone)]
pub struct Rig {
    nodes: Vec<RigNode>,
}

const SKIN: u32 = 0xfdbcb4;
const CLOTH: u32 = 0x4a5568;
const TROUSERS: u32 = 0x2d3748;
const FRAMES: u32 = 0x1a202c;
const BOOK: u32 = 0x3b82f6;
const HAIR: u32 = 0x3f2a1d;
const SHOES: u32 = 0x1f2937;
const EYES: u32 = 0x111827;
const BUBBLE: u32 = 0xffffff;

impl Rig {
    /// Build the teacher figure with the whole-body `scale` applied at the root.
    pub fn teacher(scale: f32) -> Self {
        use Segment::*;

        let mut nodes: Vec<RigNode> = Vec::with_capacity(Segment::COUNT);
        let mut add = |segment: Segment,
                       parent: Option<Segment>,
                       rest: Transform,
                       shape: Shape,
                       shape_offset: Vec3,
                       material: Material| {
            debug_assert_eq!(segment.index(), nodes.len(), "rig nodes out of order");
            let openness = (segment.role() == SegmentRole::Eye).then_some(1.0);
            nodes.push(RigNode {
                segment,
                parent: parent.map(Segment::index),
                rest,
                local: rest,
                shape,
                shape_offset,
                material,
                visible: segment.role() != SegmentRole::Overlay,
                cast_shadow: !matches!(segment.role(), SegmentRole::Group | SegmentRole::Overlay),
                openness,
            });
        };

        let root = Transform {
            scale: Vec3::splat(scale),
            ..Transform::IDENTITY
        };
        let none = Material::new(0xffffff, 1.0);

        add(Root, None, root, Shape::None, Vec3::ZERO, none);
        add(
            Torso,
            Some(Root),
            Transform::at(0.0, 0.5, 0.0),
            Shape::Cuboid {
                size: [0.7, 0.9, 0.3],
            },
            Vec3::ZERO,
            Material::new(CLOTH, 0.7),
        );
        add(
            Head,
            Some(Torso),
            Transform::at(0.0, 0.7, 0.0),
            Shape::Sphere { radius: 0.4 },
            Vec3::ZERO,
            Material::new(SKIN, 0.5),
        );
        for (seg, x) in [(LeftEye, -0.14), (RightEye, 0.14)] {
            add(
                seg,
                Some(Head),
                Transform::at(x, 0.05, 0.35),
                Shape::Sphere { radius: 0.05 },
                Vec3::ZERO,
                Material::new(EYES, 0.2),
            );
        }
        add(
            Glasses,
            Some(Head),
            Transform::at(0.0, 0.05, 0.4),
            Shape::Cuboid {
                size: [0.5, 0.08, 0.01],
            },
            Vec3::ZERO,
            Material::new(FRAMES, 0.3).with_metalness(0.6),
        );
        for (seg, x, z, tilt) in [
            (HairFront, 0.0, 0.22, 0.0),
            (HairLeft, -0.3, -0.05, 0.35),
            (HairRight, 0.3, -0.05, -0.35),
        ] {
            add(
                seg,
                Some(Head),
                Transform::at(x, 0.3, z).with_rotation_z(tilt),
                Shape::Cylinder {
                    radius: 0.04,
                    height: 0.25,
                },
                Vec3::ZERO,
                Material::new(HAIR, 0.8),
            );
        }
        add(
            Headwear,
            Some(Head),
            Transform::at(0.0, 0.4, 0.0),
            Shape::Cuboid {
                size: [0.6, 0.05, 0.6],
            },
            Vec3::ZERO,
            Material::new(FRAMES, 0.6),
        );

        for (upper, fore, hand, x, tilt) in [
            (LeftUpperArm, LeftForearm, LeftHand, -0.45, -0.3),
            (RightUpperArm, RightForearm, RightHand, 0.45, 0.3),
        ] {
            add(
                upper,
                Some(Torso),
                Transform::at(x, 0.3, 0.0).with_rotation_z(tilt),
                Shape::Cylinder {
                    radius: 0.08,
                    height: 0.3,
                },
                Vec3::new(0.0, -0.15, 0.0),
                Material::new(CLOTH, 0.7),
            );
            add(
                fore,
                Some(upper),
                Transform::at(0.0, -0.3, 0.0),
                Shape::Cylinder {
                    radius: 0.07,
                    height: 0.3,
                },
                Vec3::new(0.0, -0.15, 0.0),
                Material::new(CLOTH, 0.7),
            );
            add(
                hand,
                Some(fore),
                Transform::at(0.0, -0.32, 0.0),
                Shape::Sphere { radius: 0.08 },
                Vec3::ZERO,
                Material::new(SKIN, 0.5),
            );
        }
        add(
            Book,
            Some(RightHand),
            Transform::at(0.0, -0.05, 0.12),
            Shape::Cuboid {
                size: [0.15, 0.2, 0.02],
            },
            Vec3::ZERO,
            Material::new(BOOK, 0.4),
        );

        for (leg, shoe, x) in [(LeftLeg, LeftShoe, -0.15), (RightLeg, RightShoe, 0.15)] {
            add(
                leg,
                Some(Root),
                Transform::at(x, 0.15, 0.0),
                Shape::Cylinder {
                    radius: 0.08,
                    height: 0.7,
                },
                Vec3::new(0.0, -0.35, 0.0),
                Material::new(TROUSERS, 0.8),
            );
            add(
                shoe,
                Some(leg),
                Transform::at(0.0, -0.72, 0.05),
                Shape::Cuboid {
                    size: [0.14, 0.08, 0.24],
                },
                Vec3::ZERO,
                Material::new(SHOES, 0.6),
            );
        }

        add(
            SpeechBubble,
            Some(Root),
            Transform::at(0.8, 1.8, 0.0),
            Shape::Panel {
                width: 1.5,
                height: 0.6,
                depth: 0.1,
            },
            Vec3::ZERO,
            Material::new(BUBBLE, 0.9),
        );

        Self { nodes }
    }

    pub fn nodes(&self) -> &[RigNode] {
        &self.nodes
    }

    pub fn node(&self, segment: Segment) -> &RigNode {
        &self.nodes[segment.index()]
    }

    pub fn node_mut(&mut self, segment: Segment) -> &mut RigNode {
        &mut self.nodes[segment.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Set every local transform back to the authored pose.
    pub fn reset_pose(&mut self) {
        for node in &mut self.nodes {
            node.local = node.rest;
        }
    }

    /// Change the whole-body scale (layout switch).
    pub fn set_scale(&mut self, scale: f32) {
        let root = self.node_mut(Segment::Root);
        root.rest.scale = Vec3::splat(scale);
        root.local.scale = Vec3::splat(scale);
    }

    /// Set eye openness; the eyes flatten vertically as they close.
    pub fn set_eye_openness(&mut self, openness: f32) {
        let openness = openness.clamp(0.0, 1.0);
        for seg in [Segment::LeftEye, Segment::RightEye] {
            let node = self.node_mut(seg);
            node.openness = Some(openness);
            node.local.scale.y = node.rest.scale.y * openness;
        }
    }

    pub fn eye_openness(&self) -> f32 {
        self.node(Segment::LeftEye).openness.unwrap_or(1.0)
    }

    /// World matrix of every node, indexed like [`Rig::nodes`].
    pub fn world_transforms(&self) -> Vec<Mat4> {
        let mut world: Vec<Mat4> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let local = node.local.matrix();
            let m = match node.parent {
                Some(p) => world[p] * local,
                None => local,
            };
            world.push(m);
        }
        world
    }

    /// World matrix of a node's shape (joint transform plus shape offset).
    pub fn shape_matrix(&self, world: &[Mat4], segment: Segment) -> Mat4 {
        let node = self.node(segment);
        world[segment.index()] * Mat4::from_translation(node.shape_offset)
    }

    /// World-space axis-aligned bounds over visible shapes.
    pub fn world_bounds(&self, world: &[Mat4]) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for node in self.nodes.iter().filter(|n| n.visible) {
            let half = node.shape.half_extents();
            if half == Vec3::ZERO {
                continue;
            }
            let m = self.shape_matrix(world, node.segment);
            for corner in 0..8 {
                let local = Vec3::new(
                    if corner & 1 == 0 { -half.x } else { half.x },
                    if corner & 2 == 0 { -half.y } else { half.y },
                    if corner & 4 == 0 { -half.z } else { half.z },
                );
                let p = m.transform_point3(local);
                min = min.min(p);
                max = max.max(p);
            }
        }

        if min.x > max.x {
            (Vec3::ZERO, Vec3::ZERO)
        } else {
            (min, max)
        }
    }
}
