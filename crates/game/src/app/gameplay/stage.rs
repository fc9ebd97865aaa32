use std::collections::BTreeMap;

use engine::{
    CapsuleShape, CharacterBody, GazeWorld, LayerMask, LookTarget, ObjectId, Ray, RayHit,
};
use glam::Vec3;

use super::props::{Prop, PropKind};

pub(crate) const WALL_LAYER: u32 = 0;
pub(crate) const PROP_LAYER: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Aabb {
    pub(crate) min: Vec3,
    pub(crate) max: Vec3,
}

impl Aabb {
    pub(crate) fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Entry distance along the ray, or 0 when the origin is inside.
    fn ray_distance(&self, ray: &Ray) -> Option<f32> {
        let mut near = f32::NEG_INFINITY;
        let mut far = f32::INFINITY;
        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            let (min, max) = (self.min[axis], self.max[axis]);
            if direction.abs() < f32::EPSILON {
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }
            let inverse = 1.0 / direction;
            let mut t0 = (min - origin) * inverse;
            let mut t1 = (max - origin) * inverse;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            near = near.max(t0);
            far = far.min(t1);
            if near > far {
                return None;
            }
        }
        if far < 0.0 {
            return None;
        }
        Some(near.max(0.0))
    }
}

#[derive(Debug, Clone)]
struct Collider {
    object: ObjectId,
    bounds: Aabb,
    layer: u32,
}

/// Box-only level geometry plus the props that react to gaze.
#[derive(Debug, Default)]
pub(crate) struct StageWorld {
    colliders: Vec<Collider>,
    props: BTreeMap<ObjectId, Prop>,
    next_object: u64,
}

impl StageWorld {
    pub(crate) fn add_wall(&mut self, bounds: Aabb) -> ObjectId {
        let object = self.allocate();
        self.colliders.push(Collider {
            object,
            bounds,
            layer: WALL_LAYER,
        });
        object
    }

    pub(crate) fn add_prop(&mut self, kind: PropKind, bounds: Aabb) -> ObjectId {
        let object = self.allocate();
        self.colliders.push(Collider {
            object,
            bounds,
            layer: PROP_LAYER,
        });
        self.props.insert(object, Prop::new(kind));
        object
    }

    pub(crate) fn remove(&mut self, object: ObjectId) {
        self.colliders.retain(|collider| collider.object != object);
        self.props.remove(&object);
    }

    pub(crate) fn prop(&self, object: ObjectId) -> Option<&Prop> {
        self.props.get(&object)
    }

    #[cfg(test)]
    pub(crate) fn find_prop(&self, kind: PropKind) -> Option<ObjectId> {
        self.props
            .iter()
            .find(|(_, prop)| prop.kind() == kind)
            .map(|(object, _)| *object)
    }

    fn allocate(&mut self) -> ObjectId {
        self.next_object += 1;
        ObjectId(self.next_object)
    }
}

impl GazeWorld for StageWorld {
    fn raycast(&self, ray: Ray, max_distance: f32, layers: LayerMask) -> Option<RayHit> {
        self.colliders
            .iter()
            .filter(|collider| layers.contains_layer(collider.layer))
            .filter_map(|collider| {
                collider
                    .bounds
                    .ray_distance(&ray)
                    .filter(|distance| *distance <= max_distance)
                    .map(|distance| RayHit {
                        object: collider.object,
                        distance,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn look_target_mut(&mut self, object: ObjectId) -> Option<&mut dyn LookTarget> {
        self.props
            .get_mut(&object)
            .map(|prop| prop as &mut dyn LookTarget)
    }
}

/// Capsule that slides freely inside a rectangular room and rests on a flat floor.
#[derive(Debug, Clone)]
pub(crate) struct KinematicBody {
    position: Vec3,
    capsule: CapsuleShape,
    floor_y: f32,
    room_min: Vec3,
    room_max: Vec3,
    grounded: bool,
}

impl KinematicBody {
    pub(crate) fn new(position: Vec3, height: f32, room: Aabb) -> Self {
        let floor_y = room.min.y;
        Self {
            position,
            capsule: CapsuleShape::new(height, Vec3::new(0.0, height * 0.5, 0.0)),
            floor_y,
            room_min: room.min,
            room_max: room.max,
            grounded: position.y <= floor_y,
        }
    }
}

impl CharacterBody for KinematicBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn move_by(&mut self, displacement: Vec3) {
        let mut next = self.position + displacement;
        next.x = next.x.max(self.room_min.x).min(self.room_max.x);
        next.z = next.z.max(self.room_min.z).min(self.room_max.z);
        self.grounded = next.y <= self.floor_y;
        if self.grounded {
            next.y = self.floor_y;
        }
        self.position = next;
    }

    fn is_grounded(&self) -> bool {
        self.grounded
    }

    fn capsule(&self) -> CapsuleShape {
        self.capsule
    }

    fn set_capsule(&mut self, capsule: CapsuleShape) {
        self.capsule = capsule;
    }
}
