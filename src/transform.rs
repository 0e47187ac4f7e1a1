// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! World-space poses that emitters can follow.

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use glam::{Affine3A, Quat, Vec3};

/// A pose in world space, along with the local position it was derived from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// World-space position.
    pub position: Vec3,
    /// World-space rotation.
    pub rotation: Quat,
    /// World-space scale.
    pub scale: Vec3,
    /// Position relative to the parent. Equal to `position` for root transforms.
    pub local_position: Vec3,
}

impl Transform {
    /// Creates a root transform at the given position.
    pub fn from_position(position: Vec3) -> Transform {
        Transform {
            position,
            local_position: position,
            ..Transform::default()
        }
    }

    /// Converts a point from this transform's local space into world space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position)
            .transform_point3(point)
    }

    /// The world position an emitter following this transform at `offset` sits at.
    pub fn follow_point(&self, offset: Vec3) -> Vec3 {
        self.transform_point(self.local_position + offset)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_position: Vec3::ZERO,
        }
    }
}

/// A shared transform owned by the host. Emitters only hold it weakly, so dropping every
/// `TransformRef` ends any following.
#[derive(Clone, Debug, Default)]
pub struct TransformRef(Rc<RefCell<Transform>>);

impl TransformRef {
    pub fn new(transform: Transform) -> TransformRef {
        TransformRef(Rc::new(RefCell::new(transform)))
    }

    /// Borrows the current pose.
    pub fn get(&self) -> Ref<'_, Transform> {
        self.0.borrow()
    }

    /// Replaces the pose.
    pub fn set(&self, transform: Transform) {
        *self.0.borrow_mut() = transform;
    }

    /// Moves a root transform to a new world position.
    pub fn set_position(&self, position: Vec3) {
        let mut transform = self.0.borrow_mut();
        transform.position = position;
        transform.local_position = position;
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<Transform>> {
        Rc::downgrade(&self.0)
    }
}
