//! Pointer dragging: each input source drives an invisible kinematic proxy
//! body, and grabbing pins a live body to that proxy with a soft joint.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use glam::Vec2;

use crate::api::config::SandboxConfig;
use crate::api::types::PointerId;
use crate::core::physics::{
    BodyDesc, BodyHandle, JointDesc, JointHandle, PhysicsSpace, ShapeFilter, INFINITE_MASS,
};
use crate::input::queue::InputEvent;

/// Tunables for grabbing and proxy motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSettings {
    pub capture_radius: f32,
    pub max_force: f32,
    pub error_bias: f32,
    pub blend: f32,
    pub display_rate: f32,
}

impl DragSettings {
    pub fn from_config(config: &SandboxConfig) -> Self {
        Self {
            capture_radius: config.capture_radius,
            max_force: config.drag_max_force,
            error_bias: config.drag_error_bias,
            blend: config.pointer_blend,
            display_rate: config.display_rate,
        }
    }
}

impl Default for DragSettings {
    fn default() -> Self {
        Self::from_config(&SandboxConfig::default())
    }
}

/// One input source's kinematic stand-in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerProxy {
    pub body: BodyHandle,
    pub joint: Option<JointHandle>,
    pub grabbed: Option<BodyHandle>,
    pub target: Vec2,
}

#[derive(Debug, Default)]
pub struct InteractionController {
    settings: DragSettings,
    proxies: BTreeMap<PointerId, PointerProxy>,
}

impl InteractionController {
    pub fn new(settings: DragSettings) -> Self {
        Self {
            settings,
            proxies: BTreeMap::new(),
        }
    }

    pub fn settings(&self) -> &DragSettings {
        &self.settings
    }

    pub fn proxy(&self, id: PointerId) -> Option<&PointerProxy> {
        self.proxies.get(&id)
    }

    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }

    /// Number of proxies currently holding a body.
    pub fn active_grabs(&self) -> usize {
        self.proxies.values().filter(|p| p.joint.is_some()).count()
    }

    pub fn handle(&mut self, space: &mut PhysicsSpace, event: InputEvent) {
        match event {
            InputEvent::PointerDown { id, pos } => {
                self.on_press(space, id, pos);
            }
            InputEvent::PointerMove { id, pos } => self.on_move(id, pos),
            InputEvent::PointerUp { id } => {
                self.on_release(space, id);
            }
        }
    }

    /// Press: make sure the proxy exists, then try to grab the nearest
    /// grabbable body. Returns the grabbed body, if any.
    pub fn on_press(&mut self, space: &mut PhysicsSpace, id: PointerId, pos: Vec2) -> Option<BodyHandle> {
        let proxy = match self.proxies.entry(id) {
            Entry::Occupied(entry) => {
                let proxy = entry.into_mut();
                if let Some(joint) = proxy.joint.take() {
                    space.remove_joint(joint);
                }
                proxy.grabbed = None;
                if id.is_touch() {
                    space.set_body_position(proxy.body, pos);
                }
                proxy
            }
            Entry::Vacant(entry) => {
                let body = space.create_body(&BodyDesc::kinematic().with_position(pos));
                entry.insert(PointerProxy {
                    body,
                    joint: None,
                    grabbed: None,
                    target: pos,
                })
            }
        };
        proxy.target = pos;

        let (joint, grabbed) = grab(space, &self.settings, proxy.body, pos)?;
        proxy.joint = Some(joint);
        proxy.grabbed = Some(grabbed);
        log::debug!("{:?} grabbed body {:?}", id, grabbed);
        Some(grabbed)
    }

    /// Record where the pointer is now; the proxy follows on `update`.
    /// Moves before the first press of a pointer are ignored.
    pub fn on_move(&mut self, id: PointerId, pos: Vec2) {
        if let Some(proxy) = self.proxies.get_mut(&id) {
            proxy.target = pos;
        }
    }

    /// Drop whatever the pointer holds. Touch proxies go away entirely.
    /// Returns `false` for unknown ids.
    pub fn on_release(&mut self, space: &mut PhysicsSpace, id: PointerId) -> bool {
        let Some(proxy) = self.proxies.get_mut(&id) else {
            return false;
        };
        if let Some(joint) = proxy.joint.take() {
            space.remove_joint(joint);
            log::debug!("{:?} released body {:?}", id, proxy.grabbed);
        }
        proxy.grabbed = None;

        if id.is_touch() {
            let body = proxy.body;
            self.proxies.remove(&id);
            space.remove_body(body);
        }
        true
    }

    /// Ease every proxy toward its target and give it the matching velocity.
    pub fn update(&mut self, space: &mut PhysicsSpace) {
        let blend = self.settings.blend;
        let rate = self.settings.display_rate;
        for proxy in self.proxies.values_mut() {
            if !space.contains_body(proxy.body) {
                continue;
            }
            if let Some(joint) = proxy.joint {
                if !space.contains_joint(joint) {
                    proxy.joint = None;
                    proxy.grabbed = None;
                }
            }
            let (old, _) = space.body_position(proxy.body);
            let new = old.lerp(proxy.target, blend);
            space.set_body_position(proxy.body, new);
            space.set_velocity(proxy.body, (new - old) * rate);
        }
    }

    /// Remove every proxy and its joint from the space.
    pub fn clear(&mut self, space: &mut PhysicsSpace) {
        for (_, proxy) in std::mem::take(&mut self.proxies) {
            if let Some(joint) = proxy.joint {
                space.remove_joint(joint);
            }
            space.remove_body(proxy.body);
        }
    }
}

fn grab(
    space: &mut PhysicsSpace,
    settings: &DragSettings,
    proxy: BodyHandle,
    pos: Vec2,
) -> Option<(JointHandle, BodyHandle)> {
    let info = space.point_query_nearest(pos, settings.capture_radius, ShapeFilter::GRABBABLE)?;
    if space.mass(info.body) >= INFINITE_MASS {
        return None;
    }

    let nearest = if info.distance > 0.0 { info.point } else { pos };
    let anchor = space.world_to_local(info.body, nearest);
    let joint = space.create_joint(proxy, info.body, &JointDesc::Drag {
        anchor_a: Vec2::ZERO,
        anchor_b: anchor,
        max_force: settings.max_force,
        error_bias: settings.error_bias,
    });
    Some((joint, info.body))
}
