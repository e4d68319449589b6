// Camera rig: a per-frame integrator from (previous rig, inputs, phase) to the next rig.
// Rule: the rendered pose only ever eases toward a target; nothing snaps the camera.
// Mode switches and resets move the target, never the current pose.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Distance to the point the camera looks at.
const LOOK_DISTANCE: f32 = 100.0;

/// The slice of app state the rig reads each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraView {
    pub phase: Phase,
    pub memory_mode: bool,
    pub reset_trigger: u64,
}

/// Input accumulated between two frames.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameSignals {
    /// Pixels dragged since the last frame.
    pub drag_delta: Vec2,
    /// Wheel units scrolled since the last frame.
    pub wheel_delta: f32,
    pub keys: HeldKeys,
    /// Pointer in normalized device coordinates.
    pub pointer: Vec2,
}

/// Complete rig state. Copy so that each step is a pure function of the last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigState {
    pub current: Pose,
    pub target: Pose,
    pub memory_depth: f32,
    pub was_memory_mode: bool,
    pub seen_reset: u64,
}

impl RigState {
    pub fn at_home(settings: &CameraSettings) -> Self {
        RigState {
            current: Pose::new(settings.home),
            target: Pose::new(settings.home),
            memory_depth: settings.home.z,
            was_memory_mode: false,
            seen_reset: 0,
        }
    }
}

/// Rendered camera for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraFrame {
    pub position: Vec3,
    pub look_at: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

/// Advance the rig by one frame.
pub fn advance(prev: RigState, signals: &FrameSignals, view: CameraView, settings: &CameraSettings) -> RigState {
    let mut rig = prev;

    // Entering the tunnel resyncs depth to where the camera is, so there is no jump.
    if view.memory_mode && !rig.was_memory_mode {
        rig.memory_depth = rig.current.position.z;
    } else if !view.memory_mode && rig.was_memory_mode {
        rig.target = Pose::new(settings.home);
        rig.memory_depth = settings.home.z;
    }
    rig.was_memory_mode = view.memory_mode;

    if view.reset_trigger != rig.seen_reset {
        rig.seen_reset = view.reset_trigger;
        rig.target = Pose::new(settings.home);
        rig.memory_depth = settings.home.z;
    }

    if !view.phase.locks_camera_input() {
        apply_pointer(&mut rig, signals, view.memory_mode, settings);
    }

    if view.phase == Phase::Reading {
        rig.target = Pose::new(settings.reading_position);
    } else if view.phase == Phase::Stories {
        let decay = settings.stories_decay;
        rig.target.position.x *= decay;
        rig.target.position.y *= decay;
        rig.target.position.z += (settings.stories_depth - rig.target.position.z) * settings.stories_depth_lerp;
        rig.target.yaw *= decay;
        rig.target.pitch *= decay;
    } else if view.memory_mode {
        rig.memory_depth = rig.memory_depth.clamp(settings.memory_far, settings.memory_near);
        rig.target.position = Vec3::new(
            signals.pointer.x * settings.parallax,
            signals.pointer.y * settings.parallax,
            rig.memory_depth,
        );
        rig.target.yaw = 0.0;
        rig.target.pitch = 0.0;
        // Orientation is held; the tunnel view aims down the axis instead.
        rig.current.position = lerp_vec3(rig.current.position, rig.target.position, settings.memory_lerp);
        return rig;
    } else {
        fly(&mut rig.target, rig.current.yaw, &signals.keys, settings);
    }

    let t = settings.free_lerp;
    rig.current.position = lerp_vec3(rig.current.position, rig.target.position, t);
    rig.current.yaw = lerp(rig.current.yaw, rig.target.yaw, t);
    rig.current.pitch = lerp(rig.current.pitch, rig.target.pitch, t);
    rig
}

fn apply_pointer(rig: &mut RigState, signals: &FrameSignals, memory_mode: bool, settings: &CameraSettings) {
    if signals.drag_delta != Vec2::ZERO {
        rig.target.yaw -= signals.drag_delta.x * settings.drag_sensitivity;
        rig.target.pitch -= signals.drag_delta.y * settings.drag_sensitivity;
        rig.target.pitch = rig
            .target
            .pitch
            .clamp(-std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2);
    }

    if signals.wheel_delta != 0.0 {
        if memory_mode {
            // Clamped with the rest of the tunnel state in `advance`.
            rig.memory_depth += signals.wheel_delta * settings.wheel_depth;
        } else {
            let speed = -signals.wheel_delta * settings.wheel_dolly;
            let yaw = rig.current.yaw;
            let bound = settings.fly_bound;
            rig.target.position.x = (rig.target.position.x - yaw.sin() * speed).clamp(-bound, bound);
            rig.target.position.z = (rig.target.position.z - yaw.cos() * speed).clamp(-bound, bound);
        }
    }
}

fn fly(target: &mut Pose, yaw: f32, keys: &HeldKeys, settings: &CameraSettings) {
    if !keys.any() {
        return;
    }
    let speed = settings.fly_speed;
    let forward = Vec3::new(-yaw.sin(), 0.0, -yaw.cos());
    let right = Vec3::new(yaw.cos(), 0.0, -yaw.sin());

    let mut step = Vec3::ZERO;
    if keys.forward {
        step += forward;
    }
    if keys.back {
        step -= forward;
    }
    if keys.right {
        step += right;
    }
    if keys.left {
        step -= right;
    }
    if keys.up {
        step.y += 1.0;
    }
    if keys.down {
        step.y -= 1.0;
    }

    let bound = Vec3::splat(settings.fly_bound);
    target.position = (target.position + step * speed).clamp(-bound, bound);
}

/// Owns the rig and collects pointer input between frames.
#[derive(Debug, Clone)]
pub struct CameraRig {
    settings: CameraSettings,
    state: RigState,
    dragging: bool,
    last_pointer_px: Option<Vec2>,
    pending: FrameSignals,
}

impl CameraRig {
    pub fn new(settings: CameraSettings) -> Self {
        let state = RigState::at_home(&settings);
        CameraRig {
            settings,
            state,
            dragging: false,
            last_pointer_px: None,
            pending: FrameSignals::default(),
        }
    }

    pub fn state(&self) -> &RigState {
        &self.state
    }

    /// Pointer pressed at pixel coordinates. Drags never start in locked phases.
    pub fn pointer_down(&mut self, x: f32, y: f32, phase: Phase) {
        if phase.locks_camera_input() {
            return;
        }
        self.dragging = true;
        self.last_pointer_px = Some(Vec2::new(x, y));
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
        self.last_pointer_px = None;
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let here = Vec2::new(x, y);
        if self.dragging {
            if let Some(last) = self.last_pointer_px {
                self.pending.drag_delta += here - last;
            }
            self.last_pointer_px = Some(here);
        }
    }

    pub fn wheel(&mut self, delta_y: f32) {
        self.pending.wheel_delta += delta_y;
    }

    /// Integrate one frame and return the pose to render.
    pub fn tick(&mut self, input: &FrameInput, view: CameraView) -> CameraFrame {
        let mut signals = std::mem::take(&mut self.pending);
        signals.keys = input.keys;
        signals.pointer = input.pointer;
        self.state = advance(self.state, &signals, view, &self.settings);
        self.frame(view)
    }

    /// The pose as it should be rendered for `view`.
    pub fn frame(&self, view: CameraView) -> CameraFrame {
        let current = self.state.current;
        let look_at = if view.memory_mode && !matches!(view.phase, Phase::Reading | Phase::Stories) {
            Vec3::new(0.0, 0.0, current.position.z - LOOK_DISTANCE)
        } else {
            current.position + current.forward() * LOOK_DISTANCE
        };
        CameraFrame {
            position: current.position,
            look_at,
            yaw: current.yaw,
            pitch: current.pitch,
        }
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}
