// Photo field: staggered spawn, per-phase layout, selection and dissolve.
// Timers are owned by the field and cancelled whenever the condition that scheduled
// them stops holding, so a stale spawn or removal can never fire into another phase.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::CameraFrame;
use crate::catalog::PhotoCatalog;
use crate::dissolve::{DissolveCloud, ParticleFrame};
use crate::layout::{reading_ring, spiral, FloatLayout};
use crate::state::AppState;
use crate::timers::{TimerHandle, Timers};
use crate::types::*;

/// Longest side of a photo plane in world units.
const MAX_PLANE_SIZE: f32 = 12.0;
/// Distance in front of the camera a selected photo settles at.
const SELECTED_DISTANCE: f32 = 25.0;
/// Where a selected photo sits while the letter is open.
const READING_SLOT: Vec3 = Vec3::new(-50.0, 0.0, 30.0);
/// Where a newly mounted entity starts before easing in.
const SPAWN_ORIGIN: Vec3 = Vec3::new(0.0, 0.0, -100.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldTimer {
    Spawn,
    Loaded,
    Dissolve,
}

/// One spawned photo and its animation state.
#[derive(Debug, Clone)]
struct PhotoEntity {
    url: String,
    layout: FloatLayout,
    spawned_at: Timestamp,
    position: Vec3,
    opacity: f32,
    scale: f32,
}

/// One photo as the shell should draw it this frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoInstance {
    pub index: usize,
    pub url: String,
    pub position: Vec3,
    /// Point the plane faces.
    pub facing: Vec3,
    pub size: Vec2,
    pub scale: f32,
    pub opacity: f32,
    pub selected: bool,
    pub render_order: i32,
    /// Story overlay, only while selected.
    pub story: Option<PhotoStory>,
}

/// What the field produced this frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FieldFrame {
    pub photos: Vec<PhotoInstance>,
    pub particles: Option<ParticleFrame>,
}

/// Controller for the whole photo set.
#[derive(Debug, Clone)]
pub struct PhotoField {
    settings: PhotoSettings,
    catalog: PhotoCatalog,
    order: Vec<String>,
    memory_mode: bool,
    entities: Vec<PhotoEntity>,
    /// Plane sizes of images that finished loading, by URL.
    image_sizes: HashMap<String, Vec2>,
    removed: usize,
    dissolve_target: usize,
    selected: Option<usize>,
    hovered: Option<usize>,
    timers: Timers<FieldTimer>,
    spawn_timer: Option<TimerHandle>,
    loaded_timer: Option<TimerHandle>,
    dissolve_timer: Option<TimerHandle>,
    was_showing: bool,
    was_fading: bool,
    epoch: Option<Timestamp>,
    cloud: DissolveCloud,
}

impl PhotoField {
    pub fn new(settings: PhotoSettings, catalog: PhotoCatalog, narrow_viewport: bool) -> Self {
        let budget = if narrow_viewport {
            settings.particle_budget / 2
        } else {
            settings.particle_budget
        };
        let order = catalog.ordered(false);
        PhotoField {
            settings,
            catalog,
            order,
            memory_mode: false,
            entities: Vec::new(),
            image_sizes: HashMap::new(),
            removed: 0,
            dissolve_target: 0,
            selected: None,
            hovered: None,
            timers: Timers::new(),
            spawn_timer: None,
            loaded_timer: None,
            dissolve_timer: None,
            was_showing: false,
            was_fading: false,
            epoch: None,
            cloud: DissolveCloud::new(budget, 0x5eed),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entities spawned so far.
    pub fn spawned(&self) -> usize {
        self.entities.len()
    }

    /// Entities currently drawn: spawned minus those already dissolved.
    pub fn visible(&self) -> usize {
        self.entities.len().saturating_sub(self.removed)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// The shell finished decoding an image. Failed loads never call this.
    pub fn image_ready(&mut self, url: &str, width_px: f32, height_px: f32) {
        if width_px <= 0.0 || height_px <= 0.0 {
            return;
        }
        let aspect = width_px / height_px;
        let size = if aspect > 1.0 {
            Vec2::new(MAX_PLANE_SIZE, MAX_PLANE_SIZE / aspect)
        } else {
            Vec2::new(MAX_PLANE_SIZE * aspect, MAX_PLANE_SIZE)
        };
        self.image_sizes.insert(url.to_string(), size);
    }

    /// Click on entity `index`. Toggles selection, or opens the chat for the trigger photo.
    pub fn select(&mut self, state: &mut AppState, index: usize) {
        if !matches!(state.phase(), Phase::Ready | Phase::Reading) || index >= self.visible() {
            return;
        }
        if self.catalog.is_chat_trigger(&self.entities[index].url) {
            state.set_show_chat(true);
            return;
        }
        self.selected = if self.selected == Some(index) {
            None
        } else {
            Some(index)
        };
    }

    /// Click on empty space or Escape.
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    pub fn hover(&mut self, index: Option<usize>) {
        self.hovered = index;
    }

    /// Advance timers and animation by one frame.
    pub fn tick(&mut self, state: &mut AppState, camera: &CameraFrame, now: Timestamp) -> FieldFrame {
        let epoch = *self.epoch.get_or_insert(now);
        self.sync_flags(state, now);
        self.run_timers(state, now);
        self.cloud.tick(now);

        let t = now.since(epoch) as f32 / 1_000_000.0;
        self.animate(state, camera, now, t);

        let photos = if matches!(state.phase(), Phase::Ready | Phase::Reading | Phase::Ending) {
            self.instances(state.phase(), camera)
        } else {
            Vec::new()
        };
        FieldFrame {
            photos,
            particles: self.cloud.frame(),
        }
    }

    fn sync_flags(&mut self, state: &AppState, now: Timestamp) {
        let showing = state.show_photos();
        if !showing {
            if self.was_showing {
                self.reset_field();
            }
            self.was_showing = false;
            return;
        }
        self.was_showing = true;

        if state.is_memory_mode() != self.memory_mode {
            self.memory_mode = state.is_memory_mode();
            self.reorder();
        }

        let fading = state.photos_fading();
        if fading && !self.was_fading {
            self.start_dissolve(now);
        } else if !fading && self.was_fading {
            // A cleared fade starts a fresh field from zero.
            self.reset_field();
        }
        self.was_fading = fading;

        let may_spawn = state.phase() != Phase::Stories && !fading;
        if !may_spawn {
            self.cancel(FieldTimer::Spawn);
            self.cancel(FieldTimer::Loaded);
            return;
        }
        if self.spawn_timer.is_none() && self.loaded_timer.is_none() {
            if self.entities.len() < self.order.len() {
                self.spawn_timer = Some(
                    self.timers
                        .schedule(now.plus_millis(self.settings.spawn_stagger_ms), FieldTimer::Spawn),
                );
            } else if !state.photos_loaded() {
                self.schedule_loaded(now);
            }
        }
    }

    fn schedule_loaded(&mut self, from: Timestamp) {
        let delay = if self.order.is_empty() {
            self.settings.empty_loaded_delay_ms
        } else {
            self.settings.loaded_delay_ms
        };
        self.loaded_timer = Some(self.timers.schedule(from.plus_millis(delay), FieldTimer::Loaded));
    }

    fn run_timers(&mut self, state: &mut AppState, now: Timestamp) {
        loop {
            let due = self.timers.drain_due(now);
            if due.is_empty() {
                break;
            }
            for (at, timer) in due {
                match timer {
                    FieldTimer::Spawn => {
                        self.spawn_timer = None;
                        self.spawn_next(at);
                        if self.entities.len() < self.order.len() {
                            self.spawn_timer = Some(
                                self.timers
                                    .schedule(at.plus_millis(self.settings.spawn_stagger_ms), FieldTimer::Spawn),
                            );
                        } else if !state.photos_loaded() {
                            self.schedule_loaded(at);
                        }
                    }
                    FieldTimer::Loaded => {
                        self.loaded_timer = None;
                        state.set_photos_loaded(true);
                    }
                    FieldTimer::Dissolve => {
                        self.dissolve_timer = None;
                        self.removed += 1;
                        if self.removed < self.dissolve_target {
                            self.dissolve_timer = Some(
                                self.timers
                                    .schedule(at.plus_millis(self.settings.dissolve_interval_ms), FieldTimer::Dissolve),
                            );
                        }
                    }
                }
            }
        }
    }

    fn spawn_next(&mut self, at: Timestamp) {
        let index = self.entities.len();
        let Some(url) = self.order.get(index) else {
            return;
        };
        self.entities.push(PhotoEntity {
            url: url.clone(),
            layout: FloatLayout::for_index(index, self.order.len()),
            spawned_at: at,
            position: SPAWN_ORIGIN,
            opacity: 0.0,
            scale: 0.0,
        });
    }

    fn start_dissolve(&mut self, now: Timestamp) {
        // Entities without a loaded image were never drawn.
        let sources: Vec<Vec3> = self
            .entities
            .iter()
            .filter(|e| self.image_sizes.contains_key(&e.url))
            .map(|e| e.position)
            .collect();
        self.cloud.ignite(&sources, now);
        self.removed = 0;
        self.dissolve_target = self.entities.len();
        self.selected = None;
        self.cancel(FieldTimer::Dissolve);
        if self.dissolve_target > 0 {
            self.dissolve_timer = Some(
                self.timers
                    .schedule(now.plus_millis(self.settings.dissolve_interval_ms), FieldTimer::Dissolve),
            );
        }
    }

    fn cancel(&mut self, timer: FieldTimer) {
        let slot = match timer {
            FieldTimer::Spawn => &mut self.spawn_timer,
            FieldTimer::Loaded => &mut self.loaded_timer,
            FieldTimer::Dissolve => &mut self.dissolve_timer,
        };
        if let Some(handle) = slot.take() {
            self.timers.cancel(handle);
        }
    }

    fn reset_field(&mut self) {
        self.timers.clear();
        self.spawn_timer = None;
        self.loaded_timer = None;
        self.dissolve_timer = None;
        self.entities.clear();
        self.removed = 0;
        self.dissolve_target = 0;
        self.selected = None;
        self.hovered = None;
        self.cloud.reset();
    }

    /// Re-key spawned entities after the display order changed. Animation state
    /// follows the URL; the selection does not survive a reorder.
    fn reorder(&mut self) {
        self.order = self.catalog.ordered(self.memory_mode);
        let spawned = self.entities.len();
        let mut previous: HashMap<String, PhotoEntity> =
            self.entities.drain(..).map(|e| (e.url.clone(), e)).collect();
        let total = self.order.len();
        for (index, url) in self.order.iter().take(spawned).enumerate() {
            let mut entity = previous.remove(url).unwrap_or_else(|| PhotoEntity {
                url: url.clone(),
                layout: FloatLayout::for_index(index, total),
                spawned_at: Timestamp::default(),
                position: SPAWN_ORIGIN,
                opacity: 0.0,
                scale: 0.0,
            });
            entity.layout = FloatLayout::for_index(index, total);
            self.entities.push(entity);
        }
        self.selected = None;
        self.hovered = None;
    }

    fn animate(&mut self, state: &AppState, camera: &CameraFrame, now: Timestamp, t: f32) {
        let phase = state.phase();
        let fading = state.photos_fading();
        let memory_mode = state.is_memory_mode();
        let total = self.order.len();
        let any_selected = self.selected.is_some();
        let camera_forward = (camera.look_at - camera.position).normalize_or(Vec3::NEG_Z);

        for (index, entity) in self.entities.iter_mut().enumerate() {
            let Some(size) = self.image_sizes.get(&entity.url) else {
                continue;
            };
            let is_selected = self.selected == Some(index);
            let is_hovered = self.hovered == Some(index);

            let (mut target, mut target_scale, mut target_opacity) = match phase {
                Phase::Stories => (entity.layout.backdrop(), 0.3, 1.0),
                Phase::Reading => (reading_ring(index, total, t), 0.85, 1.0),
                _ if memory_mode => (spiral(index).0, 0.8, 1.0),
                _ => (entity.layout.bob(t), entity.layout.scale, 1.0),
            };

            if fading {
                target_scale = 0.0;
                target_opacity = 0.0;
            } else if is_selected {
                if phase == Phase::Reading {
                    target = READING_SLOT;
                    target_scale = 1.5;
                } else {
                    target = camera.position + camera_forward * SELECTED_DISTANCE;
                    target_scale = 18.0 / size.x.max(size.y);
                }
                target_opacity = 1.0;
            } else if is_hovered {
                target_scale = entity.layout.scale * 1.6;
                target_opacity = 1.0;
            }
            if any_selected && !is_selected {
                target_opacity = 0.1;
            }

            let appear = (now.since(entity.spawned_at) as f32 / 1_000_000.0 / self.settings.appear_secs).min(1.0);
            let ease = 1.0 - (1.0 - appear).powi(3);

            let lerp = if is_selected {
                self.settings.selected_lerp
            } else {
                self.settings.idle_lerp
            };
            entity.position += (target - entity.position) * lerp;

            if fading {
                entity.scale = 0.0;
                entity.opacity = 0.0;
            } else {
                let scale_lerp = if is_hovered { 0.08 } else { 0.04 };
                entity.scale += (target_scale * ease - entity.scale) * scale_lerp;
                entity.opacity += (target_opacity * ease - entity.opacity) * 0.05;
            }
        }
    }

    fn instances(&self, phase: Phase, camera: &CameraFrame) -> Vec<PhotoInstance> {
        self.entities
            .iter()
            .take(self.visible())
            .enumerate()
            .filter_map(|(index, entity)| {
                let size = *self.image_sizes.get(&entity.url)?;
                let selected = self.selected == Some(index);
                let facing = if phase == Phase::Reading {
                    Vec3::new(camera.position.x, entity.position.y, camera.position.z)
                } else {
                    camera.position
                };
                let render_order = if selected {
                    1000
                } else if self.hovered == Some(index) {
                    999
                } else {
                    (1000.0 - camera.position.distance(entity.position)).floor() as i32
                };
                Some(PhotoInstance {
                    index,
                    url: entity.url.clone(),
                    position: entity.position,
                    facing,
                    size,
                    scale: entity.scale.max(0.01),
                    opacity: entity.opacity,
                    selected,
                    render_order,
                    story: if selected {
                        self.catalog.story_for(&entity.url).cloned()
                    } else {
                        None
                    },
                })
            })
            .collect()
    }
}
