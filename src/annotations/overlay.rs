//! Overlay sizing through resize observation of the content box.
//!
//! The highlight overlay covers the unscaled content box, so its size has to
//! follow every reflow of the content (page images arriving, text layout,
//! theme changes). Content roots are observed while they exist and each
//! measured size change is delivered as a [`ResizeEntry`].

use std::collections::HashMap;

use bevy::prelude::*;

use crate::viewer::{ContentExtent, ContentRoot};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEntry {
    pub target: Entity,
    /// Natural (unscaled) size of the target.
    pub size: Vec2,
}

/// Subscribe/unsubscribe size observation of entities.
pub trait ResizeObserver {
    fn observe(&mut self, target: Entity);
    fn unobserve(&mut self, target: Entity);
    /// Drain the size changes recorded since the last call, oldest first.
    fn take_records(&mut self) -> Vec<ResizeEntry>;
}

/// Observer fed by the content measuring system.
#[derive(Resource, Debug, Default)]
pub struct ContentResizeObserver {
    observed: HashMap<Entity, Option<Vec2>>,
    records: Vec<ResizeEntry>,
}

impl ContentResizeObserver {
    pub fn is_observing(&self, target: Entity) -> bool {
        self.observed.contains_key(&target)
    }

    /// Record a measurement. Ignored for unobserved targets and unchanged sizes.
    pub fn report(&mut self, target: Entity, size: Vec2) {
        let Some(last) = self.observed.get_mut(&target) else {
            return;
        };
        if *last == Some(size) {
            return;
        }
        *last = Some(size);
        self.records.push(ResizeEntry { target, size });
    }
}

impl ResizeObserver for ContentResizeObserver {
    fn observe(&mut self, target: Entity) {
        self.observed.entry(target).or_insert(None);
    }

    fn unobserve(&mut self, target: Entity) {
        self.observed.remove(&target);
        self.records.retain(|r| r.target != target);
    }

    fn take_records(&mut self) -> Vec<ResizeEntry> {
        std::mem::take(&mut self.records)
    }
}

/// Current overlay dimensions in document units.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    pub target: Option<Entity>,
    pub size: Vec2,
}

impl OverlayLayout {
    pub fn apply(&mut self, records: &[ResizeEntry]) -> bool {
        let Some(latest) = records.last() else {
            return false;
        };
        let changed = self.size != latest.size || self.target != Some(latest.target);
        self.target = Some(latest.target);
        self.size = latest.size;
        changed
    }

    pub fn detach(&mut self, target: Entity) {
        if self.target == Some(target) {
            *self = Self::default();
        }
    }
}

pub fn observe_content_roots(
    added: Query<Entity, Added<ContentRoot>>,
    mut removed: RemovedComponents<ContentRoot>,
    mut observer: ResMut<ContentResizeObserver>,
    mut layout: ResMut<OverlayLayout>,
) {
    for entity in removed.read() {
        observer.unobserve(entity);
        layout.detach(entity);
    }
    for entity in added.iter() {
        observer.observe(entity);
    }
}

pub fn measure_content(
    roots: Query<(Entity, &ContentExtent), Changed<ContentExtent>>,
    mut observer: ResMut<ContentResizeObserver>,
) {
    for (entity, extent) in roots.iter() {
        observer.report(entity, extent.0);
    }
}

pub fn apply_resize_records(
    mut observer: ResMut<ContentResizeObserver>,
    mut layout: ResMut<OverlayLayout>,
) {
    let records = observer.take_records();
    if layout.apply(&records)
        && let Some(last) = records.last()
    {
        debug!("Overlay resized to {}x{}", last.size.x, last.size.y);
    }
}
