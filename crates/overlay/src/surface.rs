//! Map surface capability.
//!
//! The overlay never renders anything itself. It drives whatever map widget the host
//! provides through [`MapSurface`], and owns that widget through [`MapHandle`].

use std::collections::BTreeMap;

use crate::render::MarkerVisual;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapEvent {
    Load,
    Zoom,
    Move,
    Rotate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Line,
    Symbol,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub kind: LayerKind,
    pub source: String,
    pub source_layer: String,
}

/// Primitives the host map widget exposes.
pub trait MapSurface {
    fn add_layer(&mut self, layer: LayerSpec);
    fn remove_layer(&mut self, id: &str);
    fn add_marker(&mut self, marker: MarkerVisual) -> MarkerId;
    fn remove_marker(&mut self, id: MarkerId);
    /// `filter` is a Mapbox style expression.
    fn set_filter(&mut self, layer_id: &str, filter: serde_json::Value);
    fn set_layout_visibility(&mut self, layer_id: &str, visible: bool);
    fn zoom(&self) -> f64;
    fn bearing(&self) -> f64;
    fn subscribe(&mut self, event: MapEvent) -> ListenerId;
    fn unsubscribe(&mut self, id: ListenerId);
    /// Release the underlying widget. Called at most once by [`MapHandle`].
    fn dispose(&mut self);
}

/// Owned map surface with the listeners registered through it.
///
/// Disposing detaches every listener and releases the surface exactly once; later
/// calls, and the drop, are no-ops.
pub struct MapHandle<S: MapSurface> {
    surface: Option<S>,
    listeners: Vec<ListenerId>,
}

impl<S: MapSurface> MapHandle<S> {
    pub fn new(surface: S) -> Self {
        MapHandle {
            surface: Some(surface),
            listeners: Vec::new(),
        }
    }

    pub fn get(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn is_disposed(&self) -> bool {
        self.surface.is_none()
    }

    pub fn listen(&mut self, event: MapEvent) {
        if let Some(surface) = self.surface.as_mut() {
            let id = surface.subscribe(event);
            self.listeners.push(id);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Returns the released surface on the first call only.
    pub fn dispose(&mut self) -> Option<S> {
        let mut surface = self.surface.take()?;
        for id in self.listeners.drain(..) {
            surface.unsubscribe(id);
        }
        surface.dispose();
        tracing::debug!("Map surface disposed");
        Some(surface)
    }
}

impl<S: MapSurface> Drop for MapHandle<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayerState {
    pub spec: LayerSpec,
    pub filter: Option<serde_json::Value>,
    pub visible: bool,
}

/// In-memory surface that records every command. Used by the headless briefing and
/// in tests.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    layers: BTreeMap<String, LayerState>,
    markers: BTreeMap<MarkerId, MarkerVisual>,
    listeners: BTreeMap<ListenerId, MapEvent>,
    zoom: f64,
    bearing: f64,
    next_id: u64,
    markers_removed: usize,
    dispose_count: usize,
}

impl RecordingSurface {
    pub fn new(zoom: f64) -> Self {
        RecordingSurface {
            layers: BTreeMap::new(),
            markers: BTreeMap::new(),
            listeners: BTreeMap::new(),
            zoom,
            bearing: 0.0,
            next_id: 1,
            markers_removed: 0,
            dispose_count: 0,
        }
    }

    fn next(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }

    pub fn set_bearing(&mut self, bearing: f64) {
        self.bearing = bearing;
    }

    pub fn layer(&self, id: &str) -> Option<&LayerState> {
        self.layers.get(id)
    }

    pub fn markers(&self) -> impl Iterator<Item = &MarkerVisual> {
        self.markers.values()
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn markers_removed(&self) -> usize {
        self.markers_removed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_listening(&self, event: MapEvent) -> bool {
        self.listeners.values().any(|e| *e == event)
    }

    pub fn dispose_count(&self) -> usize {
        self.dispose_count
    }
}

impl MapSurface for RecordingSurface {
    fn add_layer(&mut self, layer: LayerSpec) {
        self.layers.insert(
            layer.id.clone(),
            LayerState {
                spec: layer,
                filter: None,
                visible: true,
            },
        );
    }

    fn remove_layer(&mut self, id: &str) {
        self.layers.remove(id);
    }

    fn add_marker(&mut self, marker: MarkerVisual) -> MarkerId {
        let id = MarkerId(self.next());
        self.markers.insert(id, marker);
        id
    }

    fn remove_marker(&mut self, id: MarkerId) {
        if self.markers.remove(&id).is_some() {
            self.markers_removed += 1;
        }
    }

    fn set_filter(&mut self, layer_id: &str, filter: serde_json::Value) {
        if let Some(layer) = self.layers.get_mut(layer_id) {
            layer.filter = Some(filter);
        }
    }

    fn set_layout_visibility(&mut self, layer_id: &str, visible: bool) {
        if let Some(layer) = self.layers.get_mut(layer_id) {
            layer.visible = visible;
        }
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn bearing(&self) -> f64 {
        self.bearing
    }

    fn subscribe(&mut self, event: MapEvent) -> ListenerId {
        let id = ListenerId(self.next());
        self.listeners.insert(id, event);
        id
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn dispose(&mut self) {
        self.dispose_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_disposes_once_and_detaches_listeners() {
        let mut handle = MapHandle::new(RecordingSurface::new(12.0));
        handle.listen(MapEvent::Zoom);
        handle.listen(MapEvent::Move);
        assert_eq!(handle.get().unwrap().listener_count(), 2);

        let released = handle.dispose().expect("first dispose releases the surface");
        assert_eq!(released.listener_count(), 0);
        assert_eq!(released.dispose_count(), 1);
        assert!(handle.is_disposed());
        assert!(handle.dispose().is_none());
    }

    #[test]
    fn test_listen_after_dispose_is_noop() {
        let mut handle = MapHandle::new(RecordingSurface::new(12.0));
        handle.dispose();
        handle.listen(MapEvent::Zoom);
        assert_eq!(handle.listener_count(), 0);
    }

    #[test]
    fn test_filter_on_missing_layer_is_ignored() {
        let mut surface = RecordingSurface::new(12.0);
        surface.set_filter("nope", serde_json::json!(true));
        assert!(surface.layer("nope").is_none());
    }
}
