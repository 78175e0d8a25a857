use fireline_shared::contour::{self, ContourFilter, ContourSettings};
use fireline_shared::models::{AssetFilter, DecisionRecord, ElevationSelection, Incident};
use fireline_shared::placement;
use tokio::sync::watch;

use crate::acquisition::PlanSource;
use crate::geocode::{resolve_address, AddressSource};
use crate::render::{IconResolver, ImageIcons};
use crate::store::{OverlayPhase, OverlaySnapshot, OverlayStore, StoreAction, StoreChange};
use crate::surface::{LayerKind, LayerSpec, MapEvent, MapHandle, MapSurface, MarkerId};
use crate::terrain::{select_contour, TerrainSource};

pub const TERRAIN_SOURCE: &str = "mapbox-terrain";
pub const CONTOUR_SOURCE_LAYER: &str = "contour";
pub const CONTOUR_LAYER_ID: &str = "contour-highlight";
pub const CONTOUR_LABEL_LAYER_ID: &str = "contour-highlight-label";

/// Drives the overlay for one incident.
///
/// Owns the map surface, the markers placed on it and the observable state. All
/// mutation of the surface happens here; terrain, geocoding and plan sources are
/// borrowed only for the duration of the call that uses them.
pub struct OverlayController<S: MapSurface, I: IconResolver = ImageIcons> {
    map: MapHandle<S>,
    store: OverlayStore,
    icons: I,
    incident: Incident,
    settings: ContourSettings,
    placed: Vec<MarkerId>,
    contour_applied: bool,
    location_started: bool,
    acquisition_started: bool,
}

impl<S: MapSurface> OverlayController<S, ImageIcons> {
    pub fn new(surface: S, incident: Incident, settings: ContourSettings) -> Self {
        Self::with_icons(surface, incident, settings, ImageIcons::default())
    }
}

impl<S: MapSurface, I: IconResolver> OverlayController<S, I> {
    pub fn with_icons(surface: S, incident: Incident, settings: ContourSettings, icons: I) -> Self {
        let mut map = MapHandle::new(surface);
        map.listen(MapEvent::Load);
        OverlayController {
            map,
            store: OverlayStore::new(incident),
            icons,
            incident,
            settings,
            placed: Vec::new(),
            contour_applied: false,
            location_started: false,
            acquisition_started: false,
        }
    }

    pub fn incident(&self) -> Incident {
        self.incident
    }

    pub fn phase(&self) -> OverlayPhase {
        self.store.snapshot().phase
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        self.store.snapshot()
    }

    /// Presentation hook: a receiver that wakes on every state change.
    pub fn subscribe(&self) -> watch::Receiver<OverlaySnapshot> {
        self.store.subscribe()
    }

    pub fn surface(&self) -> Option<&S> {
        self.map.get()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.map.get_mut()
    }

    /// Entry point for notifications from the map widget.
    pub fn handle_event(&mut self, event: MapEvent) {
        if self.map.is_disposed() {
            return;
        }
        match event {
            MapEvent::Load => self.on_map_load(),
            MapEvent::Zoom | MapEvent::Move => self.refresh_contour_visibility(),
            MapEvent::Rotate => {
                if let Some(bearing) = self.map.get().map(|s| s.bearing()) {
                    self.dispatch(StoreAction::Bearing(bearing));
                }
            }
        }
    }

    fn on_map_load(&mut self) {
        if self.phase() != OverlayPhase::Uninitialized {
            return;
        }
        if let Some(surface) = self.map.get_mut() {
            for (id, kind) in [
                (CONTOUR_LAYER_ID, LayerKind::Line),
                (CONTOUR_LABEL_LAYER_ID, LayerKind::Symbol),
            ] {
                surface.add_layer(LayerSpec {
                    id: id.to_string(),
                    kind,
                    source: TERRAIN_SOURCE.to_string(),
                    source_layer: CONTOUR_SOURCE_LAYER.to_string(),
                });
                // Hidden until a band has been chosen.
                surface.set_layout_visibility(id, false);
            }
        }
        for event in [MapEvent::Zoom, MapEvent::Move, MapEvent::Rotate] {
            self.map.listen(event);
        }
        tracing::info!("Map ready");
        self.dispatch(StoreAction::MapLoaded);
    }

    /// Reverse-geocode the incident and choose its contour band. Runs once.
    pub async fn locate_incident<T, A>(&mut self, terrain: &T, addresses: &A)
    where
        T: TerrainSource,
        A: AddressSource,
    {
        if !self.ready_for_queries() || self.location_started {
            return;
        }
        self.location_started = true;
        let incident = self.incident;
        let settings = self.settings;
        let (address, elevation) = tokio::join!(
            resolve_address(addresses, incident),
            select_contour(terrain, incident, &settings)
        );
        self.apply_location(address, elevation);
    }

    /// Acquire the suppression plan. Returns whether a plan was stored.
    ///
    /// Only the first call does anything; in-flight requests are not cancelled.
    pub async fn acquire_plan<P: PlanSource>(&mut self, plans: &P) -> bool {
        if self.acquisition_started {
            tracing::debug!("Plan acquisition already started");
            return false;
        }
        self.acquisition_started = true;
        match plans.acquire(self.incident).await {
            Some(record) => {
                self.apply_plan(record);
                true
            }
            None => {
                tracing::warn!("Suppression plan unavailable");
                false
            }
        }
    }

    /// Run location and acquisition concurrently on the current task.
    pub async fn start<P, T, A>(&mut self, plans: &P, terrain: &T, addresses: &A)
    where
        P: PlanSource,
        T: TerrainSource,
        A: AddressSource,
    {
        if !self.ready_for_queries() {
            return;
        }
        let run_location = !self.location_started;
        let run_plan = !self.acquisition_started;
        self.location_started = true;
        self.acquisition_started = true;

        let incident = self.incident;
        let settings = self.settings;
        let location = async {
            if !run_location {
                return None;
            }
            Some(
                tokio::join!(
                    resolve_address(addresses, incident),
                    select_contour(terrain, incident, &settings)
                ),
            )
        };
        let plan = async {
            if !run_plan {
                return None;
            }
            plans.acquire(incident).await
        };
        let (location, record) = tokio::join!(location, plan);

        if let Some((address, elevation)) = location {
            self.apply_location(address, elevation);
        }
        match record {
            Some(record) => self.apply_plan(record),
            None if run_plan => tracing::warn!("Suppression plan unavailable"),
            None => {}
        }
    }

    /// Change the visible asset categories. Takes effect once a plan is present.
    pub fn select_filter(&mut self, filter: AssetFilter) {
        self.dispatch(StoreAction::FilterSelected(filter));
    }

    /// Detach listeners and release the map surface. Only the first call returns it.
    pub fn release(&mut self) -> Option<S> {
        self.placed.clear();
        self.map.dispose()
    }

    fn ready_for_queries(&self) -> bool {
        if self.map.is_disposed() || self.phase() == OverlayPhase::Uninitialized {
            tracing::warn!("Map not ready, skipping incident queries");
            return false;
        }
        true
    }

    fn apply_location(&mut self, address: String, elevation: ElevationSelection) {
        let filter = ContourFilter::for_selection(&elevation, &self.settings);
        if let Some(surface) = self.map.get_mut() {
            let expr = filter.to_expression();
            surface.set_filter(CONTOUR_LAYER_ID, expr.clone());
            surface.set_filter(CONTOUR_LABEL_LAYER_ID, expr);
            self.contour_applied = true;
        }
        tracing::info!(%address, contour = %filter, "Incident located");
        self.dispatch(StoreAction::Located {
            address,
            elevation,
            contour_filter: filter,
        });
        self.refresh_contour_visibility();
    }

    fn apply_plan(&mut self, record: DecisionRecord) {
        self.dispatch(StoreAction::PlanAcquired(record));
    }

    fn dispatch(&mut self, action: StoreAction) {
        if let Some(change) = self.store.dispatch(action) {
            self.on_store_change(change);
        }
    }

    fn on_store_change(&mut self, change: StoreChange) {
        match change {
            StoreChange::MapReady | StoreChange::PlanChanged | StoreChange::FilterChanged => {
                self.place_markers()
            }
            StoreChange::IncidentLocated
            | StoreChange::ViewportChanged
            | StoreChange::MarkersChanged => {}
        }
    }

    /// Replace every marker from the previous run with the set for the current plan
    /// and filter. No-op without a plan or a loaded map.
    fn place_markers(&mut self) {
        let snapshot = self.store.snapshot();
        if snapshot.phase == OverlayPhase::Uninitialized {
            return;
        }
        let Some(plan) = snapshot.plan() else {
            return;
        };
        let Some(surface) = self.map.get_mut() else {
            return;
        };

        for id in self.placed.drain(..) {
            surface.remove_marker(id);
        }
        let markers = placement::place_markers(self.incident, plan, snapshot.filter);
        for marker in &markers {
            let visual = self.icons.resolve(marker);
            self.placed.push(surface.add_marker(visual));
        }
        tracing::info!(
            markers = markers.len(),
            filter = ?snapshot.filter,
            "Placed asset markers"
        );
        self.dispatch(StoreAction::MarkersPlaced(markers));
    }

    fn refresh_contour_visibility(&mut self) {
        if !self.contour_applied {
            return;
        }
        let Some(surface) = self.map.get_mut() else {
            return;
        };
        let visible = contour::is_contour_visible(surface.zoom(), &self.settings);
        surface.set_layout_visibility(CONTOUR_LAYER_ID, visible);
        surface.set_layout_visibility(CONTOUR_LABEL_LAYER_ID, visible);
        self.dispatch(StoreAction::ContourVisibility(visible));
    }
}
