//! Observable overlay state.
//!
//! Every mutation goes through [`OverlayStore::dispatch`], which returns the change it
//! made (if any) so the controller can react synchronously, and publishes the new
//! snapshot to presentation subscribers over a `watch` channel.

use fireline_shared::contour::ContourFilter;
use fireline_shared::models::{
    AssetFilter, AssetMarker, DecisionRecord, ElevationSelection, HelicopterStatus, Incident,
    StrategyPlan, WeatherSnapshot,
};
use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum OverlayPhase {
    Uninitialized,
    MapReady,
    IncidentLocated,
    PlanAcquired,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySnapshot {
    pub phase: OverlayPhase,
    pub incident: Incident,
    pub address: Option<String>,
    pub decision: Option<DecisionRecord>,
    pub filter: AssetFilter,
    pub elevation: Option<ElevationSelection>,
    pub contour_filter: Option<ContourFilter>,
    pub contour_visible: bool,
    pub bearing: f64,
    pub markers: Vec<AssetMarker>,
}

impl OverlaySnapshot {
    fn new(incident: Incident) -> Self {
        OverlaySnapshot {
            phase: OverlayPhase::Uninitialized,
            incident,
            address: None,
            decision: None,
            filter: AssetFilter::SeeAll,
            elevation: None,
            contour_filter: None,
            contour_visible: false,
            bearing: 0.0,
            markers: Vec::new(),
        }
    }

    pub fn plan(&self) -> Option<&StrategyPlan> {
        self.decision.as_ref().map(|d| &d.strategy_data)
    }

    pub fn weather(&self) -> Option<&WeatherSnapshot> {
        self.decision.as_ref().map(|d| &d.weather_data)
    }

    pub fn helicopter_status(&self) -> HelicopterStatus {
        HelicopterStatus::from_plan(self.plan())
    }

    fn apply(&mut self, action: StoreAction) -> Option<StoreChange> {
        match action {
            StoreAction::MapLoaded => {
                if self.phase != OverlayPhase::Uninitialized {
                    return None;
                }
                self.phase = OverlayPhase::MapReady;
                Some(StoreChange::MapReady)
            }
            StoreAction::Located { address, elevation, contour_filter } => {
                if self.phase != OverlayPhase::MapReady {
                    return None;
                }
                self.address = Some(address);
                self.elevation = Some(elevation);
                self.contour_filter = Some(contour_filter);
                self.phase = if self.decision.is_some() {
                    OverlayPhase::PlanAcquired
                } else {
                    OverlayPhase::IncidentLocated
                };
                Some(StoreChange::IncidentLocated)
            }
            StoreAction::PlanAcquired(record) => {
                // A parsed plan is immutable for the session.
                if self.decision.is_some() {
                    return None;
                }
                self.decision = Some(record);
                if self.phase == OverlayPhase::IncidentLocated {
                    self.phase = OverlayPhase::PlanAcquired;
                }
                Some(StoreChange::PlanChanged)
            }
            StoreAction::FilterSelected(filter) => {
                if self.filter == filter {
                    return None;
                }
                self.filter = filter;
                Some(StoreChange::FilterChanged)
            }
            StoreAction::ContourVisibility(visible) => {
                if self.contour_visible == visible {
                    return None;
                }
                self.contour_visible = visible;
                Some(StoreChange::ViewportChanged)
            }
            StoreAction::Bearing(bearing) => {
                if self.bearing == bearing {
                    return None;
                }
                self.bearing = bearing;
                Some(StoreChange::ViewportChanged)
            }
            StoreAction::MarkersPlaced(markers) => {
                self.markers = markers;
                Some(StoreChange::MarkersChanged)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum StoreAction {
    MapLoaded,
    Located {
        address: String,
        elevation: ElevationSelection,
        contour_filter: ContourFilter,
    },
    PlanAcquired(DecisionRecord),
    FilterSelected(AssetFilter),
    ContourVisibility(bool),
    Bearing(f64),
    MarkersPlaced(Vec<AssetMarker>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    MapReady,
    IncidentLocated,
    PlanChanged,
    FilterChanged,
    ViewportChanged,
    MarkersChanged,
}

pub struct OverlayStore {
    tx: watch::Sender<OverlaySnapshot>,
}

impl OverlayStore {
    pub fn new(incident: Incident) -> Self {
        let (tx, _rx) = watch::channel(OverlaySnapshot::new(incident));
        OverlayStore { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<OverlaySnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> OverlaySnapshot {
        self.tx.borrow().clone()
    }

    /// Apply an action. Subscribers are only notified when something changed.
    pub fn dispatch(&self, action: StoreAction) -> Option<StoreChange> {
        let mut change = None;
        self.tx.send_if_modified(|state| {
            change = state.apply(action);
            change.is_some()
        });
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fireline_shared::models::{AssetCategory, StrategyPlan, WeatherSnapshot};

    fn record() -> DecisionRecord {
        DecisionRecord {
            strategy_data: StrategyPlan {
                helicopter_deployed: true,
                slope: 4.5,
                elevation: 573.0,
                wind_speed: 2.3,
                wind_direction: 180.0,
                entry_points: vec!["East Point 1".to_string()],
                strategy_text: "text".to_string(),
            },
            weather_data: WeatherSnapshot {
                wind_direction: 180.0,
                wind_speed: 2.3,
                humidity: Some(32.0),
            },
        }
    }

    fn located() -> StoreAction {
        StoreAction::Located {
            address: "Gyeongju".to_string(),
            elevation: ElevationSelection {
                chosen_elevation: 410.0,
                fallback_used: false,
            },
            contour_filter: ContourFilter::ElevationEquals(410.0),
        }
    }

    #[test]
    fn test_phase_progression() {
        let store = OverlayStore::new(Incident::new(129.2, 35.8));
        assert_eq!(store.snapshot().phase, OverlayPhase::Uninitialized);
        assert_eq!(store.dispatch(StoreAction::MapLoaded), Some(StoreChange::MapReady));
        assert_eq!(store.dispatch(located()), Some(StoreChange::IncidentLocated));
        assert_eq!(store.snapshot().phase, OverlayPhase::IncidentLocated);
        assert_eq!(
            store.dispatch(StoreAction::PlanAcquired(record())),
            Some(StoreChange::PlanChanged)
        );
        assert_eq!(store.snapshot().phase, OverlayPhase::PlanAcquired);
        assert_eq!(store.snapshot().helicopter_status(), HelicopterStatus::Necessary);
    }

    #[test]
    fn test_located_before_map_ready_is_ignored() {
        let store = OverlayStore::new(Incident::new(129.2, 35.8));
        assert_eq!(store.dispatch(located()), None);
        assert!(store.snapshot().address.is_none());
    }

    #[test]
    fn test_early_plan_promotes_on_location() {
        let store = OverlayStore::new(Incident::new(129.2, 35.8));
        store.dispatch(StoreAction::MapLoaded);
        store.dispatch(StoreAction::PlanAcquired(record()));
        assert_eq!(store.snapshot().phase, OverlayPhase::MapReady);
        store.dispatch(located());
        assert_eq!(store.snapshot().phase, OverlayPhase::PlanAcquired);
    }

    #[test]
    fn test_plan_is_immutable_once_set() {
        let store = OverlayStore::new(Incident::new(129.2, 35.8));
        store.dispatch(StoreAction::PlanAcquired(record()));
        let mut other = record();
        other.strategy_data.helicopter_deployed = false;
        assert_eq!(store.dispatch(StoreAction::PlanAcquired(other)), None);
        assert!(store.snapshot().plan().unwrap().helicopter_deployed);
    }

    #[test]
    fn test_same_filter_is_not_a_change() {
        let store = OverlayStore::new(Incident::new(129.2, 35.8));
        assert_eq!(store.dispatch(StoreAction::FilterSelected(AssetFilter::SeeAll)), None);
        assert_eq!(
            store.dispatch(StoreAction::FilterSelected(AssetFilter::Only(
                AssetCategory::Firefighter
            ))),
            Some(StoreChange::FilterChanged)
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = OverlayStore::new(Incident::new(129.2, 35.8));
        let mut rx = store.subscribe();
        store.dispatch(StoreAction::MapLoaded);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().phase, OverlayPhase::MapReady);

        store.dispatch(StoreAction::FilterSelected(AssetFilter::SeeAll));
        assert!(!rx.has_changed().unwrap());
    }
}
