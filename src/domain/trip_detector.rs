// Trip detection state machine
use crate::domain::geofence::DumpPolygon;
use crate::domain::gps::GpsFix;
use crate::domain::ids::{IdSource, UuidIds};
use crate::domain::trip::{TripEvent, TripStatus};
use std::sync::Arc;

/// Detects dump-zone visits in a single vehicle's GPS history.
///
/// One forward pass over the time-sorted fixes with at most one open trip.
/// A fix inside a zone opens or extends the trip; a fix anywhere else
/// closes it at that fix's timestamp.
#[derive(Clone)]
pub struct TripDetector {
    ids: Arc<dyn IdSource>,
}

impl TripDetector {
    pub fn new() -> Self {
        Self::with_id_source(Arc::new(UuidIds))
    }

    pub fn with_id_source(ids: Arc<dyn IdSource>) -> Self {
        Self { ids }
    }

    pub fn analyze_trips(&self, history: &[GpsFix], polygons: &[DumpPolygon]) -> Vec<TripEvent> {
        let mut fixes: Vec<&GpsFix> = history.iter().collect();
        fixes.sort_by_key(|fix| fix.timestamp);

        let mut trips: Vec<TripEvent> = Vec::new();
        let mut current: Option<TripEvent> = None;

        for fix in &fixes {
            match containing_polygon(fix, polygons) {
                Some(zone) => {
                    let same_zone = current
                        .as_ref()
                        .is_some_and(|trip| trip.dump_id == zone.id);
                    if same_zone {
                        if let Some(trip) = current.as_mut() {
                            trip.path.push([fix.latitude, fix.longitude]);
                        }
                    } else {
                        // switching zones closes the open trip at this fix
                        if let Some(mut finished) = current.take() {
                            finished.close(fix.timestamp);
                            trips.push(finished);
                        }
                        current = Some(self.open_trip(fix, zone));
                    }
                }
                None => {
                    if let Some(mut finished) = current.take() {
                        finished.close(fix.timestamp);
                        trips.push(finished);
                    }
                }
            }
        }

        // history ended while still inside a zone
        if let Some(mut finished) = current.take() {
            if let Some(last) = fixes.last() {
                finished.close(last.timestamp);
            }
            trips.push(finished);
        }

        trips
    }

    fn open_trip(&self, fix: &GpsFix, zone: &DumpPolygon) -> TripEvent {
        TripEvent {
            id: self.ids.next_id(),
            vehicle_no: fix.vehicle_no.clone(),
            dump_id: zone.id.clone(),
            dump_name: zone.name.clone(),
            entry_time: fix.timestamp,
            exit_time: fix.timestamp,
            duration_minutes: 0.0,
            is_valid: false,
            status: TripStatus::InProgress,
            path: vec![[fix.latitude, fix.longitude]],
        }
    }
}

impl Default for TripDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// First polygon in the provided order that contains the fix. Fixes with
/// non-finite coordinates never match.
fn containing_polygon<'a>(fix: &GpsFix, polygons: &'a [DumpPolygon]) -> Option<&'a DumpPolygon> {
    if !(fix.latitude.is_finite() && fix.longitude.is_finite()) {
        return None;
    }
    polygons.iter().find(|zone| {
        // store-validated rings cannot fail the test; a degenerate ring
        // from a hand-edited file just never matches
        zone.contains(fix.latitude, fix.longitude).unwrap_or(false)
    })
}
