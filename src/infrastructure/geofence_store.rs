// Geofence store - Dump zone persistence as a JSON file on disk
use crate::domain::geofence::{DumpPolygon, InvalidGeometry};
use crate::domain::ids::{IdSource, UuidIds};
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum GeofenceStoreError {
    #[error(transparent)]
    Geometry(#[from] InvalidGeometry),

    #[error("failed to access polygon storage: {0}")]
    Io(#[from] std::io::Error),

    #[error("polygon storage is corrupted: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct GeofenceStore {
    path: PathBuf,
    ids: Arc<dyn IdSource>,
}

impl GeofenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, GeofenceStoreError> {
        Self::with_id_source(path, Arc::new(UuidIds))
    }

    pub fn with_id_source(
        path: impl Into<PathBuf>,
        ids: Arc<dyn IdSource>,
    ) -> Result<Self, GeofenceStoreError> {
        let path = path.into();
        // A bare filename has an empty parent
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path, ids })
    }

    /// Current zone set. A store that has never been written starts out
    /// with the default plant polygon; an explicitly saved empty set stays
    /// empty.
    pub fn list(&self) -> Result<Vec<DumpPolygon>, GeofenceStoreError> {
        if !self.path.exists() {
            return Ok(vec![DumpPolygon::default_plant()]);
        }
        let raw = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, polygons: &[DumpPolygon]) -> Result<(), GeofenceStoreError> {
        let json = serde_json::to_string_pretty(polygons)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Validate and append a new zone, materializing the default set on
    /// first write.
    pub fn create(
        &self,
        name: &str,
        ring: Vec<[f64; 2]>,
    ) -> Result<DumpPolygon, GeofenceStoreError> {
        let polygon = DumpPolygon::new(self.ids.next_id(), name.to_string(), ring, Utc::now())?;
        let mut polygons = self.list()?;
        polygons.push(polygon.clone());
        self.save(&polygons)?;
        Ok(polygon)
    }

    /// Remove a zone by id. Deleting an unknown id is a no-op, but still
    /// materializes the current set to disk.
    pub fn delete(&self, id: &str) -> Result<(), GeofenceStoreError> {
        let mut polygons = self.list()?;
        polygons.retain(|polygon| polygon.id != id);
        self.save(&polygons)
    }
}
