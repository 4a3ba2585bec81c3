//! Map marker layer.
//!
//! [`MarkerLayer`] owns one [`Marker`] per door currently shown on the
//! map. Every data change goes through [`MarkerLayer::sync`], which drops
//! the previous markers and rebuilds the full set from the new door list.
//! There is no incremental diffing and no spatial index; the layer is
//! sized for the few hundred doors a single listing returns.

use serde_json::{json, Value};

use crate::format;
use crate::models::{Category, Door, Location};
use crate::types::EntityId;

/// Centre used when the layer has no markers.
pub const DEFAULT_CENTER: Location = Location {
    latitude: 0.0,
    longitude: 0.0,
};

/// A single pin on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub door_id: EntityId,
    pub title: String,
    pub category: Category,
    pub position: Location,
    /// Short text shown when the marker is selected.
    pub popup: String,
}

impl Marker {
    fn from_door(door: &Door) -> Self {
        let place = door
            .place_name
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or("Unknown place");
        Self {
            door_id: door.id,
            title: door.title.clone(),
            category: door.category,
            position: door.location,
            popup: format!(
                "{} ({}) - {} - by {}",
                door.title, door.category, place, door.user_name
            ),
        }
    }

    /// simplestyle-spec colour for the marker's category.
    pub fn color(&self) -> &'static str {
        match self.category {
            Category::A => "#d97706",
            Category::B => "#2563eb",
        }
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn center(&self) -> Location {
        Location {
            latitude: (self.south + self.north) / 2.0,
            longitude: (self.west + self.east) / 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MarkerLayer {
    markers: Vec<Marker>,
    fallback_center: Location,
    generation: u64,
}

impl Default for MarkerLayer {
    fn default() -> Self {
        Self::new(DEFAULT_CENTER)
    }
}

impl MarkerLayer {
    pub fn new(fallback_center: Location) -> Self {
        Self {
            markers: Vec::new(),
            fallback_center,
            generation: 0,
        }
    }

    /// Replace every marker with one per door, in door order.
    pub fn sync(&mut self, doors: &[Door]) {
        self.markers.clear();
        self.markers.extend(doors.iter().map(Marker::from_door));
        self.generation += 1;
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Number of times the layer has been rebuilt.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn find(&self, door_id: EntityId) -> Option<&Marker> {
        self.markers.iter().find(|m| m.door_id == door_id)
    }

    /// Bounding box of all markers, or `None` when empty.
    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.markers.first()?.position;
        let init = Bounds {
            south: first.latitude,
            west: first.longitude,
            north: first.latitude,
            east: first.longitude,
        };
        Some(self.markers.iter().fold(init, |b, m| Bounds {
            south: b.south.min(m.position.latitude),
            west: b.west.min(m.position.longitude),
            north: b.north.max(m.position.latitude),
            east: b.east.max(m.position.longitude),
        }))
    }

    /// Midpoint of [`bounds`](Self::bounds), or the fallback centre.
    pub fn center(&self) -> Location {
        self.bounds()
            .map(|b| b.center())
            .unwrap_or(self.fallback_center)
    }

    /// Export the markers as a GeoJSON `FeatureCollection`.
    ///
    /// GeoJSON positions are `[longitude, latitude]`.
    pub fn to_geojson(&self) -> Value {
        let features: Vec<Value> = self
            .markers
            .iter()
            .map(|m| {
                json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "Point",
                        "coordinates": [m.position.longitude, m.position.latitude],
                    },
                    "properties": {
                        "id": m.door_id.to_string(),
                        "title": m.title,
                        "category": m.category.as_str(),
                        "description": m.popup,
                        "marker-color": m.color(),
                    },
                })
            })
            .collect();

        json!({
            "type": "FeatureCollection",
            "features": features,
        })
    }

    /// One line per marker, used by the terminal map view.
    pub fn describe(&self) -> Vec<String> {
        self.markers
            .iter()
            .map(|m| format!("[{}] {} @ {}", m.category, m.title, format::coordinates(&m.position)))
            .collect()
    }
}
