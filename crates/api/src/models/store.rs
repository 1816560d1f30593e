//! Store locator types.

use rust_decimal::Decimal;
use serde::Serialize;

use loyalty_core::{Coordinates, ServiceId, StoreId};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub hours: serde_json::Value,
    pub rating: f64,
    pub review_count: i32,
    pub is_open: bool,
    pub has_parking: bool,
    pub is_wheelchair_accessible: bool,
    pub has_wifi: bool,
    pub is_featured: bool,
    /// Kilometres from the searcher, present only for location searches.
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl Store {
    /// The store's position, if both coordinates are recorded and valid.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.latitude?, self.longitude?).ok()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoreService {
    pub id: ServiceId,
    pub store_id: StoreId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub duration_minutes: i32,
    pub price: Option<Decimal>,
    pub is_available: bool,
    pub requires_booking: bool,
}

/// Store list filters.
#[derive(Debug, Clone, Default)]
pub struct StoreFilter {
    pub services: Vec<String>,
    pub min_rating: Option<f64>,
    pub is_open: Option<bool>,
    pub has_parking: Option<bool>,
    pub is_wheelchair_accessible: Option<bool>,
    pub has_wifi: Option<bool>,
}

/// Location search around a point.
#[derive(Debug, Clone, Copy)]
pub struct NearbySearch {
    pub origin: Coordinates,
    pub max_distance_km: Option<f64>,
}

impl NearbySearch {
    /// Annotate stores with their distance, drop those without coordinates
    /// or beyond the radius, and order nearest first.
    #[must_use]
    pub fn apply(&self, stores: Vec<Store>) -> Vec<Store> {
        let mut nearby: Vec<Store> = stores
            .into_iter()
            .filter_map(|mut store| {
                let distance = self.origin.distance_to(&store.coordinates()?);
                if self.max_distance_km.is_some_and(|max| distance > max) {
                    return None;
                }
                store.distance = Some(distance);
                Some(store)
            })
            .collect();

        nearby.sort_by(|a, b| {
            a.distance
                .unwrap_or(f64::INFINITY)
                .total_cmp(&b.distance.unwrap_or(f64::INFINITY))
        });
        nearby
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(id: i32, lat: Option<f64>, lon: Option<f64>) -> Store {
        Store {
            id: StoreId::new(id),
            name: format!("Store {id}"),
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip_code: "62701".to_string(),
            phone: None,
            email: None,
            website: None,
            description: None,
            latitude: lat,
            longitude: lon,
            hours: serde_json::json!({}),
            rating: 4.5,
            review_count: 0,
            is_open: true,
            has_parking: false,
            is_wheelchair_accessible: false,
            has_wifi: false,
            is_featured: false,
            distance: None,
        }
    }

    #[test]
    fn test_nearby_orders_by_distance_and_filters() {
        let search = NearbySearch {
            origin: Coordinates::new(0.0, 0.0).unwrap(),
            max_distance_km: Some(500.0),
        };
        let stores = vec![
            store(1, Some(3.0), Some(0.0)),
            store(2, Some(1.0), Some(0.0)),
            store(3, None, None),
            store(4, Some(20.0), Some(0.0)),
        ];

        let result = search.apply(stores);
        let ids: Vec<i32> = result.iter().map(|s| s.id.as_i32()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(result.iter().all(|s| s.distance.is_some()));
    }

    #[test]
    fn test_nearby_without_radius_keeps_all_located_stores() {
        let search = NearbySearch {
            origin: Coordinates::new(0.0, 0.0).unwrap(),
            max_distance_km: None,
        };
        let result = search.apply(vec![store(1, Some(60.0), Some(0.0)), store(2, None, Some(1.0))]);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_distance_only_serialized_when_present() {
        let json = serde_json::to_value(store(1, None, None)).unwrap();
        assert!(json.get("distance").is_none());
        assert_eq!(json["zipCode"], "62701");
    }
}
