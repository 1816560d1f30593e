//! Store locator route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use loyalty_core::{Coordinates, StoreId};

use crate::db::StoreRepository;
use crate::error::{AppError, Result};
use crate::models::store::{NearbySearch, Store, StoreFilter, StoreService};
use crate::state::AppState;

use super::ApiQuery;

/// Query parameters for `GET /api/stores`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreQuery {
    /// Comma separated service names.
    pub services: Option<String>,
    pub rating: Option<f64>,
    pub is_open: Option<bool>,
    pub has_parking: Option<bool>,
    pub is_wheelchair_accessible: Option<bool>,
    pub has_wifi: Option<bool>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub max_distance: Option<f64>,
}

impl StoreQuery {
    fn filter(&self) -> StoreFilter {
        StoreFilter {
            services: self
                .services
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            min_rating: self.rating,
            is_open: self.is_open,
            has_parking: self.has_parking,
            is_wheelchair_accessible: self.is_wheelchair_accessible,
            has_wifi: self.has_wifi,
        }
    }

    fn nearby(&self) -> Result<Option<NearbySearch>> {
        let (Some(lat), Some(lng)) = (self.lat, self.lng) else {
            return Ok(None);
        };
        let origin = Coordinates::new(lat, lng)
            .map_err(|e| AppError::invalid_field("lat", e.to_string()))?;
        if self.max_distance.is_some_and(|d| !d.is_finite() || d < 0.0) {
            return Err(AppError::invalid_field(
                "maxDistance",
                "maxDistance must be a positive number of kilometres",
            ));
        }
        Ok(Some(NearbySearch {
            origin,
            max_distance_km: self.max_distance,
        }))
    }
}

#[derive(Debug, Serialize)]
pub struct StoresResponse {
    pub stores: Vec<Store>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ServicesResponse {
    pub services: Vec<StoreService>,
}

/// Store search.
///
/// GET /api/stores
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StoreQuery>,
) -> Result<Json<StoresResponse>> {
    let nearby = query.nearby()?;
    let stores = StoreRepository::new(state.pool())
        .list(&query.filter())
        .await?;

    let stores = match nearby {
        Some(search) => search.apply(stores),
        None => stores,
    };

    Ok(Json(StoresResponse {
        total: stores.len(),
        stores,
    }))
}

/// Store detail.
///
/// GET /api/stores/{id}
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<StoreId>) -> Result<Json<Store>> {
    StoreRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Store not found".to_string()))
}

/// Bookable services of a store.
///
/// GET /api/stores/{id}/services
#[instrument(skip(state))]
pub async fn services(
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
) -> Result<Json<ServicesResponse>> {
    let stores = StoreRepository::new(state.pool());
    if !stores.exists(id).await? {
        return Err(AppError::NotFound("Store not found".to_string()));
    }
    let services = stores.services(id).await?;
    Ok(Json(ServicesResponse { services }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_services_split_on_commas() {
        let query = StoreQuery {
            services: Some("Oil Change, Tire Rotation,,".to_string()),
            ..StoreQuery::default()
        };
        assert_eq!(query.filter().services, ["Oil Change", "Tire Rotation"]);
    }

    #[test]
    fn test_nearby_needs_both_coordinates() {
        let query = StoreQuery {
            lat: Some(40.0),
            ..StoreQuery::default()
        };
        assert!(query.nearby().unwrap().is_none());

        let query = StoreQuery {
            lat: Some(40.0),
            lng: Some(-74.0),
            max_distance: Some(25.0),
            ..StoreQuery::default()
        };
        let search = query.nearby().unwrap().unwrap();
        assert_eq!(search.max_distance_km, Some(25.0));
    }

    #[test]
    fn test_nearby_rejects_out_of_range() {
        let query = StoreQuery {
            lat: Some(123.0),
            lng: Some(0.0),
            ..StoreQuery::default()
        };
        assert!(matches!(query.nearby(), Err(AppError::Validation { .. })));

        let query = StoreQuery {
            lat: Some(0.0),
            lng: Some(0.0),
            max_distance: Some(-1.0),
            ..StoreQuery::default()
        };
        assert!(query.nearby().is_err());
    }
}
