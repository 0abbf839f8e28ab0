use axum::extract::{Extension, Path, Query};
use axum::http::StatusCode;
use axum::response::Json;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use wasteless_core::geo::{haversine_km, open_now, rank_nearby, round_km};
use wasteless_core::schema::donation_centers;
use wasteless_core::types::DonationCenter;
use wasteless_core::AppContext;

use crate::error::ApiError;
use crate::handlers::db_conn;

#[derive(Debug, Serialize)]
pub struct DonationCenterResponse {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub center_type: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: Option<f64>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub opening_hours: Option<String>,
    pub accepted_items: Option<String>,
    pub website: Option<String>,
    pub is_currently_open: Option<bool>,
}

impl DonationCenterResponse {
    fn from_center(center: DonationCenter, user_lat: Option<f64>, user_lon: Option<f64>) -> Self {
        let distance_km = match (user_lat, user_lon) {
            (Some(lat), Some(lon)) => {
                Some(round_km(haversine_km(lat, lon, center.latitude, center.longitude)))
            }
            _ => None,
        };
        Self::with_distance(center, distance_km)
    }

    fn with_distance(center: DonationCenter, distance_km: Option<f64>) -> Self {
        let is_currently_open = open_now(center.opening_hours.as_deref());
        DonationCenterResponse {
            id: center.id,
            name: center.name,
            center_type: center.center_type,
            address: center.address,
            city: center.city,
            state: center.state,
            latitude: center.latitude,
            longitude: center.longitude,
            distance_km,
            phone_number: center.phone_number,
            email: center.email,
            opening_hours: center.opening_hours,
            accepted_items: center.accepted_items,
            website: center.website,
            is_currently_open,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<f64>,
    #[serde(rename = "type")]
    pub center_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoordsQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

async fn load_active_centers(ctx: &AppContext) -> Result<Vec<DonationCenter>, ApiError> {
    let mut conn = db_conn(ctx).await?;
    let centers = donation_centers::table
        .filter(donation_centers::is_active.eq(true))
        .order(donation_centers::id.asc())
        .select(DonationCenter::as_select())
        .load(&mut conn)
        .await?;
    Ok(centers)
}

/// GET /api/v1/donations/nearby
pub async fn nearby(
    Extension(ctx): Extension<AppContext>,
    Query(params): Query<NearbyQuery>,
) -> Result<Json<Vec<DonationCenterResponse>>, ApiError> {
    let latitude = params
        .latitude
        .ok_or_else(|| ApiError::validation("latitude is required"))?;
    let longitude = params
        .longitude
        .ok_or_else(|| ApiError::validation("longitude is required"))?;
    let radius = params.radius.unwrap_or(10.0);
    if radius < 0.0 {
        return Err(ApiError::validation("radius must be non-negative"));
    }

    let centers = load_active_centers(&ctx).await?;
    let ranked = rank_nearby(latitude, longitude, radius, params.center_type.as_deref(), centers);

    let result = ranked
        .into_iter()
        .map(|(center, distance)| {
            DonationCenterResponse::with_distance(center, Some(round_km(distance)))
        })
        .collect();

    Ok(Json(result))
}

/// GET /api/v1/donations/city/{city}
pub async fn by_city(
    Extension(ctx): Extension<AppContext>,
    Path(city): Path<String>,
    Query(coords): Query<CoordsQuery>,
) -> Result<Json<Vec<DonationCenterResponse>>, ApiError> {
    let mut conn = db_conn(&ctx).await?;
    let centers: Vec<DonationCenter> = donation_centers::table
        .filter(donation_centers::is_active.eq(true))
        .filter(donation_centers::city.eq(&city))
        .order(donation_centers::id.asc())
        .select(DonationCenter::as_select())
        .load(&mut conn)
        .await?;

    let result = centers
        .into_iter()
        .map(|c| DonationCenterResponse::from_center(c, coords.latitude, coords.longitude))
        .collect();

    Ok(Json(result))
}

/// GET /api/v1/donations/all
pub async fn all(
    Extension(ctx): Extension<AppContext>,
    Query(coords): Query<CoordsQuery>,
) -> Result<Json<Vec<DonationCenterResponse>>, ApiError> {
    let centers = load_active_centers(&ctx).await?;

    let mut result: Vec<DonationCenterResponse> = centers
        .into_iter()
        .map(|c| DonationCenterResponse::from_center(c, coords.latitude, coords.longitude))
        .collect();

    // Distance ordering only applies when the caller told us where
    // they are.
    if coords.latitude.is_some() && coords.longitude.is_some() {
        result.sort_by(|a, b| {
            a.distance_km
                .unwrap_or(f64::MAX)
                .total_cmp(&b.distance_km.unwrap_or(f64::MAX))
        });
    }

    Ok(Json(result))
}

/// GET /api/v1/donations/{id}
pub async fn by_id(
    Extension(ctx): Extension<AppContext>,
    Path(id): Path<i64>,
    Query(coords): Query<CoordsQuery>,
) -> Result<Json<DonationCenterResponse>, ApiError> {
    let mut conn = db_conn(&ctx).await?;
    let center: Option<DonationCenter> = donation_centers::table
        .find(id)
        .select(DonationCenter::as_select())
        .first(&mut conn)
        .await
        .optional()?;

    let center = center.ok_or_else(|| ApiError::not_found("donation center", id))?;
    Ok(Json(DonationCenterResponse::from_center(
        center,
        coords.latitude,
        coords.longitude,
    )))
}

#[derive(Debug, Deserialize)]
pub struct CreateDonationCenterRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub center_type: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub opening_hours: Option<String>,
    pub accepted_items: Option<String>,
    pub website: Option<String>,
}

/// POST /api/v1/donations/centers — administrative write path.
pub async fn create(
    Extension(ctx): Extension<AppContext>,
    Json(request): Json<CreateDonationCenterRequest>,
) -> Result<(StatusCode, Json<DonationCenterResponse>), ApiError> {
    if request.name.is_empty() {
        return Err(ApiError::validation("name is required"));
    }

    let mut conn = db_conn(&ctx).await?;
    let center: DonationCenter = diesel::insert_into(donation_centers::table)
        .values((
            donation_centers::name.eq(&request.name),
            donation_centers::center_type.eq(&request.center_type),
            donation_centers::address.eq(&request.address),
            donation_centers::city.eq(&request.city),
            donation_centers::state.eq(&request.state),
            donation_centers::latitude.eq(request.latitude),
            donation_centers::longitude.eq(request.longitude),
            donation_centers::phone_number.eq(&request.phone_number),
            donation_centers::email.eq(&request.email),
            donation_centers::opening_hours.eq(&request.opening_hours),
            donation_centers::accepted_items.eq(&request.accepted_items),
            donation_centers::website.eq(&request.website),
            donation_centers::is_active.eq(true),
        ))
        .returning(DonationCenter::as_returning())
        .get_result(&mut conn)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DonationCenterResponse::from_center(center, None, None)),
    ))
}
