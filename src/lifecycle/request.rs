use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::utils::geo::{parse_coordinate, GeoPoint};

/// Coordinates arrive either as JSON numbers or as numeric strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CoordinateValue {
    Number(f64),
    Text(String),
}

impl CoordinateValue {
    pub fn to_degrees(&self) -> Option<f64> {
        match self {
            CoordinateValue::Number(value) => Some(*value).filter(|v| v.is_finite()),
            CoordinateValue::Text(raw) => parse_coordinate(raw),
        }
    }
}

/// Body of `POST /bookings`, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingRequest {
    pub service_id: Option<i32>,
    pub pickup_lat: Option<CoordinateValue>,
    pub pickup_lng: Option<CoordinateValue>,
    pub pickup_address: Option<String>,
    pub drop_lat: Option<CoordinateValue>,
    pub drop_lng: Option<CoordinateValue>,
    pub drop_address: Option<String>,
}

/// Validated booking input.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub service_id: i32,
    pub pickup: GeoPoint,
    pub pickup_address: String,
    pub drop: GeoPoint,
    pub drop_address: String,
}

impl BookingRequest {
    pub fn validate(self) -> AppResult<NewBooking> {
        let mut missing = Vec::new();
        if self.service_id.is_none() {
            missing.push("service_id");
        }
        for (field, value) in [
            ("pickup_lat", &self.pickup_lat),
            ("pickup_lng", &self.pickup_lng),
            ("drop_lat", &self.drop_lat),
            ("drop_lng", &self.drop_lng),
        ] {
            if value.is_none() {
                missing.push(field);
            }
        }
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let pickup = GeoPoint::new(
            coordinate("pickup_lat", self.pickup_lat)?,
            coordinate("pickup_lng", self.pickup_lng)?,
        );
        let drop = GeoPoint::new(
            coordinate("drop_lat", self.drop_lat)?,
            coordinate("drop_lng", self.drop_lng)?,
        );

        Ok(NewBooking {
            service_id: self.service_id.unwrap_or_default(),
            pickup,
            pickup_address: self.pickup_address.unwrap_or_default(),
            drop,
            drop_address: self.drop_address.unwrap_or_default(),
        })
    }
}

fn coordinate(field: &str, value: Option<CoordinateValue>) -> AppResult<f64> {
    value
        .as_ref()
        .and_then(CoordinateValue::to_degrees)
        .ok_or_else(|| AppError::Validation(format!("{field} must be a number")))
}
