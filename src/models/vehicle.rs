//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle, su tarifa (rate card) y los
//! filtros de búsqueda. Mapea al schema PostgreSQL con primary key 'id'.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::{is_truthy, parse_timestamp, split_csv};

pub const DEFAULT_SEARCH_LIMIT: i64 = 50;
pub const MAX_SEARCH_LIMIT: i64 = 100;

/// Tipo de vehículo - mapea al ENUM vehicle_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "vehicle_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Sedan,
    Suv,
    Hatchback,
    Coupe,
    Convertible,
    Pickup,
    Van,
}

impl VehicleType {
    pub const ALL: [VehicleType; 7] = [
        VehicleType::Sedan,
        VehicleType::Suv,
        VehicleType::Hatchback,
        VehicleType::Coupe,
        VehicleType::Convertible,
        VehicleType::Pickup,
        VehicleType::Van,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Sedan => "sedan",
            VehicleType::Suv => "suv",
            VehicleType::Hatchback => "hatchback",
            VehicleType::Coupe => "coupe",
            VehicleType::Convertible => "convertible",
            VehicleType::Pickup => "pickup",
            VehicleType::Van => "van",
        }
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        VehicleType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| format!("unknown vehicle type '{}'", value))
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vehicle principal - mapea a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub city: String,
    pub location: String,
    pub pickup_location: String,
    pub vehicle_type: VehicleType,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub seats: i32,
    pub transmission: String,
    pub hourly_rate: Decimal,
    pub daily_rate: Decimal,
    pub weekly_rate: Decimal,
    pub delivery_fee: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Tarifas de un vehículo; se leen una sola vez al crear la reserva
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateCard {
    pub hourly_rate: Decimal,
    pub daily_rate: Decimal,
    pub weekly_rate: Decimal,
}

impl Vehicle {
    pub fn rate_card(&self) -> RateCard {
        RateCard {
            hourly_rate: self.hourly_rate,
            daily_rate: self.daily_rate,
            weekly_rate: self.weekly_rate,
        }
    }
}

/// Filtros para búsqueda de vehículos (query string)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct VehicleFilters {
    pub location: Option<String>,
    pub pickup_location: Option<String>,
    /// Lista separada por comas
    pub transmission: Option<String>,
    /// Lista separada por comas
    pub vehicle_type: Option<String>,
    pub seats: Option<i32>,
    pub seats_min: Option<i32>,
    pub seats_max: Option<i32>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub search: Option<String>,
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub available_only: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Opciones de filtrado para el frontend
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FilterStats {
    pub min_hourly_rate: Option<Decimal>,
    pub max_hourly_rate: Option<Decimal>,
    pub min_seats: Option<i32>,
    pub max_seats: Option<i32>,
}

/// Orden de resultados de búsqueda
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VehicleSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
}

impl FromStr for VehicleSort {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "" | "newest" => Ok(VehicleSort::Newest),
            "price" => Ok(VehicleSort::PriceAsc),
            "-price" => Ok(VehicleSort::PriceDesc),
            "rating" => Ok(VehicleSort::Rating),
            other => Err(AppError::BadRequest(format!(
                "Unknown sort '{}' (expected price, -price, newest or rating)",
                other
            ))),
        }
    }
}

/// Filtros ya interpretados, listos para construir la consulta
#[derive(Debug, Clone, Default)]
pub struct VehicleSearch {
    pub location: Option<String>,
    pub pickup_location: Option<String>,
    pub transmissions: Vec<String>,
    pub vehicle_types: Vec<String>,
    pub seats: Option<i32>,
    pub seats_min: Option<i32>,
    pub seats_max: Option<i32>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub search: Option<String>,
    /// Solo vehículos sin reservas activas en la ventana
    pub available_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub sort: VehicleSort,
    pub limit: i64,
    pub offset: i64,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl TryFrom<VehicleFilters> for VehicleSearch {
    type Error = AppError;

    fn try_from(filters: VehicleFilters) -> AppResult<Self> {
        let available_between = match (
            is_truthy(filters.available_only.as_deref()),
            non_blank(filters.start_at),
            non_blank(filters.end_at),
        ) {
            (true, Some(start), Some(end)) => Some((
                parse_timestamp("start_at", &start)?,
                parse_timestamp("end_at", &end)?,
            )),
            _ => None,
        };

        Ok(Self {
            location: non_blank(filters.location),
            pickup_location: non_blank(filters.pickup_location),
            transmissions: split_csv(filters.transmission.as_deref()),
            vehicle_types: split_csv(filters.vehicle_type.as_deref()),
            seats: filters.seats,
            seats_min: filters.seats_min,
            seats_max: filters.seats_max,
            price_min: filters.price_min,
            price_max: filters.price_max,
            search: non_blank(filters.search),
            available_between,
            sort: filters.sort.as_deref().unwrap_or("").parse()?,
            limit: filters
                .limit
                .unwrap_or(DEFAULT_SEARCH_LIMIT)
                .clamp(1, MAX_SEARCH_LIMIT),
            offset: filters.offset.unwrap_or(0).max(0),
        })
    }
}

/// Franja ocupada de un vehículo
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BookedSlot {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: crate::models::booking::BookingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_from_filters_defaults() {
        let search = VehicleSearch::try_from(VehicleFilters::default()).unwrap();
        assert_eq!(search.limit, DEFAULT_SEARCH_LIMIT);
        assert_eq!(search.offset, 0);
        assert_eq!(search.sort, VehicleSort::Newest);
        assert!(search.available_between.is_none());
    }

    #[test]
    fn test_search_from_filters_parses_lists_and_window() {
        let filters = VehicleFilters {
            transmission: Some("manual, automatic".to_string()),
            vehicle_type: Some("suv,".to_string()),
            start_at: Some("2024-03-01T10:00:00Z".to_string()),
            end_at: Some("2024-03-02T10:00:00Z".to_string()),
            available_only: Some("yes".to_string()),
            sort: Some("-price".to_string()),
            limit: Some(500),
            offset: Some(-3),
            location: Some("  ".to_string()),
            ..Default::default()
        };
        let search = VehicleSearch::try_from(filters).unwrap();
        assert_eq!(search.transmissions, vec!["manual", "automatic"]);
        assert_eq!(search.vehicle_types, vec!["suv"]);
        assert!(search.available_between.is_some());
        assert_eq!(search.sort, VehicleSort::PriceDesc);
        assert_eq!(search.limit, MAX_SEARCH_LIMIT);
        assert_eq!(search.offset, 0);
        assert!(search.location.is_none());
    }

    #[test]
    fn test_window_ignored_without_available_only() {
        let filters = VehicleFilters {
            start_at: Some("2024-03-01T10:00:00".to_string()),
            end_at: Some("2024-03-02T10:00:00".to_string()),
            ..Default::default()
        };
        assert!(VehicleSearch::try_from(filters).unwrap().available_between.is_none());
    }

    #[test]
    fn test_unknown_sort_is_bad_request() {
        let filters = VehicleFilters {
            sort: Some("cheapest".to_string()),
            ..Default::default()
        };
        assert!(matches!(VehicleSearch::try_from(filters), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_vehicle_type_round_trip_names() {
        for t in VehicleType::ALL {
            assert_eq!(t.as_str().parse::<VehicleType>(), Ok(t));
        }
        assert!("truck".parse::<VehicleType>().is_err());
    }
}
