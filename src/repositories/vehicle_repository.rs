use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest};
use crate::models::vehicle::{BookedSlot, FilterStats, Vehicle, VehicleSearch, VehicleSort};
use crate::utils::errors::{forbidden_error, not_found_error, AppError};

const VEHICLE_COLUMNS: &str = "v.id, v.owner_id, v.title, v.description, v.city, v.location, \
     v.pickup_location, v.vehicle_type, v.make, v.model, v.year, v.seats, v.transmission, \
     v.hourly_rate, v.daily_rate, v.weekly_rate, v.delivery_fee, v.is_active, v.created_at";

const LIKE_ESCAPE: &str = " ESCAPE '\\'";

/// Patrón ILIKE de subcadena con los comodines del término escapados
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Construye la consulta de búsqueda con parámetros enlazados
pub fn build_search_query(search: &VehicleSearch) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(VEHICLE_COLUMNS);
    qb.push(" FROM vehicles v WHERE v.is_active = TRUE");

    if let Some(location) = &search.location {
        qb.push(" AND v.location ILIKE ")
            .push_bind(like_pattern(location))
            .push(LIKE_ESCAPE);
    }
    if let Some(pickup) = &search.pickup_location {
        qb.push(" AND v.pickup_location ILIKE ")
            .push_bind(like_pattern(pickup))
            .push(LIKE_ESCAPE);
    }
    if !search.transmissions.is_empty() {
        qb.push(" AND v.transmission = ANY(").push_bind(search.transmissions.clone()).push(")");
    }
    if !search.vehicle_types.is_empty() {
        qb.push(" AND v.vehicle_type::text = ANY(")
            .push_bind(search.vehicle_types.clone())
            .push(")");
    }
    if let Some(seats) = search.seats {
        qb.push(" AND v.seats = ").push_bind(seats);
    }
    if let Some(seats_min) = search.seats_min {
        qb.push(" AND v.seats >= ").push_bind(seats_min);
    }
    if let Some(seats_max) = search.seats_max {
        qb.push(" AND v.seats <= ").push_bind(seats_max);
    }
    if let Some(price_min) = search.price_min {
        qb.push(" AND v.hourly_rate >= ").push_bind(price_min);
    }
    if let Some(price_max) = search.price_max {
        qb.push(" AND v.hourly_rate <= ").push_bind(price_max);
    }
    if let Some(term) = &search.search {
        let pattern = like_pattern(term);
        qb.push(" AND (v.title ILIKE ")
            .push_bind(pattern.clone())
            .push(LIKE_ESCAPE)
            .push(" OR v.make ILIKE ")
            .push_bind(pattern.clone())
            .push(LIKE_ESCAPE)
            .push(" OR v.model ILIKE ")
            .push_bind(pattern)
            .push(LIKE_ESCAPE)
            .push(")");
    }
    if let Some((start_at, end_at)) = search.available_between {
        qb.push(
            " AND NOT EXISTS (SELECT 1 FROM bookings b WHERE b.vehicle_id = v.id \
             AND b.status IN ('pending', 'confirmed') AND b.start_at < ",
        )
        .push_bind(end_at)
        .push(" AND b.end_at > ")
        .push_bind(start_at)
        .push(")");
    }

    qb.push(match search.sort {
        VehicleSort::Newest => " ORDER BY v.created_at DESC",
        VehicleSort::PriceAsc => " ORDER BY v.hourly_rate ASC, v.created_at DESC",
        VehicleSort::PriceDesc => " ORDER BY v.hourly_rate DESC, v.created_at DESC",
        VehicleSort::Rating => {
            " ORDER BY (SELECT AVG(r.rating) FROM reviews r WHERE r.vehicle_id = v.id) DESC NULLS LAST, \
             v.created_at DESC"
        }
    });

    qb.push(" LIMIT ").push_bind(search.limit);
    qb.push(" OFFSET ").push_bind(search.offset);
    qb
}

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner_id: Uuid, request: CreateVehicleRequest) -> Result<Vehicle, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (
                id, owner_id, title, description, city, location, pickup_location, vehicle_type,
                make, model, year, seats, transmission, hourly_rate, daily_rate, weekly_rate,
                delivery_fee, is_active, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(request.title.trim().to_string())
        .bind(request.description)
        .bind(request.city)
        .bind(request.location)
        .bind(request.pickup_location)
        .bind(request.vehicle_type)
        .bind(request.make)
        .bind(request.model)
        .bind(request.year)
        .bind(request.seats)
        .bind(request.transmission)
        .bind(request.hourly_rate)
        .bind(request.daily_rate)
        .bind(request.weekly_rate)
        .bind(request.delivery_fee.unwrap_or(Decimal::ZERO))
        .bind(request.is_active.unwrap_or(true))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    /// Vehículo visible públicamente (activo)
    pub async fn find_active(&self, id: Uuid) -> Result<Vehicle, AppError> {
        self.find_by_id(id)
            .await?
            .filter(|v| v.is_active)
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))
    }

    /// Vehículo del propietario; si pertenece a otro se devuelve `Forbidden`
    async fn find_owned(&self, id: Uuid, owner_id: Uuid) -> Result<Vehicle, AppError> {
        let vehicle = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))?;

        if vehicle.owner_id != owner_id {
            return Err(forbidden_error("modify vehicle", "vehicle belongs to another owner"));
        }
        Ok(vehicle)
    }

    pub async fn search(&self, search: &VehicleSearch) -> Result<Vec<Vehicle>, AppError> {
        let vehicles = build_search_query(search)
            .build_query_as::<Vehicle>()
            .fetch_all(&self.pool)
            .await?;

        Ok(vehicles)
    }

    pub async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<Vehicle, AppError> {
        let current = self.find_owned(id, owner_id).await?;

        let vehicle = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles SET
                title = $2, description = $3, city = $4, location = $5, pickup_location = $6,
                vehicle_type = $7, make = $8, model = $9, year = $10, seats = $11,
                transmission = $12, hourly_rate = $13, daily_rate = $14, weekly_rate = $15,
                delivery_fee = $16, is_active = $17
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.title.map(|t| t.trim().to_string()).unwrap_or(current.title))
        .bind(request.description.unwrap_or(current.description))
        .bind(request.city.unwrap_or(current.city))
        .bind(request.location.unwrap_or(current.location))
        .bind(request.pickup_location.unwrap_or(current.pickup_location))
        .bind(request.vehicle_type.unwrap_or(current.vehicle_type))
        .bind(request.make.unwrap_or(current.make))
        .bind(request.model.unwrap_or(current.model))
        .bind(request.year.or(current.year))
        .bind(request.seats.unwrap_or(current.seats))
        .bind(request.transmission.unwrap_or(current.transmission))
        .bind(request.hourly_rate.unwrap_or(current.hourly_rate))
        .bind(request.daily_rate.unwrap_or(current.daily_rate))
        .bind(request.weekly_rate.unwrap_or(current.weekly_rate))
        .bind(request.delivery_fee.unwrap_or(current.delivery_fee))
        .bind(request.is_active.unwrap_or(current.is_active))
        .fetch_one(&self.pool)
        .await?;

        Ok(vehicle)
    }

    pub async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<(), AppError> {
        self.find_owned(id, owner_id).await?;

        sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn filter_stats(&self) -> Result<FilterStats, AppError> {
        let stats = sqlx::query_as::<_, FilterStats>(
            r#"
            SELECT
                MIN(hourly_rate) AS min_hourly_rate,
                MAX(hourly_rate) AS max_hourly_rate,
                MIN(seats) AS min_seats,
                MAX(seats) AS max_seats
            FROM vehicles
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    pub async fn transmissions(&self) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT transmission FROM vehicles WHERE transmission <> '' ORDER BY transmission",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(t,)| t).collect())
    }

    /// Reservas activas del vehículo que se solapan con la ventana
    pub async fn booked_slots(
        &self,
        vehicle_id: Uuid,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Result<Vec<BookedSlot>, AppError> {
        let slots = sqlx::query_as::<_, BookedSlot>(
            r#"
            SELECT start_at, end_at, status
            FROM bookings
            WHERE vehicle_id = $1
              AND status IN ('pending', 'confirmed')
              AND start_at < $3
              AND end_at > $2
            ORDER BY start_at
            "#,
        )
        .bind(vehicle_id)
        .bind(start_at)
        .bind(end_at)
        .fetch_all(&self.pool)
        .await?;

        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn search() -> VehicleSearch {
        VehicleSearch {
            limit: 50,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_query_only_active_and_newest() {
        let s = search();
        let qb = build_search_query(&s);
        let sql = qb.sql();
        assert!(sql.contains("WHERE v.is_active = TRUE"));
        assert!(sql.contains("ORDER BY v.created_at DESC"));
        assert!(sql.ends_with("LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn test_filters_are_bound_in_order() {
        let s = VehicleSearch {
            location: Some("pune".to_string()),
            transmissions: vec!["manual".to_string()],
            vehicle_types: vec!["suv".to_string(), "van".to_string()],
            seats_min: Some(4),
            price_max: Some(dec!(250)),
            sort: VehicleSort::PriceAsc,
            ..search()
        };
        let qb = build_search_query(&s);
        let sql = qb.sql();

        assert!(sql.contains("v.location ILIKE $1 ESCAPE '\\'"));
        assert!(sql.contains("v.transmission = ANY($2)"));
        assert!(sql.contains("v.vehicle_type::text = ANY($3)"));
        assert!(sql.contains("v.seats >= $4"));
        assert!(sql.contains("v.hourly_rate <= $5"));
        assert!(sql.contains("ORDER BY v.hourly_rate ASC"));
        assert!(sql.ends_with("LIMIT $6 OFFSET $7"));
    }

    #[test]
    fn test_search_term_matches_title_make_model() {
        let s = VehicleSearch {
            search: Some("swift".to_string()),
            ..search()
        };
        let qb = build_search_query(&s);
        assert!(qb.sql().contains(
            "(v.title ILIKE $1 ESCAPE '\\' OR v.make ILIKE $2 ESCAPE '\\' \
             OR v.model ILIKE $3 ESCAPE '\\')"
        ));
    }

    // ==================== like_pattern tests ====================

    #[test]
    fn test_like_pattern_wraps_plain_term() {
        assert_eq!(like_pattern("pune"), "%pune%");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        // Un "%" literal no debe coincidir con todo
        assert_eq!(like_pattern("%"), "%\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\x"), "%c:\\\\x%");
    }

    #[test]
    fn test_availability_excludes_active_overlaps() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let s = VehicleSearch {
            available_between: Some((start, start + chrono::Duration::hours(4))),
            sort: VehicleSort::Rating,
            ..search()
        };
        let qb = build_search_query(&s);
        let sql = qb.sql();

        assert!(sql.contains("NOT EXISTS"));
        assert!(sql.contains("b.status IN ('pending', 'confirmed')"));
        assert!(sql.contains("b.start_at < $1 AND b.end_at > $2"));
        assert!(sql.contains("AVG(r.rating)"));
    }
}
