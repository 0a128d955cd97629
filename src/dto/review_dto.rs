use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

// Request para publicar una reseña
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[serde(alias = "vehicle")]
    pub vehicle_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub comment: String,
}

// Filtro opcional por vehículo
#[derive(Debug, Default, Deserialize)]
pub struct ReviewQuery {
    pub vehicle: Option<Uuid>,
}
