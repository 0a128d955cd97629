use serde::Deserialize;
use uuid::Uuid;

// Request para marcar un vehículo como favorito
#[derive(Debug, Deserialize)]
pub struct CreateFavoriteRequest {
    #[serde(alias = "vehicle")]
    pub vehicle_id: Uuid,
}
