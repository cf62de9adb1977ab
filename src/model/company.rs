use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Padaria Central",
        "street": "Rua das Flores",
        "number": 120,
        "complement": "Loja 2",
        "district": "Centro",
        "city": "Curitiba",
        "state": "PR",
        "postal_code": "80010000"
    })
)]
pub struct Company {
    pub id: u64,
    pub name: String,
    pub street: String,
    pub number: i32,
    #[schema(nullable = true)]
    pub complement: Option<String>,
    pub district: String,
    pub city: String,
    pub state: String,
    /// Eight digits, no separator
    pub postal_code: String,
}
