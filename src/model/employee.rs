use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Maria Souza",
        "email": "maria.souza@company.com",
        "company_id": 1,
        "cpf": "12345678901"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Maria Souza")]
    pub name: String,

    #[schema(example = "maria.souza@company.com")]
    pub email: String,

    #[schema(example = 1)]
    pub company_id: u64,

    /// CPF of the user bound to this employee
    #[schema(example = "12345678901")]
    pub cpf: String,
}
