// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;

// A documentação cobre as superfícies estáveis da API (auth, cadastros).
// Ordens de saída e OS ainda estão fora do contrato público.
#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::first_access,
        handlers::auth::setup,
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Categorias ---
        handlers::categories::list_categories,
        handlers::categories::create_category,
        handlers::categories::update_category,
        handlers::categories::delete_category,

        // --- Equipamentos ---
        handlers::equipment::list_equipment,
        handlers::equipment::list_low_stock,
        handlers::equipment::get_equipment,
        handlers::equipment::create_equipment,
        handlers::equipment::update_equipment,
        handlers::equipment::delete_equipment,

        // --- Clientes ---
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::create_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::SetupPayload,
            models::auth::LoginPayload,
            models::auth::AuthResponse,

            // --- Categorias ---
            models::category::Category,
            handlers::categories::CategoryPayload,

            // --- Equipamentos ---
            models::equipment::Equipment,
            models::equipment::EquipmentWithCategory,
            handlers::equipment::CreateEquipmentPayload,
            handlers::equipment::UpdateEquipmentPayload,

            // --- Clientes ---
            models::customer::Customer,
            handlers::customers::CustomerPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e primeiro acesso"),
        (name = "Categorias", description = "Categorias de equipamento"),
        (name = "Equipamentos", description = "Catálogo e estoque de equipamentos"),
        (name = "Clientes", description = "Cadastro de clientes")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
