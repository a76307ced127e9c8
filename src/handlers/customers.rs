// src/handlers/customers.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::customer_repo::CustomerData,
    models::customer::Customer,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[validate(length(min = 1, message = "A razão social é obrigatória."))]
    #[schema(example = "Estúdio Luz e Forma Ltda")]
    pub razao_social: String,

    #[schema(example = "Estúdio Luz e Forma")]
    pub nome_fantasia: Option<String>,

    // Aceita com ou sem máscara; a normalização reduz a dígitos.
    #[schema(example = "12.345.678/0001-90")]
    pub cnpj: Option<String>,

    pub inscricao_estadual: Option<String>,
    pub endereco: Option<String>,
    pub numero: Option<String>,
    pub complemento: Option<String>,
    pub bairro: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub cep: Option<String>,
    pub telefone: Option<String>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    pub contato: Option<String>,
    pub observacoes: Option<String>,
}

impl CustomerPayload {
    fn as_data(&self) -> CustomerData<'_> {
        CustomerData {
            razao_social: &self.razao_social,
            nome_fantasia: self.nome_fantasia.as_deref(),
            cnpj: None, // preenchido pelo service após normalização
            inscricao_estadual: self.inscricao_estadual.as_deref(),
            endereco: self.endereco.as_deref(),
            numero: self.numero.as_deref(),
            complemento: self.complemento.as_deref(),
            bairro: self.bairro.as_deref(),
            cidade: self.cidade.as_deref(),
            estado: self.estado.as_deref(),
            cep: self.cep.as_deref(),
            telefone: self.telefone.as_deref(),
            email: self.email.as_deref(),
            contato: self.contato.as_deref(),
            observacoes: self.observacoes.as_deref(),
        }
    }
}

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Clientes",
    responses((status = 200, description = "Clientes ativos", body = Vec<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let customers = app_state.customer_service.list().await?;
    Ok(Json(customers))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Clientes",
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state.customer_service.get(id).await?;
    Ok(Json(customer))
}

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Clientes",
    request_body = CustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 409, description = "CNPJ já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let customer = app_state
        .customer_service
        .create(&payload.as_data(), payload.cnpj.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// PUT /api/customers/{id}
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Clientes",
    request_body = CustomerPayload,
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 409, description = "CNPJ já cadastrado em outro cliente")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let customer = app_state
        .customer_service
        .update(id, &payload.as_data(), payload.cnpj.as_deref())
        .await?;

    Ok(Json(customer))
}

// DELETE /api/customers/{id} (exclusão lógica)
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Clientes",
    responses(
        (status = 204, description = "Cliente desativado"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.customer_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
