// src/main.rs

use axum::{
    Router,
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, patch, post, put},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::{admin_guard, auth_guard};
use crate::middleware::rate_limit::rate_limit_guard;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // .expect() é adequado aqui: sem configuração válida a aplicação não sobe.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Migrações versionadas rodam na inicialização.
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas públicas de autenticação + /me protegida
    let auth_routes = Router::new()
        .route("/first-access", get(handlers::auth::first_access))
        .route("/setup", post(handlers::auth::setup))
        .route("/login", post(handlers::auth::login))
        .merge(
            Router::new()
                .route("/me", get(handlers::auth::get_me))
                .layer(axum_middleware::from_fn_with_state(
                    app_state.clone(),
                    auth_guard,
                )),
        );

    // Gestão de usuários: listagem/criação/papéis são de admin;
    // a edição de perfil checa "self ou admin" no handler.
    let user_routes = Router::new()
        .route("/{id}", put(handlers::users::update_user))
        .merge(
            Router::new()
                .route(
                    "/",
                    get(handlers::users::list_users).post(handlers::users::create_user),
                )
                .route("/{id}/role", patch(handlers::users::change_role))
                .route("/{id}/deactivate", patch(handlers::users::deactivate_user))
                .route("/{id}/reactivate", patch(handlers::users::reactivate_user))
                .layer(axum_middleware::from_fn(admin_guard)),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let category_routes = Router::new()
        .route(
            "/",
            get(handlers::categories::list_categories).post(handlers::categories::create_category),
        )
        .route(
            "/{id}",
            put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let equipment_routes = Router::new()
        .route(
            "/",
            get(handlers::equipment::list_equipment).post(handlers::equipment::create_equipment),
        )
        .route("/low-stock", get(handlers::equipment::list_low_stock))
        .route(
            "/{id}",
            get(handlers::equipment::get_equipment)
                .put(handlers::equipment::update_equipment)
                .delete(handlers::equipment::delete_equipment),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let transaction_routes = Router::new()
        .route("/", get(handlers::transactions::list_transactions))
        .route("/entrada", post(handlers::transactions::registrar_entrada))
        .route("/saida", post(handlers::transactions::registrar_saida))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let exit_order_routes = Router::new()
        .route(
            "/",
            get(handlers::exit_orders::list_orders).post(handlers::exit_orders::create_order),
        )
        .route("/{id}", get(handlers::exit_orders::get_order))
        .route("/{id}/cancel", post(handlers::exit_orders::cancel_order))
        .route(
            "/{id}/items/{item_id}",
            put(handlers::exit_orders::update_item_quantity)
                .delete(handlers::exit_orders::delete_item),
        )
        .route(
            "/{id}/items/{item_id}/conditional",
            patch(handlers::exit_orders::toggle_item_conditional),
        )
        .route(
            "/{id}/items/{item_id}/history",
            get(handlers::exit_orders::item_history),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let composite_routes = Router::new()
        .route(
            "/",
            get(handlers::composite_items::list_composite_items)
                .post(handlers::composite_items::create_composite_item),
        )
        .route(
            "/{id}",
            get(handlers::composite_items::get_composite_item)
                .put(handlers::composite_items::update_composite_item)
                .delete(handlers::composite_items::delete_composite_item),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let customer_routes = Router::new()
        .route(
            "/",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            "/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let service_order_routes = Router::new()
        .route(
            "/",
            get(handlers::service_orders::list_orders).post(handlers::service_orders::create_order),
        )
        .route(
            "/{id}",
            get(handlers::service_orders::get_order).put(handlers::service_orders::update_order),
        )
        .route("/{id}/status", patch(handlers::service_orders::change_status))
        .route("/{id}/items", post(handlers::service_orders::add_item))
        .route("/{id}/payments", post(handlers::service_orders::add_payment))
        .route("/{id}/history", get(handlers::service_orders::history))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let admin_routes = Router::new()
        .route("/reset-movements", post(handlers::admin::reset_movements))
        .layer(axum_middleware::from_fn(admin_guard))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // CORS: allow-list vinda do ambiente; vazia libera tudo (desenvolvimento).
    let cors_layer = if app_state.cors_allowed_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = app_state
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/categories", category_routes)
        .nest("/api/equipment", equipment_routes)
        .nest("/api/transactions", transaction_routes)
        .nest("/api/exit-orders", exit_order_routes)
        .nest("/api/composite-items", composite_routes)
        .nest("/api/customers", customer_routes)
        .nest("/api/service-orders", service_order_routes)
        .nest("/api/admin", admin_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            rate_limit_guard,
        ))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state.clone());

    // Inicia o servidor
    let addr = format!("0.0.0.0:{}", app_state.port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
