// src/config.rs

use std::{env, time::Duration};

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{
        CategoryRepository, CompositeRepository, CustomerRepository, EquipmentRepository,
        ExitOrderRepository, ServiceOrderRepository, TransactionRepository, UserRepository,
    },
    middleware::rate_limit::RateLimiter,
    services::{
        AuthService, CompositeService, CustomerService, EquipmentService, ExitOrderService,
        ServiceOrderService, UserService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub rate_limiter: RateLimiter,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub equipment_service: EquipmentService,
    pub exit_order_service: ExitOrderService,
    pub composite_service: CompositeService,
    pub customer_service: CustomerService,
    pub service_order_service: ServiceOrderService,
}

impl AppState {
    // Toda a configuração de ambiente é lida uma única vez, aqui.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        // Lista separada por vírgula; vazia libera CORS para qualquer origem.
        let cors_allowed_origins: Vec<String> = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let rate_limit_max: u32 = env::var("RATE_LIMIT_MAX_REQUESTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);
        let rate_limit_window: u64 = env::var("RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let category_repo = CategoryRepository::new(db_pool.clone());
        let equipment_repo = EquipmentRepository::new(db_pool.clone());
        let transaction_repo = TransactionRepository::new(db_pool.clone());
        let exit_order_repo = ExitOrderRepository::new(db_pool.clone());
        let composite_repo = CompositeRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let service_order_repo = ServiceOrderRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            transaction_repo.clone(),
            jwt_secret,
            db_pool.clone(),
        );
        let user_service = UserService::new(
            user_repo.clone(),
            transaction_repo.clone(),
            db_pool.clone(),
        );
        let equipment_service = EquipmentService::new(
            equipment_repo.clone(),
            category_repo.clone(),
            transaction_repo.clone(),
        );
        let exit_order_service = ExitOrderService::new(
            exit_order_repo,
            equipment_service.clone(),
            db_pool.clone(),
        );
        let composite_service = CompositeService::new(
            composite_repo,
            equipment_repo.clone(),
            db_pool.clone(),
        );
        let customer_service = CustomerService::new(customer_repo, db_pool.clone());
        let service_order_service = ServiceOrderService::new(
            service_order_repo,
            equipment_service.clone(),
            db_pool.clone(),
        );

        let rate_limiter = RateLimiter::new(rate_limit_max, Duration::from_secs(rate_limit_window));

        Ok(Self {
            db_pool,
            port,
            cors_allowed_origins,
            rate_limiter,
            auth_service,
            user_service,
            equipment_service,
            exit_order_service,
            composite_service,
            customer_service,
            service_order_service,
        })
    }
}
