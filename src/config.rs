// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    db::{BusinessRepository, BusinessStore, UserRepository, UserStore},
    services::{
        auth::AuthService, business_service::BusinessService, rbac_service::RbacService,
        staff_service::StaffService,
    },
};

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub jwt_expiration_days: i64,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_expiration_days: parse_var("JWT_EXPIRATION_DAYS", 7)?,
            bcrypt_cost: parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} tem um valor inválido: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub business_service: BusinessService,
    pub rbac_service: RbacService,
    pub staff_service: StaffService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // Faz o app rodar as migrações do SQLx na inicialização
        sqlx::migrate!()
            .run(&db_pool)
            .await
            .context("Falha ao rodar as migrações do banco de dados")?;

        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

        let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(db_pool.clone()));
        let businesses: Arc<dyn BusinessStore> = Arc::new(BusinessRepository::new(db_pool));

        Ok(Self::from_stores(&config, users, businesses))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_stores(
        config: &Config,
        users: Arc<dyn UserStore>,
        businesses: Arc<dyn BusinessStore>,
    ) -> Self {
        let auth_service = AuthService::new(
            users.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiration_days,
            config.bcrypt_cost,
        );
        let business_service = BusinessService::new(users.clone(), businesses.clone());
        let rbac_service = RbacService::new(businesses.clone());
        let staff_service = StaffService::new(users, businesses);

        Self {
            auth_service,
            business_service,
            rbac_service,
            staff_service,
        }
    }
}
