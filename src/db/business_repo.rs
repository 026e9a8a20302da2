// src/db/business_repo.rs
//
// A empresa é um agregado único: cargos e funcionários ficam em colunas JSONB
// na mesma linha, e toda escrita é condicionada à `version` lida.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::business::{Business, Role, Staff},
};

#[async_trait]
pub trait BusinessStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Business>, AppError>;
    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Business>, AppError>;
    async fn find_by_role_code(&self, role_code: &str) -> Result<Option<Business>, AppError>;
    async fn business_code_exists(&self, business_code: &str) -> Result<bool, AppError>;
    async fn role_code_exists(&self, role_code: &str) -> Result<bool, AppError>;

    /// Insere uma empresa nova. Retorna o registro gravado (version = 1).
    async fn insert(&self, business: &Business) -> Result<Business, AppError>;

    /// Grava o documento inteiro se ninguém escreveu desde a leitura
    /// (`business.version` é a versão lida). Caso contrário, `VersionConflict`.
    async fn save(&self, business: &Business) -> Result<Business, AppError>;
}

#[derive(Debug, sqlx::FromRow)]
struct BusinessRow {
    id: Uuid,
    business_code: String,
    business_name: String,
    owner_id: Uuid,
    owner_email: String,
    roles: Json<Vec<Role>>,
    staff: Json<Vec<Staff>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BusinessRow> for Business {
    fn from(row: BusinessRow) -> Self {
        Business {
            id: row.id,
            business_code: row.business_code,
            business_name: row.business_name,
            owner_id: row.owner_id,
            owner_email: row.owner_email,
            roles: row.roles.0,
            staff: row.staff.0,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const BUSINESS_COLUMNS: &str =
    "id, business_code, business_name, owner_id, owner_email, roles, staff, version, created_at, updated_at";

#[derive(Clone)]
pub struct BusinessRepository {
    pool: PgPool,
}

impl BusinessRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, filter: &str, value: impl ToString) -> Result<Option<Business>, AppError> {
        let row = sqlx::query_as::<_, BusinessRow>(&format!(
            "SELECT {} FROM businesses WHERE {}",
            BUSINESS_COLUMNS, filter
        ))
        .bind(value.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Business::from))
    }
}

#[async_trait]
impl BusinessStore for BusinessRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Business>, AppError> {
        self.find_one("id = $1::uuid", id).await
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Business>, AppError> {
        self.find_one("owner_id = $1::uuid", owner_id).await
    }

    // Busca pelo código dentro do array JSONB (usa o índice GIN)
    async fn find_by_role_code(&self, role_code: &str) -> Result<Option<Business>, AppError> {
        self.find_one(
            "roles @> jsonb_build_array(jsonb_build_object('roleCode', $1::text))",
            role_code,
        )
        .await
    }

    async fn business_code_exists(&self, business_code: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM businesses WHERE business_code = $1)",
        )
        .bind(business_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn role_code_exists(&self, role_code: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM businesses
                WHERE roles @> jsonb_build_array(jsonb_build_object('roleCode', $1::text))
            )
            "#,
        )
        .bind(role_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert(&self, business: &Business) -> Result<Business, AppError> {
        let row = sqlx::query_as::<_, BusinessRow>(&format!(
            r#"
            INSERT INTO businesses (id, business_code, business_name, owner_id, owner_email, roles, staff, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 1)
            RETURNING {}
            "#,
            BUSINESS_COLUMNS
        ))
        .bind(business.id)
        .bind(&business.business_code)
        .bind(&business.business_name)
        .bind(business.owner_id)
        .bind(&business.owner_email)
        .bind(Json(&business.roles))
        .bind(Json(&business.staff))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return match db_err.constraint() {
                        Some("businesses_owner_id_key") => {
                            AppError::Conflict("This user already owns a business.".to_string())
                        }
                        _ => AppError::Conflict(format!(
                            "Business code '{}' is already taken.",
                            business.business_code
                        )),
                    };
                }
            }
            e.into()
        })?;

        Ok(row.into())
    }

    async fn save(&self, business: &Business) -> Result<Business, AppError> {
        let row = sqlx::query_as::<_, BusinessRow>(&format!(
            r#"
            UPDATE businesses
            SET business_name = $3,
                roles = $4,
                staff = $5,
                version = version + 1,
                updated_at = now()
            WHERE id = $1 AND version = $2
            RETURNING {}
            "#,
            BUSINESS_COLUMNS
        ))
        .bind(business.id)
        .bind(business.version)
        .bind(&business.business_name)
        .bind(Json(&business.roles))
        .bind(Json(&business.staff))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            // Nenhuma linha: ou a empresa sumiu, ou alguém escreveu antes de nós
            None => match self.find_by_id(business.id).await? {
                Some(_) => Err(AppError::VersionConflict),
                None => Err(AppError::BusinessNotFound),
            },
        }
    }
}
