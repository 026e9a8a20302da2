// src/services/business_service.rs

use std::sync::Arc;

use crate::{
    common::{
        codes::{self, MAX_CODE_ATTEMPTS},
        error::AppError,
    },
    db::{BusinessStore, UserStore},
    models::{
        auth::{BusinessSnapshot, User},
        business::{Business, JoinOutcome, NewStaff, Role, Staff},
        permission::{default_role_permissions, DEFAULT_ROLE_NAMES},
    },
    services::rbac_service::mint_role_code,
};

/// Resultado da entrada via código de cargo.
#[derive(Debug, Clone)]
pub struct JoinResult {
    pub outcome: JoinOutcome,
    pub business: Business,
    pub staff: Staff,
    pub role: Role,
    pub user: User,
}

#[derive(Clone)]
pub struct BusinessService {
    user_repo: Arc<dyn UserStore>,
    business_repo: Arc<dyn BusinessStore>,
}

/// Carrega a empresa do usuário e exige que ele seja o dono.
/// A checagem acontece antes de qualquer mutação.
pub(crate) async fn load_owned_business(
    business_repo: &dyn BusinessStore,
    user: &User,
) -> Result<Business, AppError> {
    let business = match &user.business {
        Some(snapshot) => business_repo.find_by_id(snapshot.business_id).await?,
        // Dono cuja gravação do snapshot falhou: a empresa existe, o cache não
        None => business_repo.find_by_owner(user.id).await?,
    }
    .ok_or(AppError::BusinessNotFound)?;

    business.ensure_owner(user)?;
    Ok(business)
}

/// Carrega a empresa à qual o snapshot do usuário aponta (dono ou funcionário).
pub(crate) async fn load_member_business(
    business_repo: &dyn BusinessStore,
    user: &User,
) -> Result<Business, AppError> {
    let snapshot = user.business.as_ref().ok_or(AppError::BusinessNotFound)?;
    business_repo
        .find_by_id(snapshot.business_id)
        .await?
        .ok_or(AppError::BusinessNotFound)
}

// O cache está velho? Compara identidade e versão do cargo, não campo a campo.
fn snapshot_is_stale(cached: &BusinessSnapshot, expected: &BusinessSnapshot) -> bool {
    cached.business_id != expected.business_id
        || cached.is_business_owner != expected.is_business_owner
        || cached.business_name != expected.business_name
        || cached.business_code != expected.business_code
        || cached.staff_id != expected.staff_id
        || cached.role_id != expected.role_id
        || cached.role_version != expected.role_version
}

impl BusinessService {
    pub fn new(user_repo: Arc<dyn UserStore>, business_repo: Arc<dyn BusinessStore>) -> Self {
        Self { user_repo, business_repo }
    }

    // =========================================================================
    //  CRIAÇÃO
    // =========================================================================

    async fn pick_business_code(&self, business_name: &str, requested: Option<&str>) -> Result<String, AppError> {
        if let Some(raw) = requested.filter(|r| !r.trim().is_empty()) {
            let code = codes::normalize_business_code(raw).ok_or_else(|| {
                AppError::InvalidInput(
                    "Business code must be 3 to 20 letters or digits.".to_string(),
                )
            })?;
            if self.business_repo.business_code_exists(&code).await? {
                return Err(AppError::Conflict(format!("Business code '{}' is already taken.", code)));
            }
            return Ok(code);
        }

        for attempt in 0..MAX_CODE_ATTEMPTS {
            let code = codes::generate_business_code(business_name, attempt);
            if !self.business_repo.business_code_exists(&code).await? {
                return Ok(code);
            }
            tracing::debug!(code = %code, "Código de empresa já em uso, gerando outro");
        }

        Err(AppError::Conflict(
            "Could not generate a unique business code. Please choose one.".to_string(),
        ))
    }

    /// Cria a empresa com os cargos padrão e torna o usuário dono.
    /// Ordem: empresa primeiro (ponto de durabilidade), snapshot do usuário depois.
    pub async fn create_business(
        &self,
        user: &User,
        business_name: &str,
        requested_code: Option<&str>,
    ) -> Result<(Business, User), AppError> {
        let had_snapshot = user.business.is_some();
        let (user, business) = self.repair_snapshot(user.clone()).await?;

        // Tentativa anterior gravou a empresa mas falhou no usuário: o reparo
        // já reconectou o dono, então a criação é dada como concluída
        if let (false, Some(orphan)) = (had_snapshot, business) {
            return Ok((orphan, user));
        }

        if user.business.is_some() {
            return Err(AppError::Conflict(
                "You already belong to a business. Leave it before creating a new one.".to_string(),
            ));
        }

        let business_name = business_name.trim();
        if business_name.is_empty() {
            return Err(AppError::InvalidInput("Business name is required.".to_string()));
        }

        let code = self.pick_business_code(business_name, requested_code).await?;
        let mut business = Business::new(business_name, &code, user.id, &user.email);

        for role_name in DEFAULT_ROLE_NAMES {
            let role_code = mint_role_code(self.business_repo.as_ref(), &business, role_name).await?;
            business.add_role(role_name, &default_role_permissions(role_name), role_code, true)?;
        }

        let business = self.business_repo.insert(&business).await?;
        let user = self
            .user_repo
            .set_business_snapshot(user.id, Some(&business.owner_snapshot()))
            .await?;

        tracing::info!(
            business_id = %business.id,
            business_code = %business.business_code,
            owner_id = %user.id,
            "🏪 Empresa criada"
        );

        Ok((business, user))
    }

    // =========================================================================
    //  ENTRADA VIA CÓDIGO DE CARGO
    // =========================================================================

    /// Repetir a chamada é seguro: se o e-mail já está na equipe, só atualiza.
    /// Se a gravação do usuário falhar, o erro sobe e o cliente repete.
    pub async fn join_business(
        &self,
        user: &User,
        role_code: &str,
        name: Option<&str>,
        phone: &str,
    ) -> Result<JoinResult, AppError> {
        let role_code = role_code.trim();
        let (user, _) = self.repair_snapshot(user.clone()).await?;

        let mut business = self
            .business_repo
            .find_by_role_code(role_code)
            .await?
            .ok_or(AppError::RoleCodeNotFound)?;

        if business.is_owner(&user) {
            return Err(AppError::InvalidInput(
                "You own this business and cannot join it as staff.".to_string(),
            ));
        }
        if let Some(current) = &user.business {
            if current.business_id != business.id {
                return Err(AppError::Conflict(
                    "You already belong to another business. Leave it before joining a new one.".to_string(),
                ));
            }
        }

        let display_name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&user.name)
            .to_string();

        let (outcome, staff) = business.join_with_role(
            role_code,
            NewStaff {
                name: display_name,
                email: user.email.clone(),
                phone: phone.to_string(),
                salary: None,
                user_id: Some(user.id),
            },
        )?;

        let business = self.business_repo.save(&business).await?;
        let user = self
            .user_repo
            .set_business_snapshot(user.id, Some(&business.staff_snapshot(&staff)))
            .await?;

        let role = business
            .find_role(&staff.role_id)
            .cloned()
            .ok_or(AppError::RoleNotFound)?;

        tracing::info!(
            business_id = %business.id,
            staff_id = %staff.staff_id,
            role = %role.role_name,
            refreshed = (outcome == JoinOutcome::Refreshed),
            "🤝 Entrada na empresa via código de cargo"
        );

        Ok(JoinResult { outcome, business, staff, role, user })
    }

    // =========================================================================
    //  REPARO DO SNAPSHOT
    // =========================================================================

    /// Recalcula o snapshot a partir da empresa e regrava se estiver velho.
    /// Funcionário removido (ou empresa apagada) perde o vínculo aqui; dono sem
    /// snapshot é religado à própria empresa.
    pub async fn repair_snapshot(&self, user: User) -> Result<(User, Option<Business>), AppError> {
        let Some(cached) = user.business.clone() else {
            return self.reattach_owner(user).await;
        };

        let business = self.business_repo.find_by_id(cached.business_id).await?;
        let expected = business.as_ref().and_then(|b| b.expected_snapshot(&user));

        match expected {
            Some(fresh) if !snapshot_is_stale(&cached, &fresh) => Ok((user, business)),
            Some(fresh) => {
                tracing::warn!(
                    user_id = %user.id,
                    business_id = %fresh.business_id,
                    cached_role_version = ?cached.role_version,
                    role_version = ?fresh.role_version,
                    "🔧 Snapshot de permissões desatualizado, regravando"
                );
                let user = self.user_repo.set_business_snapshot(user.id, Some(&fresh)).await?;
                Ok((user, business))
            }
            None => {
                tracing::warn!(
                    user_id = %user.id,
                    business_id = %cached.business_id,
                    "🔧 Usuário não pertence mais à empresa, limpando snapshot"
                );
                let user = self.user_repo.set_business_snapshot(user.id, None).await?;
                Ok((user, None))
            }
        }
    }

    // Sem snapshot, mas dono de uma empresa (gravação do usuário falhou na criação)
    async fn reattach_owner(&self, user: User) -> Result<(User, Option<Business>), AppError> {
        let Some(orphan) = self.business_repo.find_by_owner(user.id).await? else {
            return Ok((user, None));
        };

        tracing::warn!(
            business_id = %orphan.id,
            user_id = %user.id,
            "🔧 Dono sem snapshot, religando à própria empresa"
        );
        let user = self
            .user_repo
            .set_business_snapshot(user.id, Some(&orphan.owner_snapshot()))
            .await?;
        Ok((user, Some(orphan)))
    }

    /// GET /business/details: sempre passa pelo reparo.
    pub async fn business_details(&self, user: &User) -> Result<(User, Option<Business>), AppError> {
        self.repair_snapshot(user.clone()).await
    }

    // =========================================================================
    //  SAÍDA
    // =========================================================================

    pub async fn leave_business(&self, user: &User) -> Result<User, AppError> {
        let (user, business) = self.repair_snapshot(user.clone()).await?;

        if user.business.is_none() {
            return Err(AppError::InvalidInput("You are not part of any business.".to_string()));
        }
        if user.is_business_owner() {
            return Err(AppError::InvalidInput(
                "The business owner cannot leave their own business.".to_string(),
            ));
        }

        if let Some(mut business) = business {
            if let Some(entry_id) = business.find_staff_by_email(&user.email).map(|s| s.id.clone()) {
                business.remove_staff(&entry_id)?;
                self.business_repo.save(&business).await?;
            }
        }

        let user = self.user_repo.set_business_snapshot(user.id, None).await?;
        tracing::info!(user_id = %user.id, "👋 Usuário saiu da empresa");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory::InMemoryStore,
        models::permission::{has_permission, Action, Module},
    };

    pub(crate) struct Fixture {
        pub store: Arc<InMemoryStore>,
        pub service: BusinessService,
    }

    pub(crate) fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let service = BusinessService::new(store.clone(), store.clone());
        Fixture { store, service }
    }

    pub(crate) async fn register(store: &InMemoryStore, email: &str) -> User {
        store.create_user(email, email, "hash").await.unwrap()
    }

    async fn reload(store: &InMemoryStore, user: &User) -> User {
        UserStore::find_by_id(store, user.id).await.unwrap().unwrap()
    }

    fn role_code(business: &Business, name: &str) -> String {
        business.resolve_role(name).unwrap().role_code.clone()
    }

    #[tokio::test]
    async fn create_business_mints_default_roles_and_owner_snapshot() {
        let f = fixture();
        let owner = register(&f.store, "a@x.com").await;

        let (business, owner) = f.service.create_business(&owner, "Acme", Some("acme12")).await.unwrap();

        assert_eq!(business.business_code, "ACME12");
        assert_eq!(business.roles.len(), 6);
        assert!(business.roles.iter().all(|r| r.is_default));
        assert!(business.roles.iter().all(|r| r.role_code.starts_with("ACME12-")));
        business.check_invariants().unwrap();

        let snapshot = owner.business.unwrap();
        assert!(snapshot.is_business_owner);
        assert_eq!(snapshot.role, "Business Owner");
        assert!(has_permission(&snapshot.permissions, Module::Staff, Action::Delete));
    }

    #[tokio::test]
    async fn generated_business_code_uses_name_prefix() {
        let f = fixture();
        let owner = register(&f.store, "a@x.com").await;
        let (business, _) = f.service.create_business(&owner, "Acme", None).await.unwrap();
        assert!(business.business_code.starts_with("ACME"));
    }

    #[tokio::test]
    async fn taken_business_code_is_a_conflict() {
        let f = fixture();
        let a = register(&f.store, "a@x.com").await;
        let b = register(&f.store, "b@x.com").await;
        f.service.create_business(&a, "Acme", Some("ACME12")).await.unwrap();

        let err = f.service.create_business(&b, "Acme Two", Some("ACME12")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn affiliated_user_cannot_create_another_business() {
        let f = fixture();
        let owner = register(&f.store, "a@x.com").await;
        let (_, owner) = f.service.create_business(&owner, "Acme", None).await.unwrap();

        let err = f.service.create_business(&owner, "Second", None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(f.store.business_count(), 1);
    }

    #[tokio::test]
    async fn failed_owner_write_is_resumed_on_retry() {
        let f = fixture();
        let owner = register(&f.store, "a@x.com").await;

        f.store.fail_user_writes(true);
        assert!(f.service.create_business(&owner, "Acme", None).await.is_err());
        assert_eq!(f.store.business_count(), 1);
        assert!(reload(&f.store, &owner).await.business.is_none());

        f.store.fail_user_writes(false);
        let (business, owner) = f.service.create_business(&owner, "Acme", None).await.unwrap();
        assert_eq!(f.store.business_count(), 1);
        assert_eq!(owner.business.unwrap().business_id, business.id);
    }

    #[tokio::test]
    async fn join_twice_yields_one_staff_entry() {
        let f = fixture();
        let owner = register(&f.store, "a@x.com").await;
        let staff = register(&f.store, "b@x.com").await;
        let (business, _) = f.service.create_business(&owner, "Acme", Some("ACME12")).await.unwrap();
        let code = role_code(&business, "Manager");

        let first = f.service.join_business(&staff, &code, None, "9999999999").await.unwrap();
        let second = f.service.join_business(&first.user, &code, None, "9999999999").await.unwrap();

        assert_eq!(first.outcome, JoinOutcome::Joined);
        assert_eq!(second.outcome, JoinOutcome::Refreshed);
        assert_eq!(second.business.staff.len(), 1);
        assert_eq!(first.staff.staff_id, "ACME12001");
        assert_eq!(first.staff.role, "Manager");

        let snapshot = second.user.business.unwrap();
        assert!(!snapshot.is_business_owner);
        assert_eq!(snapshot.role, "Manager");
        assert_eq!(snapshot.staff_id.as_deref(), Some("ACME12001"));
    }

    #[tokio::test]
    async fn join_retry_after_user_write_failure_is_safe() {
        let f = fixture();
        let owner = register(&f.store, "a@x.com").await;
        let staff = register(&f.store, "b@x.com").await;
        let (business, _) = f.service.create_business(&owner, "Acme", None).await.unwrap();
        let code = role_code(&business, "Sales");

        f.store.fail_user_writes(true);
        assert!(f.service.join_business(&staff, &code, None, "9999999999").await.is_err());
        f.store.fail_user_writes(false);

        let retry = f.service.join_business(&staff, &code, None, "9999999999").await.unwrap();
        assert_eq!(retry.outcome, JoinOutcome::Refreshed);
        assert_eq!(retry.business.staff.len(), 1);
        assert_eq!(retry.user.business.unwrap().role, "Sales");
    }

    #[tokio::test]
    async fn unknown_role_code_fails() {
        let f = fixture();
        let staff = register(&f.store, "b@x.com").await;
        let err = f.service.join_business(&staff, "NOPE-ABC123", None, "1").await.unwrap_err();
        assert!(matches!(err, AppError::RoleCodeNotFound));
    }

    #[tokio::test]
    async fn member_of_another_business_must_leave_first() {
        let f = fixture();
        let a = register(&f.store, "a@x.com").await;
        let c = register(&f.store, "c@x.com").await;
        let staff = register(&f.store, "b@x.com").await;
        let (acme, _) = f.service.create_business(&a, "Acme", None).await.unwrap();
        let (globex, _) = f.service.create_business(&c, "Globex", None).await.unwrap();

        let joined = f
            .service
            .join_business(&staff, &role_code(&acme, "Sales"), None, "1")
            .await
            .unwrap();
        let err = f
            .service
            .join_business(&joined.user, &role_code(&globex, "Sales"), None, "1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let left = f.service.leave_business(&joined.user).await.unwrap();
        assert!(left.business.is_none());
        let moved = f
            .service
            .join_business(&left, &role_code(&globex, "Sales"), None, "1")
            .await
            .unwrap();
        assert_eq!(moved.business.id, globex.id);

        let acme_now = BusinessStore::find_by_id(f.store.as_ref(), acme.id).await.unwrap().unwrap();
        assert!(acme_now.staff.is_empty());
    }

    #[tokio::test]
    async fn owner_cannot_leave() {
        let f = fixture();
        let owner = register(&f.store, "a@x.com").await;
        let (_, owner) = f.service.create_business(&owner, "Acme", None).await.unwrap();
        assert!(matches!(
            f.service.leave_business(&owner).await.unwrap_err(),
            AppError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn details_clear_snapshot_when_staff_entry_is_gone() {
        let f = fixture();
        let owner = register(&f.store, "a@x.com").await;
        let staff = register(&f.store, "b@x.com").await;
        let (business, _) = f.service.create_business(&owner, "Acme", None).await.unwrap();
        let joined = f
            .service
            .join_business(&staff, &role_code(&business, "Sales"), None, "1")
            .await
            .unwrap();

        // Remoção direta no documento, sem passar pelo serviço (sem push)
        let mut doc = joined.business.clone();
        doc.remove_staff(&joined.staff.id).unwrap();
        f.store.save(&doc).await.unwrap();

        let (user, business) = f.service.business_details(&joined.user).await.unwrap();
        assert!(user.business.is_none());
        assert!(business.is_none());
        assert!(reload(&f.store, &user).await.business.is_none());
    }

    #[tokio::test]
    async fn full_two_digit_code_space_still_creates_a_business() {
        let f = fixture();
        for n in 10..100 {
            let filler = Business::new("Acme", &format!("ACME{}", n), uuid::Uuid::new_v4(), &format!("o{}@x.com", n));
            f.store.insert(&filler).await.unwrap();
        }
        let owner = register(&f.store, "a@x.com").await;

        let (business, _) = f.service.create_business(&owner, "Acme Foods", None).await.unwrap();

        assert!(business.business_code.starts_with("ACME"));
        assert!(business.business_code.len() > 6);
        assert_eq!(f.store.business_count(), 91);
    }

    #[tokio::test]
    async fn exhausted_business_codes_are_a_conflict() {
        let f = fixture();
        let owner = register(&f.store, "a@x.com").await;
        f.store.take_all_codes(true);

        let err = f.service.create_business(&owner, "Acme", None).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(f.store.business_count(), 0);
        assert!(reload(&f.store, &owner).await.business.is_none());
    }

    #[tokio::test]
    async fn owner_without_snapshot_cannot_join_another_business() {
        let f = fixture();
        let a = register(&f.store, "a@x.com").await;
        let x = register(&f.store, "x@x.com").await;
        let (acme, _) = f.service.create_business(&a, "Acme", None).await.unwrap();

        f.store.fail_user_writes(true);
        assert!(f.service.create_business(&x, "Xyz", None).await.is_err());
        f.store.fail_user_writes(false);
        assert!(reload(&f.store, &x).await.business.is_none());

        let err = f
            .service
            .join_business(&x, &role_code(&acme, "Sales"), None, "1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let acme_now = BusinessStore::find_by_id(f.store.as_ref(), acme.id).await.unwrap().unwrap();
        assert!(acme_now.staff.is_empty());
        let x_now = reload(&f.store, &x).await;
        assert!(x_now.is_business_owner());
        assert_ne!(x_now.business.unwrap().business_id, acme.id);
    }

    #[tokio::test]
    async fn details_reattach_owner_without_snapshot() {
        let f = fixture();
        let owner = register(&f.store, "a@x.com").await;

        f.store.fail_user_writes(true);
        assert!(f.service.create_business(&owner, "Acme", None).await.is_err());
        f.store.fail_user_writes(false);

        let (user, business) = f.service.business_details(&owner).await.unwrap();
        let business = business.unwrap();
        assert!(user.is_business_owner());
        assert!(user.can(Module::Staff, Action::Read));
        assert_eq!(user.business.unwrap().business_id, business.id);
        assert!(reload(&f.store, &owner).await.is_business_owner());
    }
}
