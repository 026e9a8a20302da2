// src/models/business.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{codes, error::AppError},
    models::{
        auth::{BusinessSnapshot, User},
        permission::{all_permissions, normalize_permissions, Action, Module, Permission},
    },
};

pub const OWNER_ROLE_LABEL: &str = "Business Owner";

// ---
// 1. Role (embutido na empresa)
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "role_4f1c0e2a9b7d4c3e8f6a5b4c3d2e1f00")]
    pub id: String,
    #[schema(example = "Manager")]
    pub role_name: String,
    // Token de entrada. Imutável depois de emitido.
    #[schema(example = "ACME12-MAN7X9")]
    pub role_code: String,
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub is_default: bool,
    // roleVersion: sobe a cada edição do cargo
    #[serde(default = "first_version")]
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn first_version() -> i64 {
    1
}

fn default_true() -> bool {
    true
}

// ---
// 2. Staff (embutido na empresa)
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    #[schema(example = "ACME12001")]
    pub staff_id: String,
    pub name: String,
    #[schema(example = "b@x.com")]
    pub email: String,
    #[schema(example = "9999999999")]
    pub phone: String,
    // Nome do cargo só para exibição; a chave de verdade é `role_id`
    #[schema(example = "Manager")]
    pub role: String,
    pub role_id: String,
    pub role_version: i64,
    // Cópia das permissões do cargo no momento da atribuição
    pub permissions: Vec<Permission>,
    #[schema(value_type = Option<f64>)]
    pub salary: Option<Decimal>,
    pub user_id: Option<Uuid>,
    pub joined_at: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Role {
    pub fn view(&self, with_code: bool) -> RoleView {
        RoleView {
            id: self.id.clone(),
            role_name: self.role_name.clone(),
            role_code: with_code.then(|| self.role_code.clone()),
            permissions: self.permissions.clone(),
            is_default: self.is_default,
            version: self.version,
        }
    }
}

impl Staff {
    fn matches(&self, key: &str) -> bool {
        self.id == key || self.staff_id == key
    }

    fn copy_role(&mut self, role: &Role) {
        self.role = role.role_name.clone();
        self.role_id = role.id.clone();
        self.role_version = role.version;
        self.permissions = role.permissions.clone();
    }
}

// ---
// 3. Business (a raiz do agregado)
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: Uuid,
    #[schema(example = "ACME12")]
    pub business_code: String,
    #[schema(example = "Acme")]
    pub business_name: String,
    pub owner_id: Uuid,
    pub owner_email: String,
    pub roles: Vec<Role>,
    pub staff: Vec<Staff>,
    // Controle de concorrência otimista: toda escrita exige a versão lida
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dados de um funcionário novo (vindos do dono ou do fluxo de entrada).
#[derive(Debug, Clone)]
pub struct NewStaff {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub salary: Option<Decimal>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    Refreshed,
}

#[derive(Debug, Clone, Default)]
pub struct StaffChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub salary: Option<Decimal>,
}

impl Business {
    pub fn new(business_name: &str, business_code: &str, owner_id: Uuid, owner_email: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            business_code: business_code.to_string(),
            business_name: business_name.to_string(),
            owner_id,
            owner_email: owner_email.to_lowercase(),
            roles: Vec::new(),
            staff: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owner(&self, user: &User) -> bool {
        self.owner_id == user.id
    }

    /// Falha com Forbidden antes de qualquer mutação.
    pub fn ensure_owner(&self, user: &User) -> Result<(), AppError> {
        if self.is_owner(user) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only the business owner can perform this action.".to_string(),
            ))
        }
    }

    // =========================================================================
    //  CARGOS
    // =========================================================================

    pub fn find_role(&self, role_id: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == role_id)
    }

    pub fn find_role_by_code(&self, role_code: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.role_code == role_code)
    }

    /// Resolve por id estável e, na falta, pelo nome (o frontend antigo manda o nome).
    pub fn resolve_role(&self, id_or_name: &str) -> Option<&Role> {
        self.find_role(id_or_name).or_else(|| {
            self.roles
                .iter()
                .find(|r| r.role_name.eq_ignore_ascii_case(id_or_name))
        })
    }

    pub fn has_role_code(&self, role_code: &str) -> bool {
        self.find_role_by_code(role_code).is_some()
    }

    /// Adiciona um cargo com um código já gerado. O código precisa ser inédito aqui dentro.
    pub fn add_role(
        &mut self,
        role_name: &str,
        permissions: &[Permission],
        role_code: String,
        is_default: bool,
    ) -> Result<&Role, AppError> {
        let role_name = role_name.trim();
        if role_name.is_empty() {
            return Err(AppError::InvalidInput("Role name is required.".to_string()));
        }
        if self.has_role_code(&role_code) {
            return Err(AppError::Conflict(format!("Role code '{}' already exists.", role_code)));
        }

        let now = Utc::now();
        self.roles.push(Role {
            id: codes::new_role_id(),
            role_name: role_name.to_string(),
            role_code,
            permissions: normalize_permissions(permissions),
            is_default,
            version: 1,
            created_at: now,
            updated_at: now,
        });

        Ok(&self.roles[self.roles.len() - 1])
    }

    /// Edita nome/permissões no lugar. O código não muda; os funcionários com esse
    /// cargo recebem a nova cópia no mesmo documento. Usuários só no próximo reparo.
    pub fn update_role(
        &mut self,
        role_id: &str,
        role_name: &str,
        permissions: &[Permission],
    ) -> Result<&Role, AppError> {
        let role_name = role_name.trim();
        if role_name.is_empty() {
            return Err(AppError::InvalidInput("Role name is required.".to_string()));
        }

        let idx = self
            .roles
            .iter()
            .position(|r| r.id == role_id)
            .ok_or(AppError::RoleNotFound)?;

        let role = &mut self.roles[idx];
        role.role_name = role_name.to_string();
        role.permissions = normalize_permissions(permissions);
        role.version += 1;
        role.updated_at = Utc::now();
        let role = role.clone();

        for member in self.staff.iter_mut().filter(|s| s.role_id == role.id) {
            member.copy_role(&role);
        }

        Ok(&self.roles[idx])
    }

    /// Cargos padrão nunca saem (checado primeiro); os demais só se ninguém usar.
    pub fn remove_role(&mut self, role_id: &str) -> Result<Role, AppError> {
        let idx = self
            .roles
            .iter()
            .position(|r| r.id == role_id)
            .ok_or(AppError::RoleNotFound)?;

        let role = &self.roles[idx];
        if role.is_default {
            return Err(AppError::DefaultRoleProtected(role.role_name.clone()));
        }
        if self.staff.iter().any(|s| s.role_id == role.id) {
            return Err(AppError::RoleInUse(role.role_name.clone()));
        }

        Ok(self.roles.remove(idx))
    }

    // =========================================================================
    //  FUNCIONÁRIOS
    // =========================================================================

    pub fn find_staff_by_email(&self, email: &str) -> Option<&Staff> {
        self.staff.iter().find(|s| s.email.eq_ignore_ascii_case(email))
    }

    // Maior sequência já usada + 1: matrículas removidas nunca são reaproveitadas
    fn next_staff_sequence(&self) -> usize {
        self.staff
            .iter()
            .filter_map(|s| codes::staff_sequence(&self.business_code, &s.staff_id))
            .max()
            .unwrap_or(0)
            + 1
    }

    fn validate_new_member(&self, new: &NewStaff) -> Result<(), AppError> {
        if new.name.trim().is_empty() || new.email.trim().is_empty() || new.phone.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Name, email and phone are required.".to_string(),
            ));
        }
        if new.email.eq_ignore_ascii_case(&self.owner_email) {
            return Err(AppError::InvalidInput(
                "The business owner cannot be added as staff.".to_string(),
            ));
        }
        Ok(())
    }

    /// Dono cadastra um funcionário diretamente.
    pub fn add_staff(&mut self, new: NewStaff, role_key: &str) -> Result<&Staff, AppError> {
        self.validate_new_member(&new)?;
        if self.find_staff_by_email(&new.email).is_some() {
            return Err(AppError::Conflict(format!(
                "A staff member with email '{}' already exists.",
                new.email
            )));
        }
        let role = self.resolve_role(role_key).ok_or(AppError::RoleNotFound)?.clone();

        self.push_staff(new, &role);
        Ok(&self.staff[self.staff.len() - 1])
    }

    fn push_staff(&mut self, new: NewStaff, role: &Role) {
        let staff_id = codes::format_staff_id(&self.business_code, self.next_staff_sequence());
        let mut member = Staff {
            id: codes::new_staff_entry_id(),
            staff_id,
            name: new.name.trim().to_string(),
            email: new.email.trim().to_lowercase(),
            phone: new.phone.trim().to_string(),
            role: String::new(),
            role_id: String::new(),
            role_version: 0,
            permissions: Vec::new(),
            salary: new.salary,
            user_id: new.user_id,
            joined_at: Utc::now(),
            is_active: true,
        };
        member.copy_role(role);
        self.staff.push(member);
    }

    /// Entrada via código de cargo. Se o e-mail já é funcionário, só atualiza o
    /// cargo/permissões (repetir a chamada é seguro).
    pub fn join_with_role(
        &mut self,
        role_code: &str,
        new: NewStaff,
    ) -> Result<(JoinOutcome, Staff), AppError> {
        self.validate_new_member(&new)?;
        let role = self
            .find_role_by_code(role_code)
            .ok_or(AppError::RoleCodeNotFound)?
            .clone();

        if let Some(existing) = self
            .staff
            .iter_mut()
            .find(|s| s.email.eq_ignore_ascii_case(&new.email))
        {
            existing.copy_role(&role);
            if new.user_id.is_some() {
                existing.user_id = new.user_id;
            }
            return Ok((JoinOutcome::Refreshed, existing.clone()));
        }

        self.push_staff(new, &role);
        Ok((JoinOutcome::Joined, self.staff[self.staff.len() - 1].clone()))
    }

    /// Troca o cargo e substitui as permissões por uma cópia nova do cargo alvo.
    pub fn assign_role(&mut self, staff_key: &str, role_key: &str) -> Result<&Staff, AppError> {
        let role = self.resolve_role(role_key).ok_or(AppError::RoleNotFound)?.clone();
        let member = self
            .staff
            .iter_mut()
            .find(|s| s.matches(staff_key))
            .ok_or(AppError::StaffNotFound)?;

        member.copy_role(&role);
        Ok(&*member)
    }

    pub fn update_staff_details(&mut self, staff_key: &str, changes: StaffChanges) -> Result<&Staff, AppError> {
        let member = self
            .staff
            .iter_mut()
            .find(|s| s.matches(staff_key))
            .ok_or(AppError::StaffNotFound)?;

        if let Some(name) = changes.name.filter(|n| !n.trim().is_empty()) {
            member.name = name.trim().to_string();
        }
        if let Some(phone) = changes.phone.filter(|p| !p.trim().is_empty()) {
            member.phone = phone.trim().to_string();
        }
        if changes.salary.is_some() {
            member.salary = changes.salary;
        }

        Ok(&*member)
    }

    pub fn remove_staff(&mut self, staff_key: &str) -> Result<Staff, AppError> {
        let idx = self
            .staff
            .iter()
            .position(|s| s.matches(staff_key))
            .ok_or(AppError::StaffNotFound)?;

        Ok(self.staff.remove(idx))
    }

    // =========================================================================
    //  SNAPSHOTS E VISÕES
    // =========================================================================

    pub fn owner_snapshot(&self) -> BusinessSnapshot {
        BusinessSnapshot {
            business_id: self.id,
            business_name: self.business_name.clone(),
            business_code: self.business_code.clone(),
            is_business_owner: true,
            role: OWNER_ROLE_LABEL.to_string(),
            role_id: None,
            role_version: None,
            staff_id: None,
            permissions: all_permissions(),
        }
    }

    pub fn staff_snapshot(&self, member: &Staff) -> BusinessSnapshot {
        BusinessSnapshot {
            business_id: self.id,
            business_name: self.business_name.clone(),
            business_code: self.business_code.clone(),
            is_business_owner: false,
            role: member.role.clone(),
            role_id: Some(member.role_id.clone()),
            role_version: Some(member.role_version),
            staff_id: Some(member.staff_id.clone()),
            permissions: member.permissions.clone(),
        }
    }

    /// O que o usuário deveria ter em cache agora. `None` = não pertence mais.
    pub fn expected_snapshot(&self, user: &User) -> Option<BusinessSnapshot> {
        if self.is_owner(user) {
            return Some(self.owner_snapshot());
        }
        self.find_staff_by_email(&user.email)
            .map(|member| self.staff_snapshot(member))
    }

    /// Visão da empresa para quem pede. Códigos de cargo só para o dono
    /// (são tokens de entrada); lista de funcionários só com `staff:read`.
    pub fn details_for(&self, user: &User) -> BusinessDetails {
        let owner = self.is_owner(user);
        let roles = self.roles.iter().map(|r| r.view(owner)).collect();

        BusinessDetails {
            id: self.id,
            business_code: self.business_code.clone(),
            business_name: self.business_name.clone(),
            owner_email: self.owner_email.clone(),
            roles,
            staff: (owner || user.can(Module::Staff, Action::Read))
                .then(|| self.staff.clone()),
            version: self.version,
        }
    }

    /// Confere os invariantes do agregado. Usado nos testes e no repositório em memória.
    #[cfg(test)]
    pub fn check_invariants(&self) -> Result<(), String> {
        use std::collections::HashSet;

        let mut ids = HashSet::new();
        let mut role_codes = HashSet::new();
        for r in &self.roles {
            if !ids.insert(&r.id) {
                return Err(format!("duplicate role id {}", r.id));
            }
            if !role_codes.insert(&r.role_code) {
                return Err(format!("duplicate role code {}", r.role_code));
            }
        }

        let mut emails = HashSet::new();
        for s in &self.staff {
            let email = s.email.to_lowercase();
            if email == self.owner_email.to_lowercase() {
                return Err(format!("owner {} listed as staff", email));
            }
            if !emails.insert(email) {
                return Err(format!("duplicate staff email {}", s.email));
            }
        }
        Ok(())
    }
}

// ---
// Visões / respostas
// ---
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleView {
    pub id: String,
    pub role_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_code: Option<String>,
    pub permissions: Vec<Permission>,
    pub is_default: bool,
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDetails {
    pub id: Uuid,
    pub business_code: String,
    pub business_name: String,
    pub owner_email: String,
    pub roles: Vec<RoleView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff: Option<Vec<Staff>>,
    pub version: i64,
}

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBusinessPayload {
    #[validate(length(min = 1, max = 120, message = "O nome da empresa é obrigatório."))]
    #[schema(example = "Acme")]
    pub business_name: String,
    // Opcional: código escolhido pelo dono
    #[schema(example = "ACME12")]
    pub business_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinBusinessPayload {
    #[validate(length(min = 1, message = "O código do cargo é obrigatório."))]
    #[schema(example = "ACME12-MAN7X9")]
    pub role_code: String,
    #[validate(length(min = 1, message = "O telefone é obrigatório."))]
    #[schema(example = "9999999999")]
    pub phone: String,
    // Se ausente, usamos o nome do cadastro
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRolePayload {
    pub id: Option<String>,
    #[validate(length(min = 1, message = "O nome do cargo é obrigatório."))]
    #[schema(example = "Cashier")]
    pub role_name: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddStaffPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 1, message = "O telefone é obrigatório."))]
    pub phone: String,
    #[validate(length(min = 1, message = "O cargo é obrigatório."))]
    pub role: String,
    #[schema(value_type = Option<f64>)]
    pub salary: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaffPayload {
    pub role: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub salary: Option<Decimal>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

// Respostas com o usuário e/ou a empresa atualizados
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business: Option<BusinessDetails>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub message: String,
    pub already_member: bool,
    pub staff_id: String,
    pub role: RoleView,
    pub business: BusinessDetails,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::permission::{default_role_permissions, has_permission, DEFAULT_ROLE_NAMES};

    fn owner() -> User {
        user("a@x.com")
    }

    fn user(email: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: email.split('@').next().unwrap_or_default().to_string(),
            password_hash: String::new(),
            business: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn business_with_defaults(owner: &User) -> Business {
        let mut b = Business::new("Acme", "ACME12", owner.id, &owner.email);
        for name in DEFAULT_ROLE_NAMES {
            let code = codes::generate_role_code("ACME12", name);
            b.add_role(name, &default_role_permissions(name), code, true).unwrap();
        }
        b
    }

    fn new_staff(email: &str) -> NewStaff {
        NewStaff {
            name: "B".into(),
            email: email.into(),
            phone: "9999999999".into(),
            salary: None,
            user_id: None,
        }
    }

    fn role_id(b: &Business, name: &str) -> String {
        b.resolve_role(name).unwrap().id.clone()
    }

    #[test]
    fn joining_twice_keeps_a_single_entry() {
        let o = owner();
        let mut b = business_with_defaults(&o);
        let code = b.resolve_role("Manager").unwrap().role_code.clone();

        let (first, staff) = b.join_with_role(&code, new_staff("b@x.com")).unwrap();
        let (second, again) = b.join_with_role(&code, new_staff("B@X.com")).unwrap();

        assert_eq!(first, JoinOutcome::Joined);
        assert_eq!(second, JoinOutcome::Refreshed);
        assert_eq!(staff.staff_id, "ACME12001");
        assert_eq!(again.staff_id, "ACME12001");
        assert_eq!(b.staff.len(), 1);
        b.check_invariants().unwrap();
    }

    #[test]
    fn unknown_role_code_is_rejected() {
        let o = owner();
        let mut b = business_with_defaults(&o);
        let err = b.join_with_role("NOPE-XXX000", new_staff("b@x.com")).unwrap_err();
        assert!(matches!(err, AppError::RoleCodeNotFound));
    }

    #[test]
    fn owner_cannot_become_staff() {
        let o = owner();
        let mut b = business_with_defaults(&o);
        let code = b.resolve_role("Sales").unwrap().role_code.clone();

        let err = b.join_with_role(&code, new_staff("A@x.com")).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(b.staff.is_empty());
    }

    #[test]
    fn staff_ids_are_not_reused_after_removal() {
        let o = owner();
        let mut b = business_with_defaults(&o);
        b.add_staff(new_staff("b@x.com"), "Sales").unwrap();
        b.add_staff(new_staff("c@x.com"), "Sales").unwrap();
        b.remove_staff("ACME12001").unwrap();

        let d = b.add_staff(new_staff("d@x.com"), "Sales").unwrap();
        assert_eq!(d.staff_id, "ACME12003");
    }

    #[test]
    fn duplicate_staff_email_is_a_conflict() {
        let o = owner();
        let mut b = business_with_defaults(&o);
        b.add_staff(new_staff("b@x.com"), "Sales").unwrap();
        let err = b.add_staff(new_staff("b@x.com"), "Manager").unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn default_roles_are_protected_even_when_unused() {
        let o = owner();
        let mut b = business_with_defaults(&o);
        let accountant = role_id(&b, "Accountant");

        let err = b.remove_role(&accountant).unwrap_err();
        assert!(matches!(err, AppError::DefaultRoleProtected(_)));
        assert_eq!(b.roles.len(), 6);
    }

    #[test]
    fn assigned_default_role_reports_protection_not_usage() {
        let o = owner();
        let mut b = business_with_defaults(&o);
        let manager = role_id(&b, "Manager");
        b.add_staff(new_staff("b@x.com"), &manager).unwrap();

        let err = b.remove_role(&manager).unwrap_err();
        assert!(matches!(err, AppError::DefaultRoleProtected(ref name) if name == "Manager"));
        assert_eq!(b.roles.len(), 6);
        assert_eq!(b.staff.len(), 1);
    }

    #[test]
    fn assigned_custom_role_cannot_be_deleted() {
        let o = owner();
        let mut b = business_with_defaults(&o);
        let cashier = b
            .add_role("Cashier", &default_role_permissions("Sales"), "ACME12-CASAAA".into(), false)
            .unwrap()
            .id
            .clone();
        b.add_staff(new_staff("b@x.com"), &cashier).unwrap();

        assert!(matches!(b.remove_role(&cashier).unwrap_err(), AppError::RoleInUse(_)));

        // Renomear não burla a checagem (a chave é o id)
        b.update_role(&cashier, "Front Desk", &[]).unwrap();
        assert!(matches!(b.remove_role(&cashier).unwrap_err(), AppError::RoleInUse(_)));

        b.remove_staff("ACME12001").unwrap();
        b.remove_role(&cashier).unwrap();
        assert!(b.find_role(&cashier).is_none());
    }

    #[test]
    fn role_update_keeps_code_and_resyncs_staff() {
        let o = owner();
        let mut b = business_with_defaults(&o);
        let manager = b.resolve_role("Manager").unwrap().clone();
        b.add_staff(new_staff("b@x.com"), &manager.id).unwrap();

        let perms = vec![Permission::new(Module::Orders, &[Action::Read])];
        let updated = b.update_role(&manager.id, "Store Manager", &perms).unwrap().clone();

        assert_eq!(updated.role_code, manager.role_code);
        assert_eq!(updated.version, manager.version + 1);

        let member = b.find_staff_by_email("b@x.com").unwrap();
        assert_eq!(member.role, "Store Manager");
        assert_eq!(member.role_version, updated.version);
        assert_eq!(member.permissions, perms);
    }

    #[test]
    fn reassigning_replaces_permissions_exactly() {
        let o = owner();
        let mut b = business_with_defaults(&o);
        b.add_staff(new_staff("b@x.com"), "Manager").unwrap();

        let member = b.assign_role("ACME12001", "Delivery Boy").unwrap().clone();
        let delivery = b.resolve_role("Delivery Boy").unwrap();

        assert_eq!(member.role, "Delivery Boy");
        assert_eq!(member.permissions, delivery.permissions);
        assert!(!has_permission(&member.permissions, Module::Inventory, Action::Read));
    }

    #[test]
    fn details_hide_role_codes_from_staff() {
        let o = owner();
        let mut b = business_with_defaults(&o);
        b.add_staff(new_staff("b@x.com"), "Delivery Boy").unwrap();

        let mut staff_user = user("b@x.com");
        staff_user.business = b.expected_snapshot(&staff_user);

        let owner_view = b.details_for(&o);
        let staff_view = b.details_for(&staff_user);

        assert!(owner_view.roles.iter().all(|r| r.role_code.is_some()));
        assert!(staff_view.roles.iter().all(|r| r.role_code.is_none()));
        assert!(staff_view.staff.is_none());
    }

    #[test]
    fn expected_snapshot_is_none_for_strangers() {
        let o = owner();
        let b = business_with_defaults(&o);
        assert!(b.expected_snapshot(&user("z@x.com")).is_none());
        assert!(b.expected_snapshot(&o).unwrap().is_business_owner);
    }
}
