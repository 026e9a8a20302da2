// src/models/permission.rs

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---
// 1. Módulos do sistema
// ---
// Qualquer valor desconhecido vindo do JSONB vira `Unknown` e nunca concede nada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Dashboard,
    Orders,
    Inventory,
    Staff,
    Rates,
    Suppliers,
    Customers,
    #[serde(other)]
    Unknown,
}

impl Module {
    pub const ALL: [Module; 7] = [
        Module::Dashboard,
        Module::Orders,
        Module::Inventory,
        Module::Staff,
        Module::Rates,
        Module::Suppliers,
        Module::Customers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Dashboard => "dashboard",
            Module::Orders => "orders",
            Module::Inventory => "inventory",
            Module::Staff => "staff",
            Module::Rates => "rates",
            Module::Suppliers => "suppliers",
            Module::Customers => "customers",
            Module::Unknown => "unknown",
        }
    }
}

// ---
// 2. Ações
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    #[serde(other)]
    Unknown,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Read, Action::Create, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Unknown => "unknown",
        }
    }
}

// ---
// 3. Permissão (módulo + ações permitidas)
// ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[schema(example = "orders")]
    pub module: Module,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Permission {
    pub fn new(module: Module, actions: &[Action]) -> Self {
        Self { module, actions: actions.to_vec() }
    }
}

/// Verificação plana: existe alguma entrada com o módulo que contenha a ação?
/// Sem hierarquia e sem curinga. Listas vazias ou lixo resultam em `false`.
pub fn has_permission(permissions: &[Permission], module: Module, action: Action) -> bool {
    if module == Module::Unknown || action == Action::Unknown {
        return false;
    }
    permissions
        .iter()
        .any(|p| p.module == module && p.actions.contains(&action))
}

/// União das ações por módulo.
pub fn effective_permissions(permissions: &[Permission]) -> BTreeMap<Module, BTreeSet<Action>> {
    let mut map: BTreeMap<Module, BTreeSet<Action>> = BTreeMap::new();
    for p in permissions.iter().filter(|p| p.module != Module::Unknown) {
        let entry = map.entry(p.module).or_default();
        entry.extend(p.actions.iter().copied().filter(|a| *a != Action::Unknown));
    }
    map.retain(|_, actions| !actions.is_empty());
    map
}

/// Forma canônica: uma entrada por módulo, ações ordenadas e sem duplicatas.
pub fn normalize_permissions(permissions: &[Permission]) -> Vec<Permission> {
    effective_permissions(permissions)
        .into_iter()
        .map(|(module, actions)| Permission {
            module,
            actions: actions.into_iter().collect(),
        })
        .collect()
}

/// Concessão total do dono da empresa.
pub fn all_permissions() -> Vec<Permission> {
    Module::ALL
        .into_iter()
        .map(|m| Permission::new(m, &Action::ALL))
        .collect()
}

// ---
// 4. Cargos padrão criados junto com a empresa
// ---
pub const DEFAULT_ROLE_NAMES: [&str; 6] = [
    "Owner",
    "Manager",
    "Accountant",
    "Delivery Boy",
    "Sales",
    "Inventory Manager",
];

pub fn default_role_permissions(role_name: &str) -> Vec<Permission> {
    use Action::*;
    use Module::*;

    let crud = [Read, Create, Update, Delete];
    let grants: Vec<(Module, Vec<Action>)> = match role_name {
        "Owner" => return all_permissions(),
        "Manager" => vec![
            (Dashboard, vec![Read]),
            (Orders, crud.to_vec()),
            (Inventory, crud.to_vec()),
            (Customers, crud.to_vec()),
            (Suppliers, crud.to_vec()),
            (Rates, vec![Read, Update]),
            (Staff, vec![Read]),
        ],
        "Accountant" => vec![
            (Dashboard, vec![Read]),
            (Orders, vec![Read]),
            (Rates, vec![Read, Update]),
            (Suppliers, vec![Read]),
            (Customers, vec![Read]),
        ],
        "Delivery Boy" => vec![(Orders, vec![Read, Update]), (Customers, vec![Read])],
        "Sales" => vec![
            (Dashboard, vec![Read]),
            (Orders, vec![Read, Create, Update]),
            (Customers, vec![Read, Create, Update]),
            (Rates, vec![Read]),
        ],
        "Inventory Manager" => vec![
            (Dashboard, vec![Read]),
            (Inventory, crud.to_vec()),
            (Suppliers, vec![Read, Create, Update]),
        ],
        _ => Vec::new(),
    };

    grants
        .into_iter()
        .map(|(module, actions)| Permission { module, actions })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(module: Module, actions: &[Action]) -> Permission {
        Permission::new(module, actions)
    }

    #[test]
    fn empty_list_never_grants() {
        for m in Module::ALL {
            for a in Action::ALL {
                assert!(!has_permission(&[], m, a));
            }
        }
    }

    #[test]
    fn read_only_does_not_grant_delete() {
        let perms = vec![perm(Module::Orders, &[Action::Read])];
        assert!(has_permission(&perms, Module::Orders, Action::Read));
        assert!(!has_permission(&perms, Module::Orders, Action::Delete));
    }

    #[test]
    fn explicit_delete_is_granted() {
        let perms = vec![perm(Module::Orders, &[Action::Read, Action::Delete])];
        assert!(has_permission(&perms, Module::Orders, Action::Delete));
        assert!(!has_permission(&perms, Module::Inventory, Action::Delete));
    }

    #[test]
    fn malformed_json_deserializes_to_nothing_granted() {
        let raw = r#"[{"module":"payroll","actions":["read"]},{"module":"orders","actions":["fly"]}]"#;
        let perms: Vec<Permission> = serde_json::from_str(raw).unwrap();

        assert_eq!(perms[0].module, Module::Unknown);
        assert_eq!(perms[1].actions, vec![Action::Unknown]);
        assert!(!has_permission(&perms, Module::Unknown, Action::Read));
        assert!(!has_permission(&perms, Module::Orders, Action::Unknown));
        assert!(!has_permission(&perms, Module::Orders, Action::Read));
    }

    #[test]
    fn effective_permissions_unions_duplicate_modules() {
        let perms = vec![
            perm(Module::Orders, &[Action::Read]),
            perm(Module::Orders, &[Action::Update, Action::Read]),
            perm(Module::Staff, &[]),
        ];
        let normalized = normalize_permissions(&perms);

        assert_eq!(
            normalized,
            vec![perm(Module::Orders, &[Action::Read, Action::Update])]
        );
    }

    #[test]
    fn owner_grant_covers_everything() {
        let all = all_permissions();
        for m in Module::ALL {
            for a in Action::ALL {
                assert!(has_permission(&all, m, a));
            }
        }
    }

    #[test]
    fn every_default_role_has_a_template() {
        for name in DEFAULT_ROLE_NAMES {
            assert!(!default_role_permissions(name).is_empty(), "{name}");
        }
        assert!(default_role_permissions("Custom").is_empty());
    }
}
