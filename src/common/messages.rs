// src/common/messages.rs

use crate::middleware::i18n::Locale;

// Mensagens de sucesso devolvidas no campo "message" das respostas
#[derive(Debug, Clone, Copy)]
pub enum Notice<'a> {
    BusinessCreated { business: &'a str },
    Joined { business: &'a str, role: &'a str },
    AlreadyMember,
    LeftBusiness,
    DetailsLoaded,
    NoBusiness,
    RoleSaved { role: &'a str },
    RoleDeleted,
    StaffAdded { staff_id: &'a str },
    StaffUpdated { staff_id: &'a str },
    StaffRemoved { staff_id: &'a str },
}

impl Notice<'_> {
    pub fn text(&self, locale: &Locale) -> String {
        let pt = locale.0 == "pt";

        match (self, pt) {
            (Notice::BusinessCreated { business }, false) => format!("Business '{}' created.", business),
            (Notice::BusinessCreated { business }, true) => format!("Empresa '{}' criada.", business),
            (Notice::Joined { business, role }, false) => format!("Joined '{}' as {}.", business, role),
            (Notice::Joined { business, role }, true) => format!("Você entrou em '{}' como {}.", business, role),
            (Notice::AlreadyMember, false) => {
                "You are already part of this business — permissions refreshed.".to_string()
            }
            (Notice::AlreadyMember, true) => {
                "Você já faz parte desta empresa — permissões atualizadas.".to_string()
            }
            (Notice::LeftBusiness, false) => "You left the business.".to_string(),
            (Notice::LeftBusiness, true) => "Você saiu da empresa.".to_string(),
            (Notice::DetailsLoaded, false) => "Business details loaded.".to_string(),
            (Notice::DetailsLoaded, true) => "Detalhes da empresa carregados.".to_string(),
            (Notice::NoBusiness, false) => "You are not part of any business.".to_string(),
            (Notice::NoBusiness, true) => "Você não faz parte de nenhuma empresa.".to_string(),
            (Notice::RoleSaved { role }, false) => format!("Role '{}' saved.", role),
            (Notice::RoleSaved { role }, true) => format!("Cargo '{}' salvo.", role),
            (Notice::RoleDeleted, false) => "Role deleted.".to_string(),
            (Notice::RoleDeleted, true) => "Cargo removido.".to_string(),
            (Notice::StaffAdded { staff_id }, false) => format!("Staff member {} added.", staff_id),
            (Notice::StaffAdded { staff_id }, true) => format!("Funcionário {} cadastrado.", staff_id),
            (Notice::StaffUpdated { staff_id }, false) => format!("Staff member {} updated.", staff_id),
            (Notice::StaffUpdated { staff_id }, true) => format!("Funcionário {} atualizado.", staff_id),
            (Notice::StaffRemoved { staff_id }, false) => format!("Staff member {} removed.", staff_id),
            (Notice::StaffRemoved { staff_id }, true) => format!("Funcionário {} removido.", staff_id),
        }
    }
}
