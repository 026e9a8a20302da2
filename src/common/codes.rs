// src/common/codes.rs
//
// Geração dos tokens legíveis: código da empresa, código de cargo e matrícula.

use rand::Rng;
use uuid::Uuid;

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

// Quantas vezes tentamos gerar um código livre antes de devolver Conflict
pub const MAX_CODE_ATTEMPTS: usize = 5;

fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}

/// "Acme Traders" -> "ACME" + 2 dígitos aleatórios (ex: "ACME12").
/// Nomes curtos são completados com 'X'. A partir da segunda tentativa o sufixo
/// vira base36 e cresce um caractere por tentativa ("ACME7QK", "ACME0Z3F", ...).
pub fn generate_business_code(business_name: &str, attempt: usize) -> String {
    let mut prefix: String = business_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(4)
        .collect::<String>()
        .to_ascii_uppercase();

    while prefix.len() < 4 {
        prefix.push('X');
    }

    let suffix = match attempt {
        0 => rand::rng().random_range(10..100u8).to_string(),
        n => random_base36(2 + n),
    };
    format!("{}{}", prefix, suffix)
}

/// `{businessCode}-{3 primeiras letras do cargo}{3 caracteres base36}`.
/// Ex: ("ACME12", "Manager") -> "ACME12-MAN7X9".
pub fn generate_role_code(business_code: &str, role_name: &str) -> String {
    let prefix: String = role_name
        .chars()
        .filter(|c| c.is_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase();

    format!("{}-{}{}", business_code, prefix, random_base36(3))
}

/// Códigos escolhidos pelo dono: 3 a 20 caracteres A-Z/0-9 (normalizado em maiúsculas).
pub fn normalize_business_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    let valid = (3..=20).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(code)
}

/// Matrícula: código da empresa + sequência com 3 dígitos (ex: "ACME12001").
pub fn format_staff_id(business_code: &str, sequence: usize) -> String {
    format!("{}{:03}", business_code, sequence)
}

/// Extrai a sequência de uma matrícula desta empresa, se for uma.
pub fn staff_sequence(business_code: &str, staff_id: &str) -> Option<usize> {
    staff_id.strip_prefix(business_code)?.parse().ok()
}

pub fn new_role_id() -> String {
    format!("role_{}", Uuid::new_v4().simple())
}

pub fn new_staff_entry_id() -> String {
    format!("staff_{}", Uuid::new_v4().simple())
}
