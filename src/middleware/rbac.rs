// src/middleware/rbac.rs

use crate::{common::error::AppError, middleware::auth::AuthenticatedUser};

// A verificação de perfil é uma função pura, independente do roteamento:
// o chamador pertence ao conjunto exigido ou não.
pub fn authorize(role: &str, permitidos: &[&str]) -> bool {
    permitidos.contains(&role)
}

impl AuthenticatedUser {
    // Composta explicitamente no início de cada handler protegido.
    pub fn require_role(&self, permitidos: &[&str]) -> Result<(), AppError> {
        if authorize(&self.0.role, permitidos) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::User;

    fn usuario(role: &str) -> AuthenticatedUser {
        AuthenticatedUser(User {
            id: 1,
            username: "fulano".into(),
            email: None,
            password_hash: "$2b$12$hash".into(),
            role: role.into(),
        })
    }

    #[test]
    fn admin_pertence_ao_conjunto() {
        assert!(authorize("admin", &["admin", "diretor"]));
        assert!(authorize("admin", &["admin"]));
    }

    #[test]
    fn diretor_nao_passa_em_rota_de_admin() {
        assert!(!authorize("diretor", &["admin"]));
        assert!(authorize("diretor", &["admin", "diretor"]));
    }

    #[test]
    fn perfil_desconhecido_nunca_passa() {
        assert!(!authorize("estagiario", &["admin", "diretor"]));
        assert!(!authorize("", &["admin"]));
    }

    #[test]
    fn require_role_traduz_para_permission_denied() {
        assert!(usuario("diretor").require_role(&["admin", "diretor"]).is_ok());
        assert!(matches!(
            usuario("diretor").require_role(&["admin"]),
            Err(AppError::PermissionDenied)
        ));
    }
}
