// src/services/user_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{AuditRepository, UserRepository},
    models::{
        audit::AuditAction,
        user::{DiretorResumo, RegisterUserPayload, UpdateUserPayload, User},
    },
    services::auth,
};

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    audit_repo: AuditRepository,
    pool: PgPool,
}

impl UserService {
    pub fn new(user_repo: UserRepository, audit_repo: AuditRepository, pool: PgPool) -> Self {
        Self { user_repo, audit_repo, pool }
    }

    // Registro de um novo usuário (ação restrita a admin no handler).
    pub async fn register_user(
        &self,
        actor: &User,
        payload: RegisterUserPayload,
    ) -> Result<User, AppError> {
        let password_hash = auth::hash_password(payload.password).await?;

        let mut tx = self.pool.begin().await?;
        let user = self
            .user_repo
            .create(
                &mut *tx,
                &payload.username,
                payload.email.as_deref(),
                &password_hash,
                &payload.role,
            )
            .await?;
        tx.commit().await?;

        self.audit_repo
            .append(
                &self.pool,
                actor,
                AuditAction::Create,
                &user.id.to_string(),
                "users",
                &format!("Usuário '{}' criado.", user.username),
            )
            .await?;

        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list_all().await
    }

    pub async fn list_diretores(&self) -> Result<Vec<DiretorResumo>, AppError> {
        self.user_repo.list_diretores().await
    }

    // Edição parcial: campos ausentes ficam como estão; senha vazia não é
    // alterada. E-mail/username duplicados viram erro de conflito via
    // constraint do banco.
    pub async fn update_user(
        &self,
        actor: &User,
        id: i64,
        payload: UpdateUserPayload,
    ) -> Result<User, AppError> {
        let mut user = self.user_repo.find_by_id(id).await?.ok_or(AppError::NotFound)?;

        if let Some(username) = payload.username {
            user.username = username;
        }
        if let Some(email) = payload.email {
            user.email = Some(email);
        }
        if let Some(role) = payload.role {
            user.role = role;
        }
        if let Some(password) = payload.password.filter(|p| !p.is_empty()) {
            user.password_hash = auth::hash_password(password).await?;
        }

        let atualizado = self.user_repo.update(&self.pool, &user).await?;

        self.audit_repo
            .append(
                &self.pool,
                actor,
                AuditAction::Update,
                &atualizado.id.to_string(),
                "users",
                &format!("Usuário '{}' editado.", atualizado.username),
            )
            .await?;

        Ok(atualizado)
    }

    pub async fn delete_user(&self, actor: &User, id: i64) -> Result<(), AppError> {
        // O autor da exclusão precisa continuar existindo para assinar a
        // entrada de auditoria.
        if actor.id == id {
            return Err(AppError::InvalidFieldValue(
                "Não é possível excluir o próprio usuário.".to_string(),
            ));
        }

        let user = self.user_repo.find_by_id(id).await?.ok_or(AppError::NotFound)?;

        self.user_repo.delete(&self.pool, id).await?;

        self.audit_repo
            .append(
                &self.pool,
                actor,
                AuditAction::Delete,
                &user.id.to_string(),
                "users",
                &format!("Usuário '{}' excluído.", user.username),
            )
            .await?;

        Ok(())
    }

    // Provisiona o usuário 'admin' padrão na inicialização, como o ambiente
    // de implantação espera encontrar.
    pub async fn ensure_admin(&self, senha_padrao: &str) -> Result<(), AppError> {
        match self.user_repo.find_by_username("admin").await? {
            None => {
                tracing::info!("Criando usuário 'admin' padrão...");
                let password_hash = auth::hash_password(senha_padrao.to_owned()).await?;
                self.user_repo
                    .create(
                        &self.pool,
                        "admin",
                        Some("admin@uniesp.edu.br"),
                        &password_hash,
                        "admin",
                    )
                    .await?;
                tracing::info!("Usuário 'admin' criado com sucesso.");
            }
            Some(mut admin) if admin.email.is_none() => {
                tracing::info!("Atualizando email do usuário 'admin' existente...");
                admin.email = Some("admin@uniesp.edu.br".to_string());
                self.user_repo.update(&self.pool, &admin).await?;
            }
            Some(_) => {}
        }
        Ok(())
    }
}
