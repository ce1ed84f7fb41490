// src/db/audit_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::{
        audit::{AuditAction, AuditLogEntry},
        user::User,
    },
};

// Gravador da trilha de auditoria: apenas INSERT e leitura ordenada, nunca
// UPDATE ou DELETE. Uma falha na gravação é propagada ao chamador — uma
// mutação sem registro é uma lacuna de conformidade, não um detalhe.
#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Acrescenta uma entrada com timestamp do servidor. Além do user_id,
    // grava o username como snapshot: a entrada continua atribuível mesmo
    // se o usuário for excluído depois.
    pub async fn append<'e, E>(
        &self,
        executor: E,
        actor: &User,
        action: AuditAction,
        record_id: &str,
        table_name: &str,
        details: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO audit_log (user_id, username, action, record_id, table_name, details)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(actor.id)
        .bind(&actor.username)
        .bind(action)
        .bind(record_id)
        .bind(table_name)
        .bind(details)
        .execute(executor)
        .await?;

        Ok(())
    }

    // Mais recentes primeiro.
    pub async fn list_all(&self) -> Result<Vec<AuditLogEntry>, AppError> {
        let entradas = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            SELECT id, user_id, username, action, record_id, table_name, "timestamp", details
            FROM audit_log
            ORDER BY "timestamp" DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(entradas)
    }
}
