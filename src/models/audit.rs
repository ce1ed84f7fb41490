// src/models/audit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Mapeia o CREATE TYPE audit_action do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_action", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

// Uma entrada imutável da trilha de auditoria. O user_id é anulável (o
// usuário pode ter sido excluído depois); username é o snapshot do autor
// no momento da ação.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuditLogEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub action: AuditAction,
    pub record_id: String,
    pub table_name: String,
    pub timestamp: DateTime<Utc>,
    pub details: String,
}
