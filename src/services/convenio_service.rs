// src/services/convenio_service.rs

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{AuditRepository, ConvenioRepository},
    models::{
        audit::AuditAction,
        convenio::{aplicar_atualizacao, Convenio, NovoConvenio},
        user::User,
    },
    services::{
        mailer::Mailer,
        storage::{ArquivoRecebido, AttachmentStorage},
    },
};

// Orquestra o ciclo de vida de um convênio: validação, mutação no banco,
// arquivo anexado, trilha de auditoria e notificação, nesta ordem.
#[derive(Clone)]
pub struct ConvenioService {
    repo: ConvenioRepository,
    audit_repo: AuditRepository,
    storage: AttachmentStorage,
    mailer: Mailer,
    pool: PgPool,
}

impl ConvenioService {
    pub fn new(
        repo: ConvenioRepository,
        audit_repo: AuditRepository,
        storage: AttachmentStorage,
        mailer: Mailer,
        pool: PgPool,
    ) -> Self {
        Self { repo, audit_repo, storage, mailer, pool }
    }

    // Cadastro de um novo convênio a partir do mapa de campos do formulário
    // e do PDF opcional. O arquivo só é gravado depois do commit da linha,
    // para nunca deixar um arquivo órfão se o banco falhar. Uma falha na
    // auditoria é devolvida ao chamador mesmo com o convênio já gravado.
    pub async fn create_convenio(
        &self,
        actor: &User,
        campos: HashMap<String, String>,
        arquivo: Option<ArquivoRecebido>,
    ) -> Result<Convenio, AppError> {
        let mut novo = NovoConvenio::from_campos(&campos)?;
        novo.validate()?;

        // Extensão inválida ou upload ausente: o convênio segue sem anexo.
        let upload = arquivo.and_then(|a| self.storage.stage(a));
        if let Some(upload) = &upload {
            novo.caminho_arquivo_pdf = Some(upload.nome_final.clone());
        }

        let mut tx = self.pool.begin().await?;
        let convenio = self.repo.create(&mut *tx, &novo).await?;
        tx.commit().await?;

        if let Some(upload) = &upload {
            self.storage.commit(upload).await?;
        }

        self.audit_repo
            .append(
                &self.pool,
                actor,
                AuditAction::Create,
                &convenio.id.to_string(),
                "convenios",
                &format!("Novo convênio '{}' criado.", convenio.nome_conveniada),
            )
            .await?;

        // Melhor-esforço: uma falha aqui é logada dentro do mailer e nunca
        // desfaz o cadastro.
        if let Some(email) = &convenio.diretor_responsavel_email {
            self.mailer.notify_director(email, &convenio).await;
        }

        Ok(convenio)
    }

    pub async fn list_convenios(&self) -> Result<Vec<Convenio>, AppError> {
        self.repo.list_all().await
    }

    pub async fn get_convenio(&self, id: Uuid) -> Result<Convenio, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    // Atualização parcial campo a campo. Duas atualizações concorrentes no
    // mesmo registro disputam em regime de última-escrita-vence; não há
    // token de concorrência otimista.
    pub async fn update_convenio(
        &self,
        actor: &User,
        id: Uuid,
        campos: HashMap<String, String>,
        novo_arquivo: Option<ArquivoRecebido>,
    ) -> Result<Convenio, AppError> {
        let mut convenio = self.repo.find_by_id(id).await?.ok_or(AppError::NotFound)?;

        aplicar_atualizacao(&mut convenio, &campos)?;

        let upload = novo_arquivo.and_then(|a| self.storage.stage(a));
        let caminho_antigo = match &upload {
            Some(novo) => {
                let antigo = convenio.caminho_arquivo_pdf.take();
                convenio.caminho_arquivo_pdf = Some(novo.nome_final.clone());
                antigo
            }
            None => None,
        };

        let atualizado = self.repo.update(&self.pool, &convenio).await?;

        // O arquivo novo entra primeiro; só então o antigo é descartado.
        if let Some(upload) = &upload {
            self.storage.commit(upload).await?;
            if let Some(antigo) = caminho_antigo {
                self.storage.remove(&antigo).await;
            }
        }

        self.audit_repo
            .append(
                &self.pool,
                actor,
                AuditAction::Update,
                &atualizado.id.to_string(),
                "convenios",
                &format!("Convênio '{}' atualizado.", atualizado.nome_conveniada),
            )
            .await?;

        Ok(atualizado)
    }

    // Exclui o registro e o PDF associado; a ausência do arquivo no disco
    // não é um erro.
    pub async fn delete_convenio(&self, actor: &User, id: Uuid) -> Result<(), AppError> {
        let convenio = self.repo.find_by_id(id).await?.ok_or(AppError::NotFound)?;

        self.repo.delete(&self.pool, id).await?;

        if let Some(caminho) = &convenio.caminho_arquivo_pdf {
            self.storage.remove(caminho).await;
        }

        self.audit_repo
            .append(
                &self.pool,
                actor,
                AuditAction::Delete,
                &convenio.id.to_string(),
                "convenios",
                &format!("Convênio '{}' excluído.", convenio.nome_conveniada),
            )
            .await?;

        Ok(())
    }
}
