// src/db/convenio_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::convenio::{Convenio, NovoConvenio},
};

// O repositório de convênios, responsável por todas as interações com a
// tabela 'convenios'. Os timestamps são sempre atribuídos pelo banco, nunca
// pelo chamador: criado_em e atualizado_em nascem do mesmo NOW() e toda
// atualização refaz o atualizado_em.
#[derive(Clone)]
pub struct ConvenioRepository {
    pool: PgPool,
}

impl ConvenioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Insere um novo convênio com id gerado aqui
    pub async fn create<'e, E>(&self, executor: E, novo: &NovoConvenio) -> Result<Convenio, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let convenio = sqlx::query_as::<_, Convenio>(
            r#"
            INSERT INTO convenios (
                id, nome_conveniada, cnpj, nome_fantasia, cidade, estado,
                area_atuacao, qtd_funcionarios, qtd_associados, qtd_sindicalizados,
                responsavel_legal, cargo_responsavel, email_responsavel,
                telefone_responsavel, unidade_uniesp, diretor_responsavel,
                diretor_responsavel_email, data_assinatura, observacoes,
                caminho_arquivo_pdf, status
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&novo.nome_conveniada)
        .bind(&novo.cnpj)
        .bind(&novo.nome_fantasia)
        .bind(&novo.cidade)
        .bind(&novo.estado)
        .bind(&novo.area_atuacao)
        .bind(novo.qtd_funcionarios)
        .bind(novo.qtd_associados)
        .bind(novo.qtd_sindicalizados)
        .bind(&novo.responsavel_legal)
        .bind(&novo.cargo_responsavel)
        .bind(&novo.email_responsavel)
        .bind(&novo.telefone_responsavel)
        .bind(&novo.unidade_uniesp)
        .bind(&novo.diretor_responsavel)
        .bind(&novo.diretor_responsavel_email)
        .bind(novo.data_assinatura)
        .bind(&novo.observacoes)
        .bind(&novo.caminho_arquivo_pdf)
        .bind(novo.status)
        .fetch_one(executor)
        .await?;

        Ok(convenio)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Convenio>, AppError> {
        let maybe_convenio =
            sqlx::query_as::<_, Convenio>("SELECT * FROM convenios WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(maybe_convenio)
    }

    pub async fn list_all(&self) -> Result<Vec<Convenio>, AppError> {
        let convenios = sqlx::query_as::<_, Convenio>("SELECT * FROM convenios")
            .fetch_all(&self.pool)
            .await?;
        Ok(convenios)
    }

    // Regrava o registro inteiro já mesclado pelo serviço. Última escrita
    // vence; o banco refaz o atualizado_em.
    pub async fn update<'e, E>(&self, executor: E, convenio: &Convenio) -> Result<Convenio, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let atualizado = sqlx::query_as::<_, Convenio>(
            r#"
            UPDATE convenios SET
                nome_conveniada = $2, cnpj = $3, nome_fantasia = $4, cidade = $5,
                estado = $6, area_atuacao = $7, qtd_funcionarios = $8,
                qtd_associados = $9, qtd_sindicalizados = $10,
                responsavel_legal = $11, cargo_responsavel = $12,
                email_responsavel = $13, telefone_responsavel = $14,
                unidade_uniesp = $15, diretor_responsavel = $16,
                diretor_responsavel_email = $17, data_assinatura = $18,
                observacoes = $19, caminho_arquivo_pdf = $20, status = $21,
                atualizado_em = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(convenio.id)
        .bind(&convenio.nome_conveniada)
        .bind(&convenio.cnpj)
        .bind(&convenio.nome_fantasia)
        .bind(&convenio.cidade)
        .bind(&convenio.estado)
        .bind(&convenio.area_atuacao)
        .bind(convenio.qtd_funcionarios)
        .bind(convenio.qtd_associados)
        .bind(convenio.qtd_sindicalizados)
        .bind(&convenio.responsavel_legal)
        .bind(&convenio.cargo_responsavel)
        .bind(&convenio.email_responsavel)
        .bind(&convenio.telefone_responsavel)
        .bind(&convenio.unidade_uniesp)
        .bind(&convenio.diretor_responsavel)
        .bind(&convenio.diretor_responsavel_email)
        .bind(convenio.data_assinatura)
        .bind(&convenio.observacoes)
        .bind(&convenio.caminho_arquivo_pdf)
        .bind(convenio.status)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)?;

        Ok(atualizado)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let resultado = sqlx::query("DELETE FROM convenios WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if resultado.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
