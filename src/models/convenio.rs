// src/models/convenio.rs

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;

// Mapeia o CREATE TYPE convenio_status do banco.
// A grafia canônica é minúscula; a entrada é aceita sem distinção de caixa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "convenio_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConvenioStatus {
    Ativo,
    Rescindido,
    Expirado,
}

impl ConvenioStatus {
    pub fn parse(valor: &str) -> Option<Self> {
        match valor.trim().to_lowercase().as_str() {
            "ativo" => Some(Self::Ativo),
            "rescindido" => Some(Self::Rescindido),
            "expirado" => Some(Self::Expirado),
            _ => None,
        }
    }
}

// Representa um convênio vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Convenio {
    pub id: Uuid,
    pub nome_conveniada: String,
    pub cnpj: String,
    pub nome_fantasia: String,
    pub cidade: String,
    pub estado: String,
    pub area_atuacao: String,
    pub qtd_funcionarios: i32,
    pub qtd_associados: i32,
    pub qtd_sindicalizados: i32,
    pub responsavel_legal: String,
    pub cargo_responsavel: String,
    pub email_responsavel: String,
    pub telefone_responsavel: String,
    pub unidade_uniesp: String,
    pub diretor_responsavel: String,
    pub diretor_responsavel_email: Option<String>,
    pub data_assinatura: Option<NaiveDate>,
    pub observacoes: Option<String>,
    pub caminho_arquivo_pdf: Option<String>,
    pub status: ConvenioStatus,
    pub criado_em: DateTime<Utc>,
    pub atualizado_em: DateTime<Utc>,
}

// Dados já convertidos para a criação de um convênio
#[derive(Debug, Validate)]
pub struct NovoConvenio {
    pub nome_conveniada: String,
    pub cnpj: String,
    pub nome_fantasia: String,
    pub cidade: String,
    pub estado: String,
    pub area_atuacao: String,
    pub qtd_funcionarios: i32,
    pub qtd_associados: i32,
    pub qtd_sindicalizados: i32,
    pub responsavel_legal: String,
    pub cargo_responsavel: String,
    #[validate(email(message = "O e-mail do responsável é inválido."))]
    pub email_responsavel: String,
    pub telefone_responsavel: String,
    pub unidade_uniesp: String,
    pub diretor_responsavel: String,
    #[validate(email(message = "O e-mail do diretor é inválido."))]
    pub diretor_responsavel_email: Option<String>,
    pub data_assinatura: Option<NaiveDate>,
    pub observacoes: Option<String>,
    pub caminho_arquivo_pdf: Option<String>,
    pub status: ConvenioStatus,
}

const CAMPOS_TEXTO: &[&str] = &[
    "nome_conveniada",
    "cnpj",
    "nome_fantasia",
    "cidade",
    "estado",
    "area_atuacao",
    "responsavel_legal",
    "cargo_responsavel",
    "email_responsavel",
    "telefone_responsavel",
    "unidade_uniesp",
    "diretor_responsavel",
];

const CAMPOS_CONTAGEM: &[&str] = &["qtd_funcionarios", "qtd_associados", "qtd_sindicalizados"];

fn parse_contagem(chave: &str, valor: &str) -> Result<i32, AppError> {
    let numero: i32 = valor
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidFieldValue(format!("Valor inválido para {chave}: '{valor}'")))?;
    if numero < 0 {
        return Err(AppError::InvalidFieldValue(format!(
            "O campo {chave} não pode ser negativo."
        )));
    }
    Ok(numero)
}

fn parse_data(valor: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(valor.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidFieldValue(format!("Data inválida: '{valor}' (use AAAA-MM-DD).")))
}

impl NovoConvenio {
    // Converte o mapa de campos do formulário em um convênio pronto para inserir.
    // Campos obrigatórios ausentes, inteiros/datas malformados e status ausente
    // ou desconhecido são erros de validação.
    pub fn from_campos(campos: &HashMap<String, String>) -> Result<Self, AppError> {
        let texto = |chave: &str| -> Result<String, AppError> {
            campos
                .get(chave)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    AppError::InvalidFieldValue(format!("Campo obrigatório ausente: {chave}"))
                })
        };

        let contagem = |chave: &str| -> Result<i32, AppError> {
            parse_contagem(chave, &texto(chave)?)
        };

        let opcional = |chave: &str| -> Option<String> {
            campos
                .get(chave)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let data_assinatura = opcional("data_assinatura").map(|v| parse_data(&v)).transpose()?;

        let status = opcional("status")
            .as_deref()
            .and_then(ConvenioStatus::parse)
            .ok_or_else(|| {
                AppError::InvalidFieldValue(
                    "Status ausente ou inválido (use ativo, rescindido ou expirado).".to_string(),
                )
            })?;

        Ok(Self {
            nome_conveniada: texto("nome_conveniada")?,
            cnpj: texto("cnpj")?,
            nome_fantasia: texto("nome_fantasia")?,
            cidade: texto("cidade")?,
            estado: texto("estado")?,
            area_atuacao: texto("area_atuacao")?,
            qtd_funcionarios: contagem("qtd_funcionarios")?,
            qtd_associados: contagem("qtd_associados")?,
            qtd_sindicalizados: contagem("qtd_sindicalizados")?,
            responsavel_legal: texto("responsavel_legal")?,
            cargo_responsavel: texto("cargo_responsavel")?,
            email_responsavel: texto("email_responsavel")?,
            telefone_responsavel: texto("telefone_responsavel")?,
            unidade_uniesp: texto("unidade_uniesp")?,
            diretor_responsavel: texto("diretor_responsavel")?,
            diretor_responsavel_email: opcional("diretor_responsavel_email"),
            data_assinatura,
            observacoes: opcional("observacoes"),
            caminho_arquivo_pdf: None,
            status,
        })
    }
}

// Aplica uma atualização parcial campo a campo sobre um convênio já carregado.
// Regras por campo:
//   - data_assinatura: vazio limpa o campo; valor presente é parseado ou erro;
//   - status: aceito sem distinção de caixa; valor vazio ou fora do enum é
//     ignorado em silêncio, sem erro;
//   - contagens: valor presente é parseado como inteiro não negativo ou erro;
//   - demais campos de texto: atribuídos como strings opacas; vazios ignorados.
// Chaves desconhecidas e campos controlados pelo servidor (id, caminho do
// arquivo, timestamps) são ignorados.
pub fn aplicar_atualizacao(
    convenio: &mut Convenio,
    campos: &HashMap<String, String>,
) -> Result<(), AppError> {
    for (chave, valor) in campos {
        let valor = valor.trim();

        match chave.as_str() {
            "data_assinatura" => {
                convenio.data_assinatura = if valor.is_empty() {
                    None
                } else {
                    Some(parse_data(valor)?)
                };
            }
            "status" => {
                if valor.is_empty() {
                    continue;
                }
                match ConvenioStatus::parse(valor) {
                    Some(status) => convenio.status = status,
                    None => {
                        tracing::warn!("Status '{}' não é válido; alteração ignorada.", valor);
                    }
                }
            }
            chave_contagem if CAMPOS_CONTAGEM.contains(&chave_contagem) => {
                if valor.is_empty() {
                    continue;
                }
                let numero = parse_contagem(chave_contagem, valor)?;
                match chave_contagem {
                    "qtd_funcionarios" => convenio.qtd_funcionarios = numero,
                    "qtd_associados" => convenio.qtd_associados = numero,
                    _ => convenio.qtd_sindicalizados = numero,
                }
            }
            "observacoes" => {
                if !valor.is_empty() {
                    convenio.observacoes = Some(valor.to_string());
                }
            }
            "diretor_responsavel_email" => {
                if !valor.is_empty() {
                    convenio.diretor_responsavel_email = Some(valor.to_string());
                }
            }
            chave_texto if CAMPOS_TEXTO.contains(&chave_texto) => {
                if valor.is_empty() {
                    continue;
                }
                let destino = match chave_texto {
                    "nome_conveniada" => &mut convenio.nome_conveniada,
                    "cnpj" => &mut convenio.cnpj,
                    "nome_fantasia" => &mut convenio.nome_fantasia,
                    "cidade" => &mut convenio.cidade,
                    "estado" => &mut convenio.estado,
                    "area_atuacao" => &mut convenio.area_atuacao,
                    "responsavel_legal" => &mut convenio.responsavel_legal,
                    "cargo_responsavel" => &mut convenio.cargo_responsavel,
                    "email_responsavel" => &mut convenio.email_responsavel,
                    "telefone_responsavel" => &mut convenio.telefone_responsavel,
                    "unidade_uniesp" => &mut convenio.unidade_uniesp,
                    _ => &mut convenio.diretor_responsavel,
                };
                *destino = valor.to_string();
            }
            // O caminho do arquivo nunca vem do mapa de campos: ele é derivado
            // do upload pelo armazenamento de anexos. Chaves desconhecidas
            // também caem aqui e são ignoradas.
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campos_validos() -> HashMap<String, String> {
        let pares = [
            ("nome_conveniada", "ACME"),
            ("cnpj", "12.345.678/0001-90"),
            ("nome_fantasia", "ACME Ltda"),
            ("cidade", "João Pessoa"),
            ("estado", "PB"),
            ("area_atuacao", "Metalurgia"),
            ("qtd_funcionarios", "120"),
            ("qtd_associados", "80"),
            ("qtd_sindicalizados", "40"),
            ("responsavel_legal", "Maria Souza"),
            ("cargo_responsavel", "Diretora"),
            ("email_responsavel", "maria@acme.com.br"),
            ("telefone_responsavel", "(83) 99999-0000"),
            ("unidade_uniesp", "Campus I"),
            ("diretor_responsavel", "Carlos Lima"),
            ("data_assinatura", "2025-03-10"),
            ("status", "ativo"),
        ];
        pares
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn convenio_existente() -> Convenio {
        let novo = NovoConvenio::from_campos(&campos_validos()).unwrap();
        Convenio {
            id: Uuid::new_v4(),
            nome_conveniada: novo.nome_conveniada,
            cnpj: novo.cnpj,
            nome_fantasia: novo.nome_fantasia,
            cidade: novo.cidade,
            estado: novo.estado,
            area_atuacao: novo.area_atuacao,
            qtd_funcionarios: novo.qtd_funcionarios,
            qtd_associados: novo.qtd_associados,
            qtd_sindicalizados: novo.qtd_sindicalizados,
            responsavel_legal: novo.responsavel_legal,
            cargo_responsavel: novo.cargo_responsavel,
            email_responsavel: novo.email_responsavel,
            telefone_responsavel: novo.telefone_responsavel,
            unidade_uniesp: novo.unidade_uniesp,
            diretor_responsavel: novo.diretor_responsavel,
            diretor_responsavel_email: None,
            data_assinatura: novo.data_assinatura,
            observacoes: None,
            caminho_arquivo_pdf: None,
            status: novo.status,
            criado_em: Utc::now(),
            atualizado_em: Utc::now(),
        }
    }

    #[test]
    fn status_aceita_qualquer_caixa() {
        assert_eq!(ConvenioStatus::parse("ativo"), Some(ConvenioStatus::Ativo));
        assert_eq!(ConvenioStatus::parse("ATIVO"), Some(ConvenioStatus::Ativo));
        assert_eq!(
            ConvenioStatus::parse("Rescindido"),
            Some(ConvenioStatus::Rescindido)
        );
        assert_eq!(
            ConvenioStatus::parse("  expirado "),
            Some(ConvenioStatus::Expirado)
        );
    }

    #[test]
    fn status_fora_do_enum_retorna_none() {
        assert_eq!(ConvenioStatus::parse("INVALIDO"), None);
        assert_eq!(ConvenioStatus::parse(""), None);
        assert_eq!(ConvenioStatus::parse("ativa"), None);
    }

    #[test]
    fn from_campos_converte_tipos() {
        let novo = NovoConvenio::from_campos(&campos_validos()).unwrap();
        assert_eq!(novo.nome_conveniada, "ACME");
        assert_eq!(novo.qtd_funcionarios, 120);
        assert_eq!(novo.status, ConvenioStatus::Ativo);
        assert_eq!(
            novo.data_assinatura,
            Some(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
        );
        assert!(novo.caminho_arquivo_pdf.is_none());
    }

    #[test]
    fn from_campos_sem_campo_obrigatorio_falha() {
        let mut campos = campos_validos();
        campos.remove("cnpj");
        assert!(matches!(
            NovoConvenio::from_campos(&campos),
            Err(AppError::InvalidFieldValue(_))
        ));
    }

    #[test]
    fn from_campos_inteiro_malformado_falha() {
        let mut campos = campos_validos();
        campos.insert("qtd_associados".into(), "oitenta".into());
        assert!(matches!(
            NovoConvenio::from_campos(&campos),
            Err(AppError::InvalidFieldValue(_))
        ));
    }

    #[test]
    fn from_campos_contagem_negativa_falha() {
        let mut campos = campos_validos();
        campos.insert("qtd_funcionarios".into(), "-1".into());
        assert!(NovoConvenio::from_campos(&campos).is_err());
    }

    #[test]
    fn from_campos_data_malformada_falha() {
        let mut campos = campos_validos();
        campos.insert("data_assinatura".into(), "10/03/2025".into());
        assert!(NovoConvenio::from_campos(&campos).is_err());
    }

    #[test]
    fn from_campos_sem_status_falha() {
        let mut campos = campos_validos();
        campos.remove("status");
        assert!(NovoConvenio::from_campos(&campos).is_err());
    }

    #[test]
    fn atualizacao_com_status_invalido_mantem_o_atual_sem_erro() {
        let mut convenio = convenio_existente();
        let campos: HashMap<String, String> = [
            ("status".to_string(), "INVALIDO".to_string()),
            ("cidade".to_string(), "Campina Grande".to_string()),
        ]
        .into();

        aplicar_atualizacao(&mut convenio, &campos).unwrap();

        // O status inválido é ignorado, mas os demais campos são aplicados.
        assert_eq!(convenio.status, ConvenioStatus::Ativo);
        assert_eq!(convenio.cidade, "Campina Grande");
    }

    #[test]
    fn atualizacao_de_status_e_case_insensitive() {
        let mut convenio = convenio_existente();
        let campos: HashMap<String, String> =
            [("status".to_string(), "RESCINDIDO".to_string())].into();

        aplicar_atualizacao(&mut convenio, &campos).unwrap();
        assert_eq!(convenio.status, ConvenioStatus::Rescindido);
    }

    #[test]
    fn atualizacao_com_inteiro_malformado_falha() {
        let mut convenio = convenio_existente();
        let campos: HashMap<String, String> =
            [("qtd_funcionarios".to_string(), "muitos".to_string())].into();

        assert!(matches!(
            aplicar_atualizacao(&mut convenio, &campos),
            Err(AppError::InvalidFieldValue(_))
        ));
    }

    #[test]
    fn atualizacao_preserva_campos_nao_enviados() {
        let mut convenio = convenio_existente();
        let antes = convenio.clone();
        let campos: HashMap<String, String> =
            [("observacoes".to_string(), "Renovação prevista.".to_string())].into();

        aplicar_atualizacao(&mut convenio, &campos).unwrap();

        assert_eq!(convenio.observacoes.as_deref(), Some("Renovação prevista."));
        assert_eq!(convenio.nome_conveniada, antes.nome_conveniada);
        assert_eq!(convenio.qtd_funcionarios, antes.qtd_funcionarios);
        assert_eq!(convenio.status, antes.status);
    }

    #[test]
    fn atualizacao_limpa_data_quando_vazia() {
        let mut convenio = convenio_existente();
        assert!(convenio.data_assinatura.is_some());

        let campos: HashMap<String, String> =
            [("data_assinatura".to_string(), "".to_string())].into();
        aplicar_atualizacao(&mut convenio, &campos).unwrap();

        assert!(convenio.data_assinatura.is_none());
    }

    #[test]
    fn atualizacao_ignora_chaves_desconhecidas_e_protegidas() {
        let mut convenio = convenio_existente();
        let id_original = convenio.id;
        let campos: HashMap<String, String> = [
            ("id".to_string(), Uuid::new_v4().to_string()),
            ("caminho_arquivo_pdf".to_string(), "../../etc/passwd".to_string()),
            ("campo_inexistente".to_string(), "x".to_string()),
        ]
        .into();

        aplicar_atualizacao(&mut convenio, &campos).unwrap();

        assert_eq!(convenio.id, id_original);
        assert!(convenio.caminho_arquivo_pdf.is_none());
    }
}
