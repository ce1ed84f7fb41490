// src/handlers/convenios.rs

use std::collections::HashMap;

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{audit::AuditLogEntry, convenio::Convenio},
    services::storage::ArquivoRecebido,
};

// GET /convenios_api
pub async fn list_convenios(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Convenio>>, AppError> {
    user.require_role(&["admin", "diretor"])?;

    let convenios = app_state.convenio_service.list_convenios().await?;
    Ok(Json(convenios))
}

// POST /convenio — multipart com os campos do convênio e o PDF opcional
// no campo 'caminho_arquivo_pdf'
pub async fn create_convenio(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    user.require_role(&["admin", "diretor"])?;

    let (campos, arquivo) = ler_formulario(multipart, "caminho_arquivo_pdf").await?;

    let convenio = app_state
        .convenio_service
        .create_convenio(&user.0, campos, arquivo)
        .await?;

    Ok((StatusCode::CREATED, Json(convenio)))
}

// GET /convenio/{id}
pub async fn get_convenio(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Convenio>, AppError> {
    user.require_role(&["admin", "diretor"])?;

    let convenio = app_state.convenio_service.get_convenio(id).await?;
    Ok(Json(convenio))
}

// PATCH/POST /convenio/{id} — atualização parcial. Aceita JSON (mapa de
// campos) ou multipart; no multipart o arquivo de substituição vem no
// campo 'documento'.
pub async fn update_convenio(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    request: Request,
) -> Result<Json<Convenio>, AppError> {
    user.require_role(&["admin"])?;

    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let (campos, arquivo) = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| AppError::InvalidFieldValue(format!("Formulário inválido: {e}")))?;
        ler_formulario(multipart, "documento").await?
    } else {
        let Json(mapa) = Json::<Map<String, Value>>::from_request(request, &())
            .await
            .map_err(|e| AppError::InvalidFieldValue(format!("Corpo JSON inválido: {e}")))?;
        (normalizar_mapa(mapa), None)
    };

    let convenio = app_state
        .convenio_service
        .update_convenio(&user.0, id, campos, arquivo)
        .await?;

    Ok(Json(convenio))
}

// DELETE /convenio/{id}
pub async fn delete_convenio(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    user.require_role(&["admin"])?;

    app_state
        .convenio_service
        .delete_convenio(&user.0, id)
        .await?;

    Ok(Json(json!({ "message": "Convênio removido com sucesso!" })))
}

// GET /uploads/{filename} — serve o PDF armazenado. Basta estar autenticado.
pub async fn download_arquivo(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let caminho = app_state.storage.resolve(&filename).ok_or(AppError::NotFound)?;

    let dados = match tokio::fs::read(&caminho).await {
        Ok(dados) => dados,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AppError::NotFound),
        Err(e) => return Err(AppError::StorageError(e)),
    };

    Ok(([(header::CONTENT_TYPE, "application/pdf")], dados).into_response())
}

// GET /logs_auditoria_api — mais recentes primeiro
pub async fn list_audit_logs(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<AuditLogEntry>>, AppError> {
    user.require_role(&["admin"])?;

    let logs = app_state.audit_repo.list_all().await?;
    Ok(Json(logs))
}

// Percorre o multipart separando os campos de texto do arquivo enviado.
// Um upload sem nome ou sem conteúdo conta como "nenhum arquivo".
async fn ler_formulario(
    mut multipart: Multipart,
    campo_arquivo: &str,
) -> Result<(HashMap<String, String>, Option<ArquivoRecebido>), AppError> {
    let mut campos = HashMap::new();
    let mut arquivo = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(nome) = field.name().map(|n| n.to_string()) else {
            continue;
        };

        if nome == campo_arquivo {
            let nome_original = field.file_name().map(|n| n.to_string()).unwrap_or_default();
            let dados = field.bytes().await?.to_vec();
            if !nome_original.is_empty() && !dados.is_empty() {
                arquivo = Some(ArquivoRecebido { nome_original, dados });
            }
        } else {
            campos.insert(nome, field.text().await?);
        }
    }

    Ok((campos, arquivo))
}

// Achata o corpo JSON no mesmo mapa campo→texto usado pelo formulário:
// null vira vazio (campo limpo), números e booleanos viram texto, arrays e
// objetos não têm correspondência e são ignorados.
fn normalizar_mapa(mapa: Map<String, Value>) -> HashMap<String, String> {
    mapa.into_iter()
        .filter_map(|(chave, valor)| {
            let texto = match valor {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                _ => return None,
            };
            Some((chave, texto))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizacao_converte_escalares_e_descarta_compostos() {
        let mut mapa = Map::new();
        mapa.insert("cidade".into(), Value::String("Recife".into()));
        mapa.insert("qtd_funcionarios".into(), json!(42));
        mapa.insert("data_assinatura".into(), Value::Null);
        mapa.insert("tags".into(), json!(["a", "b"]));

        let campos = normalizar_mapa(mapa);

        assert_eq!(campos.get("cidade").map(String::as_str), Some("Recife"));
        assert_eq!(campos.get("qtd_funcionarios").map(String::as_str), Some("42"));
        assert_eq!(campos.get("data_assinatura").map(String::as_str), Some(""));
        assert!(!campos.contains_key("tags"));
    }
}
