// src/services/storage.rs

use std::path::PathBuf;

use uuid::Uuid;

use crate::common::error::AppError;

// Um arquivo recebido no formulário, ainda sem validação.
#[derive(Debug, Clone)]
pub struct ArquivoRecebido {
    pub nome_original: String,
    pub dados: Vec<u8>,
}

// Upload já aceito e com nome definitivo. Os bytes só vão para o disco em
// `commit`, depois que a transação do registro dono tiver sido confirmada.
#[derive(Debug)]
pub struct UploadPreparado {
    pub nome_final: String,
    dados: Vec<u8>,
}

// Gerencia o diretório de uploads: no máximo um PDF por convênio, com nome
// `<uuid>_<nome-saneado>`. O nome armazenado nunca deriva apenas da entrada
// do usuário.
#[derive(Clone)]
pub struct AttachmentStorage {
    raiz: PathBuf,
}

impl AttachmentStorage {
    pub fn new(raiz: impl Into<PathBuf>) -> Self {
        Self { raiz: raiz.into() }
    }

    pub async fn init(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.raiz).await?;
        Ok(())
    }

    // Valida a extensão e gera o nome único. Um upload que não seja PDF é
    // descartado em silêncio: o convênio segue sem o documento, sem erro.
    pub fn stage(&self, arquivo: ArquivoRecebido) -> Option<UploadPreparado> {
        if !extensao_permitida(&arquivo.nome_original) {
            tracing::warn!(
                "Arquivo '{}' ignorado: apenas PDFs são aceitos.",
                arquivo.nome_original
            );
            return None;
        }

        let nome_seguro = sanitizar_nome(&arquivo.nome_original);
        let nome_final = format!("{}_{}", Uuid::new_v4(), nome_seguro);

        Some(UploadPreparado {
            nome_final,
            dados: arquivo.dados,
        })
    }

    // Grava em um caminho de staging e renomeia para o nome definitivo, para
    // nunca deixar um arquivo parcial visível com o nome final. O destino
    // passa pela mesma validação de `resolve`: todo nome gravado pode depois
    // ser servido e removido.
    pub async fn commit(&self, upload: &UploadPreparado) -> Result<(), AppError> {
        let destino = self.resolve(&upload.nome_final).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("nome de arquivo inválido: '{}'", upload.nome_final),
            )
        })?;
        let staging = self.raiz.join(format!("{}.part", upload.nome_final));

        tokio::fs::write(&staging, &upload.dados).await?;
        tokio::fs::rename(&staging, &destino).await?;
        Ok(())
    }

    // Remove o arquivo se existir; "já não existe" não é um erro.
    pub async fn remove(&self, nome: &str) {
        let Some(caminho) = self.resolve(nome) else {
            tracing::warn!("Nome de arquivo suspeito ignorado na remoção: '{}'", nome);
            return;
        };

        match tokio::fs::remove_file(&caminho).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!("Falha ao remover o arquivo '{}': {}", caminho.display(), e);
            }
        }
    }

    // Resolve um nome armazenado para o caminho dentro da raiz. Sem
    // separadores o nome não sai do diretório; "." e ".." são as únicas
    // entradas restantes que não apontam para um arquivo.
    pub fn resolve(&self, nome: &str) -> Option<PathBuf> {
        if nome.is_empty()
            || nome == "."
            || nome == ".."
            || nome.contains('/')
            || nome.contains('\\')
        {
            return None;
        }
        Some(self.raiz.join(nome))
    }
}

// Só aceitamos .pdf, sem distinção de caixa.
fn extensao_permitida(nome: &str) -> bool {
    nome.rsplit_once('.')
        .map(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

// Mantém apenas o último componente do caminho e troca qualquer caractere
// fora de [A-Za-z0-9._-] por '_'.
fn sanitizar_nome(nome: &str) -> String {
    let base = nome
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    let limpo: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let limpo = limpo.trim_start_matches('.').to_string();
    if limpo.is_empty() {
        "documento.pdf".to_string()
    } else {
        limpo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apenas_pdf_e_aceito() {
        assert!(extensao_permitida("contrato.pdf"));
        assert!(extensao_permitida("CONTRATO.PDF"));
        assert!(!extensao_permitida("contrato.exe"));
        assert!(!extensao_permitida("contrato"));
        assert!(!extensao_permitida(""));
    }

    #[test]
    fn sanitizacao_remove_componentes_de_caminho() {
        assert_eq!(sanitizar_nome("../../etc/senha.pdf"), "senha.pdf");
        assert_eq!(sanitizar_nome("C:\\temp\\termo.pdf"), "termo.pdf");
        assert_eq!(sanitizar_nome("termo de parceria.pdf"), "termo_de_parceria.pdf");
    }

    #[test]
    fn sanitizacao_nunca_gera_nome_vazio() {
        assert_eq!(sanitizar_nome("///"), "documento.pdf");
        assert_eq!(sanitizar_nome("...."), "documento.pdf");
    }

    #[test]
    fn stage_rejeita_extensao_invalida_em_silencio() {
        let storage = AttachmentStorage::new("/tmp/uploads");
        let arquivo = ArquivoRecebido {
            nome_original: "contract.exe".into(),
            dados: vec![1, 2, 3],
        };
        assert!(storage.stage(arquivo).is_none());
    }

    #[test]
    fn stage_prefixa_uuid_ao_nome_saneado() {
        let storage = AttachmentStorage::new("/tmp/uploads");
        let arquivo = ArquivoRecebido {
            nome_original: "termo anual.pdf".into(),
            dados: vec![],
        };

        let upload = storage.stage(arquivo).unwrap();
        let (prefixo, resto) = upload.nome_final.split_once('_').unwrap();
        assert!(Uuid::parse_str(prefixo).is_ok());
        assert_eq!(resto, "termo_anual.pdf");
    }

    #[test]
    fn resolve_rejeita_travessia_de_diretorio() {
        let storage = AttachmentStorage::new("/tmp/uploads");
        assert!(storage.resolve("../segredo.pdf").is_none());
        assert!(storage.resolve("a/b.pdf").is_none());
        assert!(storage.resolve("a\\b.pdf").is_none());
        assert!(storage.resolve("..").is_none());
        assert!(storage.resolve(".").is_none());
        assert!(storage.resolve("").is_none());
        assert!(storage.resolve("ok.pdf").is_some());
    }

    #[test]
    fn resolve_aceita_pontos_consecutivos_dentro_do_nome() {
        let storage = AttachmentStorage::new("/tmp/uploads");
        assert!(storage.resolve("relatorio..anual.pdf").is_some());
    }
}
