//! Testes de integração do armazenamento de anexos, usando um diretório
//! temporário real. Não precisa de banco rodando.

use convenios_backend::services::storage::{ArquivoRecebido, AttachmentStorage};
use tempfile::TempDir;

fn pdf_de_teste(nome: &str) -> ArquivoRecebido {
    ArquivoRecebido {
        nome_original: nome.to_string(),
        dados: b"%PDF-1.4 conteudo de teste".to_vec(),
    }
}

#[tokio::test]
async fn commit_grava_o_arquivo_sem_deixar_staging_para_tras() {
    let dir = TempDir::new().unwrap();
    let storage = AttachmentStorage::new(dir.path());

    let upload = storage.stage(pdf_de_teste("termo anual.pdf")).unwrap();
    storage.commit(&upload).await.unwrap();

    let caminho = storage.resolve(&upload.nome_final).unwrap();
    assert_eq!(
        std::fs::read(&caminho).unwrap(),
        b"%PDF-1.4 conteudo de teste"
    );

    // O caminho de staging `.part` não pode sobrar depois do rename.
    let sobras: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|entrada| entrada.ok())
        .filter(|entrada| entrada.file_name().to_string_lossy().ends_with(".part"))
        .collect();
    assert!(sobras.is_empty());
}

#[tokio::test]
async fn dois_uploads_do_mesmo_nome_nao_colidem() {
    let dir = TempDir::new().unwrap();
    let storage = AttachmentStorage::new(dir.path());

    let primeiro = storage.stage(pdf_de_teste("contrato.pdf")).unwrap();
    let segundo = storage.stage(pdf_de_teste("contrato.pdf")).unwrap();

    assert_ne!(primeiro.nome_final, segundo.nome_final);

    storage.commit(&primeiro).await.unwrap();
    storage.commit(&segundo).await.unwrap();

    assert!(storage.resolve(&primeiro.nome_final).unwrap().exists());
    assert!(storage.resolve(&segundo.nome_final).unwrap().exists());
}

#[tokio::test]
async fn substituicao_remove_o_arquivo_antigo() {
    let dir = TempDir::new().unwrap();
    let storage = AttachmentStorage::new(dir.path());

    let antigo = storage.stage(pdf_de_teste("v1.pdf")).unwrap();
    storage.commit(&antigo).await.unwrap();

    let novo = storage.stage(pdf_de_teste("v2.pdf")).unwrap();
    storage.commit(&novo).await.unwrap();
    storage.remove(&antigo.nome_final).await;

    assert!(!storage.resolve(&antigo.nome_final).unwrap().exists());
    assert!(storage.resolve(&novo.nome_final).unwrap().exists());
}

#[tokio::test]
async fn nome_com_pontos_consecutivos_grava_serve_e_remove() {
    let dir = TempDir::new().unwrap();
    let storage = AttachmentStorage::new(dir.path());

    // O saneamento preserva pontos internos; o nome gravado precisa continuar
    // resolvível para o download e para a remoção junto com o registro.
    let upload = storage.stage(pdf_de_teste("relatorio..anual.pdf")).unwrap();
    assert!(upload.nome_final.ends_with("_relatorio..anual.pdf"));

    storage.commit(&upload).await.unwrap();

    let caminho = storage.resolve(&upload.nome_final).unwrap();
    assert!(caminho.exists());

    storage.remove(&upload.nome_final).await;
    assert!(!caminho.exists());
}

#[tokio::test]
async fn remover_arquivo_ja_ausente_nao_e_erro() {
    let dir = TempDir::new().unwrap();
    let storage = AttachmentStorage::new(dir.path());

    // Não deve entrar em pânico nem propagar erro.
    storage.remove("11111111-1111-1111-1111-111111111111_sumiu.pdf").await;
}

#[tokio::test]
async fn init_cria_a_raiz_se_nao_existir() {
    let dir = TempDir::new().unwrap();
    let raiz = dir.path().join("uploads").join("convenios");
    let storage = AttachmentStorage::new(&raiz);

    storage.init().await.unwrap();
    assert!(raiz.is_dir());
}
