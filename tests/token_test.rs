//! Teste de integração da emissão e validação de JWT.
//!
//! O token é emitido e decodificado localmente com o mesmo segredo HS256 que
//! o servidor usaria. Não precisa de servidor nem de banco rodando.
//!
//! Rode com: `cargo test --test token_test`

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};

use convenios_backend::common::error::AppError;
use convenios_backend::models::user::Claims;
use convenios_backend::services::auth::{decode_claims, issue_token};

// Um segredo falso para testes — nunca use o real em testes versionados.
const TEST_SECRET: &str = "segredo-de-teste-com-tamanho-suficiente-para-hs256-xxxx";

#[test]
fn token_emitido_decodifica_para_o_mesmo_usuario() {
    let token = issue_token(42, TEST_SECRET).expect("emissão deveria funcionar");

    let claims = decode_claims(&token, TEST_SECRET).expect("token deveria ser válido");

    assert_eq!(claims.sub, 42);
    assert!(claims.iat <= claims.exp);
    // Expira em 7 dias.
    assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
}

#[test]
fn segredo_errado_e_rejeitado() {
    let token = issue_token(1, TEST_SECRET).unwrap();

    let resultado = decode_claims(&token, "outro-segredo-completamente-diferente-xxxxxxxxxx");
    assert!(matches!(resultado, Err(AppError::InvalidToken)));
}

#[test]
fn token_expirado_e_rejeitado() {
    let agora = Utc::now().timestamp() as usize;

    // Expirou há 5 minutos (bem além da tolerância padrão de 60s).
    let claims = Claims {
        sub: 7,
        exp: agora - 300,
        iat: agora - 3600,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_ref()),
    )
    .unwrap();

    let resultado = decode_claims(&token, TEST_SECRET);
    assert!(matches!(resultado, Err(AppError::InvalidToken)));
}

#[test]
fn token_lixo_e_rejeitado() {
    let resultado = decode_claims("nao.e.um.jwt", TEST_SECRET);
    assert!(matches!(resultado, Err(AppError::InvalidToken)));
}
