// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{AuditRepository, ConvenioRepository, UserRepository},
    services::{
        auth::AuthService, convenio_service::ConvenioService, mailer::Mailer,
        storage::AttachmentStorage, user_service::UserService,
    },
};

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub convenio_service: ConvenioService,
    pub audit_repo: AuditRepository,
    pub storage: AttachmentStorage,
}

impl AppState {
    // Carrega as configurações do ambiente e monta o gráfico de dependências.
    // Se a configuração falhar, a aplicação não deve iniciar.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let storage = AttachmentStorage::new(upload_dir);
        storage.init().await?;

        let mailer = Mailer::from_env();

        let user_repo = UserRepository::new(db_pool.clone());
        let convenio_repo = ConvenioRepository::new(db_pool.clone());
        let audit_repo = AuditRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo.clone(), jwt_secret.clone());
        let user_service =
            UserService::new(user_repo, audit_repo.clone(), db_pool.clone());
        let convenio_service = ConvenioService::new(
            convenio_repo,
            audit_repo.clone(),
            storage.clone(),
            mailer,
            db_pool.clone(),
        );

        Ok(Self {
            db_pool,
            jwt_secret,
            auth_service,
            user_service,
            convenio_service,
            audit_repo,
            storage,
        })
    }
}
