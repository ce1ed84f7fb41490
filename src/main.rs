//src/main.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;

use convenios_backend::{config::AppState, handlers, middleware::auth::auth_guard};

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Garante que o usuário 'admin' padrão exista
    let admin_password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "123456".to_string());
    app_state
        .user_service
        .ensure_admin(&admin_password)
        .await
        .expect("Falha ao provisionar o usuário 'admin'.");

    // Rotas públicas
    let public_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/login", post(handlers::auth::login));

    // Rotas protegidas pelo middleware de autenticação; a checagem de perfil
    // acontece dentro de cada handler.
    let protected_routes = Router::new()
        .route("/logout", get(handlers::auth::logout))
        .route("/convenios_api", get(handlers::convenios::list_convenios))
        .route("/convenio", post(handlers::convenios::create_convenio))
        .route(
            "/convenio/{id}",
            get(handlers::convenios::get_convenio)
                .patch(handlers::convenios::update_convenio)
                .post(handlers::convenios::update_convenio)
                .delete(handlers::convenios::delete_convenio),
        )
        .route(
            "/uploads/{filename}",
            get(handlers::convenios::download_arquivo),
        )
        .route(
            "/logs_auditoria_api",
            get(handlers::convenios::list_audit_logs),
        )
        .route("/register", post(handlers::users::register))
        .route("/users_api", get(handlers::users::list_users))
        .route("/users/diretores_api", get(handlers::users::list_diretores))
        .route(
            "/users/{id}",
            patch(handlers::users::update_user).delete(handlers::users::delete_user),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal; o termo em PDF pode chegar a 16 MB
    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:8080";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
