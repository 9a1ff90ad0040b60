//src/main.rs

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod services;

use crate::config::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é correto aqui: se a configuração falhar, a aplicação não
    // deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas do Curral Inteligente, aninhadas por propriedade.
    let curral_routes = Router::new()
        .route(
            "/identificar",
            get(handlers::identificacao::identificar)
                .post(handlers::identificacao::identificar_post),
        )
        .route("/manejos", post(handlers::curral::registrar_manejo))
        .route("/sessoes", post(handlers::curral::abrir_sessao))
        .route("/sessoes/encerrar", post(handlers::curral::encerrar_sessao))
        .route(
            "/sessoes/ativa/stats",
            get(handlers::curral::stats_sessao_ativa),
        )
        .route(
            "/sessoes/{sessao_id}/eventos",
            post(handlers::curral::registrar_evento),
        )
        .route(
            "/animais/{animal_id}/pesagens",
            get(handlers::curral::historico_pesagens),
        );

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/propriedades/{propriedade_id}/curral", curral_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
