// src/config.rs

use crate::{
    db::{AnimalRepository, CurralRepository},
    services::{
        cadastro::CadastroService, curral::CurralService, identificacao::IdentificacaoService,
    },
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub identificacao_service: IdentificacaoService,
    pub cadastro_service: CadastroService,
    pub curral_service: CurralService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let animal_repo = AnimalRepository::new(db_pool.clone());
        let curral_repo = CurralRepository::new(db_pool.clone());

        let identificacao_service =
            IdentificacaoService::new(animal_repo.clone(), curral_repo.clone());
        let cadastro_service = CadastroService::new(db_pool.clone(), animal_repo.clone());
        let curral_service = CurralService::new(db_pool.clone(), animal_repo, curral_repo);

        Ok(Self {
            db_pool,
            identificacao_service,
            cadastro_service,
            curral_service,
        })
    }
}
