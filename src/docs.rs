// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Identificação ---
        handlers::identificacao::identificar,
        handlers::identificacao::identificar_post,

        // --- Sessões ---
        handlers::curral::abrir_sessao,
        handlers::curral::encerrar_sessao,
        handlers::curral::stats_sessao_ativa,

        // --- Eventos e Manejo ---
        handlers::curral::registrar_evento,
        handlers::curral::registrar_manejo,
        handlers::curral::historico_pesagens,
    ),
    components(
        schemas(
            models::animal::AnimalIndividual,
            models::animal::BrincoAnimal,
            models::animal::MovimentacaoIndividual,
            models::animal::Sexo,
            models::animal::StatusAnimal,
            models::animal::TipoBrinco,
            models::animal::StatusBrinco,
            models::animal::TipoMovimentacao,
            models::curral::CurralSessao,
            models::curral::CurralEvento,
            models::curral::StatusSessao,
            models::curral::TipoTrabalho,
            models::curral::TipoEvento,
            models::curral::PrenhezStatus,
            services::identificacao::FichaAnimal,
            services::identificacao::FichaBrinco,
            services::identificacao::CandidatoIdentificacao,
            services::identificacao::OrigemCandidato,
            services::identificacao::SituacaoBnd,
            services::identificacao::ResumoPesagem,
            services::cadastro::CadastroConcluido,
            services::cadastro::TrocaConcluida,
            services::curral::SessaoAberta,
            services::curral::SessaoEncerrada,
            services::curral::EstatisticasSessao,
            services::curral::ResumoEventos,
            services::curral::ResumoVendas,
            handlers::identificacao::IdentificarPayload,
            handlers::curral::AbrirSessaoPayload,
            handlers::curral::EncerrarSessaoPayload,
            handlers::curral::RegistrarEventoPayload,
            handlers::curral::ManejoPayload,
            handlers::curral::CadastroPayload,
            handlers::curral::TrocaBrincoPayload,
            handlers::curral::PesagemPayload,
        )
    ),
    tags(
        (name = "Identificação", description = "Leitura de códigos e desambiguação de animais"),
        (name = "Sessões", description = "Abertura, acompanhamento e encerramento de sessões de curral"),
        (name = "Eventos", description = "Registro de eventos de manejo e histórico de pesagens")
    ),
    info(
        title = "MONPEC Curral Inteligente",
        description = "API do fluxo de curral: identificação de animais, sessões de manejo e eventos."
    )
)]
pub struct ApiDoc;
