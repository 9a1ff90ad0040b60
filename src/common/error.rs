use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro central, com `thiserror` para melhor ergonomia.
// O corpo de resposta segue o contrato do Curral Inteligente:
// {"status": "erro", "mensagem": ...}
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Regras de negócio violadas (sexo não informado, peso inválido, etc.)
    #[error("{0}")]
    Regra(String),

    #[error("Código muito curto. Digite pelo menos 3 caracteres.")]
    CodigoMuitoCurto,

    #[error("{0}")]
    NaoEncontrado(String),

    #[error("Este brinco já está em uso por outro animal.")]
    BrincoJaEmUso,

    #[error("Esta sessão já está encerrada.")]
    SessaoJaEncerrada,

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado.
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, mensagem) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut detalhes = std::collections::HashMap::new();
                for (campo, erros_campo) in errors.field_errors() {
                    let mensagens: Vec<String> = erros_campo
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    detalhes.insert(campo.to_string(), mensagens);
                }
                let body = Json(json!({
                    "status": "erro",
                    "mensagem": "Um ou mais campos são inválidos.",
                    "detalhes": detalhes,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::Regra(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::CodigoMuitoCurto => (
                StatusCode::BAD_REQUEST,
                "Código muito curto. Digite pelo menos 3 caracteres.".to_string(),
            ),
            AppError::NaoEncontrado(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BrincoJaEmUso => (
                StatusCode::CONFLICT,
                "Este brinco já está em uso por outro animal.".to_string(),
            ),
            AppError::SessaoJaEncerrada => (
                StatusCode::BAD_REQUEST,
                "Esta sessão já está encerrada.".to_string(),
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro interno do servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Não foi possível concluir a operação.".to_string(),
                )
            }
        };

        let body = Json(json!({ "status": "erro", "mensagem": mensagem }));
        (status, body).into_response()
    }
}
