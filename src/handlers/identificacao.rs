// src/handlers/identificacao.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    services::identificacao::{FichaAnimal, Identificacao},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct IdentificarParams {
    /// Código lido pelo bastão ou digitado (SISBOV, manejo ou RFID).
    pub codigo: Option<String>,
    /// Animal já escolhido no modal de duplicidade.
    pub animal_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct IdentificarPayload {
    pub codigo: Option<String>,
    pub animal_id: Option<Uuid>,
}

/// A identificação não é um erro de aplicação: duplicidade e não-encontrado
/// são resultados esperados do fluxo, com seus próprios status HTTP.
fn responder(identificacao: Identificacao) -> impl IntoResponse {
    match identificacao {
        Identificacao::Animal(ficha) => (
            StatusCode::OK,
            Json(json!({
                "status": "sucesso",
                "tipo": "ANIMAL",
                "animal": *ficha,
            })),
        ),
        Identificacao::Estoque(brinco) => (
            StatusCode::OK,
            Json(json!({
                "status": "sucesso",
                "tipo": "BRINCO_ESTOQUE",
                "brinco": brinco,
            })),
        ),
        Identificacao::Duplicidade {
            codigo_lido,
            candidatos,
            mensagem,
        } => (
            StatusCode::CONFLICT,
            Json(json!({
                "status": "duplicidade",
                "mensagem": mensagem,
                "codigo_lido": codigo_lido,
                "candidatos": candidatos,
            })),
        ),
        Identificacao::NaoEncontrado {
            codigo_consultado,
            mensagem,
            consta_bnd,
            situacao_bnd,
        } => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "status": "nao_encontrado",
                "mensagem": mensagem,
                "codigo_consultado": codigo_consultado,
                "consta_bnd": consta_bnd,
                "situacao_bnd": situacao_bnd,
            })),
        ),
    }
}

#[utoipa::path(
    get,
    path = "/api/propriedades/{propriedade_id}/curral/identificar",
    params(
        ("propriedade_id" = Uuid, Path, description = "Propriedade dona do rebanho"),
        IdentificarParams
    ),
    responses(
        (status = 200, description = "Animal do rebanho ou brinco de estoque identificado", body = FichaAnimal),
        (status = 400, description = "Código ausente ou curto demais"),
        (status = 404, description = "Código não encontrado no rebanho nem no estoque"),
        (status = 409, description = "Mais de um candidato; o operador deve escolher pelo SISBOV")
    ),
    tag = "Identificação"
)]
pub async fn identificar(
    State(app_state): State<AppState>,
    Path(propriedade_id): Path<Uuid>,
    Query(params): Query<IdentificarParams>,
) -> Result<impl IntoResponse, AppError> {
    let resultado = app_state
        .identificacao_service
        .identificar(propriedade_id, params.codigo.as_deref(), params.animal_id)
        .await?;
    Ok(responder(resultado))
}

#[utoipa::path(
    post,
    path = "/api/propriedades/{propriedade_id}/curral/identificar",
    params(("propriedade_id" = Uuid, Path, description = "Propriedade dona do rebanho")),
    request_body = IdentificarPayload,
    responses(
        (status = 200, description = "Animal do rebanho ou brinco de estoque identificado"),
        (status = 404, description = "Código não encontrado"),
        (status = 409, description = "Duplicidade de candidatos")
    ),
    tag = "Identificação"
)]
pub async fn identificar_post(
    State(app_state): State<AppState>,
    Path(propriedade_id): Path<Uuid>,
    Json(payload): Json<IdentificarPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let resultado = app_state
        .identificacao_service
        .identificar(propriedade_id, payload.codigo.as_deref(), payload.animal_id)
        .await?;
    Ok(responder(resultado))
}
