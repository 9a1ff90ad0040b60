// src/handlers/curral.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        animal::Sexo,
        curral::{PrenhezStatus, TipoEvento, TipoTrabalho},
    },
    services::{
        cadastro::{CadastroAnimal, TrocaBrinco},
        curral::{AberturaSessao, EstatisticasSessao, RegistroEvento, SessaoAberta, SessaoEncerrada},
    },
};

// ---
// Payloads
// ---

/// O front envia o tipo como texto livre; valores desconhecidos caem no
/// padrão COLETA_DADOS em vez de derrubar a requisição.
fn tipo_trabalho_ou_padrao<'de, D>(deserializer: D) -> Result<TipoTrabalho, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let bruto = Option::<String>::deserialize(deserializer)?;
    Ok(bruto
        .and_then(|tipo| serde_json::from_value(serde_json::Value::String(tipo)).ok())
        .unwrap_or_default())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AbrirSessaoPayload {
    #[serde(default, deserialize_with = "tipo_trabalho_ou_padrao")]
    pub tipo_trabalho: TipoTrabalho,
    #[validate(length(max = 200, message = "O nome da sessão é longo demais."))]
    pub nome: Option<String>,
    pub quantidade_esperada: Option<i32>,
    pub nome_lote: Option<String>,
    pub pasto_origem: Option<String>,
    pub descricao: Option<String>,
    pub responsavel: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EncerrarSessaoPayload {
    /// Quando omitido, encerra a sessão ativa da propriedade.
    pub sessao_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegistrarEventoPayload {
    pub animal_id: Option<Uuid>,
    pub tipo_evento: TipoEvento,
    pub peso_kg: Option<Decimal>,
    pub brinco_anterior: Option<String>,
    pub brinco_novo: Option<String>,
    pub prenhez_status: Option<PrenhezStatus>,
    pub data_previsao_parto: Option<NaiveDate>,
    pub lote_destino: Option<String>,
    pub observacoes: Option<String>,
    pub responsavel: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CadastroPayload {
    #[validate(length(min = 3, message = "Informe o código do brinco/SISBOV."))]
    pub codigo: String,
    pub brinco_id: Option<Uuid>,
    pub sexo: Option<Sexo>,
    pub raca: Option<String>,
    pub categoria: Option<String>,
    pub data_nascimento: Option<NaiveDate>,
    pub peso_kg: Option<Decimal>,
    pub origem: Option<String>,
    pub observacoes: Option<String>,
    pub responsavel: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TrocaBrincoPayload {
    #[validate(length(min = 1, message = "Informe o código do animal."))]
    pub codigo_animal: String,
    #[validate(length(min = 1, message = "Informe o código do brinco novo."))]
    pub codigo_novo: String,
    pub motivo: Option<String>,
    pub responsavel: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PesagemPayload {
    /// Animal já escolhido no modal de duplicidade; dispensa o código.
    pub animal_id: Option<Uuid>,
    pub codigo: Option<String>,
    pub peso_kg: Decimal,
    pub observacoes: Option<String>,
    pub responsavel: Option<String>,
}

/// Envelope do fluxo de manejo: o front envia exatamente um dos blocos e o
/// handler despacha para o serviço correspondente.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ManejoPayload {
    pub cadastro: Option<CadastroPayload>,
    pub troca_brinco: Option<TrocaBrincoPayload>,
    pub pesagem: Option<PesagemPayload>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoricoParams {
    /// Quantidade máxima de pesagens (padrão 10).
    pub limite: Option<i64>,
}

// ---
// Handlers: Sessões
// ---

#[utoipa::path(
    post,
    path = "/api/propriedades/{propriedade_id}/curral/sessoes",
    params(("propriedade_id" = Uuid, Path, description = "Propriedade")),
    request_body = AbrirSessaoPayload,
    responses(
        (status = 201, description = "Sessão aberta", body = SessaoAberta),
        (status = 400, description = "Payload inválido")
    ),
    tag = "Sessões"
)]
pub async fn abrir_sessao(
    State(app_state): State<AppState>,
    Path(propriedade_id): Path<Uuid>,
    Json(payload): Json<AbrirSessaoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let aberta = app_state
        .curral_service
        .abrir_sessao(
            propriedade_id,
            AberturaSessao {
                tipo_trabalho: payload.tipo_trabalho,
                nome: payload.nome,
                quantidade_esperada: payload.quantidade_esperada,
                nome_lote: payload.nome_lote,
                pasto_origem: payload.pasto_origem,
                descricao: payload.descricao,
                responsavel: payload.responsavel,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(aberta)))
}

#[utoipa::path(
    post,
    path = "/api/propriedades/{propriedade_id}/curral/sessoes/encerrar",
    params(("propriedade_id" = Uuid, Path, description = "Propriedade")),
    request_body = EncerrarSessaoPayload,
    responses(
        (status = 200, description = "Sessão encerrada, com estatísticas e vendas geradas", body = SessaoEncerrada),
        (status = 400, description = "Sessão já encerrada"),
        (status = 404, description = "Nenhuma sessão ativa")
    ),
    tag = "Sessões"
)]
pub async fn encerrar_sessao(
    State(app_state): State<AppState>,
    Path(propriedade_id): Path<Uuid>,
    Json(payload): Json<EncerrarSessaoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let encerrada = app_state
        .curral_service
        .encerrar_sessao(propriedade_id, payload.sessao_id)
        .await?;
    Ok((StatusCode::OK, Json(encerrada)))
}

#[utoipa::path(
    get,
    path = "/api/propriedades/{propriedade_id}/curral/sessoes/ativa/stats",
    params(("propriedade_id" = Uuid, Path, description = "Propriedade")),
    responses(
        (status = 200, description = "Estatísticas da sessão ativa", body = EstatisticasSessao),
        (status = 404, description = "Nenhuma sessão ativa")
    ),
    tag = "Sessões"
)]
pub async fn stats_sessao_ativa(
    State(app_state): State<AppState>,
    Path(propriedade_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let estatisticas = app_state
        .curral_service
        .estatisticas_sessao_ativa(propriedade_id)
        .await?;
    Ok((StatusCode::OK, Json(estatisticas)))
}

// ---
// Handlers: Eventos e Manejo
// ---

#[utoipa::path(
    post,
    path = "/api/propriedades/{propriedade_id}/curral/sessoes/{sessao_id}/eventos",
    params(
        ("propriedade_id" = Uuid, Path, description = "Propriedade"),
        ("sessao_id" = Uuid, Path, description = "Sessão de destino")
    ),
    request_body = RegistrarEventoPayload,
    responses(
        (status = 201, description = "Evento registrado"),
        (status = 400, description = "Evento exige animal ou sessão já encerrada"),
        (status = 404, description = "Sessão ou animal não encontrado")
    ),
    tag = "Eventos"
)]
pub async fn registrar_evento(
    State(app_state): State<AppState>,
    Path((propriedade_id, sessao_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<RegistrarEventoPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let evento = app_state
        .curral_service
        .registrar_evento(
            propriedade_id,
            RegistroEvento {
                sessao_id: Some(sessao_id),
                animal_id: payload.animal_id,
                tipo_evento: payload.tipo_evento,
                peso_kg: payload.peso_kg,
                brinco_anterior: payload.brinco_anterior,
                brinco_novo: payload.brinco_novo,
                prenhez_status: payload.prenhez_status,
                data_previsao_parto: payload.data_previsao_parto,
                lote_destino: payload.lote_destino,
                observacoes: payload.observacoes,
                responsavel: payload.responsavel,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "sucesso", "evento": evento })),
    ))
}

#[utoipa::path(
    post,
    path = "/api/propriedades/{propriedade_id}/curral/manejos",
    params(("propriedade_id" = Uuid, Path, description = "Propriedade")),
    request_body = ManejoPayload,
    responses(
        (status = 200, description = "Manejo executado"),
        (status = 400, description = "Fluxo não reconhecido ou payload inválido"),
        (status = 404, description = "Animal ou brinco não encontrado"),
        (status = 409, description = "Brinco já em uso")
    ),
    tag = "Eventos"
)]
pub async fn registrar_manejo(
    State(app_state): State<AppState>,
    Path(propriedade_id): Path<Uuid>,
    Json(payload): Json<ManejoPayload>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cadastro) = payload.cadastro {
        cadastro.validate()?;
        let concluido = app_state
            .cadastro_service
            .cadastrar_do_estoque(
                propriedade_id,
                CadastroAnimal {
                    codigo: cadastro.codigo,
                    brinco_id: cadastro.brinco_id,
                    sexo: cadastro.sexo,
                    raca: cadastro.raca,
                    categoria: cadastro.categoria,
                    data_nascimento: cadastro.data_nascimento,
                    peso_kg: cadastro.peso_kg,
                    origem: cadastro.origem,
                    observacoes: cadastro.observacoes,
                    responsavel: cadastro.responsavel,
                },
            )
            .await?;
        return Ok((
            StatusCode::CREATED,
            Json(json!({ "status": "sucesso", "cadastro": concluido })),
        ));
    }

    if let Some(troca) = payload.troca_brinco {
        troca.validate()?;
        let concluida = app_state
            .cadastro_service
            .trocar_brinco(
                propriedade_id,
                TrocaBrinco {
                    codigo_animal: troca.codigo_animal,
                    codigo_novo: troca.codigo_novo,
                    motivo: troca.motivo,
                    responsavel: troca.responsavel,
                },
            )
            .await?;
        return Ok((
            StatusCode::OK,
            Json(json!({ "status": "sucesso", "troca": concluida })),
        ));
    }

    if let Some(pesagem) = payload.pesagem {
        pesagem.validate()?;
        let evento = app_state
            .curral_service
            .registrar_pesagem(
                propriedade_id,
                pesagem.animal_id,
                pesagem.codigo.as_deref(),
                pesagem.peso_kg,
                pesagem.observacoes,
                pesagem.responsavel,
            )
            .await?;
        return Ok((
            StatusCode::OK,
            Json(json!({ "status": "sucesso", "evento": evento })),
        ));
    }

    Err(AppError::Regra(
        "Fluxo de manejo não reconhecido. Atualize a página e tente novamente.".to_string(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/propriedades/{propriedade_id}/curral/animais/{animal_id}/pesagens",
    params(
        ("propriedade_id" = Uuid, Path, description = "Propriedade"),
        ("animal_id" = Uuid, Path, description = "Animal"),
        HistoricoParams
    ),
    responses(
        (status = 200, description = "Histórico de pesagens do animal"),
        (status = 404, description = "Animal não encontrado")
    ),
    tag = "Eventos"
)]
pub async fn historico_pesagens(
    State(app_state): State<AppState>,
    Path((propriedade_id, animal_id)): Path<(Uuid, Uuid)>,
    Query(params): Query<HistoricoParams>,
) -> Result<impl IntoResponse, AppError> {
    let limite = params.limite.unwrap_or(10).clamp(1, 100);
    let pesagens = app_state
        .curral_service
        .historico_pesagens(propriedade_id, animal_id, limite)
        .await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "status": "sucesso", "pesagens": pesagens })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tipo_de_trabalho_desconhecido_cai_no_padrao() {
        let payload: AbrirSessaoPayload =
            serde_json::from_value(json!({ "tipo_trabalho": "TIPO_INVALIDO" })).unwrap();
        assert_eq!(payload.tipo_trabalho, TipoTrabalho::ColetaDados);

        let payload: AbrirSessaoPayload =
            serde_json::from_value(json!({ "tipo_trabalho": null })).unwrap();
        assert_eq!(payload.tipo_trabalho, TipoTrabalho::ColetaDados);

        let payload: AbrirSessaoPayload = serde_json::from_value(json!({})).unwrap();
        assert_eq!(payload.tipo_trabalho, TipoTrabalho::ColetaDados);
    }

    #[test]
    fn tipo_de_trabalho_valido_e_respeitado() {
        let payload: AbrirSessaoPayload =
            serde_json::from_value(json!({ "tipo_trabalho": "VENDA_FRIGORIFICO" })).unwrap();
        assert_eq!(payload.tipo_trabalho, TipoTrabalho::VendaFrigorifico);
    }

    #[test]
    fn pesagem_aceita_animal_escolhido_na_duplicidade_sem_codigo() {
        let escolhido = Uuid::new_v4();
        let payload: PesagemPayload = serde_json::from_value(json!({
            "animal_id": escolhido.to_string(),
            "peso_kg": 350.5,
        }))
        .unwrap();
        assert_eq!(payload.animal_id, Some(escolhido));
        assert!(payload.codigo.is_none());
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn encerrar_sessao_sem_id_passa_na_validacao() {
        let payload: EncerrarSessaoPayload = serde_json::from_value(json!({})).unwrap();
        assert!(payload.sessao_id.is_none());
        assert!(payload.validate().is_ok());
    }
}
