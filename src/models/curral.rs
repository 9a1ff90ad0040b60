// src/models/curral.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_sessao", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusSessao {
    Aberta,
    Encerrada,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "tipo_trabalho", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoTrabalho {
    PesagemRotina,
    VendaFrigorifico,
    VendaTerceiros,
    Iatf,
    Inventario,
    Conferencia,
    Entrada,
    Saida,
    #[default]
    ColetaDados,
    Outros,
}

impl TipoTrabalho {
    /// Nome amigável usado no título automático da sessão.
    pub fn descricao(&self) -> &'static str {
        match self {
            TipoTrabalho::PesagemRotina => "Pesagem de Rotina",
            TipoTrabalho::VendaFrigorifico => "Venda para Frigorífico",
            TipoTrabalho::VendaTerceiros => "Venda para Terceiros",
            TipoTrabalho::Iatf => "IATF",
            TipoTrabalho::Inventario => "Inventário de Animais",
            TipoTrabalho::Conferencia => "Conferência",
            TipoTrabalho::Entrada => "Entrada",
            TipoTrabalho::Saida => "Saída",
            TipoTrabalho::ColetaDados => "Coleta de Dados",
            TipoTrabalho::Outros => "Outros",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "tipo_evento_curral", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoEvento {
    Identificacao,
    Pesagem,
    TrocaBrinco,
    Reproducao,
    Diagnostico,
    Sanidade,
    Entrada,
    Saida,
    Apartacao,
    Outros,
}

impl TipoEvento {
    /// Eventos de movimentação coletiva podem ser registrados sem animal.
    pub fn exige_animal(&self) -> bool {
        !matches!(
            self,
            TipoEvento::Entrada | TipoEvento::Saida | TipoEvento::Outros
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "prenhez_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrenhezStatus {
    #[default]
    Desconhecido,
    Agendado,
    Prenha,
    NaoPrenha,
    Parto,
}

impl PrenhezStatus {
    pub fn descricao(&self) -> &'static str {
        match self {
            PrenhezStatus::Desconhecido => "Desconhecido",
            PrenhezStatus::Agendado => "Diagnóstico Agendado",
            PrenhezStatus::Prenha => "Prenha",
            // Na ficha do animal a operação fala em "Vazia".
            PrenhezStatus::NaoPrenha => "Vazia",
            PrenhezStatus::Parto => "Pariu Recentemente",
        }
    }
}

/// Sessão de manejo de curral: período de trabalho delimitado que agrupa
/// todos os eventos registrados. No máximo uma sessão `ABERTA` por
/// propriedade; `ENCERRADA` é terminal.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CurralSessao {
    pub id: Uuid,
    pub propriedade_id: Uuid,
    pub nome: String,
    pub tipo_trabalho: TipoTrabalho,
    pub quantidade_esperada: Option<i32>,
    pub nome_lote: Option<String>,
    pub pasto_origem: Option<String>,
    pub descricao: Option<String>,
    pub data_inicio: DateTime<Utc>,
    pub data_fim: Option<DateTime<Utc>>,
    pub status: StatusSessao,
    pub responsavel: Option<String>,
}

/// Evento registrado durante o manejo. Append-only: o estado do animal
/// (peso, status reprodutivo, lote) é derivado reproduzindo o log.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CurralEvento {
    pub id: Uuid,
    pub sessao_id: Uuid,
    pub animal_id: Option<Uuid>,
    pub tipo_evento: TipoEvento,
    pub data_evento: DateTime<Utc>,
    pub peso_kg: Option<Decimal>,
    pub brinco_anterior: Option<String>,
    pub brinco_novo: Option<String>,
    pub prenhez_status: PrenhezStatus,
    pub data_previsao_parto: Option<NaiveDate>,
    pub lote_destino: Option<String>,
    pub observacoes: Option<String>,
    pub responsavel: Option<String>,
}
