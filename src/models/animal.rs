// src/models/animal.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sexo_animal")]
pub enum Sexo {
    F,
    M,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_animal", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusAnimal {
    Ativo,
    Vendido,
    Morto,
    Transferido,
    Desaparecido,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_brinco", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoBrinco {
    Visual,
    Eletronico,
    Botton,
    Bolinha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_brinco", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusBrinco {
    Disponivel,
    EmUso,
    Danificado,
    Perdido,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_movimentacao", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoMovimentacao {
    Nascimento,
    Compra,
    Venda,
    TransferenciaEntrada,
    TransferenciaSaida,
    Morte,
    Outros,
}

impl Sexo {
    pub fn descricao(&self) -> &'static str {
        match self {
            Sexo::F => "Fêmea",
            Sexo::M => "Macho",
        }
    }
}

impl StatusAnimal {
    pub fn descricao(&self) -> &'static str {
        match self {
            StatusAnimal::Ativo => "Ativo",
            StatusAnimal::Vendido => "Vendido",
            StatusAnimal::Morto => "Morto",
            StatusAnimal::Transferido => "Transferido",
            StatusAnimal::Desaparecido => "Desaparecido",
        }
    }
}

impl TipoBrinco {
    pub fn descricao(&self) -> &'static str {
        match self {
            TipoBrinco::Visual => "Visual",
            TipoBrinco::Eletronico => "Eletrônico",
            TipoBrinco::Botton => "Botton",
            TipoBrinco::Bolinha => "Bolinha",
        }
    }
}

impl StatusBrinco {
    pub fn descricao(&self) -> &'static str {
        match self {
            StatusBrinco::Disponivel => "Disponível",
            StatusBrinco::EmUso => "Em uso",
            StatusBrinco::Danificado => "Danificado",
            StatusBrinco::Perdido => "Perdido",
        }
    }
}

impl TipoMovimentacao {
    pub fn descricao(&self) -> &'static str {
        match self {
            TipoMovimentacao::Nascimento => "Nascimento",
            TipoMovimentacao::Compra => "Compra",
            TipoMovimentacao::Venda => "Venda",
            TipoMovimentacao::TransferenciaEntrada => "Transferência (entrada)",
            TipoMovimentacao::TransferenciaSaida => "Transferência (saída)",
            TipoMovimentacao::Morte => "Morte",
            TipoMovimentacao::Outros => "Outros",
        }
    }
}

/// Animal identificado individualmente conforme o PNIB.
///
/// Os quatro identificadores (brinco visual, SISBOV, RFID e número de manejo)
/// alimentam o casamento de códigos do Curral Inteligente. O SISBOV, quando
/// presente, é único e é o desambiguador autoritativo.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AnimalIndividual {
    pub id: Uuid,
    pub propriedade_id: Uuid,
    pub numero_brinco: String,
    pub codigo_sisbov: Option<String>,
    // Normalmente as posições 8-13 do código SISBOV de 15 dígitos.
    pub numero_manejo: Option<String>,
    pub codigo_eletronico: Option<String>,
    pub tipo_brinco: TipoBrinco,
    pub sexo: Sexo,
    pub raca: Option<String>,
    pub categoria: Option<String>,
    pub data_nascimento: Option<NaiveDate>,
    pub data_identificacao: Option<NaiveDate>,
    // Cache oportunista: a fonte de verdade são os eventos de PESAGEM.
    pub peso_atual_kg: Option<Decimal>,
    pub status: StatusAnimal,
    pub observacoes: Option<String>,
    pub criado_em: DateTime<Utc>,
    pub atualizado_em: DateTime<Utc>,
}

/// Brinco ainda não aplicado a um animal (estoque da propriedade).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BrincoAnimal {
    pub id: Uuid,
    pub propriedade_id: Uuid,
    pub numero_brinco: String,
    pub codigo_rfid: Option<String>,
    pub tipo_brinco: TipoBrinco,
    pub status: StatusBrinco,
    pub animal_id: Option<Uuid>,
    pub codigo_lote: Option<String>,
    pub fornecedor: Option<String>,
    pub data_aquisicao: Option<NaiveDate>,
    pub data_utilizacao: Option<NaiveDate>,
    pub data_descarte: Option<NaiveDate>,
    pub status_motivo: Option<String>,
    pub criado_em: DateTime<Utc>,
    pub atualizado_em: DateTime<Utc>,
}

/// Lançamento do livro-razão de vida do animal. Criado uma vez por evento
/// (nascimento, compra, venda, ...) e nunca alterado.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MovimentacaoIndividual {
    pub id: Uuid,
    pub animal_id: Uuid,
    pub tipo_movimentacao: TipoMovimentacao,
    pub data_movimentacao: NaiveDate,
    pub propriedade_origem_id: Option<Uuid>,
    pub propriedade_destino_id: Option<Uuid>,
    pub categoria_anterior: Option<String>,
    pub peso_kg: Option<Decimal>,
    pub valor: Option<Decimal>,
    pub observacoes: Option<String>,
    pub motivo_detalhado: Option<String>,
    pub responsavel: Option<String>,
    pub criado_em: DateTime<Utc>,
}
