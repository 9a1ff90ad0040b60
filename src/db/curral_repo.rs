// src/db/curral_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::curral::{CurralEvento, CurralSessao, PrenhezStatus, TipoEvento, TipoTrabalho},
};

pub struct NovaSessao {
    pub propriedade_id: Uuid,
    pub nome: String,
    pub tipo_trabalho: TipoTrabalho,
    pub quantidade_esperada: Option<i32>,
    pub nome_lote: Option<String>,
    pub pasto_origem: Option<String>,
    pub descricao: Option<String>,
    pub responsavel: Option<String>,
}

pub struct NovoEvento {
    pub sessao_id: Uuid,
    pub animal_id: Option<Uuid>,
    pub tipo_evento: TipoEvento,
    pub peso_kg: Option<Decimal>,
    pub brinco_anterior: Option<String>,
    pub brinco_novo: Option<String>,
    pub prenhez_status: PrenhezStatus,
    pub data_previsao_parto: Option<NaiveDate>,
    pub lote_destino: Option<String>,
    pub observacoes: Option<String>,
    pub responsavel: Option<String>,
}

// O repositório de sessões e eventos de curral.
#[derive(Clone)]
pub struct CurralRepository {
    pool: PgPool,
}

impl CurralRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn sessao_ativa(
        &self,
        propriedade_id: Uuid,
    ) -> Result<Option<CurralSessao>, AppError> {
        let sessao = sqlx::query_as::<_, CurralSessao>(
            r#"
            SELECT * FROM curral_sessoes
            WHERE propriedade_id = $1 AND status = 'ABERTA'
            ORDER BY data_inicio DESC
            LIMIT 1
            "#,
        )
        .bind(propriedade_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sessao)
    }

    pub async fn sessao_por_id(
        &self,
        propriedade_id: Uuid,
        sessao_id: Uuid,
    ) -> Result<Option<CurralSessao>, AppError> {
        let sessao = sqlx::query_as::<_, CurralSessao>(
            "SELECT * FROM curral_sessoes WHERE id = $1 AND propriedade_id = $2",
        )
        .bind(sessao_id)
        .bind(propriedade_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sessao)
    }

    pub async fn eventos_da_sessao(&self, sessao_id: Uuid) -> Result<Vec<CurralEvento>, AppError> {
        let eventos = sqlx::query_as::<_, CurralEvento>(
            "SELECT * FROM curral_eventos WHERE sessao_id = $1 ORDER BY data_evento",
        )
        .bind(sessao_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(eventos)
    }

    /// Pesagens mais recentes do animal (fonte do histórico da ficha).
    pub async fn pesagens_do_animal(
        &self,
        animal_id: Uuid,
        limite: i64,
    ) -> Result<Vec<CurralEvento>, AppError> {
        let eventos = sqlx::query_as::<_, CurralEvento>(
            r#"
            SELECT * FROM curral_eventos
            WHERE animal_id = $1 AND tipo_evento = 'PESAGEM'
            ORDER BY data_evento DESC
            LIMIT $2
            "#,
        )
        .bind(animal_id)
        .bind(limite)
        .fetch_all(&self.pool)
        .await?;
        Ok(eventos)
    }

    /// Evento mais recente com diagnóstico de prenhez conhecido.
    pub async fn ultimo_evento_prenhez(
        &self,
        animal_id: Uuid,
    ) -> Result<Option<CurralEvento>, AppError> {
        let evento = sqlx::query_as::<_, CurralEvento>(
            r#"
            SELECT * FROM curral_eventos
            WHERE animal_id = $1 AND prenhez_status <> 'DESCONHECIDO'
            ORDER BY data_evento DESC
            LIMIT 1
            "#,
        )
        .bind(animal_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(evento)
    }

    /// Lote atual do animal, derivado do último evento de apartação.
    pub async fn ultimo_lote_destino(&self, animal_id: Uuid) -> Result<Option<String>, AppError> {
        let lote = sqlx::query_scalar::<_, String>(
            r#"
            SELECT lote_destino FROM curral_eventos
            WHERE animal_id = $1
              AND tipo_evento = 'APARTACAO'
              AND lote_destino IS NOT NULL
            ORDER BY data_evento DESC
            LIMIT 1
            "#,
        )
        .bind(animal_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lote)
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---

    /// Encerra todas as sessões abertas da propriedade. Mantém o invariante
    /// de no máximo uma sessão aberta ao criar uma nova.
    pub async fn encerrar_sessoes_abertas<'e, E>(
        &self,
        executor: E,
        propriedade_id: Uuid,
        data_fim: DateTime<Utc>,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let resultado = sqlx::query(
            r#"
            UPDATE curral_sessoes
            SET status = 'ENCERRADA', data_fim = $2
            WHERE propriedade_id = $1 AND status = 'ABERTA'
            "#,
        )
        .bind(propriedade_id)
        .bind(data_fim)
        .execute(executor)
        .await?;
        Ok(resultado.rows_affected())
    }

    pub async fn criar_sessao<'e, E>(
        &self,
        executor: E,
        nova: NovaSessao,
    ) -> Result<CurralSessao, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sessao = sqlx::query_as::<_, CurralSessao>(
            r#"
            INSERT INTO curral_sessoes
                (propriedade_id, nome, tipo_trabalho, quantidade_esperada,
                 nome_lote, pasto_origem, descricao, responsavel)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(nova.propriedade_id)
        .bind(&nova.nome)
        .bind(nova.tipo_trabalho)
        .bind(nova.quantidade_esperada)
        .bind(&nova.nome_lote)
        .bind(&nova.pasto_origem)
        .bind(&nova.descricao)
        .bind(&nova.responsavel)
        .fetch_one(executor)
        .await?;
        Ok(sessao)
    }

    pub async fn encerrar_sessao<'e, E>(
        &self,
        executor: E,
        sessao_id: Uuid,
        data_fim: DateTime<Utc>,
    ) -> Result<CurralSessao, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sessao = sqlx::query_as::<_, CurralSessao>(
            r#"
            UPDATE curral_sessoes
            SET status = 'ENCERRADA', data_fim = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(sessao_id)
        .bind(data_fim)
        .fetch_one(executor)
        .await?;
        Ok(sessao)
    }

    pub async fn criar_evento<'e, E>(
        &self,
        executor: E,
        novo: NovoEvento,
    ) -> Result<CurralEvento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let evento = sqlx::query_as::<_, CurralEvento>(
            r#"
            INSERT INTO curral_eventos
                (sessao_id, animal_id, tipo_evento, peso_kg, brinco_anterior,
                 brinco_novo, prenhez_status, data_previsao_parto, lote_destino,
                 observacoes, responsavel)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(novo.sessao_id)
        .bind(novo.animal_id)
        .bind(novo.tipo_evento)
        .bind(novo.peso_kg)
        .bind(&novo.brinco_anterior)
        .bind(&novo.brinco_novo)
        .bind(novo.prenhez_status)
        .bind(novo.data_previsao_parto)
        .bind(&novo.lote_destino)
        .bind(&novo.observacoes)
        .bind(&novo.responsavel)
        .fetch_one(executor)
        .await?;
        Ok(evento)
    }
}
