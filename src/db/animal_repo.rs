// src/db/animal_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::animal::{
        AnimalIndividual, BrincoAnimal, MovimentacaoIndividual, Sexo, StatusAnimal, StatusBrinco,
        TipoBrinco, TipoMovimentacao,
    },
};

/// Dados para inserção de um animal recém-identificado.
pub struct NovoAnimal {
    pub propriedade_id: Uuid,
    pub numero_brinco: String,
    pub codigo_sisbov: Option<String>,
    pub numero_manejo: Option<String>,
    pub codigo_eletronico: Option<String>,
    pub tipo_brinco: TipoBrinco,
    pub sexo: Sexo,
    pub raca: Option<String>,
    pub categoria: Option<String>,
    pub data_nascimento: Option<NaiveDate>,
    pub data_identificacao: NaiveDate,
    pub peso_atual_kg: Option<Decimal>,
    pub observacoes: Option<String>,
}

pub struct NovaMovimentacao {
    pub animal_id: Uuid,
    pub tipo_movimentacao: TipoMovimentacao,
    pub data_movimentacao: NaiveDate,
    pub propriedade_origem_id: Option<Uuid>,
    pub categoria_anterior: Option<String>,
    pub peso_kg: Option<Decimal>,
    pub observacoes: Option<String>,
    pub motivo_detalhado: Option<String>,
    pub responsavel: Option<String>,
}

// O repositório de animais, brincos de estoque e movimentações.
#[derive(Clone)]
pub struct AnimalRepository {
    pool: PgPool,
}

impl AnimalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura" (Getters)
    // ---
    // Funções de leitura são simples e usam a pool principal.

    /// Rebanho completo da propriedade, para o casamento de códigos em memória.
    pub async fn listar_por_propriedade(
        &self,
        propriedade_id: Uuid,
    ) -> Result<Vec<AnimalIndividual>, AppError> {
        let animais = sqlx::query_as::<_, AnimalIndividual>(
            "SELECT * FROM animais_individuais WHERE propriedade_id = $1 ORDER BY numero_brinco",
        )
        .bind(propriedade_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(animais)
    }

    pub async fn buscar_por_id(
        &self,
        propriedade_id: Uuid,
        animal_id: Uuid,
    ) -> Result<Option<AnimalIndividual>, AppError> {
        let animal = sqlx::query_as::<_, AnimalIndividual>(
            "SELECT * FROM animais_individuais WHERE id = $1 AND propriedade_id = $2",
        )
        .bind(animal_id)
        .bind(propriedade_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(animal)
    }

    /// Casamento exato pelos quatro identificadores (fluxo de pesagem rápida).
    pub async fn buscar_por_codigo_exato(
        &self,
        propriedade_id: Uuid,
        codigo: &str,
    ) -> Result<Option<AnimalIndividual>, AppError> {
        let animal = sqlx::query_as::<_, AnimalIndividual>(
            r#"
            SELECT * FROM animais_individuais
            WHERE propriedade_id = $1
              AND (codigo_sisbov = $2 OR numero_brinco = $2
                   OR codigo_eletronico = $2 OR numero_manejo = $2)
            "#,
        )
        .bind(propriedade_id)
        .bind(codigo)
        .fetch_optional(&self.pool)
        .await?;
        Ok(animal)
    }

    /// Brincos do estoque que ainda não estão aplicados a nenhum animal.
    pub async fn listar_estoque_disponivel(
        &self,
        propriedade_id: Uuid,
    ) -> Result<Vec<BrincoAnimal>, AppError> {
        let brincos = sqlx::query_as::<_, BrincoAnimal>(
            r#"
            SELECT * FROM brincos_estoque
            WHERE propriedade_id = $1 AND status <> 'EM_USO'
            ORDER BY numero_brinco
            "#,
        )
        .bind(propriedade_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(brincos)
    }

    pub async fn existe_animal_com_sisbov(&self, codigo: &str) -> Result<bool, AppError> {
        let existe = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM animais_individuais
                WHERE numero_brinco = $1 OR codigo_sisbov = $1
            )
            "#,
        )
        .bind(codigo)
        .fetch_one(&self.pool)
        .await?;
        Ok(existe)
    }

    pub async fn primeira_movimentacao(
        &self,
        animal_id: Uuid,
    ) -> Result<Option<MovimentacaoIndividual>, AppError> {
        let movimentacao = sqlx::query_as::<_, MovimentacaoIndividual>(
            r#"
            SELECT * FROM movimentacoes_individuais
            WHERE animal_id = $1
            ORDER BY data_movimentacao, criado_em
            LIMIT 1
            "#,
        )
        .bind(animal_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(movimentacao)
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---
    // Estas usam o padrão genérico 'Executor' para rodar dentro de uma transação.

    /// Trava a linha do brinco para a reivindicação. É este lock que garante
    /// que um duplo clique resulte em um sucesso e um "brinco já em uso".
    pub async fn brinco_para_atualizacao<'e, E>(
        &self,
        executor: E,
        propriedade_id: Uuid,
        brinco_id: Uuid,
    ) -> Result<Option<BrincoAnimal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let brinco = sqlx::query_as::<_, BrincoAnimal>(
            "SELECT * FROM brincos_estoque WHERE id = $1 AND propriedade_id = $2 FOR UPDATE",
        )
        .bind(brinco_id)
        .bind(propriedade_id)
        .fetch_optional(executor)
        .await?;
        Ok(brinco)
    }

    pub async fn brinco_disponivel_para_atualizacao<'e, E>(
        &self,
        executor: E,
        propriedade_id: Uuid,
        codigo: &str,
    ) -> Result<Option<BrincoAnimal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let brinco = sqlx::query_as::<_, BrincoAnimal>(
            r#"
            SELECT * FROM brincos_estoque
            WHERE propriedade_id = $1
              AND (numero_brinco = $2 OR codigo_rfid = $2)
              AND status <> 'EM_USO'
            FOR UPDATE
            "#,
        )
        .bind(propriedade_id)
        .bind(codigo)
        .fetch_optional(executor)
        .await?;
        Ok(brinco)
    }

    pub async fn animal_para_atualizacao<'e, E>(
        &self,
        executor: E,
        propriedade_id: Uuid,
        codigo: &str,
    ) -> Result<Option<AnimalIndividual>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let animal = sqlx::query_as::<_, AnimalIndividual>(
            r#"
            SELECT * FROM animais_individuais
            WHERE propriedade_id = $1
              AND (codigo_sisbov = $2 OR numero_brinco = $2)
            FOR UPDATE
            "#,
        )
        .bind(propriedade_id)
        .bind(codigo)
        .fetch_optional(executor)
        .await?;
        Ok(animal)
    }

    pub async fn brinco_do_animal_para_atualizacao<'e, E>(
        &self,
        executor: E,
        propriedade_id: Uuid,
        animal_id: Uuid,
    ) -> Result<Option<BrincoAnimal>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let brinco = sqlx::query_as::<_, BrincoAnimal>(
            "SELECT * FROM brincos_estoque WHERE propriedade_id = $1 AND animal_id = $2 FOR UPDATE",
        )
        .bind(propriedade_id)
        .bind(animal_id)
        .fetch_optional(executor)
        .await?;
        Ok(brinco)
    }

    pub async fn criar_animal<'e, E>(
        &self,
        executor: E,
        novo: NovoAnimal,
    ) -> Result<AnimalIndividual, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, AnimalIndividual>(
            r#"
            INSERT INTO animais_individuais
                (propriedade_id, numero_brinco, codigo_sisbov, numero_manejo,
                 codigo_eletronico, tipo_brinco, sexo, raca, categoria,
                 data_nascimento, data_identificacao, peso_atual_kg, observacoes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(novo.propriedade_id)
        .bind(&novo.numero_brinco)
        .bind(&novo.codigo_sisbov)
        .bind(&novo.numero_manejo)
        .bind(&novo.codigo_eletronico)
        .bind(novo.tipo_brinco)
        .bind(novo.sexo)
        .bind(&novo.raca)
        .bind(&novo.categoria)
        .bind(novo.data_nascimento)
        .bind(novo.data_identificacao)
        .bind(novo.peso_atual_kg)
        .bind(&novo.observacoes)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Regra(
                        "Já existe um animal cadastrado com este número SISBOV.".to_string(),
                    );
                }
            }
            e.into()
        })
    }

    pub async fn vincular_brinco<'e, E>(
        &self,
        executor: E,
        brinco_id: Uuid,
        animal_id: Uuid,
        data_utilizacao: NaiveDate,
        codigo_rfid: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE brincos_estoque
            SET status = 'EM_USO',
                animal_id = $2,
                data_utilizacao = $3,
                codigo_rfid = COALESCE(codigo_rfid, $4),
                atualizado_em = now()
            WHERE id = $1
            "#,
        )
        .bind(brinco_id)
        .bind(animal_id)
        .bind(data_utilizacao)
        .bind(codigo_rfid)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Libera o brinco antigo após a troca, com o status decidido pelo motivo.
    pub async fn liberar_brinco<'e, E>(
        &self,
        executor: E,
        brinco_id: Uuid,
        status: StatusBrinco,
        status_motivo: &str,
        data_descarte: Option<NaiveDate>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE brincos_estoque
            SET status = $2,
                status_motivo = $3,
                data_descarte = $4,
                animal_id = NULL,
                atualizado_em = now()
            WHERE id = $1
            "#,
        )
        .bind(brinco_id)
        .bind(status)
        .bind(status_motivo)
        .bind(data_descarte)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn atualizar_identificadores<'e, E>(
        &self,
        executor: E,
        animal_id: Uuid,
        numero_brinco: &str,
        codigo_sisbov: &str,
        codigo_eletronico: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE animais_individuais
            SET numero_brinco = $2,
                codigo_sisbov = $3,
                codigo_eletronico = COALESCE($4, codigo_eletronico),
                atualizado_em = now()
            WHERE id = $1
            "#,
        )
        .bind(animal_id)
        .bind(numero_brinco)
        .bind(codigo_sisbov)
        .bind(codigo_eletronico)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Preenchimento oportunista do número de manejo calculado do SISBOV.
    pub async fn atualizar_numero_manejo(
        &self,
        animal_id: Uuid,
        numero_manejo: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE animais_individuais SET numero_manejo = $2, atualizado_em = now() WHERE id = $1",
        )
        .bind(animal_id)
        .bind(numero_manejo)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn atualizar_peso<'e, E>(
        &self,
        executor: E,
        animal_id: Uuid,
        peso_kg: Decimal,
        atualizado_em: DateTime<Utc>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE animais_individuais SET peso_atual_kg = $2, atualizado_em = $3 WHERE id = $1",
        )
        .bind(animal_id)
        .bind(peso_kg)
        .bind(atualizado_em)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn atualizar_status<'e, E>(
        &self,
        executor: E,
        animal_id: Uuid,
        status: StatusAnimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE animais_individuais SET status = $2, atualizado_em = now() WHERE id = $1",
        )
        .bind(animal_id)
        .bind(status)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Registra um lançamento no livro-razão do animal.
    pub async fn criar_movimentacao<'e, E>(
        &self,
        executor: E,
        nova: NovaMovimentacao,
    ) -> Result<MovimentacaoIndividual, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movimentacao = sqlx::query_as::<_, MovimentacaoIndividual>(
            r#"
            INSERT INTO movimentacoes_individuais
                (animal_id, tipo_movimentacao, data_movimentacao, propriedade_origem_id,
                 categoria_anterior, peso_kg, observacoes, motivo_detalhado, responsavel)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(nova.animal_id)
        .bind(nova.tipo_movimentacao)
        .bind(nova.data_movimentacao)
        .bind(nova.propriedade_origem_id)
        .bind(&nova.categoria_anterior)
        .bind(nova.peso_kg)
        .bind(&nova.observacoes)
        .bind(&nova.motivo_detalhado)
        .bind(&nova.responsavel)
        .fetch_one(executor)
        .await?;
        Ok(movimentacao)
    }

    /// Guarda contra duplicidade do encerramento de venda: já existe VENDA
    /// para este animal nesta data?
    pub async fn venda_existente_na_data<'e, E>(
        &self,
        executor: E,
        animal_id: Uuid,
        data: NaiveDate,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let existe = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM movimentacoes_individuais
                WHERE animal_id = $1 AND tipo_movimentacao = 'VENDA' AND data_movimentacao = $2
            )
            "#,
        )
        .bind(animal_id)
        .bind(data)
        .fetch_one(executor)
        .await?;
        Ok(existe)
    }
}
