// src/services/cadastro.rs
//
// Cadastro de animais a partir do estoque de brincos e troca de brinco.
// As duas operações rodam em transação: a reivindicação do brinco trava a
// linha com FOR UPDATE e reconfere o status, de modo que dois cliques
// simultâneos resultem em um cadastro e um "brinco já em uso".

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        animal_repo::{NovaMovimentacao, NovoAnimal},
        AnimalRepository,
    },
    models::animal::{Sexo, StatusBrinco, TipoMovimentacao},
    services::identificacao::{extrair_numero_manejo, idade_em_meses, normalizar_codigo},
};

/// Dados do novo animal, já validados pelo handler.
pub struct CadastroAnimal {
    pub codigo: String,
    /// Brinco escolhido no modal de duplicidade, quando houve colisão.
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

pub struct TrocaBrinco {
    pub codigo_animal: String,
    pub codigo_novo: String,
    pub motivo: Option<String>,
    pub responsavel: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CadastroConcluido {
    pub animal_id: Uuid,
    pub numero_brinco: String,
    pub codigo_sisbov: String,
    pub numero_manejo: String,
    pub categoria: String,
    pub mensagem: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrocaConcluida {
    pub animal_id: Uuid,
    pub brinco_anterior: String,
    pub brinco_novo: String,
    pub mensagem: String,
}

/// Origem declarada no formulário -> tipo de movimentação do livro-razão.
pub fn mapear_tipo_movimentacao(origem: &str) -> TipoMovimentacao {
    let origem = origem.to_lowercase();
    if origem.contains("nasc") {
        TipoMovimentacao::Nascimento
    } else if origem.contains("compra") {
        TipoMovimentacao::Compra
    } else if origem.contains("transfer") {
        TipoMovimentacao::TransferenciaEntrada
    } else {
        TipoMovimentacao::Outros
    }
}

/// Destino do brinco antigo após a troca, conforme o motivo informado.
pub fn status_para_brinco_antigo(motivo: &str) -> (StatusBrinco, &'static str) {
    let motivo = motivo.to_lowercase();
    if motivo.contains("perd") {
        (StatusBrinco::Perdido, "Perdido no campo")
    } else if motivo.contains("dan") || motivo.contains("quebr") {
        (StatusBrinco::Danificado, "Danificado na troca")
    } else {
        (StatusBrinco::Disponivel, "Liberado em troca de brinco")
    }
}

/// Categoria sugerida quando o formulário não informa uma.
pub fn categoria_padrao_para(sexo: Sexo, idade_meses: Option<i32>) -> &'static str {
    match (sexo, idade_meses) {
        (Sexo::M, Some(idade)) if idade < 12 => "Bezerros (0-12m)",
        (Sexo::F, Some(idade)) if idade < 12 => "Bezerras (0-12m)",
        (Sexo::M, Some(idade)) if idade < 24 => "Garrotes (12-24m)",
        (Sexo::F, Some(idade)) if idade < 24 => "Novilhas (12-24m)",
        (Sexo::M, _) => "Bois Magros (+24m)",
        (Sexo::F, _) => "Vacas Adultas",
    }
}

#[derive(Clone)]
pub struct CadastroService {
    pool: PgPool,
    animal_repo: AnimalRepository,
}

impl CadastroService {
    pub fn new(pool: PgPool, animal_repo: AnimalRepository) -> Self {
        Self { pool, animal_repo }
    }

    /// Converte um brinco do estoque em animal cadastrado.
    pub async fn cadastrar_do_estoque(
        &self,
        propriedade_id: Uuid,
        dados: CadastroAnimal,
    ) -> Result<CadastroConcluido, AppError> {
        let sexo = dados
            .sexo
            .ok_or_else(|| AppError::Regra("Informe o sexo do animal.".to_string()))?;

        if let Some(peso) = dados.peso_kg {
            if peso <= Decimal::ZERO {
                return Err(AppError::Regra("O peso deve ser maior que zero.".to_string()));
            }
        }

        let codigo = normalizar_codigo(&dados.codigo);
        if dados.brinco_id.is_none() && codigo.len() < 3 {
            return Err(AppError::CodigoMuitoCurto);
        }

        let mut tx = self.pool.begin().await?;

        // Trava a linha do brinco. A releitura do status dentro do lock é o
        // que torna a reivindicação idempotente sob concorrência.
        let brinco = match dados.brinco_id {
            Some(brinco_id) => {
                self.animal_repo
                    .brinco_para_atualizacao(&mut *tx, propriedade_id, brinco_id)
                    .await?
            }
            None => {
                self.animal_repo
                    .brinco_disponivel_para_atualizacao(&mut *tx, propriedade_id, &codigo)
                    .await?
            }
        }
        .ok_or_else(|| {
            AppError::NaoEncontrado("Brinco não encontrado no estoque da propriedade.".to_string())
        })?;

        if brinco.status == StatusBrinco::EmUso {
            return Err(AppError::BrincoJaEmUso);
        }

        let numero_brinco = brinco.numero_brinco.clone();
        if self
            .animal_repo
            .existe_animal_com_sisbov(&numero_brinco)
            .await?
        {
            return Err(AppError::Regra(
                "Já existe um animal cadastrado com este número SISBOV.".to_string(),
            ));
        }

        let hoje = Utc::now().date_naive();
        let idade = dados
            .data_nascimento
            .map(|nascimento| idade_em_meses(nascimento, hoje));
        let categoria = dados
            .categoria
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| categoria_padrao_para(sexo, idade).to_string());
        let numero_manejo = extrair_numero_manejo(&numero_brinco);

        let animal = self
            .animal_repo
            .criar_animal(
                &mut *tx,
                NovoAnimal {
                    propriedade_id,
                    numero_brinco: numero_brinco.clone(),
                    codigo_sisbov: Some(numero_brinco.clone()),
                    numero_manejo: numero_manejo.clone(),
                    codigo_eletronico: brinco.codigo_rfid.clone(),
                    tipo_brinco: brinco.tipo_brinco,
                    sexo,
                    raca: dados.raca.clone(),
                    categoria: Some(categoria.clone()),
                    data_nascimento: dados.data_nascimento,
                    data_identificacao: hoje,
                    peso_atual_kg: dados.peso_kg,
                    observacoes: dados.observacoes.clone(),
                },
            )
            .await?;

        self.animal_repo
            .vincular_brinco(&mut *tx, brinco.id, animal.id, hoje, None)
            .await?;

        let origem = dados.origem.unwrap_or_default();
        self.animal_repo
            .criar_movimentacao(
                &mut *tx,
                NovaMovimentacao {
                    animal_id: animal.id,
                    tipo_movimentacao: mapear_tipo_movimentacao(&origem),
                    data_movimentacao: hoje,
                    propriedade_origem_id: Some(propriedade_id),
                    categoria_anterior: None,
                    peso_kg: dados.peso_kg,
                    observacoes: None,
                    motivo_detalhado: Some(format!(
                        "Cadastro via Curral Inteligente (brinco {numero_brinco})"
                    )),
                    responsavel: dados.responsavel.clone(),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            animal_id = %animal.id,
            numero_brinco = %numero_brinco,
            "animal cadastrado a partir do estoque"
        );

        Ok(CadastroConcluido {
            animal_id: animal.id,
            codigo_sisbov: numero_brinco.clone(),
            numero_brinco,
            numero_manejo: numero_manejo.unwrap_or_default(),
            categoria,
            mensagem: "Animal cadastrado com sucesso.".to_string(),
        })
    }

    /// Substitui o brinco de um animal por um brinco disponível do estoque.
    pub async fn trocar_brinco(
        &self,
        propriedade_id: Uuid,
        dados: TrocaBrinco,
    ) -> Result<TrocaConcluida, AppError> {
        let codigo_animal = normalizar_codigo(&dados.codigo_animal);
        let codigo_novo = normalizar_codigo(&dados.codigo_novo);
        if codigo_animal.len() < 3 || codigo_novo.len() < 3 {
            return Err(AppError::CodigoMuitoCurto);
        }
        if codigo_animal == codigo_novo {
            return Err(AppError::Regra(
                "O brinco novo deve ser diferente do atual.".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let animal = self
            .animal_repo
            .animal_para_atualizacao(&mut *tx, propriedade_id, &codigo_animal)
            .await?
            .ok_or_else(|| AppError::NaoEncontrado("Animal não encontrado.".to_string()))?;

        let brinco_novo = self
            .animal_repo
            .brinco_disponivel_para_atualizacao(&mut *tx, propriedade_id, &codigo_novo)
            .await?
            .ok_or_else(|| {
                AppError::NaoEncontrado(
                    "Brinco novo não encontrado no estoque ou já em uso.".to_string(),
                )
            })?;

        let brinco_anterior = animal.numero_brinco.clone();
        let motivo = dados.motivo.unwrap_or_default();
        let (status_antigo, descricao_status) = status_para_brinco_antigo(&motivo);

        // O brinco antigo pode não existir como linha de estoque (animais
        // importados já brincados).
        if let Some(antigo) = self
            .animal_repo
            .brinco_do_animal_para_atualizacao(&mut *tx, propriedade_id, animal.id)
            .await?
        {
            let data_descarte =
                (status_antigo != StatusBrinco::Disponivel).then(|| Utc::now().date_naive());
            self.animal_repo
                .liberar_brinco(&mut *tx, antigo.id, status_antigo, descricao_status, data_descarte)
                .await?;
        }

        self.animal_repo
            .atualizar_identificadores(
                &mut *tx,
                animal.id,
                &brinco_novo.numero_brinco,
                &brinco_novo.numero_brinco,
                brinco_novo.codigo_rfid.as_deref(),
            )
            .await?;

        let hoje = Utc::now().date_naive();
        self.animal_repo
            .vincular_brinco(&mut *tx, brinco_novo.id, animal.id, hoje, None)
            .await?;

        self.animal_repo
            .criar_movimentacao(
                &mut *tx,
                NovaMovimentacao {
                    animal_id: animal.id,
                    tipo_movimentacao: TipoMovimentacao::Outros,
                    data_movimentacao: hoje,
                    propriedade_origem_id: Some(propriedade_id),
                    categoria_anterior: None,
                    peso_kg: None,
                    observacoes: None,
                    motivo_detalhado: Some(format!(
                        "Troca de brinco: {brinco_anterior} -> {} ({})",
                        brinco_novo.numero_brinco,
                        if motivo.is_empty() { "sem motivo informado" } else { &motivo }
                    )),
                    responsavel: dados.responsavel.clone(),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            animal_id = %animal.id,
            brinco_anterior = %brinco_anterior,
            brinco_novo = %brinco_novo.numero_brinco,
            "troca de brinco concluída"
        );

        Ok(TrocaConcluida {
            animal_id: animal.id,
            brinco_anterior,
            brinco_novo: brinco_novo.numero_brinco,
            mensagem: "Brinco trocado com sucesso.".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origem_do_formulario_vira_tipo_de_movimentacao() {
        assert_eq!(mapear_tipo_movimentacao("Nascimento"), TipoMovimentacao::Nascimento);
        assert_eq!(mapear_tipo_movimentacao("compra de terceiros"), TipoMovimentacao::Compra);
        assert_eq!(
            mapear_tipo_movimentacao("transferência entre fazendas"),
            TipoMovimentacao::TransferenciaEntrada
        );
        assert_eq!(mapear_tipo_movimentacao(""), TipoMovimentacao::Outros);
        assert_eq!(mapear_tipo_movimentacao("ajuste sisbov"), TipoMovimentacao::Outros);
    }

    #[test]
    fn motivo_da_troca_decide_o_destino_do_brinco_antigo() {
        assert_eq!(status_para_brinco_antigo("brinco perdido").0, StatusBrinco::Perdido);
        assert_eq!(status_para_brinco_antigo("Danificado").0, StatusBrinco::Danificado);
        assert_eq!(status_para_brinco_antigo("quebrou no tronco").0, StatusBrinco::Danificado);
        assert_eq!(status_para_brinco_antigo("").0, StatusBrinco::Disponivel);
    }

    #[test]
    fn categoria_padrao_por_sexo_e_idade() {
        assert_eq!(categoria_padrao_para(Sexo::M, Some(6)), "Bezerros (0-12m)");
        assert_eq!(categoria_padrao_para(Sexo::F, Some(11)), "Bezerras (0-12m)");
        assert_eq!(categoria_padrao_para(Sexo::M, Some(18)), "Garrotes (12-24m)");
        assert_eq!(categoria_padrao_para(Sexo::F, Some(23)), "Novilhas (12-24m)");
        assert_eq!(categoria_padrao_para(Sexo::M, Some(30)), "Bois Magros (+24m)");
        assert_eq!(categoria_padrao_para(Sexo::F, None), "Vacas Adultas");
    }
}
