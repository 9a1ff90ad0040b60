// src/services/curral.rs
//
// Sessões de manejo e eventos de curral. A sessão é uma máquina de estados
// mínima (ABERTA -> ENCERRADA, terminal); abrir uma nova sessão encerra à
// força as que ficaram abertas. O encerramento de sessões de venda para
// frigorífico gera as movimentações de VENDA, uma por animal por data.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        animal_repo::NovaMovimentacao,
        curral_repo::{NovaSessao, NovoEvento},
        AnimalRepository, CurralRepository,
    },
    models::{
        animal::{StatusAnimal, TipoMovimentacao},
        curral::{CurralEvento, CurralSessao, PrenhezStatus, StatusSessao, TipoEvento, TipoTrabalho},
    },
    services::identificacao::normalizar_codigo,
};

pub struct AberturaSessao {
    pub tipo_trabalho: TipoTrabalho,
    pub nome: Option<String>,
    pub quantidade_esperada: Option<i32>,
    pub nome_lote: Option<String>,
    pub pasto_origem: Option<String>,
    pub descricao: Option<String>,
    pub responsavel: Option<String>,
}

pub struct RegistroEvento {
    pub sessao_id: Option<Uuid>,
    pub animal_id: Option<Uuid>,
    pub tipo_evento: TipoEvento,
    pub peso_kg: Option<Decimal>,
    pub brinco_anterior: Option<String>,
    pub brinco_novo: Option<String>,
    pub prenhez_status: Option<PrenhezStatus>,
    pub data_previsao_parto: Option<chrono::NaiveDate>,
    pub lote_destino: Option<String>,
    pub observacoes: Option<String>,
    pub responsavel: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessaoAberta {
    pub sessao: CurralSessao,
    /// Sessões que ficaram abertas e foram encerradas à força.
    pub sessoes_encerradas: u64,
    pub mensagem: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResumoEventos {
    pub pesagens: usize,
    pub reproducao: usize,
    pub sanidade: usize,
    pub apartacao: usize,
    pub outros: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EstatisticasSessao {
    pub sessao_id: Uuid,
    pub nome: String,
    pub tipo_trabalho: TipoTrabalho,
    pub status: StatusSessao,
    pub data_inicio: DateTime<Utc>,
    pub duracao_minutos: i64,
    pub duracao_formatada: String,
    pub total_eventos: usize,
    pub animais_trabalhados: usize,
    pub quantidade_esperada: Option<i32>,
    pub peso_medio_kg: Option<Decimal>,
    pub resumo: ResumoEventos,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResumoVendas {
    pub movimentacoes_geradas: usize,
    pub ja_existentes: usize,
    pub falhas: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessaoEncerrada {
    pub estatisticas: EstatisticasSessao,
    pub vendas: Option<ResumoVendas>,
    pub mensagem: String,
}

// ---
// Funções puras sobre o log de eventos
// ---

/// Título automático da sessão quando o operador não informa um.
pub fn nome_padrao_sessao(tipo: TipoTrabalho, agora: DateTime<Utc>) -> String {
    format!("{} - {}", tipo.descricao(), agora.format("%d/%m/%Y %H:%M"))
}

/// Animais distintos na ordem da primeira ocorrência no log.
pub fn animais_distintos(eventos: &[CurralEvento]) -> Vec<Uuid> {
    let mut vistos = Vec::new();
    for evento in eventos {
        if let Some(animal_id) = evento.animal_id {
            if !vistos.contains(&animal_id) {
                vistos.push(animal_id);
            }
        }
    }
    vistos
}

pub fn resumir_eventos(eventos: &[CurralEvento]) -> ResumoEventos {
    let mut resumo = ResumoEventos {
        pesagens: 0,
        reproducao: 0,
        sanidade: 0,
        apartacao: 0,
        outros: 0,
    };
    for evento in eventos {
        match evento.tipo_evento {
            TipoEvento::Pesagem => resumo.pesagens += 1,
            TipoEvento::Reproducao | TipoEvento::Diagnostico => resumo.reproducao += 1,
            TipoEvento::Sanidade => resumo.sanidade += 1,
            TipoEvento::Apartacao => resumo.apartacao += 1,
            _ => resumo.outros += 1,
        }
    }
    resumo
}

pub fn peso_medio(eventos: &[CurralEvento]) -> Option<Decimal> {
    let pesos: Vec<Decimal> = eventos
        .iter()
        .filter(|e| e.tipo_evento == TipoEvento::Pesagem)
        .filter_map(|e| e.peso_kg)
        .collect();
    if pesos.is_empty() {
        return None;
    }
    let soma: Decimal = pesos.iter().sum();
    Some((soma / Decimal::from(pesos.len() as i64)).round_dp(2))
}

/// Último peso registrado para o animal dentro da sessão.
pub fn ultimo_peso_do_animal(eventos: &[CurralEvento], animal_id: Uuid) -> Option<Decimal> {
    eventos
        .iter()
        .rev()
        .find(|e| e.animal_id == Some(animal_id) && e.tipo_evento == TipoEvento::Pesagem)
        .and_then(|e| e.peso_kg)
}

pub fn duracao_minutos(inicio: DateTime<Utc>, fim: DateTime<Utc>) -> i64 {
    (fim - inicio).num_minutes().max(0)
}

pub fn formatar_duracao(minutos: i64) -> String {
    if minutos < 60 {
        format!("{minutos}min")
    } else {
        format!("{}h {:02}min", minutos / 60, minutos % 60)
    }
}

// ---
// Serviço
// ---

#[derive(Clone)]
pub struct CurralService {
    pool: PgPool,
    animal_repo: AnimalRepository,
    curral_repo: CurralRepository,
}

impl CurralService {
    pub fn new(pool: PgPool, animal_repo: AnimalRepository, curral_repo: CurralRepository) -> Self {
        Self {
            pool,
            animal_repo,
            curral_repo,
        }
    }

    /// Abre uma sessão de manejo, encerrando na mesma transação as sessões
    /// que ficaram abertas (esquecidas de dias anteriores).
    pub async fn abrir_sessao(
        &self,
        propriedade_id: Uuid,
        abertura: AberturaSessao,
    ) -> Result<SessaoAberta, AppError> {
        let agora = Utc::now();
        let nome = abertura
            .nome
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| nome_padrao_sessao(abertura.tipo_trabalho, agora));

        let mut tx = self.pool.begin().await?;
        let encerradas = self
            .curral_repo
            .encerrar_sessoes_abertas(&mut *tx, propriedade_id, agora)
            .await?;
        let sessao = self
            .curral_repo
            .criar_sessao(
                &mut *tx,
                NovaSessao {
                    propriedade_id,
                    nome,
                    tipo_trabalho: abertura.tipo_trabalho,
                    quantidade_esperada: abertura.quantidade_esperada.filter(|q| *q > 0),
                    nome_lote: abertura.nome_lote,
                    pasto_origem: abertura.pasto_origem,
                    descricao: abertura.descricao,
                    responsavel: abertura.responsavel,
                },
            )
            .await?;
        tx.commit().await?;

        if encerradas > 0 {
            tracing::warn!(
                propriedade_id = %propriedade_id,
                encerradas,
                "sessões abertas foram encerradas à força ao abrir nova sessão"
            );
        }

        Ok(SessaoAberta {
            mensagem: format!("Sessão \"{}\" iniciada.", sessao.nome),
            sessao,
            sessoes_encerradas: encerradas,
        })
    }

    pub async fn sessao_ativa(
        &self,
        propriedade_id: Uuid,
    ) -> Result<Option<CurralSessao>, AppError> {
        self.curral_repo.sessao_ativa(propriedade_id).await
    }

    /// Sessão ativa da propriedade ou, na falta dela, uma nova de coleta de
    /// dados. Usado pelos fluxos rápidos (pesagem avulsa) que não exigem
    /// abertura explícita.
    pub async fn obter_ou_criar_sessao(
        &self,
        propriedade_id: Uuid,
    ) -> Result<CurralSessao, AppError> {
        if let Some(sessao) = self.curral_repo.sessao_ativa(propriedade_id).await? {
            return Ok(sessao);
        }
        let aberta = self
            .abrir_sessao(
                propriedade_id,
                AberturaSessao {
                    tipo_trabalho: TipoTrabalho::ColetaDados,
                    nome: None,
                    quantidade_esperada: None,
                    nome_lote: None,
                    pasto_origem: None,
                    descricao: None,
                    responsavel: None,
                },
            )
            .await?;
        Ok(aberta.sessao)
    }

    async fn resolver_sessao_aberta(
        &self,
        propriedade_id: Uuid,
        sessao_id: Option<Uuid>,
    ) -> Result<CurralSessao, AppError> {
        let sessao = match sessao_id {
            Some(id) => self
                .curral_repo
                .sessao_por_id(propriedade_id, id)
                .await?
                .ok_or_else(|| AppError::NaoEncontrado("Sessão não encontrada.".to_string()))?,
            None => self.obter_ou_criar_sessao(propriedade_id).await?,
        };
        if sessao.status == StatusSessao::Encerrada {
            return Err(AppError::SessaoJaEncerrada);
        }
        Ok(sessao)
    }

    /// Registra um evento no log da sessão. Para pesagens, atualiza também o
    /// cache de peso do animal.
    pub async fn registrar_evento(
        &self,
        propriedade_id: Uuid,
        registro: RegistroEvento,
    ) -> Result<CurralEvento, AppError> {
        if registro.tipo_evento.exige_animal() && registro.animal_id.is_none() {
            return Err(AppError::Regra(
                "Selecione o animal para registrar este evento.".to_string(),
            ));
        }

        if registro.tipo_evento == TipoEvento::Pesagem {
            let peso = registro
                .peso_kg
                .ok_or_else(|| AppError::Regra("Informe o peso do animal.".to_string()))?;
            if peso <= Decimal::ZERO {
                return Err(AppError::Regra("O peso deve ser maior que zero.".to_string()));
            }
        }

        if let Some(animal_id) = registro.animal_id {
            self.animal_repo
                .buscar_por_id(propriedade_id, animal_id)
                .await?
                .ok_or_else(|| AppError::NaoEncontrado("Animal não encontrado.".to_string()))?;
        }

        let sessao = self
            .resolver_sessao_aberta(propriedade_id, registro.sessao_id)
            .await?;

        let mut tx = self.pool.begin().await?;
        let evento = self
            .curral_repo
            .criar_evento(
                &mut *tx,
                NovoEvento {
                    sessao_id: sessao.id,
                    animal_id: registro.animal_id,
                    tipo_evento: registro.tipo_evento,
                    peso_kg: registro.peso_kg,
                    brinco_anterior: registro.brinco_anterior,
                    brinco_novo: registro.brinco_novo,
                    prenhez_status: registro.prenhez_status.unwrap_or_default(),
                    data_previsao_parto: registro.data_previsao_parto,
                    lote_destino: registro.lote_destino,
                    observacoes: registro.observacoes,
                    responsavel: registro.responsavel,
                },
            )
            .await?;

        if evento.tipo_evento == TipoEvento::Pesagem {
            if let (Some(animal_id), Some(peso)) = (evento.animal_id, evento.peso_kg) {
                self.animal_repo
                    .atualizar_peso(&mut *tx, animal_id, peso, evento.data_evento)
                    .await?;
            }
        }
        tx.commit().await?;

        Ok(evento)
    }

    /// Pesagem rápida: resolve o animal pelo id (escolhido no modal de
    /// duplicidade) ou por casamento exato de código, e registra o evento na
    /// sessão ativa (criando uma, se preciso).
    pub async fn registrar_pesagem(
        &self,
        propriedade_id: Uuid,
        animal_id: Option<Uuid>,
        codigo: Option<&str>,
        peso_kg: Decimal,
        observacoes: Option<String>,
        responsavel: Option<String>,
    ) -> Result<CurralEvento, AppError> {
        // O id explícito tem precedência: um número de manejo de 6 dígitos
        // pode casar com mais de um animal, e a escolha é do operador.
        let animal = match animal_id {
            Some(id) => self
                .animal_repo
                .buscar_por_id(propriedade_id, id)
                .await?
                .ok_or_else(|| AppError::NaoEncontrado("Animal não encontrado.".to_string()))?,
            None => {
                let codigo = normalizar_codigo(codigo.unwrap_or_default());
                if codigo.len() < 3 {
                    return Err(AppError::CodigoMuitoCurto);
                }
                self.animal_repo
                    .buscar_por_codigo_exato(propriedade_id, &codigo)
                    .await?
                    .ok_or_else(|| {
                        AppError::NaoEncontrado("Animal não encontrado.".to_string())
                    })?
            }
        };

        self.registrar_evento(
            propriedade_id,
            RegistroEvento {
                sessao_id: None,
                animal_id: Some(animal.id),
                tipo_evento: TipoEvento::Pesagem,
                peso_kg: Some(peso_kg),
                brinco_anterior: None,
                brinco_novo: None,
                prenhez_status: None,
                data_previsao_parto: None,
                lote_destino: None,
                observacoes,
                responsavel,
            },
        )
        .await
    }

    pub async fn estatisticas_sessao_ativa(
        &self,
        propriedade_id: Uuid,
    ) -> Result<EstatisticasSessao, AppError> {
        let sessao = self
            .curral_repo
            .sessao_ativa(propriedade_id)
            .await?
            .ok_or_else(|| {
                AppError::NaoEncontrado("Nenhuma sessão de curral ativa.".to_string())
            })?;
        let eventos = self.curral_repo.eventos_da_sessao(sessao.id).await?;
        Ok(montar_estatisticas(&sessao, &eventos, Utc::now()))
    }

    /// Encerra a sessão. Para VENDA_FRIGORIFICO, gera as movimentações de
    /// venda depois do encerramento, animal por animal: a falha em um animal
    /// é registrada no log e não impede os demais.
    pub async fn encerrar_sessao(
        &self,
        propriedade_id: Uuid,
        sessao_id: Option<Uuid>,
    ) -> Result<SessaoEncerrada, AppError> {
        let sessao = match sessao_id {
            Some(id) => self
                .curral_repo
                .sessao_por_id(propriedade_id, id)
                .await?
                .ok_or_else(|| AppError::NaoEncontrado("Sessão não encontrada.".to_string()))?,
            None => self
                .curral_repo
                .sessao_ativa(propriedade_id)
                .await?
                .ok_or_else(|| {
                    AppError::NaoEncontrado("Nenhuma sessão de curral ativa.".to_string())
                })?,
        };
        if sessao.status == StatusSessao::Encerrada {
            return Err(AppError::SessaoJaEncerrada);
        }

        let agora = Utc::now();
        let mut tx = self.pool.begin().await?;
        let sessao = self
            .curral_repo
            .encerrar_sessao(&mut *tx, sessao.id, agora)
            .await?;
        tx.commit().await?;

        let eventos = self.curral_repo.eventos_da_sessao(sessao.id).await?;
        let estatisticas = montar_estatisticas(&sessao, &eventos, agora);

        let vendas = if sessao.tipo_trabalho == TipoTrabalho::VendaFrigorifico {
            Some(self.gerar_vendas(propriedade_id, &sessao, &eventos).await)
        } else {
            None
        };

        tracing::info!(
            sessao_id = %sessao.id,
            animais = estatisticas.animais_trabalhados,
            eventos = estatisticas.total_eventos,
            "sessão de curral encerrada"
        );

        Ok(SessaoEncerrada {
            mensagem: format!("Sessão \"{}\" encerrada.", sessao.nome),
            estatisticas,
            vendas,
        })
    }

    /// Uma movimentação de VENDA por animal distinto por data. A verificação
    /// de existência antes do insert torna o encerramento reexecutável sem
    /// duplicar lançamentos.
    async fn gerar_vendas(
        &self,
        propriedade_id: Uuid,
        sessao: &CurralSessao,
        eventos: &[CurralEvento],
    ) -> ResumoVendas {
        let data_venda = sessao
            .data_fim
            .unwrap_or_else(Utc::now)
            .date_naive();
        let mut resumo = ResumoVendas {
            movimentacoes_geradas: 0,
            ja_existentes: 0,
            falhas: 0,
        };

        for animal_id in animais_distintos(eventos) {
            let resultado = self
                .gerar_venda_do_animal(propriedade_id, sessao, eventos, animal_id, data_venda)
                .await;
            match resultado {
                Ok(true) => resumo.movimentacoes_geradas += 1,
                Ok(false) => resumo.ja_existentes += 1,
                Err(erro) => {
                    resumo.falhas += 1;
                    tracing::error!(
                        animal_id = %animal_id,
                        sessao_id = %sessao.id,
                        erro = %erro,
                        "falha ao gerar movimentação de venda; animal ignorado"
                    );
                }
            }
        }
        resumo
    }

    async fn gerar_venda_do_animal(
        &self,
        propriedade_id: Uuid,
        sessao: &CurralSessao,
        eventos: &[CurralEvento],
        animal_id: Uuid,
        data_venda: chrono::NaiveDate,
    ) -> Result<bool, AppError> {
        // Peso do último evento da sessão; na falta dele, o cache do animal.
        let peso = match ultimo_peso_do_animal(eventos, animal_id) {
            Some(peso) => Some(peso),
            None => self
                .animal_repo
                .buscar_por_id(propriedade_id, animal_id)
                .await?
                .and_then(|animal| animal.peso_atual_kg),
        };

        let mut tx = self.pool.begin().await?;
        if self
            .animal_repo
            .venda_existente_na_data(&mut *tx, animal_id, data_venda)
            .await?
        {
            tx.rollback().await?;
            return Ok(false);
        }

        self.animal_repo
            .criar_movimentacao(
                &mut *tx,
                NovaMovimentacao {
                    animal_id,
                    tipo_movimentacao: TipoMovimentacao::Venda,
                    data_movimentacao: data_venda,
                    propriedade_origem_id: Some(propriedade_id),
                    categoria_anterior: None,
                    peso_kg: peso,
                    observacoes: Some(format!("Sessão: {}", sessao.nome)),
                    motivo_detalhado: Some(
                        "Venda para frigorífico - encerramento de sessão de curral".to_string(),
                    ),
                    responsavel: sessao.responsavel.clone(),
                },
            )
            .await?;
        self.animal_repo
            .atualizar_status(&mut *tx, animal_id, StatusAnimal::Vendido)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    pub async fn historico_pesagens(
        &self,
        propriedade_id: Uuid,
        animal_id: Uuid,
        limite: i64,
    ) -> Result<Vec<CurralEvento>, AppError> {
        self.animal_repo
            .buscar_por_id(propriedade_id, animal_id)
            .await?
            .ok_or_else(|| AppError::NaoEncontrado("Animal não encontrado.".to_string()))?;
        self.curral_repo.pesagens_do_animal(animal_id, limite).await
    }
}

fn montar_estatisticas(
    sessao: &CurralSessao,
    eventos: &[CurralEvento],
    agora: DateTime<Utc>,
) -> EstatisticasSessao {
    let fim = sessao.data_fim.unwrap_or(agora);
    let minutos = duracao_minutos(sessao.data_inicio, fim);
    EstatisticasSessao {
        sessao_id: sessao.id,
        nome: sessao.nome.clone(),
        tipo_trabalho: sessao.tipo_trabalho,
        status: sessao.status,
        data_inicio: sessao.data_inicio,
        duracao_minutos: minutos,
        duracao_formatada: formatar_duracao(minutos),
        total_eventos: eventos.len(),
        animais_trabalhados: animais_distintos(eventos).len(),
        quantidade_esperada: sessao.quantidade_esperada,
        peso_medio_kg: peso_medio(eventos),
        resumo: resumir_eventos(eventos),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn evento(animal_id: Option<Uuid>, tipo: TipoEvento, peso: Option<Decimal>) -> CurralEvento {
        CurralEvento {
            id: Uuid::new_v4(),
            sessao_id: Uuid::new_v4(),
            animal_id,
            tipo_evento: tipo,
            data_evento: Utc::now(),
            peso_kg: peso,
            brinco_anterior: None,
            brinco_novo: None,
            prenhez_status: PrenhezStatus::Desconhecido,
            data_previsao_parto: None,
            lote_destino: None,
            observacoes: None,
            responsavel: None,
        }
    }

    #[test]
    fn nome_padrao_usa_tipo_e_data() {
        let agora = Utc.with_ymd_and_hms(2026, 8, 30, 14, 5, 0).unwrap();
        assert_eq!(
            nome_padrao_sessao(TipoTrabalho::VendaFrigorifico, agora),
            "Venda para Frigorífico - 30/08/2026 14:05"
        );
    }

    #[test]
    fn animais_distintos_preserva_a_primeira_ocorrencia() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let eventos = vec![
            evento(Some(a), TipoEvento::Pesagem, Some(Decimal::from(300))),
            evento(None, TipoEvento::Entrada, None),
            evento(Some(b), TipoEvento::Sanidade, None),
            evento(Some(a), TipoEvento::Pesagem, Some(Decimal::from(310))),
        ];
        assert_eq!(animais_distintos(&eventos), vec![a, b]);
    }

    #[test]
    fn resumo_agrupa_reproducao_e_diagnostico() {
        let a = Uuid::new_v4();
        let eventos = vec![
            evento(Some(a), TipoEvento::Pesagem, Some(Decimal::from(300))),
            evento(Some(a), TipoEvento::Reproducao, None),
            evento(Some(a), TipoEvento::Diagnostico, None),
            evento(Some(a), TipoEvento::Sanidade, None),
            evento(Some(a), TipoEvento::Apartacao, None),
            evento(None, TipoEvento::Entrada, None),
        ];
        let resumo = resumir_eventos(&eventos);
        assert_eq!(resumo.pesagens, 1);
        assert_eq!(resumo.reproducao, 2);
        assert_eq!(resumo.sanidade, 1);
        assert_eq!(resumo.apartacao, 1);
        assert_eq!(resumo.outros, 1);
    }

    #[test]
    fn peso_medio_considera_apenas_pesagens() {
        let a = Uuid::new_v4();
        let eventos = vec![
            evento(Some(a), TipoEvento::Pesagem, Some(Decimal::from(300))),
            evento(Some(a), TipoEvento::Pesagem, Some(Decimal::from(350))),
            evento(Some(a), TipoEvento::Sanidade, None),
        ];
        assert_eq!(peso_medio(&eventos), Some(Decimal::from(325)));
        assert_eq!(peso_medio(&[]), None);
    }

    #[test]
    fn ultimo_peso_vem_do_evento_mais_recente_da_sessao() {
        let a = Uuid::new_v4();
        let eventos = vec![
            evento(Some(a), TipoEvento::Pesagem, Some(Decimal::from(300))),
            evento(Some(a), TipoEvento::Pesagem, Some(Decimal::from(320))),
        ];
        assert_eq!(ultimo_peso_do_animal(&eventos, a), Some(Decimal::from(320)));
        assert_eq!(ultimo_peso_do_animal(&eventos, Uuid::new_v4()), None);
    }

    #[test]
    fn duracao_formatada() {
        assert_eq!(formatar_duracao(45), "45min");
        assert_eq!(formatar_duracao(125), "2h 05min");
        let inicio = Utc.with_ymd_and_hms(2026, 8, 30, 8, 0, 0).unwrap();
        let fim = Utc.with_ymd_and_hms(2026, 8, 30, 9, 30, 0).unwrap();
        assert_eq!(duracao_minutos(inicio, fim), 90);
        // Relógio que andou para trás não gera duração negativa.
        assert_eq!(duracao_minutos(fim, inicio), 0);
    }

    #[test]
    fn eventos_coletivos_nao_exigem_animal() {
        assert!(!TipoEvento::Entrada.exige_animal());
        assert!(!TipoEvento::Saida.exige_animal());
        assert!(!TipoEvento::Outros.exige_animal());
        assert!(TipoEvento::Pesagem.exige_animal());
        assert!(TipoEvento::Diagnostico.exige_animal());
    }
}
