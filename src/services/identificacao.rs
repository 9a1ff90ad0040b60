// src/services/identificacao.rs
//
// Núcleo do Curral Inteligente: dado um código digitado ou lido pelo bastão
// (SISBOV completo de 15 dígitos, número de manejo de 6-7 dígitos ou RFID),
// identifica zero, um ou vários animais/brincos. Colisões nunca são
// resolvidas por adivinhação: a lista completa de candidatos (com o SISBOV
// inteiro de cada um) volta para o operador escolher.
//
// O casamento em si é feito por funções puras sobre o rebanho carregado em
// memória, para que a precedência e a política de colisão sejam testáveis
// sem banco.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AnimalRepository, CurralRepository},
    models::{
        animal::{AnimalIndividual, BrincoAnimal, TipoMovimentacao},
        curral::CurralEvento,
    },
};

// ---
// Funções puras de normalização e extração
// ---

/// Remove caracteres não numéricos e devolve o código limpo.
pub fn normalizar_codigo(bruto: &str) -> String {
    bruto.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Obtém o número de manejo SISBOV.
///
/// Para códigos de 15 dígitos, extrai os dígitos das posições 8-13
/// (6 dígitos). Exemplo: 105500376197505 -> 619750.
/// Para códigos de 8 a 14 dígitos, descarta o dígito verificador e toma os
/// 7 últimos.
pub fn extrair_numero_manejo(codigo: &str) -> Option<String> {
    let limpo = normalizar_codigo(codigo);
    match limpo.len() {
        15 => Some(limpo[8..14].to_string()),
        n if n >= 8 => {
            let sem_verificador = &limpo[..n - 1];
            Some(sem_verificador[sem_verificador.len() - 7..].to_string())
        }
        _ => None,
    }
}

/// Um código já normalizado com exatamente 15 dígitos tem o formato SISBOV.
pub fn parece_sisbov(codigo: &str) -> bool {
    codigo.len() == 15 && codigo.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SituacaoBnd {
    Conforme,
    Atualizar,
    NaoConforme,
}

/// Situação de conformidade com o BND SISBOV.
///
/// - CONFORME: código existe na BND e está registrado no sistema.
/// - ATUALIZAR: código existe na BND, mas não foi localizado no sistema.
/// - NAO_CONFORME: código não consta na BND (ou não foi possível validar).
pub fn avaliar_situacao_bnd(consta_bnd: bool, presente_no_sistema: bool) -> SituacaoBnd {
    if consta_bnd && presente_no_sistema {
        SituacaoBnd::Conforme
    } else if consta_bnd {
        SituacaoBnd::Atualizar
    } else {
        SituacaoBnd::NaoConforme
    }
}

/// Idade em meses completos na data de hoje.
pub fn idade_em_meses(nascimento: NaiveDate, hoje: NaiveDate) -> i32 {
    let mut meses = (hoje.year() - nascimento.year()) * 12
        + (hoje.month() as i32 - nascimento.month() as i32);
    if hoje.day() < nascimento.day() {
        meses -= 1;
    }
    meses.max(0)
}

// ---
// Casamento de códigos (precedência e política de colisão)
// ---

fn numero_manejo_efetivo(
    sisbov: &str,
    brinco: &str,
    manejo_armazenado: Option<&str>,
) -> Option<String> {
    if let Some(manejo) = manejo_armazenado {
        let limpo = normalizar_codigo(manejo);
        if !limpo.is_empty() {
            return Some(limpo);
        }
    }
    if !sisbov.is_empty() {
        if let Some(extraido) = extrair_numero_manejo(sisbov) {
            return Some(extraido);
        }
    }
    if brinco.len() >= 6 {
        return Some(brinco[brinco.len() - 6..].to_string());
    }
    None
}

/// Verifica se o código lido corresponde a um animal do rebanho.
///
/// Precedência: SISBOV completo casa apenas por igualdade exata; nos demais
/// comprimentos valem RFID exato, número de manejo exato, posições 8-13 do
/// SISBOV (códigos de 6 dígitos) e sufixo do brinco/SISBOV (6-7 dígitos).
pub fn animal_corresponde(animal: &AnimalIndividual, codigo: &str) -> bool {
    let sisbov = normalizar_codigo(animal.codigo_sisbov.as_deref().unwrap_or_default());
    let brinco = normalizar_codigo(&animal.numero_brinco);
    let rfid = normalizar_codigo(animal.codigo_eletronico.as_deref().unwrap_or_default());

    // Código de 15 dígitos: nada de casamento parcial.
    if codigo.len() == 15 {
        return sisbov == codigo || brinco == codigo;
    }

    if !rfid.is_empty() && rfid == codigo {
        return true;
    }

    let manejo = numero_manejo_efetivo(&sisbov, &brinco, animal.numero_manejo.as_deref());
    if manejo.as_deref() == Some(codigo) {
        return true;
    }

    match codigo.len() {
        6 => {
            (sisbov.len() == 15 && &sisbov[8..14] == codigo)
                || (brinco.len() >= 6 && brinco.ends_with(codigo))
        }
        7 => {
            (!sisbov.is_empty() && sisbov.ends_with(codigo))
                || (!brinco.is_empty() && brinco.ends_with(codigo))
        }
        _ => sisbov == codigo || brinco == codigo,
    }
}

/// Coleta TODOS os animais que correspondem, na ordem do rebanho, para a
/// detecção de duplicidade.
pub fn casar_animais<'a>(animais: &'a [AnimalIndividual], codigo: &str) -> Vec<&'a AnimalIndividual> {
    animais
        .iter()
        .filter(|animal| animal_corresponde(animal, codigo))
        .collect()
}

fn sisbov_efetivo(animal: &AnimalIndividual) -> Option<String> {
    let sisbov = normalizar_codigo(animal.codigo_sisbov.as_deref().unwrap_or_default());
    if !sisbov.is_empty() {
        return Some(sisbov);
    }
    let brinco = normalizar_codigo(&animal.numero_brinco);
    if !brinco.is_empty() {
        return Some(brinco);
    }
    None
}

#[derive(Debug)]
pub enum Resolucao<'a> {
    Nenhum,
    Unico(&'a AnimalIndividual),
    /// Houve correspondência, mas nenhum candidato tem SISBOV para
    /// desambiguar: a consulta falha como "não encontrado".
    SemSisbov,
    Duplicidade(Vec<&'a AnimalIndividual>),
}

/// Política de colisão: com mais de um candidato, só quem tem SISBOV pode
/// ser apresentado para escolha; o sistema nunca escolhe sozinho.
pub fn resolver_candidatos(candidatos: Vec<&AnimalIndividual>) -> Resolucao<'_> {
    match candidatos.len() {
        0 => Resolucao::Nenhum,
        1 => Resolucao::Unico(candidatos[0]),
        _ => {
            let com_sisbov: Vec<_> = candidatos
                .into_iter()
                .filter(|animal| sisbov_efetivo(animal).is_some())
                .collect();
            match com_sisbov.len() {
                0 => Resolucao::SemSisbov,
                1 => Resolucao::Unico(com_sisbov[0]),
                _ => Resolucao::Duplicidade(com_sisbov),
            }
        }
    }
}

/// Verifica se o código lido corresponde a um brinco do estoque.
pub fn brinco_corresponde(brinco: &BrincoAnimal, codigo: &str) -> bool {
    let numero = normalizar_codigo(&brinco.numero_brinco);
    let rfid = normalizar_codigo(brinco.codigo_rfid.as_deref().unwrap_or_default());

    if codigo.len() == 15 {
        return numero == codigo || (!rfid.is_empty() && rfid == codigo);
    }
    if numero == codigo {
        return true;
    }
    if !rfid.is_empty() && rfid == codigo {
        return true;
    }

    // Número de manejo: o do código (6 dígitos é o próprio) contra o
    // extraído do brinco.
    let manejo_brinco = extrair_numero_manejo(&numero);
    let manejo_codigo = if codigo.len() == 6 {
        Some(codigo.to_string())
    } else {
        extrair_numero_manejo(codigo)
    };
    if manejo_brinco.is_some() && manejo_brinco == manejo_codigo {
        return true;
    }

    if codigo.len() == 6 && numero.len() == 15 && &numero[8..14] == codigo {
        return true;
    }

    codigo.len() >= 7 && (numero.ends_with(codigo) || (!rfid.is_empty() && rfid.ends_with(codigo)))
}

pub fn casar_brincos<'a>(brincos: &'a [BrincoAnimal], codigo: &str) -> Vec<&'a BrincoAnimal> {
    brincos
        .iter()
        .filter(|brinco| brinco_corresponde(brinco, codigo))
        .collect()
}

// ---
// Tipos de resposta da identificação
// ---

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResumoPesagem {
    pub peso: Option<Decimal>,
    pub data: NaiveDate,
    pub data_hora: DateTime<Utc>,
}

fn resumir_pesagem(evento: &CurralEvento) -> ResumoPesagem {
    ResumoPesagem {
        peso: evento.peso_kg,
        data: evento.data_evento.date_naive(),
        data_hora: evento.data_evento,
    }
}

/// Ficha completa do animal resolvido, com o estado derivado do log de
/// eventos (pesagens, prenhez, apartação).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FichaAnimal {
    pub id: Uuid,
    pub numero_brinco: String,
    pub codigo_sisbov: String,
    pub codigo_eletronico: String,
    pub numero_manejo: String,
    pub raca: String,
    pub sexo: String,
    pub idade_meses: Option<i32>,
    pub data_nascimento: Option<NaiveDate>,
    pub data_cadastro: Option<NaiveDate>,
    pub categoria: String,
    pub status: String,
    pub peso_atual: Option<Decimal>,
    pub data_peso_atual: Option<NaiveDate>,
    pub pesagem_atual: Option<ResumoPesagem>,
    pub pesagem_anterior: Option<ResumoPesagem>,
    pub pesagens_historico: Vec<ResumoPesagem>,
    pub status_reprodutivo: String,
    pub lote_atual: String,
    pub origem_cadastro: String,
    pub observacoes: String,
    pub consta_bnd: bool,
    pub situacao_bnd: SituacaoBnd,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FichaBrinco {
    pub id: Uuid,
    pub numero_brinco: String,
    pub codigo_rfid: String,
    pub tipo_brinco: String,
    pub status: String,
    pub codigo_lote: String,
    pub fornecedor: String,
    pub data_aquisicao: Option<NaiveDate>,
    pub numero_manejo: String,
    pub consta_bnd: bool,
    pub situacao_bnd: SituacaoBnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrigemCandidato {
    Rebanho,
    Estoque,
}

/// Candidato apresentado ao operador na desambiguação. A forma é única para
/// animais do rebanho e brincos de estoque; `origem` distingue os dois.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CandidatoIdentificacao {
    pub id: Uuid,
    pub origem: OrigemCandidato,
    pub codigo_sisbov: String,
    pub numero_manejo: String,
    pub codigo_eletronico: String,
    pub categoria: String,
    pub sexo: String,
    pub data_nascimento: Option<NaiveDate>,
    pub peso_atual: Option<Decimal>,
}

fn candidato_do_animal(animal: &AnimalIndividual) -> CandidatoIdentificacao {
    let sisbov = sisbov_efetivo(animal).unwrap_or_default();
    let manejo = animal
        .numero_manejo
        .clone()
        .or_else(|| extrair_numero_manejo(&sisbov))
        .unwrap_or_default();
    CandidatoIdentificacao {
        id: animal.id,
        origem: OrigemCandidato::Rebanho,
        codigo_sisbov: sisbov,
        numero_manejo: manejo,
        codigo_eletronico: animal.codigo_eletronico.clone().unwrap_or_default(),
        categoria: animal.categoria.clone().unwrap_or_default(),
        sexo: animal.sexo.descricao().to_string(),
        data_nascimento: animal.data_nascimento,
        peso_atual: animal.peso_atual_kg,
    }
}

fn candidato_do_brinco(brinco: &BrincoAnimal) -> CandidatoIdentificacao {
    CandidatoIdentificacao {
        id: brinco.id,
        origem: OrigemCandidato::Estoque,
        codigo_sisbov: brinco.numero_brinco.clone(),
        numero_manejo: extrair_numero_manejo(&brinco.numero_brinco).unwrap_or_default(),
        codigo_eletronico: brinco.codigo_rfid.clone().unwrap_or_default(),
        categoria: String::new(),
        sexo: String::new(),
        data_nascimento: None,
        peso_atual: None,
    }
}

#[derive(Debug)]
pub enum Identificacao {
    Animal(Box<FichaAnimal>),
    Estoque(FichaBrinco),
    Duplicidade {
        codigo_lido: String,
        candidatos: Vec<CandidatoIdentificacao>,
        mensagem: String,
    },
    NaoEncontrado {
        codigo_consultado: String,
        mensagem: String,
        consta_bnd: bool,
        situacao_bnd: SituacaoBnd,
    },
}

// ---
// Serviço
// ---

#[derive(Clone)]
pub struct IdentificacaoService {
    animal_repo: AnimalRepository,
    curral_repo: CurralRepository,
}

impl IdentificacaoService {
    pub fn new(animal_repo: AnimalRepository, curral_repo: CurralRepository) -> Self {
        Self {
            animal_repo,
            curral_repo,
        }
    }

    /// Identifica o código contra o rebanho e, em seguida, o estoque de
    /// brincos. Consulta sem efeitos colaterais (exceto o preenchimento
    /// oportunista do número de manejo do animal resolvido).
    pub async fn identificar(
        &self,
        propriedade_id: Uuid,
        codigo_bruto: Option<&str>,
        animal_id: Option<Uuid>,
    ) -> Result<Identificacao, AppError> {
        // animal_id explícito: o operador já escolheu no modal de duplicidade.
        if let Some(id) = animal_id {
            let animal = self
                .animal_repo
                .buscar_por_id(propriedade_id, id)
                .await?
                .ok_or_else(|| AppError::NaoEncontrado("Animal não encontrado.".to_string()))?;
            let ficha = self.montar_ficha(animal).await?;
            return Ok(Identificacao::Animal(Box::new(ficha)));
        }

        let bruto = codigo_bruto.unwrap_or_default().trim();
        if bruto.is_empty() {
            return Err(AppError::Regra(
                "Informe o código do brinco/SISBOV.".to_string(),
            ));
        }
        let codigo = normalizar_codigo(bruto);
        if codigo.len() < 3 {
            return Err(AppError::CodigoMuitoCurto);
        }

        let animais = self.animal_repo.listar_por_propriedade(propriedade_id).await?;
        match resolver_candidatos(casar_animais(&animais, &codigo)) {
            Resolucao::Unico(animal) => {
                let ficha = self.montar_ficha(animal.clone()).await?;
                return Ok(Identificacao::Animal(Box::new(ficha)));
            }
            Resolucao::Duplicidade(candidatos) => {
                let mensagem = format!(
                    "Foram encontrados {} animais com o mesmo número de manejo ou código RFID. \
                     Selecione o animal correto pelo SISBOV completo.",
                    candidatos.len()
                );
                return Ok(Identificacao::Duplicidade {
                    codigo_lido: codigo,
                    candidatos: candidatos.iter().map(|a| candidato_do_animal(a)).collect(),
                    mensagem,
                });
            }
            Resolucao::SemSisbov => {
                return Ok(Identificacao::NaoEncontrado {
                    consta_bnd: parece_sisbov(&codigo),
                    situacao_bnd: avaliar_situacao_bnd(parece_sisbov(&codigo), false),
                    codigo_consultado: codigo,
                    mensagem: "Código encontrado, mas nenhum animal possui SISBOV cadastrado. \
                               O código não foi encontrado."
                        .to_string(),
                });
            }
            Resolucao::Nenhum => {}
        }

        // Fallback: estoque de brincos ainda não aplicados.
        let estoque = self
            .animal_repo
            .listar_estoque_disponivel(propriedade_id)
            .await?;
        let brincos = casar_brincos(&estoque, &codigo);
        match brincos.len() {
            1 => return Ok(Identificacao::Estoque(montar_ficha_brinco(brincos[0]))),
            n if n > 1 => {
                let mensagem = format!(
                    "Foram encontrados {n} brincos com o mesmo manejo/RFID. \
                     Selecione o SISBOV correto."
                );
                return Ok(Identificacao::Duplicidade {
                    codigo_lido: codigo,
                    candidatos: brincos.iter().map(|b| candidato_do_brinco(b)).collect(),
                    mensagem,
                });
            }
            _ => {}
        }

        let consta_bnd = parece_sisbov(&codigo);
        Ok(Identificacao::NaoEncontrado {
            consta_bnd,
            situacao_bnd: avaliar_situacao_bnd(consta_bnd, false),
            codigo_consultado: codigo,
            mensagem: "Código não encontrado no rebanho ou no estoque de brincos.".to_string(),
        })
    }

    async fn montar_ficha(&self, animal: AnimalIndividual) -> Result<FichaAnimal, AppError> {
        let sisbov = animal
            .codigo_sisbov
            .clone()
            .unwrap_or_else(|| animal.numero_brinco.clone());

        // Usa o numero_manejo do banco se existir, senão calcula e persiste.
        let numero_manejo = match &animal.numero_manejo {
            Some(manejo) if !manejo.is_empty() => manejo.clone(),
            _ => {
                let calculado = extrair_numero_manejo(&sisbov).unwrap_or_default();
                if !calculado.is_empty() {
                    self.animal_repo
                        .atualizar_numero_manejo(animal.id, &calculado)
                        .await?;
                }
                calculado
            }
        };

        let pesagens = self.curral_repo.pesagens_do_animal(animal.id, 3).await?;
        let pesagem_atual = pesagens.first().map(resumir_pesagem);
        let pesagem_anterior = pesagens.get(1).map(resumir_pesagem);
        let pesagens_historico: Vec<ResumoPesagem> = pesagens.iter().map(resumir_pesagem).collect();

        let peso_atual = animal
            .peso_atual_kg
            .or_else(|| pesagem_atual.as_ref().and_then(|p| p.peso));
        let data_peso_atual = pesagem_atual
            .as_ref()
            .map(|p| p.data)
            .or_else(|| Some(animal.atualizado_em.date_naive()));

        let status_reprodutivo = self
            .curral_repo
            .ultimo_evento_prenhez(animal.id)
            .await?
            .map(|evento| evento.prenhez_status.descricao().to_string())
            .unwrap_or_default();

        let lote_atual = self
            .curral_repo
            .ultimo_lote_destino(animal.id)
            .await?
            .unwrap_or_default();

        let origem_cadastro = self
            .animal_repo
            .primeira_movimentacao(animal.id)
            .await?
            .map(|movimentacao| descrever_origem_cadastro(&movimentacao.tipo_movimentacao, movimentacao.motivo_detalhado.as_deref()))
            .unwrap_or_default();

        let idade_meses = animal
            .data_nascimento
            .map(|nascimento| idade_em_meses(nascimento, Utc::now().date_naive()));

        // Integração real com o BND poderá substituir esta regra.
        let consta_bnd = true;

        Ok(FichaAnimal {
            id: animal.id,
            numero_brinco: animal.numero_brinco.clone(),
            codigo_sisbov: sisbov,
            codigo_eletronico: animal.codigo_eletronico.clone().unwrap_or_default(),
            numero_manejo,
            raca: animal.raca.clone().unwrap_or_default(),
            sexo: animal.sexo.descricao().to_string(),
            idade_meses,
            data_nascimento: animal.data_nascimento,
            data_cadastro: animal.data_identificacao,
            categoria: animal.categoria.clone().unwrap_or_default(),
            status: animal.status.descricao().to_string(),
            peso_atual,
            data_peso_atual,
            pesagem_atual,
            pesagem_anterior,
            pesagens_historico,
            status_reprodutivo,
            lote_atual,
            origem_cadastro,
            observacoes: animal.observacoes.clone().unwrap_or_default(),
            consta_bnd,
            situacao_bnd: avaliar_situacao_bnd(consta_bnd, true),
        })
    }
}

fn montar_ficha_brinco(brinco: &BrincoAnimal) -> FichaBrinco {
    let consta_bnd = true;
    FichaBrinco {
        id: brinco.id,
        numero_brinco: brinco.numero_brinco.clone(),
        codigo_rfid: brinco.codigo_rfid.clone().unwrap_or_default(),
        tipo_brinco: brinco.tipo_brinco.descricao().to_string(),
        status: brinco.status.descricao().to_string(),
        codigo_lote: brinco.codigo_lote.clone().unwrap_or_default(),
        fornecedor: brinco.fornecedor.clone().unwrap_or_default(),
        data_aquisicao: brinco.data_aquisicao,
        numero_manejo: extrair_numero_manejo(&brinco.numero_brinco).unwrap_or_default(),
        consta_bnd,
        situacao_bnd: avaliar_situacao_bnd(consta_bnd, true),
    }
}

fn descrever_origem_cadastro(tipo: &TipoMovimentacao, motivo: Option<&str>) -> String {
    let motivo = motivo.unwrap_or_default().to_lowercase();
    if motivo.contains("ajuste") && motivo.contains("sis") {
        return "Ajuste SISBOV".to_string();
    }
    match tipo {
        TipoMovimentacao::Nascimento => "Nascimento".to_string(),
        TipoMovimentacao::Compra => "Compra".to_string(),
        outro => outro.descricao().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::animal::{Sexo, StatusAnimal, StatusBrinco, TipoBrinco};

    fn animal(
        sisbov: Option<&str>,
        brinco: &str,
        rfid: Option<&str>,
        manejo: Option<&str>,
    ) -> AnimalIndividual {
        AnimalIndividual {
            id: Uuid::new_v4(),
            propriedade_id: Uuid::new_v4(),
            numero_brinco: brinco.to_string(),
            codigo_sisbov: sisbov.map(str::to_string),
            numero_manejo: manejo.map(str::to_string),
            codigo_eletronico: rfid.map(str::to_string),
            tipo_brinco: TipoBrinco::Visual,
            sexo: Sexo::F,
            raca: None,
            categoria: None,
            data_nascimento: None,
            data_identificacao: None,
            peso_atual_kg: None,
            status: StatusAnimal::Ativo,
            observacoes: None,
            criado_em: Utc::now(),
            atualizado_em: Utc::now(),
        }
    }

    fn brinco_estoque(numero: &str, rfid: Option<&str>) -> BrincoAnimal {
        BrincoAnimal {
            id: Uuid::new_v4(),
            propriedade_id: Uuid::new_v4(),
            numero_brinco: numero.to_string(),
            codigo_rfid: rfid.map(str::to_string),
            tipo_brinco: TipoBrinco::Visual,
            status: StatusBrinco::Disponivel,
            animal_id: None,
            codigo_lote: None,
            fornecedor: None,
            data_aquisicao: None,
            data_utilizacao: None,
            data_descarte: None,
            status_motivo: None,
            criado_em: Utc::now(),
            atualizado_em: Utc::now(),
        }
    }

    #[test]
    fn normalizacao_remove_tudo_que_nao_e_digito() {
        assert_eq!(normalizar_codigo("BR 105-500.376 197505"), "105500376197505");
        assert_eq!(normalizar_codigo("abc"), "");
    }

    #[test]
    fn extracao_do_manejo_nas_posicoes_8_a_13() {
        // Exemplo literal da regra de extração.
        assert_eq!(
            extrair_numero_manejo("105500376197505").as_deref(),
            Some("619750")
        );
        assert_eq!(
            extrair_numero_manejo("105500376195129").as_deref(),
            Some("619512")
        );
    }

    #[test]
    fn extracao_para_codigos_curtos() {
        // 8-14 dígitos: descarta o verificador e toma os 7 últimos.
        assert_eq!(extrair_numero_manejo("123456789").as_deref(), Some("2345678"));
        assert_eq!(extrair_numero_manejo("1234567"), None);
    }

    #[test]
    fn sisbov_completo_casa_somente_por_igualdade_exata() {
        let rebanho = vec![animal(Some("105500376197505"), "105500376197505", None, None)];

        assert_eq!(casar_animais(&rebanho, "105500376197505").len(), 1);
        // Mesmo sufixo, código diferente: não casa.
        assert!(casar_animais(&rebanho, "999900376197505").is_empty());
    }

    #[test]
    fn seis_digitos_casa_pelo_manejo_armazenado() {
        let rebanho = vec![animal(None, "BR0001", None, Some("619512"))];
        assert_eq!(casar_animais(&rebanho, "619512").len(), 1);
    }

    #[test]
    fn seis_digitos_casa_pelas_posicoes_do_sisbov() {
        let rebanho = vec![animal(Some("105500376195129"), "BR0001", None, None)];
        assert_eq!(casar_animais(&rebanho, "619512").len(), 1);
        // Sufixo do SISBOV não vale para 6 dígitos (posições 8-13 mandam).
        assert!(casar_animais(&rebanho, "195129").is_empty());
    }

    #[test]
    fn seis_digitos_casa_pelo_sufixo_do_brinco() {
        let rebanho = vec![animal(None, "888619512", None, None)];
        assert_eq!(casar_animais(&rebanho, "619512").len(), 1);
    }

    #[test]
    fn rfid_casa_por_igualdade_exata() {
        let rebanho = vec![animal(None, "BR0001", Some("982000123456789"), None)];
        // RFID não é SISBOV: 15 dígitos casam apenas sisbov/brinco exatos,
        // mas o RFID em si é um identificador exato para outros comprimentos.
        assert!(casar_animais(&rebanho, "9820001234567").is_empty());

        let rebanho = vec![animal(None, "BR0001", Some("9820001234"), None)];
        assert_eq!(casar_animais(&rebanho, "9820001234").len(), 1);
    }

    #[test]
    fn sete_digitos_casa_pelo_sufixo_do_sisbov() {
        let rebanho = vec![animal(Some("105500376197505"), "BR0001", None, None)];
        assert_eq!(casar_animais(&rebanho, "6197505").len(), 1);
        assert!(casar_animais(&rebanho, "6197500").is_empty());
    }

    #[test]
    fn duplicidade_exige_lista_completa_nunca_escolha_silenciosa() {
        // Dois animais com o mesmo número de manejo, SISBOVs distintos.
        let rebanho = vec![
            animal(Some("105500376195129"), "105500376195129", None, Some("619512")),
            animal(Some("105509996195120"), "105509996195120", None, Some("619512")),
        ];
        match resolver_candidatos(casar_animais(&rebanho, "619512")) {
            Resolucao::Duplicidade(candidatos) => assert_eq!(candidatos.len(), 2),
            outro => panic!("esperava duplicidade, veio {outro:?}"),
        }
    }

    #[test]
    fn duplicidade_com_um_so_sisbov_resolve_para_ele() {
        let com_sisbov = animal(Some("105500376195129"), "105500376195129", None, Some("619512"));
        let sem_sisbov = animal(None, "", None, Some("619512"));
        let id_esperado = com_sisbov.id;

        let rebanho = vec![sem_sisbov, com_sisbov];
        match resolver_candidatos(casar_animais(&rebanho, "619512")) {
            Resolucao::Unico(animal) => assert_eq!(animal.id, id_esperado),
            outro => panic!("esperava único, veio {outro:?}"),
        }
    }

    #[test]
    fn candidatos_sem_sisbov_viram_nao_encontrado() {
        let rebanho = vec![
            animal(None, "", None, Some("619512")),
            animal(None, "", Some("619512"), None),
        ];
        assert!(matches!(
            resolver_candidatos(casar_animais(&rebanho, "619512")),
            Resolucao::SemSisbov
        ));
    }

    #[test]
    fn brinco_de_estoque_casa_por_numero_rfid_e_manejo() {
        let estoque = vec![brinco_estoque("105500376197505", Some("9820001234"))];

        assert_eq!(casar_brincos(&estoque, "105500376197505").len(), 1);
        assert_eq!(casar_brincos(&estoque, "9820001234").len(), 1);
        // 6 dígitos contra as posições 8-13 do número do brinco.
        assert_eq!(casar_brincos(&estoque, "619750").len(), 1);
        // SISBOV completo diferente: exato apenas.
        assert!(casar_brincos(&estoque, "999900376197505").is_empty());
    }

    #[test]
    fn multiplos_brincos_com_mesmo_manejo_sao_todos_retornados() {
        let estoque = vec![
            brinco_estoque("105500376195129", None),
            brinco_estoque("105509996195120", None),
        ];
        // Ambos têm manejo 619512 nas posições 8-13.
        assert_eq!(casar_brincos(&estoque, "619512").len(), 2);
    }

    #[test]
    fn situacao_bnd() {
        assert_eq!(avaliar_situacao_bnd(true, true), SituacaoBnd::Conforme);
        assert_eq!(avaliar_situacao_bnd(true, false), SituacaoBnd::Atualizar);
        assert_eq!(avaliar_situacao_bnd(false, false), SituacaoBnd::NaoConforme);
    }

    #[test]
    fn idade_em_meses_considera_o_dia() {
        let nascimento = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let antes_do_dia = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let no_dia = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        assert_eq!(idade_em_meses(nascimento, antes_do_dia), 23);
        assert_eq!(idade_em_meses(nascimento, no_dia), 24);
    }
}
