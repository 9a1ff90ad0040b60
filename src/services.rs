pub mod cadastro;
pub mod curral;
pub mod identificacao;
