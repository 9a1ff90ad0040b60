pub mod curral;
pub mod identificacao;
