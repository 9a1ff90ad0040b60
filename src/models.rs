pub mod animal;
pub mod curral;
