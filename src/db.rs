pub mod animal_repo;
pub use animal_repo::AnimalRepository;
pub mod curral_repo;
pub use curral_repo::CurralRepository;
