pub mod grant_repo;

pub use grant_repo::GrantRepo;
