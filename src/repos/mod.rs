/*
 * Responsibility
 * - user store の公開インターフェース (trait + backend)
 */
pub mod error;
pub mod memory_user_repo;
pub mod user_repo;

#[cfg(test)]
pub mod testing;

pub use error::RepoError;
pub use memory_user_repo::MemoryUserRepo;
pub use user_repo::{NewUser, PgUserRepo, User, UserRepo};
