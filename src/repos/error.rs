/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 * - "not found" は error ではなく `Ok(None)` で表す (UserRepo::get 参照)
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("user {name} already exists")]
    Conflict { name: String },
}

pub type RepoResult<T> = Result<T, RepoError>;

impl RepoError {
    /// Maps a unique violation on insert to `Conflict`; everything else stays `Db`.
    pub fn from_sqlx(e: sqlx::Error, name: &str) -> Self {
        if let sqlx::Error::Database(dbe) = &e
            && dbe.code().as_deref() == Some("23505")
        {
            return RepoError::Conflict {
                name: name.to_string(),
            };
        }
        RepoError::Db(e)
    }
}
