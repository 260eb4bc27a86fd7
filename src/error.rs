use thiserror::Error;

/// Errors surfaced by the solver components.
///
/// Configuration problems are logged individually as they are found and
/// counted; the count is carried here so the caller can abort with a single
/// fatal message after all issues have been reported.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{nerror} error(s) while processing [{section}]")]
    Config { section: &'static str, nerror: usize },

    #[error("numerical failure: {0}")]
    Numerics(String),
}

pub type Result<T> = std::result::Result<T, Error>;
