use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider catalog must contain at least one provider")]
    EmptyCatalog,
    #[error("duplicate provider id '{0}'")]
    DuplicateId(String),
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),
}
