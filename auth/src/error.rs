use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("payload carries no signature field")]
    MissingSignature,

    #[error("signature field is not valid hex")]
    MalformedSignature,

    #[error("signature does not match payload")]
    BadSignature,

    #[error("payload field missing or malformed: {0}")]
    MalformedField(&'static str),

    #[error("payload is too old")]
    Expired,
}
