use thiserror::Error;

#[derive(Debug, Error)]
pub enum PgmError {
    #[error("not a binary PGM (expected 'P5' magic, got '{0}')")]
    BadMagic(String),

    #[error("malformed PGM header: {0}")]
    BadHeader(String),

    #[error("unsupported max value {0} (expected 255)")]
    BadMaxValue(u32),

    #[error("truncated pixel payload: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum MeaPointError {
    #[error("malformed measured-point record: {0}")]
    BadRecord(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
