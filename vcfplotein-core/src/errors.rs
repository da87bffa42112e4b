use thiserror::Error;

/// Error type for vcfplotein-core operations.
#[derive(Error, Debug)]
pub enum VcfError {
    #[error("Can't read VCF file: {0}")]
    FileReadError(String),

    #[error("Invalid POS field on line {line}: {value}")]
    InvalidPosition { line: usize, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for vcfplotein-core operations.
pub type Result<T> = std::result::Result<T, VcfError>;
