use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum LoadError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("sampler fault: {0}")]
    Sampler(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing duty sink")]
    MissingDutySink,
    #[error("missing display")]
    MissingDisplay,
    #[error("missing input panel")]
    MissingInput,
    #[error("missing accumulator bank")]
    MissingAccumulators,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
