use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio fault: {0}")]
    Gpio(String),
    #[error("spi fault: {0}")]
    Spi(String),
    #[error("pwm fault: {0}")]
    Pwm(String),
    #[error("adc channel out of range: {0}")]
    BadChannel(u8),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
