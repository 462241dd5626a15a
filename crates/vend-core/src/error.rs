use thiserror::Error;

#[derive(Debug, Error)]
pub enum VendError {
    #[error("hardware initialization failed: {0}")]
    HardwareInit(String),

    #[error("unknown slot: {0}")]
    UnknownSlot(String),

    #[error("invalid slot label '{0}'")]
    InvalidSlot(String),

    #[error("slot {slot} references unbound relay channel {channel}")]
    UnboundChannel { slot: String, channel: u8 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, VendError>;
