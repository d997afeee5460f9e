use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("could not access MIDI devices: {0}")]
    DeviceAccessDenied(String),
    #[error("unknown parameter id: {0}")]
    UnknownParameter(String),
    #[error("bridge bind failed on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config error: {0}")]
    Config(String),
}
