pub mod config;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod main_loop;
pub mod midi_api;
pub mod net;
pub mod overlay;
pub mod patch;
pub mod protocol;
pub mod registry;
pub mod waveform;

pub use crate::config::EngineConfig;
pub use crate::device::DeviceManager;
pub use crate::dispatcher::{encode_control_change, MessageDispatcher};
pub use crate::error::EngineError;
pub use crate::main_loop::MainLoop;
pub use crate::midi_api::{MidiApi, MidirApi, NoMidiAccess};
pub use crate::net::NetworkThread;
pub use crate::overlay::LabelOverlay;
pub use crate::patch::{PatchController, PatchSnapshot};
pub use crate::protocol::{InboundMsg, OutboundMsg, INBOUND_CAP, OUTBOUND_CAP};
pub use crate::registry::{Parameter, ParameterRegistry};
pub use crate::waveform::Waveform;

/// Installs the `tracing` subscriber used by the binaries.
///
/// `filter` wins over `RUST_LOG`; with neither set the level is `info`.
pub fn init_logging(filter: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let filter = match filter {
        Some(f) => EnvFilter::new(f),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
