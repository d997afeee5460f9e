use std::net::SocketAddr;

pub const INBOUND_CAP: usize = 256;
pub const OUTBOUND_CAP: usize = 256;

pub enum InboundMsg {
    ClientConnected {
        socket_addr: SocketAddr,
        session_token: String,
    },
    ClientDisconnected,
    Command { cmd: ClientCommand },
}

pub enum OutboundMsg {
    Send { msg: EngineEvent },
}

pub use jt_protocol::{
    ClientCommand, ControlValue, DeviceHandle, EngineEvent, ErrorCode, OscSlot, ParamKind,
    ParamValue, ParameterInfo, PortState, CONTROL_CHANGE, DATA_MAX,
};
