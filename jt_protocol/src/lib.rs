use serde::{Deserialize, Serialize};

/// Status byte of a control-change message on MIDI channel 1.
pub const CONTROL_CHANGE: u8 = 0xB0;

/// Largest value a MIDI data byte can carry.
pub const DATA_MAX: u8 = 127;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OscSlot {
    Osc1,
    Osc2,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Continuous,
    Boolean,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PortState {
    Connected,
    Disconnected,
}

/// An output port as reported by the transport.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    pub id: String,
    pub name: String,
    pub state: PortState,
}

impl DeviceHandle {
    pub fn connected(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state: PortState::Connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, PortState::Connected)
    }
}

/// Catalog entry sent to the UI so it can build its controls generically.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ParameterInfo {
    pub id: String,
    pub group: String,
    pub address: u8,
    pub default_value: u8,
    pub kind: ParamKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform_slot: Option<OscSlot>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ParamValue {
    pub id: String,
    pub value: u8,
}

/// A value coming from a UI control: a slider level or a checkbox state.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum ControlValue {
    Toggle(bool),
    Level(i32),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Busy,
    UnknownParameter,
    InvalidCommand,
    InternalError,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EngineEvent {
    Handshake {
        session_token: String,
        parameters: Vec<ParameterInfo>,
        devices: Vec<DeviceHandle>,
        selected_id: Option<String>,
        patch: Vec<ParamValue>,
    },
    PatchDefaultsApplied {
        snapshot: Vec<ParamValue>,
    },
    PatchRandomized {
        snapshot: Vec<ParamValue>,
    },
    ParamApplied {
        id: String,
        value: u8,
    },
    DeviceListChanged {
        devices: Vec<DeviceHandle>,
        selected_id: Option<String>,
    },
    WaveformLabelPreview {
        slot: OscSlot,
        label: String,
    },
    WaveformLabelRestore {
        slot: OscSlot,
        label: String,
    },
    DeviceAccessDenied {
        msg: String,
    },
    Error {
        msg: String,
        code: ErrorCode,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ClientCommand {
    HandshakeAck {
        session_token: String,
    },
    SetParam {
        session_token: String,
        id: String,
        value: ControlValue,
    },
    BeginDrag {
        session_token: String,
        id: String,
    },
    EndDrag {
        session_token: String,
        id: String,
    },
    SelectDevice {
        session_token: String,
        id: Option<String>,
    },
    InitPatch {
        session_token: String,
    },
    RandomPatch {
        session_token: String,
    },
    RefreshDevices {
        session_token: String,
    },
}

impl ClientCommand {
    pub fn session_token(&self) -> &str {
        match self {
            ClientCommand::HandshakeAck { session_token } => session_token,
            ClientCommand::SetParam { session_token, .. } => session_token,
            ClientCommand::BeginDrag { session_token, .. } => session_token,
            ClientCommand::EndDrag { session_token, .. } => session_token,
            ClientCommand::SelectDevice { session_token, .. } => session_token,
            ClientCommand::InitPatch { session_token } => session_token,
            ClientCommand::RandomPatch { session_token } => session_token,
            ClientCommand::RefreshDevices { session_token } => session_token,
        }
    }
}
