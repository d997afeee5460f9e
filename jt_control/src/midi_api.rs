use crate::error::EngineError;
use crate::protocol::DeviceHandle;
use midir::{MidiOutput, MidiOutputConnection};
use tracing::{debug, info};

/// Output-side transport capability the engine drives.
pub trait MidiApi {
    /// Current output ports in enumeration order.
    fn list_outputs(&self) -> Vec<DeviceHandle>;

    /// Sends one message to the port with the given id.
    fn transmit(&mut self, port_id: &str, bytes: &[u8; 3]) -> Result<(), String>;

    /// Called when an enumeration differs from the previous one. Open
    /// connections may point at ports that went away and came back.
    fn ports_changed(&mut self) {}
}

struct OpenPort {
    id: String,
    conn: MidiOutputConnection,
}

/// `midir` backed transport. Keeps one connection open to the last port sent to.
pub struct MidirApi {
    client_name: String,
    output: MidiOutput,
    open: Option<OpenPort>,
}

impl MidirApi {
    /// Opens the platform MIDI client. Failure here is fatal for the session.
    pub fn acquire(client_name: &str) -> Result<Self, EngineError> {
        let output = MidiOutput::new(client_name)
            .map_err(|e| EngineError::DeviceAccessDenied(e.to_string()))?;
        info!("MIDI access granted for client {client_name:?}");
        Ok(Self {
            client_name: client_name.to_string(),
            output,
            open: None,
        })
    }

    fn connect(&mut self, port_id: &str) -> Result<&mut OpenPort, String> {
        let reuse = self.open.as_ref().is_some_and(|p| p.id == port_id);
        if !reuse {
            // midir connections consume their client, so every port gets its own.
            self.open = None;
            let client = MidiOutput::new(&self.client_name).map_err(|e| e.to_string())?;
            let port = client
                .find_port_by_id(port_id.to_string())
                .ok_or_else(|| format!("port {port_id} is gone"))?;
            let conn = client
                .connect(&port, &format!("{}-out", self.client_name))
                .map_err(|e| e.to_string())?;
            debug!("opened MIDI connection to {port_id}");
            self.open = Some(OpenPort {
                id: port_id.to_string(),
                conn,
            });
        }
        self.open
            .as_mut()
            .ok_or_else(|| format!("no open connection for {port_id}"))
    }
}

impl MidiApi for MidirApi {
    fn list_outputs(&self) -> Vec<DeviceHandle> {
        self.output
            .ports()
            .iter()
            .filter_map(|port| {
                let name = self.output.port_name(port).ok()?;
                Some(DeviceHandle::connected(port.id(), name))
            })
            .collect()
    }

    fn transmit(&mut self, port_id: &str, bytes: &[u8; 3]) -> Result<(), String> {
        let open = self.connect(port_id)?;
        let sent = open.conn.send(bytes).map_err(|e| e.to_string());
        if sent.is_err() {
            // Drop a broken connection so the next send reopens it.
            self.open = None;
        }
        sent
    }

    fn ports_changed(&mut self) {
        // Some backends keep accepting sends on a dead subscription.
        if let Some(open) = self.open.take() {
            debug!("port list changed, closing MIDI connection to {}", open.id);
            open.conn.close();
        }
    }
}

/// Stand-in after MIDI access was refused: no ports, nothing to send to.
pub struct NoMidiAccess;

impl MidiApi for NoMidiAccess {
    fn list_outputs(&self) -> Vec<DeviceHandle> {
        Vec::new()
    }

    fn transmit(&mut self, port_id: &str, _bytes: &[u8; 3]) -> Result<(), String> {
        Err(format!("no MIDI access (port {port_id})"))
    }
}
