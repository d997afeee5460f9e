use crate::device::DeviceManager;
use crate::midi_api::MidiApi;
use crate::protocol::{CONTROL_CHANGE, DATA_MAX};
use tracing::{debug, trace, warn};

/// Builds a control-change frame, clamping both data bytes into range.
pub fn encode_control_change(address: u8, value: i32) -> [u8; 3] {
    [
        CONTROL_CHANGE,
        address.min(DATA_MAX),
        value.clamp(0, DATA_MAX as i32) as u8,
    ]
}

/// Sends control changes to whatever device is bound right now.
pub struct MessageDispatcher<'a> {
    transport: &'a mut dyn MidiApi,
    devices: &'a DeviceManager,
}

impl<'a> MessageDispatcher<'a> {
    pub fn new(transport: &'a mut dyn MidiApi, devices: &'a DeviceManager) -> Self {
        Self { transport, devices }
    }

    /// Fire-and-forget. With no bound device the message is dropped.
    pub fn send(&mut self, address: u8, value: i32) {
        let frame = encode_control_change(address, value);
        let Some(device) = self.devices.current() else {
            trace!(
                "no MIDI output selected, dropping CC {} = {}",
                frame[1],
                frame[2]
            );
            return;
        };

        match self.transport.transmit(&device.id, &frame) {
            Ok(()) => debug!("sent CC {} = {} to {}", frame[1], frame[2], device.name),
            Err(e) => warn!("send to {} failed: {e}", device.name),
        }
    }
}
