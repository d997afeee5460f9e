use crate::protocol::{DeviceHandle, EngineEvent};
use tracing::info;

pub const NO_DEVICES_LABEL: &str = "-- No Devices Found --";
pub const NO_SELECTION_LABEL: &str = "-- No Device Selected --";

/// Owns the single bound output and the policy for choosing it.
#[derive(Debug, Clone)]
pub struct DeviceManager {
    preferred_marker: String,
    known: Vec<DeviceHandle>,
    bound: Option<String>,
}

impl DeviceManager {
    pub fn new(preferred_marker: impl Into<String>) -> Self {
        Self {
            preferred_marker: preferred_marker.into(),
            known: Vec::new(),
            bound: None,
        }
    }

    /// Re-evaluates the binding against a fresh enumeration.
    ///
    /// Keeps the current binding if that port is still connected, otherwise
    /// prefers a port whose name carries the configured marker, then falls
    /// back to the first connected port.
    pub fn refresh(&mut self, known: Vec<DeviceHandle>) -> EngineEvent {
        let previous = self.bound.take();
        self.known = known;

        let chosen = self
            .connected()
            .find(|d| previous.as_deref() == Some(d.id.as_str()))
            .or_else(|| {
                self.connected()
                    .find(|d| d.name.contains(self.preferred_marker.as_str()))
            })
            .or_else(|| self.connected().next())
            .map(|d| d.id.clone());

        if chosen != previous {
            match chosen.as_deref().and_then(|id| self.find(id)) {
                Some(d) => info!("now bound to {} ({})", d.name, d.id),
                None => info!("no MIDI output available"),
            }
        }
        self.bound = chosen;
        self.list_event()
    }

    /// Explicit user selection. An id that is not a known connected port unbinds.
    pub fn bind(&mut self, id: Option<&str>) -> Option<&DeviceHandle> {
        self.bound = id
            .and_then(|id| self.connected().find(|d| d.id == id))
            .map(|d| d.id.clone());
        match self.current() {
            Some(d) => info!("now bound to {} ({})", d.name, d.id),
            None => info!("no valid MIDI output selected"),
        }
        self.current()
    }

    pub fn current(&self) -> Option<&DeviceHandle> {
        self.bound.as_deref().and_then(|id| self.find(id))
    }

    pub fn known(&self) -> &[DeviceHandle] {
        &self.known
    }

    /// Text the device selector shows for the current state.
    pub fn display_label(&self) -> String {
        match self.current() {
            Some(d) => d.name.clone(),
            None if self.known.is_empty() => NO_DEVICES_LABEL.to_string(),
            None => NO_SELECTION_LABEL.to_string(),
        }
    }

    pub fn list_event(&self) -> EngineEvent {
        EngineEvent::DeviceListChanged {
            devices: self.known.clone(),
            selected_id: self.bound.clone(),
        }
    }

    fn find(&self, id: &str) -> Option<&DeviceHandle> {
        self.known.iter().find(|d| d.id == id)
    }

    fn connected(&self) -> impl Iterator<Item = &DeviceHandle> {
        self.known.iter().filter(|d| d.is_connected())
    }
}
