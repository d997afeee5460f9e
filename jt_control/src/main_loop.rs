use crate::config::EngineConfig;
use crate::device::DeviceManager;
use crate::dispatcher::MessageDispatcher;
use crate::error::EngineError;
use crate::midi_api::MidiApi;
use crate::overlay::LabelOverlay;
use crate::patch::PatchController;
use crate::protocol::{ClientCommand, EngineEvent, ErrorCode, InboundMsg, OutboundMsg};
use crate::registry::ParameterRegistry;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

pub struct MainLoop<R = StdRng> {
    inbound_rx: Receiver<InboundMsg>,
    outbound_tx: Sender<OutboundMsg>,

    devices: DeviceManager,
    patch: PatchController<R>,
    overlays: HashMap<&'static str, LabelOverlay>,

    active_session_token: Option<String>,
    device_poll_interval: Duration,
    last_device_poll: Option<Instant>,
    access_denied: Option<String>,
    access_denied_reported: bool,
}

impl MainLoop<StdRng> {
    pub fn new(
        inbound_rx: Receiver<InboundMsg>,
        outbound_tx: Sender<OutboundMsg>,
        config: &EngineConfig,
    ) -> Self {
        let patch = PatchController::new(ParameterRegistry::new(), config);
        Self::with_patch(inbound_rx, outbound_tx, config, patch)
    }
}

impl<R: Rng> MainLoop<R> {
    pub fn with_patch(
        inbound_rx: Receiver<InboundMsg>,
        outbound_tx: Sender<OutboundMsg>,
        config: &EngineConfig,
        patch: PatchController<R>,
    ) -> Self {
        let overlays = patch
            .registry()
            .waveform_parameters()
            .filter_map(|p| p.waveform_slot.map(|slot| (p.id, LabelOverlay::new(slot))))
            .collect();

        Self {
            inbound_rx,
            outbound_tx,
            devices: DeviceManager::new(config.preferred_device_marker.clone()),
            patch,
            overlays,
            active_session_token: None,
            device_poll_interval: config.device_poll_interval(),
            last_device_poll: None,
            access_denied: None,
            access_denied_reported: false,
        }
    }

    pub fn devices(&self) -> &DeviceManager {
        &self.devices
    }

    pub fn patch(&self) -> &PatchController<R> {
        &self.patch
    }

    /// Records that MIDI access was refused. The first client to connect is
    /// told once; nothing retries.
    pub fn report_access_denied(&mut self, err: &EngineError) {
        error!("{err}");
        self.access_denied = Some(err.to_string());
    }

    pub fn tick(&mut self, api: &mut dyn MidiApi) {
        loop {
            match self.inbound_rx.try_recv() {
                Ok(InboundMsg::ClientConnected {
                    socket_addr,
                    session_token,
                }) => {
                    info!("UI client connected from {socket_addr}");
                    self.end_drags();
                    self.poll_devices(api, true);
                    self.active_session_token = Some(session_token.clone());
                    self.handshake(session_token);
                }
                Ok(InboundMsg::ClientDisconnected) => {
                    info!("UI client disconnected");
                    self.end_drags();
                    self.active_session_token = None;
                }
                Ok(InboundMsg::Command { cmd }) => self.handle_command(api, cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break,
            }
        }

        self.poll_devices(api, false);
    }

    fn handshake(&mut self, session_token: String) {
        self.send(EngineEvent::Handshake {
            session_token,
            parameters: self.patch.registry().infos(),
            devices: self.devices.known().to_vec(),
            selected_id: self.devices.current().map(|d| d.id.clone()),
            patch: self.patch.current().to_wire(),
        });

        if !self.access_denied_reported {
            if let Some(msg) = self.access_denied.clone() {
                self.access_denied_reported = true;
                self.send(EngineEvent::DeviceAccessDenied { msg });
            }
        }
    }

    fn handle_command(&mut self, api: &mut dyn MidiApi, cmd: ClientCommand) {
        match cmd {
            ClientCommand::HandshakeAck { .. } => {}
            ClientCommand::SetParam { id, value, .. } => {
                let mut dispatcher = MessageDispatcher::new(api, &self.devices);
                match self.patch.set(&mut dispatcher, &id, value) {
                    Ok((param, wire)) => {
                        let preview = self.overlays.get(param.id).and_then(|o| o.input(wire));
                        if let Some(event) = preview {
                            self.send(event);
                        }
                        self.send(EngineEvent::ParamApplied {
                            id: param.id.to_string(),
                            value: wire,
                        });
                    }
                    Err(e) => self.reject_unknown(e),
                }
            }
            ClientCommand::BeginDrag { id, .. } => {
                if !self.overlays.contains_key(id.as_str()) {
                    // Only waveform controls carry an overlay.
                    if let Err(e) = self.patch.registry().get(&id) {
                        self.reject_unknown(e);
                    }
                    return;
                }
                let others: Vec<&'static str> = self
                    .overlays
                    .iter()
                    .filter(|(other, o)| **other != id.as_str() && o.is_active())
                    .map(|(other, _)| *other)
                    .collect();
                for other in others {
                    self.end_drag(other);
                }
                let label = self.devices.display_label();
                if let Some(overlay) = self.overlays.get_mut(id.as_str()) {
                    let event = overlay.pointer_down(Some(label));
                    self.send(event);
                }
            }
            ClientCommand::EndDrag { id, .. } => match self.patch.registry().get(&id) {
                Ok(param) => self.end_drag(param.id),
                Err(e) => self.reject_unknown(e),
            },
            ClientCommand::SelectDevice { id, .. } => {
                self.devices.bind(id.as_deref());
                let event = self.devices.list_event();
                self.send(event);
            }
            ClientCommand::InitPatch { .. } => {
                let mut dispatcher = MessageDispatcher::new(api, &self.devices);
                let snapshot = self.patch.apply_init(&mut dispatcher);
                self.send(EngineEvent::PatchDefaultsApplied {
                    snapshot: snapshot.to_wire(),
                });
            }
            ClientCommand::RandomPatch { .. } => {
                let mut dispatcher = MessageDispatcher::new(api, &self.devices);
                let snapshot = self.patch.apply_random(&mut dispatcher);
                self.send(EngineEvent::PatchRandomized {
                    snapshot: snapshot.to_wire(),
                });
            }
            ClientCommand::RefreshDevices { .. } => {
                self.poll_devices(api, true);
            }
        }
    }

    /// Hot-plug watchdog: re-enumerates on an interval and rebinds when the
    /// port set changed.
    fn poll_devices(&mut self, api: &mut dyn MidiApi, force: bool) {
        let now = Instant::now();
        let due = self
            .last_device_poll
            .map_or(true, |last| now.duration_since(last) >= self.device_poll_interval);
        if !force && !due {
            return;
        }
        self.last_device_poll = Some(now);

        let outputs = api.list_outputs();
        let changed = outputs != self.devices.known();
        if !force && !changed {
            return;
        }
        if changed {
            api.ports_changed();
        }
        let event = self.devices.refresh(outputs);
        self.send(event);
    }

    fn end_drag(&mut self, id: &str) {
        let restore = self.overlays.get_mut(id).and_then(LabelOverlay::pointer_up);
        if let Some(event) = restore {
            self.send(event);
        }
    }

    /// Drops every drag in progress. Used when the client that owned the
    /// selector goes away, so there is nobody to send restores to.
    fn end_drags(&mut self) {
        for overlay in self.overlays.values_mut() {
            overlay.pointer_up();
        }
    }

    fn reject_unknown(&mut self, err: EngineError) {
        warn!("{err}");
        self.send(EngineEvent::Error {
            msg: err.to_string(),
            code: ErrorCode::UnknownParameter,
        });
    }

    fn send(&mut self, msg: EngineEvent) {
        if self.active_session_token.is_none() {
            return;
        }
        // Non-blocking best-effort; the UI resyncs from the next handshake.
        let _ = self.outbound_tx.try_send(OutboundMsg::Send { msg });
    }
}
