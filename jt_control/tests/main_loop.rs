use crossbeam_channel::{bounded, Receiver, Sender};
use jt_control::protocol::{
    ClientCommand, ControlValue, DeviceHandle, EngineEvent, ErrorCode, OscSlot,
};
use jt_control::{EngineConfig, EngineError, InboundMsg, MainLoop, MidiApi, OutboundMsg};

const TOKEN: &str = "test-token";

struct RecordingMidi {
    ports: Vec<DeviceHandle>,
    frames: Vec<[u8; 3]>,
    reopens: usize,
}

impl MidiApi for RecordingMidi {
    fn list_outputs(&self) -> Vec<DeviceHandle> {
        self.ports.clone()
    }

    fn transmit(&mut self, _port_id: &str, bytes: &[u8; 3]) -> Result<(), String> {
        self.frames.push(*bytes);
        Ok(())
    }

    fn ports_changed(&mut self) {
        self.reopens += 1;
    }
}

struct Harness {
    in_tx: Sender<InboundMsg>,
    out_rx: Receiver<OutboundMsg>,
    main_loop: MainLoop,
    api: RecordingMidi,
}

impl Harness {
    fn new(config: &EngineConfig) -> Self {
        let (in_tx, in_rx) = bounded(jt_control::INBOUND_CAP);
        let (out_tx, out_rx) = bounded(jt_control::OUTBOUND_CAP);
        Self {
            in_tx,
            out_rx,
            main_loop: MainLoop::new(in_rx, out_tx, config),
            api: RecordingMidi {
                ports: vec![
                    DeviceHandle::connected("a", "Other Port"),
                    DeviceHandle::connected("b", "JT-4000M MIDI 1"),
                ],
                frames: Vec::new(),
                reopens: 0,
            },
        }
    }

    fn connect(&mut self) -> Vec<EngineEvent> {
        self.in_tx
            .send(InboundMsg::ClientConnected {
                socket_addr: "127.0.0.1:50000".parse().expect("socket addr"),
                session_token: TOKEN.to_string(),
            })
            .expect("queue connect");
        self.tick()
    }

    fn command(&mut self, cmd: ClientCommand) -> Vec<EngineEvent> {
        self.in_tx
            .send(InboundMsg::Command { cmd })
            .expect("queue command");
        self.tick()
    }

    fn tick(&mut self) -> Vec<EngineEvent> {
        self.main_loop.tick(&mut self.api);
        self.out_rx
            .try_iter()
            .map(|OutboundMsg::Send { msg }| msg)
            .collect()
    }
}

fn set_param(id: &str, value: ControlValue) -> ClientCommand {
    ClientCommand::SetParam {
        session_token: TOKEN.to_string(),
        id: id.to_string(),
        value,
    }
}

#[test]
fn handshake_carries_catalog_devices_and_patch() {
    let mut h = Harness::new(&EngineConfig::default());
    let events = h.connect();

    assert_eq!(events.len(), 1, "{events:?}");
    match &events[0] {
        EngineEvent::Handshake {
            session_token,
            parameters,
            devices,
            selected_id,
            patch,
        } => {
            assert_eq!(session_token, TOKEN);
            assert_eq!(parameters.len(), 31);
            assert_eq!(devices.len(), 2);
            assert_eq!(selected_id.as_deref(), Some("b"));
            assert_eq!(patch.len(), 31);
            let cutoff = patch.iter().find(|v| v.id == "vcf-cutoff").expect("cutoff");
            assert_eq!(cutoff.value, 80);
        }
        other => panic!("expected handshake, got {other:?}"),
    }
    assert!(h.api.frames.is_empty());
}

#[test]
fn set_param_sends_one_frame_and_echoes() {
    let mut h = Harness::new(&EngineConfig::default());
    h.connect();

    let events = h.command(set_param("vcf-cutoff", ControlValue::Level(100)));
    assert_eq!(h.api.frames, vec![[0xB0, 74, 100]]);
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::ParamApplied { id, value: 100 }] if id == "vcf-cutoff"
    ));

    let events = h.command(set_param("ring-mod-onoff", ControlValue::Toggle(true)));
    assert_eq!(h.api.frames.last(), Some(&[0xB0, 96, 127]));
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::ParamApplied { value: 127, .. }]
    ));
}

#[test]
fn unknown_parameter_is_reported_not_sent() {
    let mut h = Harness::new(&EngineConfig::default());
    h.connect();

    let events = h.command(set_param("osc3-wave", ControlValue::Level(5)));
    assert!(h.api.frames.is_empty());
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::Error {
            code: ErrorCode::UnknownParameter,
            ..
        }]
    ));
}

#[test]
fn waveform_drag_previews_and_restores_device_label() {
    let mut h = Harness::new(&EngineConfig::default());
    h.connect();

    let events = h.command(ClientCommand::BeginDrag {
        session_token: TOKEN.to_string(),
        id: "osc1-wave".to_string(),
    });
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::WaveformLabelPreview { slot: OscSlot::Osc1, label }] if label.is_empty()
    ));

    let events = h.command(set_param("osc1-wave", ControlValue::Level(90)));
    assert_eq!(h.api.frames, vec![[0xB0, 24, 90]]);
    assert!(matches!(
        events.as_slice(),
        [
            EngineEvent::WaveformLabelPreview { label, .. },
            EngineEvent::ParamApplied { value: 90, .. },
        ] if label == "SSAW"
    ));

    let events = h.command(ClientCommand::EndDrag {
        session_token: TOKEN.to_string(),
        id: "osc1-wave".to_string(),
    });
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::WaveformLabelRestore { slot: OscSlot::Osc1, label }]
            if label == "JT-4000M MIDI 1"
    ));

    // Outside a drag the value is still sent but no preview appears.
    let events = h.command(set_param("osc1-wave", ControlValue::Level(10)));
    assert_eq!(h.api.frames.len(), 2);
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::ParamApplied { value: 10, .. }]
    ));
}

#[test]
fn drag_on_plain_control_is_ignored() {
    let mut h = Harness::new(&EngineConfig::default());
    h.connect();

    let events = h.command(ClientCommand::BeginDrag {
        session_token: TOKEN.to_string(),
        id: "vcf-cutoff".to_string(),
    });
    assert!(events.is_empty(), "{events:?}");
}

#[test]
fn init_and_random_patches_reach_the_device() {
    let mut h = Harness::new(&EngineConfig::default());
    h.connect();

    let events = h.command(ClientCommand::InitPatch {
        session_token: TOKEN.to_string(),
    });
    assert_eq!(h.api.frames.len(), 31);
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::PatchDefaultsApplied { snapshot }] if snapshot.len() == 31
    ));

    let events = h.command(ClientCommand::RandomPatch {
        session_token: TOKEN.to_string(),
    });
    assert_eq!(h.api.frames.len(), 62);
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::PatchRandomized { snapshot }] if snapshot.len() == 31
    ));
}

#[test]
fn select_device_redirects_and_unplug_rebinds() {
    let config = EngineConfig {
        device_poll_interval_ms: 0,
        ..EngineConfig::default()
    };
    let mut h = Harness::new(&config);
    h.connect();

    let events = h.command(ClientCommand::SelectDevice {
        session_token: TOKEN.to_string(),
        id: Some("a".to_string()),
    });
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::DeviceListChanged { selected_id: Some(id), .. }] if id == "a"
    ));
    assert_eq!(h.main_loop.devices().current().map(|d| d.id.as_str()), Some("a"));

    h.api.ports.retain(|d| d.id != "a");
    let events = h.tick();
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::DeviceListChanged { selected_id: Some(id), devices }]
            if id == "b" && devices.len() == 1
    ));

    h.api.ports.clear();
    let events = h.tick();
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::DeviceListChanged { selected_id: None, .. }]
    ));

    h.command(set_param("vcf-cutoff", ControlValue::Level(1)));
    assert!(h.api.frames.is_empty());

    // No change in the port list means no event.
    assert!(h.tick().is_empty());
}

#[test]
fn access_denied_is_reported_once() {
    let mut h = Harness::new(&EngineConfig::default());
    h.api.ports.clear();
    h.main_loop
        .report_access_denied(&EngineError::DeviceAccessDenied("no backend".to_string()));

    let events = h.connect();
    assert!(matches!(
        events.as_slice(),
        [
            EngineEvent::Handshake { selected_id: None, .. },
            EngineEvent::DeviceAccessDenied { msg },
        ] if msg.contains("no backend")
    ));

    h.in_tx
        .send(InboundMsg::ClientDisconnected)
        .expect("queue disconnect");
    assert!(h.tick().is_empty());

    let events = h.connect();
    assert!(matches!(events.as_slice(), [EngineEvent::Handshake { .. }]));
}

#[test]
fn events_are_dropped_while_no_client_is_connected() {
    let mut h = Harness::new(&EngineConfig::default());
    // First tick enumerates and binds.
    assert!(h.tick().is_empty());
    let events = h.command(set_param("vcf-cutoff", ControlValue::Level(42)));
    assert!(events.is_empty());
    assert_eq!(h.api.frames, vec![[0xB0, 74, 42]]);
}

fn drag(id: &str, begin: bool) -> ClientCommand {
    let session_token = TOKEN.to_string();
    let id = id.to_string();
    if begin {
        ClientCommand::BeginDrag { session_token, id }
    } else {
        ClientCommand::EndDrag { session_token, id }
    }
}

#[test]
fn end_drag_on_unknown_id_is_reported() {
    let mut h = Harness::new(&EngineConfig::default());
    h.connect();

    let events = h.command(drag("osc3-wave", false));
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::Error {
            code: ErrorCode::UnknownParameter,
            ..
        }]
    ));
}

#[test]
fn dragging_the_other_oscillator_restores_the_first() {
    let mut h = Harness::new(&EngineConfig::default());
    h.connect();

    h.command(drag("osc1-wave", true));
    let events = h.command(drag("osc2-wave", true));
    assert!(matches!(
        events.as_slice(),
        [
            EngineEvent::WaveformLabelRestore { slot: OscSlot::Osc1, label: restored },
            EngineEvent::WaveformLabelPreview { slot: OscSlot::Osc2, label: blank },
        ] if restored == "JT-4000M MIDI 1" && blank.is_empty()
    ));

    // Osc 1 is idle now, so only osc 2 answers a release.
    assert!(h.command(drag("osc1-wave", false)).is_empty());
    let events = h.command(drag("osc2-wave", false));
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::WaveformLabelRestore { slot: OscSlot::Osc2, label }]
            if label == "JT-4000M MIDI 1"
    ));
}

#[test]
fn unplug_during_drag_still_restores_captured_label() {
    let config = EngineConfig {
        device_poll_interval_ms: 0,
        ..EngineConfig::default()
    };
    let mut h = Harness::new(&config);
    h.connect();

    h.command(drag("osc2-wave", true));
    h.api.ports.retain(|d| d.id != "b");
    let events = h.tick();
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::DeviceListChanged { selected_id: Some(id), .. }] if id == "a"
    ));

    let events = h.command(drag("osc2-wave", false));
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::WaveformLabelRestore { slot: OscSlot::Osc2, label }]
            if label == "JT-4000M MIDI 1"
    ));
}

#[test]
fn replugged_port_gets_a_fresh_connection() {
    let config = EngineConfig {
        device_poll_interval_ms: 0,
        ..EngineConfig::default()
    };
    let mut h = Harness::new(&config);
    h.connect();
    // The first enumeration on connect counts as a change.
    let base = h.api.reopens;
    assert!(h.tick().is_empty());
    assert_eq!(h.api.reopens, base);

    let unplugged = h.api.ports.remove(1);
    h.tick();
    assert_eq!(h.api.reopens, base + 1);

    h.api.ports.push(unplugged);
    let events = h.tick();
    assert_eq!(h.api.reopens, base + 2);
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::DeviceListChanged { selected_id: Some(id), .. }] if id == "a"
    ));

    // A steady port list leaves connections alone.
    h.tick();
    assert_eq!(h.api.reopens, base + 2);
}

#[test]
fn disconnect_ends_drags_silently() {
    let mut h = Harness::new(&EngineConfig::default());
    h.connect();
    h.command(drag("osc1-wave", true));

    h.in_tx
        .send(InboundMsg::ClientDisconnected)
        .expect("queue disconnect");
    assert!(h.tick().is_empty());

    h.connect();
    assert!(h.command(drag("osc1-wave", false)).is_empty());
}
