use crossbeam_channel::bounded;
use jt_control::protocol::DeviceHandle;
use jt_control::{init_logging, EngineConfig, MainLoop, MidiApi, NetworkThread};
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info};

const DEFAULT_ADDR: &str = "127.0.0.1:0";
const MOCK_PORT_ID: &str = "mock-jt-4000m";

/// One fake synth port; frames are only logged.
struct MockSynthApi {
    frames: usize,
}

impl MidiApi for MockSynthApi {
    fn list_outputs(&self) -> Vec<DeviceHandle> {
        vec![DeviceHandle::connected(MOCK_PORT_ID, "JT-4000M (Mock)")]
    }

    fn transmit(&mut self, port_id: &str, bytes: &[u8; 3]) -> Result<(), String> {
        if port_id != MOCK_PORT_ID {
            return Err(format!("unknown port {port_id}"));
        }
        self.frames += 1;
        info!(
            "frame #{}: {:02X} {:02X} {:02X}",
            self.frames, bytes[0], bytes[1], bytes[2]
        );
        Ok(())
    }
}

fn parse_arg_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn main() {
    init_logging(None);
    let args: Vec<String> = std::env::args().collect();

    let addr = parse_arg_value(&args, "--addr")
        .or_else(|| std::env::var("JT_BRIDGE_ADDR").ok())
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let addr_file = parse_arg_value(&args, "--addr-file").map(PathBuf::from);
    let run_for_ms = parse_arg_value(&args, "--run-for-ms")
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis);

    let config = EngineConfig::default();
    let (in_tx, in_rx) = bounded(jt_control::INBOUND_CAP);
    let (out_tx, out_rx) = bounded(jt_control::OUTBOUND_CAP);

    let net = match NetworkThread::spawn_with_addr(&addr, in_tx, out_rx) {
        Ok(n) => n,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    if let Some(path) = &addr_file {
        let _ = fs::write(path, net.listen_addr().to_string());
    }

    println!("mock_synth listening on ws://{}", net.listen_addr());

    let mut api = MockSynthApi { frames: 0 };
    let mut main_loop = MainLoop::new(in_rx, out_tx, &config);

    let start = Instant::now();
    loop {
        main_loop.tick(&mut api);
        thread::sleep(config.tick_interval());
        if let Some(max) = run_for_ms {
            if start.elapsed() >= max {
                break;
            }
        }
    }

    net.shutdown();
}
