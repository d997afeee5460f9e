use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use crossbeam_channel::bounded;
use jt_control::{
    init_logging, waveform, DeviceManager, EngineConfig, MainLoop, MessageDispatcher, MidiApi,
    MidirApi, NetworkThread, NoMidiAccess, PatchController, PatchSnapshot, ParameterRegistry,
};
use jt_protocol::{ControlValue, OscSlot};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "jt_cli", about = "Drive a JT-4000M style synth over MIDI CC")]
struct Args {
    /// JSON config file. Missing file means defaults.
    #[arg(long, value_name = "PATH", default_value = "jt_control.json", global = true)]
    config: PathBuf,

    /// Output port to use, by id or name substring. Overrides the configured marker.
    #[arg(long, global = true)]
    device: Option<String>,

    /// Log filter, e.g. `debug` or `jt_control=trace`. Falls back to RUST_LOG.
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List MIDI output ports and the one that would be bound.
    Ports,
    /// Print the parameter catalog.
    Params,
    /// Send the init patch.
    Init,
    /// Send a random patch.
    Random {
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Send one parameter. `true`/`false` for toggles, a number otherwise.
    Set { id: String, value: String },
    /// Name the waveform a CC value selects on oscillator 1 or 2.
    Decode {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=2))]
        slot: u8,
        value: u8,
    },
    /// Run the engine behind the WebSocket UI bridge.
    Serve {
        /// Overrides `bridge_addr` from the config.
        #[arg(long)]
        addr: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_deref());

    let mut config = EngineConfig::load(&args.config)?;
    if let Some(device) = args.device.as_deref() {
        config.preferred_device_marker = device.to_string();
    }

    match args.command {
        Command::Ports => list_ports(&config),
        Command::Params => {
            print_params();
            Ok(())
        }
        Command::Init => {
            let (mut api, devices) = open_device(&config, args.device.as_deref())?;
            let mut patch = PatchController::new(ParameterRegistry::new(), &config);
            let snapshot = patch.apply_init(&mut MessageDispatcher::new(&mut api, &devices));
            print_snapshot(&snapshot);
            Ok(())
        }
        Command::Random { seed } => {
            let (mut api, devices) = open_device(&config, args.device.as_deref())?;
            let rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let mut patch = PatchController::with_rng(ParameterRegistry::new(), &config, rng);
            let snapshot = patch.apply_random(&mut MessageDispatcher::new(&mut api, &devices));
            print_snapshot(&snapshot);
            Ok(())
        }
        Command::Set { id, value } => {
            let value = parse_control_value(&value)?;
            let (mut api, devices) = open_device(&config, args.device.as_deref())?;
            let mut patch = PatchController::new(ParameterRegistry::new(), &config);
            let (param, wire) =
                patch.set(&mut MessageDispatcher::new(&mut api, &devices), &id, value)?;
            println!("{} (CC {}) = {}", param.id, param.address, wire);
            Ok(())
        }
        Command::Decode { slot, value } => {
            let slot = if slot == 1 { OscSlot::Osc1 } else { OscSlot::Osc2 };
            println!("{}", waveform::decode(slot, value));
            Ok(())
        }
        Command::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.bridge_addr.clone());
            serve(&config, &addr)
        }
    }
}

fn list_ports(config: &EngineConfig) -> anyhow::Result<()> {
    let api = MidirApi::acquire(&config.client_name)?;
    let mut devices = DeviceManager::new(config.preferred_device_marker.clone());
    devices.refresh(api.list_outputs());

    if devices.known().is_empty() {
        println!("{}", jt_control::device::NO_DEVICES_LABEL);
        return Ok(());
    }
    let selected = devices.current().map(|d| d.id.clone());
    for d in devices.known() {
        let marker = if selected.as_deref() == Some(d.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{marker} {}\t{}", d.name, d.id);
    }
    Ok(())
}

fn print_params() {
    for p in ParameterRegistry::new().all() {
        let kind = if p.is_toggle() { "toggle" } else { "level" };
        println!(
            "{:<18} {:<16} CC {:>3}  default {:>3}  {kind}",
            p.id, p.group, p.address, p.default_value
        );
    }
}

fn print_snapshot(snapshot: &PatchSnapshot) {
    for (id, value) in snapshot.entries() {
        println!("{id:<18} {value:>3}");
    }
}

fn parse_control_value(raw: &str) -> anyhow::Result<ControlValue> {
    match raw.trim() {
        "true" | "on" => Ok(ControlValue::Toggle(true)),
        "false" | "off" => Ok(ControlValue::Toggle(false)),
        other => other
            .parse::<i32>()
            .map(ControlValue::Level)
            .with_context(|| format!("invalid value {other:?}")),
    }
}

/// Acquires MIDI and binds the requested port, or the preferred one if none was asked for.
fn open_device(
    config: &EngineConfig,
    requested: Option<&str>,
) -> anyhow::Result<(MidirApi, DeviceManager)> {
    let api = MidirApi::acquire(&config.client_name)?;
    let mut devices = DeviceManager::new(config.preferred_device_marker.clone());
    devices.refresh(api.list_outputs());

    if let Some(wanted) = requested {
        let id = devices
            .known()
            .iter()
            .find(|d| d.is_connected() && (d.id == wanted || d.name.contains(wanted)))
            .map(|d| d.id.clone())
            .ok_or_else(|| anyhow!("no MIDI output matches {wanted:?}"))?;
        devices.bind(Some(&id));
    }

    match devices.current() {
        Some(d) => info!("using {} ({})", d.name, d.id),
        None => bail!("{}", jt_control::device::NO_DEVICES_LABEL),
    }
    Ok((api, devices))
}

fn serve(config: &EngineConfig, addr: &str) -> anyhow::Result<()> {
    let (in_tx, in_rx) = bounded(jt_control::INBOUND_CAP);
    let (out_tx, out_rx) = bounded(jt_control::OUTBOUND_CAP);

    let net = NetworkThread::spawn_with_addr(addr, in_tx, out_rx)?;
    println!("listening on ws://{}", net.listen_addr());

    let mut main_loop = MainLoop::new(in_rx, out_tx, config);
    let mut api: Box<dyn MidiApi> = match MidirApi::acquire(&config.client_name) {
        Ok(api) => Box::new(api),
        Err(e) => {
            main_loop.report_access_denied(&e);
            Box::new(NoMidiAccess)
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        info!("received Ctrl-C, shutting down");
        r.store(false, Ordering::SeqCst);
    })
    .context("failed to install Ctrl-C handler")?;

    while running.load(Ordering::SeqCst) {
        main_loop.tick(api.as_mut());
        thread::sleep(config.tick_interval());
    }

    net.shutdown();
    Ok(())
}
