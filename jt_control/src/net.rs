use crate::error::EngineError;
use crate::protocol::{ClientCommand, EngineEvent, ErrorCode, InboundMsg, OutboundMsg};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message;
use tungstenite::WebSocket;

const SESSION_TOKEN_LEN: usize = 32;
const READ_TIMEOUT: Duration = Duration::from_millis(30);
const WRITE_TIMEOUT: Duration = Duration::from_millis(200);
const IDLE_SLEEP: Duration = Duration::from_millis(25);

/// WebSocket bridge between a UI client and the main loop's queues.
pub struct NetworkThread {
    listen_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    join_handle: Mutex<Option<JoinHandle<()>>>,
}

impl NetworkThread {
    pub fn spawn_with_addr(
        addr: &str,
        in_tx: Sender<InboundMsg>,
        out_rx: Receiver<OutboundMsg>,
    ) -> Result<Self, EngineError> {
        let bind_err = |source: io::Error| EngineError::Bind {
            addr: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).map_err(bind_err)?;
        listener.set_nonblocking(true).map_err(bind_err)?;
        let listen_addr = listener.local_addr().map_err(bind_err)?;
        info!("UI bridge listening on ws://{listen_addr}");

        let shutdown = Arc::new(AtomicBool::new(false));
        let bridge = Bridge {
            listener,
            in_tx,
            out_rx,
            client: None,
        };
        let stop = Arc::clone(&shutdown);
        let join_handle = thread::spawn(move || bridge.run(&stop));

        Ok(Self {
            listen_addr,
            shutdown,
            join_handle: Mutex::new(Some(join_handle)),
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let handle = self.join_handle.lock().ok().and_then(|mut h| h.take());
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl Drop for NetworkThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Client {
    ws: WebSocket<TcpStream>,
    token: String,
}

impl Client {
    fn send(&mut self, event: &EngineEvent) -> Result<(), ()> {
        let payload = serde_json::to_string(event).map_err(|_| ())?;
        self.ws.send(Message::Text(payload.into())).map_err(|_| ())
    }

    /// Best-effort error reply; the connection stays up.
    fn reject(&mut self, code: ErrorCode, msg: &str) {
        let _ = self.send(&EngineEvent::Error {
            msg: msg.to_string(),
            code,
        });
    }
}

/// What happened to the client during one pump.
enum Pump {
    Alive,
    Gone,
    /// The main loop dropped its end of the queue.
    EngineStopped,
}

struct Bridge {
    listener: TcpListener,
    in_tx: Sender<InboundMsg>,
    out_rx: Receiver<OutboundMsg>,
    client: Option<Client>,
}

impl Bridge {
    fn run(mut self, stop: &AtomicBool) {
        while !stop.load(Ordering::Relaxed) {
            self.accept_pending();

            if self.client.is_none() {
                thread::sleep(IDLE_SLEEP);
                continue;
            }
            let outcome = match self.flush_outbound() {
                Pump::Alive => self.read_one(),
                other => other,
            };
            match outcome {
                Pump::Alive => {}
                Pump::Gone => self.drop_client(),
                Pump::EngineStopped => break,
            }
        }

        if let Some(mut client) = self.client.take() {
            let _ = client.ws.close(None);
        }
    }

    /// Takes every waiting connection. The newest one wins.
    fn accept_pending(&mut self) {
        loop {
            let (stream, peer) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) => {
                    warn!("bridge accept failed: {e}");
                    return;
                }
            };
            if let Err(e) = configure(&stream) {
                warn!("could not configure socket for {peer}: {e}");
                continue;
            }
            let ws = match tungstenite::accept(stream) {
                Ok(ws) => ws,
                Err(e) => {
                    warn!("websocket upgrade from {peer} failed: {e}");
                    continue;
                }
            };
            let mut client = Client {
                ws,
                token: new_session_token(),
            };

            self.drop_client();
            let hello = InboundMsg::ClientConnected {
                socket_addr: peer,
                session_token: client.token.clone(),
            };
            if self.in_tx.try_send(hello).is_err() {
                client.reject(ErrorCode::Busy, "engine busy");
                let _ = client.ws.close(None);
                continue;
            }
            debug!("UI client {peer} attached");
            self.client = Some(client);
        }
    }

    fn flush_outbound(&mut self) -> Pump {
        let Some(client) = self.client.as_mut() else {
            return Pump::Gone;
        };
        loop {
            match self.out_rx.try_recv() {
                Ok(OutboundMsg::Send { msg }) => {
                    if client.send(&msg).is_err() {
                        return Pump::Gone;
                    }
                }
                Err(TryRecvError::Empty) => return Pump::Alive,
                Err(TryRecvError::Disconnected) => return Pump::EngineStopped,
            }
        }
    }

    /// Handles at most one frame; the read timeout keeps the loop turning.
    fn read_one(&mut self) -> Pump {
        let Some(client) = self.client.as_mut() else {
            return Pump::Gone;
        };
        let text = match client.ws.read() {
            Ok(Message::Text(text)) => text,
            Ok(Message::Ping(payload)) => {
                let _ = client.ws.send(Message::Pong(payload));
                return Pump::Alive;
            }
            Ok(Message::Close(_)) => return Pump::Gone,
            Ok(_) => return Pump::Alive,
            Err(tungstenite::Error::Io(e))
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                return Pump::Alive
            }
            Err(e) => {
                debug!("UI client read failed: {e}");
                return Pump::Gone;
            }
        };

        let cmd: ClientCommand = match serde_json::from_str(&text) {
            Ok(cmd) => cmd,
            Err(e) => {
                debug!("rejecting UI frame: {e}");
                client.reject(ErrorCode::InvalidCommand, "invalid json");
                return Pump::Alive;
            }
        };
        if cmd.session_token() != client.token {
            client.reject(ErrorCode::Unauthorized, "unauthorized");
            return Pump::Alive;
        }
        if self.in_tx.try_send(InboundMsg::Command { cmd }).is_err() {
            client.reject(ErrorCode::Busy, "engine busy");
        }
        Pump::Alive
    }

    fn drop_client(&mut self) {
        if let Some(mut client) = self.client.take() {
            let _ = client.ws.close(None);
            let _ = self.in_tx.try_send(InboundMsg::ClientDisconnected);
        }
    }
}

fn configure(stream: &TcpStream) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    stream.set_write_timeout(Some(WRITE_TIMEOUT))
}

fn new_session_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}
