//! Control session: one connection, one exchange at a time

use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use super::debounce::SignalDebounce;
use super::info::{
    find_value, KEY_ADDRESS, KEY_TRAFFIC_READ, KEY_TRAFFIC_WRITTEN, KEY_VERSION, KNOWN_KEYS,
};
use super::reply::{read_reply_resumable, skip_reply, Reply};
use super::signal::Signal;
use crate::config::DEFAULT_CONTROL_ADDR;
use crate::error::{ControlError, ControlResult};
use crate::metrics::ControlMetrics;

/// State guarded by the session lock
struct Session<S> {
    stream: BufReader<S>,
    debounce: SignalDebounce,
    /// Bytes of a reply line whose read was cancelled part way
    partial: Vec<u8>,
    /// Replies still owed by the peer for exchanges whose caller was dropped
    pending_replies: usize,
    /// Set while a command is being written and after any failure that leaves
    /// the wire position unknown
    desynced: bool,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Write one command line and read its complete reply.
    ///
    /// Bookkeeping is updated only around each await point, so a caller that
    /// drops this future part way leaves the session either draining the
    /// owed reply on the next call or marked desynced.
    async fn round_trip(&mut self, command: &str) -> ControlResult<Reply> {
        if self.desynced {
            return Err(ControlError::Desynchronized(
                "an earlier exchange was interrupted".to_string(),
            ));
        }

        while self.pending_replies > 0 {
            debug!("Discarding reply to an abandoned command");
            if let Err(e) = skip_reply(&mut self.stream, &mut self.partial).await {
                self.desynced = true;
                return Err(e);
            }
            self.pending_replies -= 1;
        }

        let frame = format!("{}\r\n", command);
        self.desynced = true;
        let writer = self.stream.get_mut();
        writer.write_all(frame.as_bytes()).await?;
        writer.flush().await?;
        self.desynced = false;

        self.pending_replies += 1;
        let result = read_reply_resumable(&mut self.stream, &mut self.partial).await;
        self.pending_replies -= 1;

        match &result {
            Ok(_) | Err(ControlError::Malformed(_)) => {}
            Err(_) => self.desynced = true,
        }
        result
    }
}

/// Client side of a control-port connection.
///
/// Every public operation takes the session lock for its whole round trip,
/// so concurrent callers never interleave bytes on the wire.
pub struct Controller<S> {
    session: Mutex<Session<S>>,
    metrics: Arc<ControlMetrics>,
}

impl Controller<TcpStream> {
    /// Connect to a control port. An empty address means `127.0.0.1:9051`.
    pub async fn connect(addr: &str) -> ControlResult<Self> {
        let addr = if addr.is_empty() {
            DEFAULT_CONTROL_ADDR
        } else {
            addr
        };

        let stream = TcpStream::connect(addr).await?;
        info!("Connected to control port at {}", addr);

        Ok(Self::new(stream))
    }
}

impl<S> Controller<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already connected stream
    pub fn new(stream: S) -> Self {
        Self {
            session: Mutex::new(Session {
                stream: BufReader::new(stream),
                debounce: SignalDebounce::new(),
                partial: Vec::new(),
                pending_replies: 0,
                desynced: false,
            }),
            metrics: Arc::new(ControlMetrics::new()),
        }
    }

    pub fn metrics(&self) -> Arc<ControlMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Send one command line and return the status code and body of a 250 reply.
    ///
    /// Any other status comes back as [`ControlError::Protocol`].
    pub async fn execute(&self, command: &str) -> ControlResult<(u16, String)> {
        let mut session = self.session.lock().await;
        let reply = self.exchange(&mut session, command).await?;
        Ok((reply.code, reply.body()))
    }

    /// Authenticate the connection. `None` or an empty credential sends a bare
    /// `AUTHENTICATE`; anything else is appended verbatim.
    pub async fn authenticate(&self, credential: Option<&str>) -> ControlResult<()> {
        let command = match credential {
            Some(secret) if !secret.is_empty() => format!("AUTHENTICATE {}", secret),
            _ => "AUTHENTICATE".to_string(),
        };

        let mut session = self.session.lock().await;
        let result = self.exchange(&mut session, &command).await;
        self.metrics.record_auth(result.is_ok());

        match result {
            Ok(_) => Ok(()),
            Err(ControlError::Protocol { code, message }) => {
                Err(ControlError::Authentication { code, message })
            }
            Err(e) => Err(e),
        }
    }

    /// Query a single GETINFO key
    pub async fn get_info(&self, key: &str) -> ControlResult<String> {
        let mut session = self.session.lock().await;
        self.get_info_locked(&mut session, key).await
    }

    /// Query a GETINFO key holding a base-10 integer
    pub async fn get_info_int(&self, key: &str) -> ControlResult<i64> {
        let mut session = self.session.lock().await;
        let value = self.get_info_locked(&mut session, key).await?;
        value.parse().map_err(|source| ControlError::Parse {
            key: key.to_string(),
            value,
            source,
        })
    }

    pub async fn get_address(&self) -> ControlResult<String> {
        self.get_info(KEY_ADDRESS).await
    }

    pub async fn get_bytes_read(&self) -> ControlResult<i64> {
        self.get_info_int(KEY_TRAFFIC_READ).await
    }

    pub async fn get_bytes_written(&self) -> ControlResult<i64> {
        self.get_info_int(KEY_TRAFFIC_WRITTEN).await
    }

    pub async fn get_version(&self) -> ControlResult<String> {
        self.get_info(KEY_VERSION).await
    }

    /// Query every key in `KNOWN_KEYS`, keeping per-key failures
    pub async fn get_known_info(&self) -> Vec<(&'static str, ControlResult<String>)> {
        let mut values = Vec::with_capacity(KNOWN_KEYS.len());
        for key in KNOWN_KEYS {
            values.push((key, self.get_info(key).await));
        }
        values
    }

    /// Send a signal unless the same one was dispatched within the debounce
    /// window, in which case this is a successful no-op.
    pub async fn signal(&self, signal: Signal) -> ControlResult<()> {
        let mut session = self.session.lock().await;

        if session.debounce.should_suppress(signal, Instant::now()) {
            debug!("Suppressing repeated signal {}", signal);
            self.metrics.record_signal(true);
            return Ok(());
        }

        let command = format!("SIGNAL {}", signal.keyword());
        self.exchange(&mut session, &command).await?;

        session.debounce.record(signal, Instant::now());
        self.metrics.record_signal(false);
        info!("Sent signal {}", signal);
        Ok(())
    }

    /// Last signal that reached the peer
    pub async fn last_signal(&self) -> Option<Signal> {
        self.session.lock().await.debounce.last_signal()
    }

    async fn get_info_locked(&self, session: &mut Session<S>, key: &str) -> ControlResult<String> {
        let reply = self
            .exchange(session, &format!("GETINFO {}", key))
            .await?;
        find_value(&reply, key).ok_or_else(|| ControlError::NotFound(key.to_string()))
    }

    /// One exchange on an already locked session
    async fn exchange(&self, session: &mut Session<S>, command: &str) -> ControlResult<Reply> {
        if command.contains(['\r', '\n']) {
            return Err(ControlError::InvalidCommand(redact(command).to_string()));
        }

        debug!("Sending command: {}", redact(command));
        let start = std::time::Instant::now();

        let result = session
            .round_trip(command)
            .await
            .and_then(Reply::into_result);

        self.metrics.record_exchange(result.is_ok(), start.elapsed());
        match &result {
            Ok(reply) => debug!("Reply status {}", reply.code),
            Err(e) => debug!("Exchange failed: {}", e),
        }
        result
    }
}

/// Hide credentials from log output
fn redact(command: &str) -> &str {
    match command.split_once(' ') {
        Some(("AUTHENTICATE", _)) => "AUTHENTICATE ****",
        _ => command,
    }
}
