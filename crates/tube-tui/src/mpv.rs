/// mpv IPC driver with separated reader/writer tasks.
///
/// Architecture:
///
/// ```text
///   MpvDriver::spawn_and_connect()
///         │
///         ├── writer_task   ← receives PendingRequest via mpsc, serialises → socket
///         └── reader_task   ← reads JSON lines from socket
///                                ├── response (has request_id) → matched oneshot::Sender
///                                └── event / property-change   → broadcast::Sender<MpvEvent>
/// ```
///
/// Events fan out over a broadcast channel because every player handle
/// watches the same process; each handle subscribes while it is alive.
///
/// Platform notes:
/// - Unix:   Unix domain sockets
/// - Windows: Named pipes  \\.\pipe\<name>
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

#[cfg(unix)]
use tokio::net::UnixStream;

#[cfg(windows)]
use tokio::net::windows::named_pipe::ClientOptions;

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

/// Reply timeout for a single IPC command.
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

// ── observation property IDs ──────────────────────────────────────────────────

pub const OBS_PAUSE: u64 = 1;
pub const OBS_CORE_IDLE: u64 = 2;
pub const OBS_IDLE_ACTIVE: u64 = 3;
pub const OBS_EOF_REACHED: u64 = 4;

const OBSERVED: [(u64, &str); 4] = [
    (OBS_PAUSE, "pause"),
    (OBS_CORE_IDLE, "core-idle"),
    (OBS_IDLE_ACTIVE, "idle-active"),
    (OBS_EOF_REACHED, "eof-reached"),
];

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<anyhow::Result<Value>>>>>;

struct PendingRequest {
    req_id: u64,
    payload: String, // serialised JSON line (already has '\n')
    reply: oneshot::Sender<anyhow::Result<Value>>,
}

/// An mpv event / property-change that arrived unsolicited (no request_id).
#[derive(Debug, Clone)]
pub struct MpvEvent {
    pub raw: Value,
}

impl MpvEvent {
    /// Returns `Some((obs_id, data))` if this is a property-change event.
    pub fn as_property_change(&self) -> Option<(u64, &Value)> {
        if self.raw.get("event")?.as_str()? == "property-change" {
            let id = self.raw.get("id")?.as_u64()?;
            let data = self.raw.get("data").unwrap_or(&Value::Null);
            Some((id, data))
        } else {
            None
        }
    }

    /// Returns the event name, e.g. "end-file", "start-file", "file-loaded".
    pub fn event_name(&self) -> Option<&str> {
        self.raw.get("event")?.as_str()
    }
}

// ── public handle ─────────────────────────────────────────────────────────────

/// Cloneable handle to the mpv writer task.
#[derive(Clone)]
pub struct MpvHandle {
    tx: mpsc::Sender<PendingRequest>,
}

impl MpvHandle {
    pub async fn send(&self, command: Value) -> anyhow::Result<Value> {
        let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
        let msg = json!({ "command": command, "request_id": req_id });
        let mut raw = serde_json::to_string(&msg)?;
        raw.push('\n');

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PendingRequest {
                req_id,
                payload: raw,
                reply: reply_tx,
            })
            .await
            .map_err(|_| anyhow::anyhow!("mpv writer task gone"))?;

        tokio::time::timeout(REPLY_TIMEOUT, reply_rx)
            .await
            .map_err(|_| anyhow::anyhow!("mpv IPC timeout for req={}", req_id))?
            .map_err(|_| anyhow::anyhow!("mpv reply channel dropped req={}", req_id))?
    }

    /// Load `url`, replacing whatever is playing.  `paused` is applied first so
    /// the new file starts in the requested state.
    pub async fn load(&self, url: &str, paused: bool) -> anyhow::Result<()> {
        self.set_pause(paused).await?;
        debug!("mpv: loadfile {}", url);
        self.send(json!(["loadfile", url, "replace"])).await?;
        Ok(())
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        self.send(json!(["stop"])).await?;
        Ok(())
    }

    pub async fn set_pause(&self, paused: bool) -> anyhow::Result<()> {
        self.send(json!(["set_property", "pause", paused])).await?;
        Ok(())
    }

    pub async fn seek_to_start(&self) -> anyhow::Result<()> {
        self.send(json!(["seek", 0, "absolute"])).await?;
        Ok(())
    }

    /// Register observe_property for the playback properties.  mpv keeps the
    /// observations across files, so once per connection is enough.
    pub async fn observe_properties(&self) -> anyhow::Result<()> {
        for (id, name) in OBSERVED {
            self.send(json!(["observe_property", id, name])).await?;
            debug!("mpv: observe_property id={} name={}", id, name);
        }
        Ok(())
    }

    /// Health-check: returns Ok(()) if mpv is responsive.
    pub async fn ping(&self) -> anyhow::Result<()> {
        self.send(json!(["get_property", "idle-active"])).await?;
        Ok(())
    }
}

// ── driver ────────────────────────────────────────────────────────────────────

/// Owns the mpv child process.
pub struct MpvDriver {
    pub socket_name: String,
    binary: PathBuf,
    args: Vec<String>,
    socket_timeout: Duration,
    process: Option<tokio::process::Child>,
    stderr_log: Option<PathBuf>,
}

impl MpvDriver {
    pub fn new(binary: PathBuf, args: Vec<String>, socket_timeout: Duration) -> Self {
        Self {
            socket_name: tube_core::platform::mpv_socket_name(),
            binary,
            args,
            socket_timeout,
            process: None,
            stderr_log: None,
        }
    }

    /// Append mpv's stderr to `path` instead of discarding it.
    pub fn with_stderr_log(mut self, path: PathBuf) -> Self {
        self.stderr_log = Some(path);
        self
    }

    pub fn process_alive(&mut self) -> bool {
        let Some(child) = self.process.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                match status.code() {
                    Some(code) => warn!("mpv process exited with code: {}", code),
                    None => warn!("mpv process terminated by signal"),
                }
                false
            }
            Err(e) => {
                warn!("mpv process_alive check failed: {}", e);
                false
            }
        }
    }

    /// Kill the process if running.
    pub async fn kill(&mut self) {
        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }
        #[cfg(unix)]
        {
            let _ = tokio::fs::remove_file(&self.socket_name).await;
        }
    }

    fn command(&self) -> anyhow::Result<tokio::process::Command> {
        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.arg("--idle=yes")
            .arg(tube_core::platform::mpv_socket_arg(&self.socket_name))
            .arg("--quiet")
            .args(&self.args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .kill_on_drop(true);
        match &self.stderr_log {
            Some(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                info!("mpv: logging stderr to {:?}", path);
                cmd.stderr(file);
            }
            None => {
                cmd.stderr(std::process::Stdio::null());
            }
        }
        Ok(cmd)
    }

    // ── spawn ─────────────────────────────────────────────────────────────────

    #[cfg(unix)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: broadcast::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;

        let socket_path = PathBuf::from(&self.socket_name);
        info!("mpv: spawning {:?}", self.binary);
        let child = self.command()?.spawn()?;
        info!("mpv: spawned process with pid {:?}", child.id());
        self.process = Some(child);

        let deadline = tokio::time::Instant::now() + self.socket_timeout;
        while !socket_path.exists() {
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!("mpv IPC socket did not appear");
            }
            if !self.process_alive() {
                anyhow::bail!("mpv exited during start-up");
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let stream = UnixStream::connect(&socket_path).await?;
        info!("mpv: connected to IPC socket");
        let (read_half, write_half) = stream.into_split();
        Ok(start_io_tasks(read_half, write_half, event_tx))
    }

    #[cfg(windows)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: broadcast::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;

        info!("mpv: spawning {:?}", self.binary);
        let child = self.command()?.spawn()?;
        self.process = Some(child);

        let pipe_path = format!(r"\\.\pipe\{}", self.socket_name);
        let deadline = tokio::time::Instant::now() + self.socket_timeout;
        loop {
            tokio::time::sleep(Duration::from_millis(100)).await;
            match ClientOptions::new().open(&pipe_path) {
                Ok(client) => {
                    info!("mpv: connected to named pipe");
                    let (read_half, write_half) = tokio::io::split(client);
                    return Ok(start_io_tasks(read_half, write_half, event_tx));
                }
                Err(_) if tokio::time::Instant::now() < deadline => continue,
                Err(_) => anyhow::bail!("mpv named pipe did not appear"),
            }
        }
    }
}

pub(crate) fn start_io_tasks<R, W>(
    read_half: R,
    write_half: W,
    event_tx: broadcast::Sender<MpvEvent>,
) -> MpvHandle
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
    W: tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    // pending map: req_id → reply channel.  Shared between writer (inserts) and reader (resolves).
    let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
    let (cmd_tx, cmd_rx) = mpsc::channel::<PendingRequest>(64);

    tokio::spawn(writer_task(write_half, cmd_rx, pending.clone()));
    tokio::spawn(reader_task(BufReader::new(read_half), pending, event_tx));

    MpvHandle { tx: cmd_tx }
}

// ── reader task ───────────────────────────────────────────────────────────────

async fn reader_task<R>(
    mut reader: BufReader<R>,
    pending: PendingMap,
    event_tx: broadcast::Sender<MpvEvent>,
) where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("mpv reader: connection closed");
                fail_pending(&pending, "mpv IPC connection closed").await;
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let val: Value = match serde_json::from_str(trimmed) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!("mpv reader: invalid json '{}': {}", trimmed, e);
                        continue;
                    }
                };

                if let Some(req_id) = val.get("request_id").and_then(|v| v.as_u64()) {
                    let mut map = pending.lock().await;
                    if let Some(tx) = map.remove(&req_id) {
                        let _ = tx.send(reply_result(req_id, val));
                    } else {
                        debug!("mpv reader: response for unknown req={}", req_id);
                    }
                } else {
                    debug!("mpv reader: event {}", trimmed);
                    // No receivers just means no player handle is alive.
                    let _ = event_tx.send(MpvEvent { raw: val });
                }
            }
            Err(e) => {
                warn!("mpv reader: read error: {}", e);
                fail_pending(&pending, &format!("mpv IPC read error: {}", e)).await;
                break;
            }
        }
    }
}

fn reply_result(req_id: u64, val: Value) -> anyhow::Result<Value> {
    if val["error"].as_str() == Some("success") {
        debug!("mpv reader: response req={} ok", req_id);
        Ok(val)
    } else {
        let err = val["error"].as_str().unwrap_or("unknown error").to_string();
        debug!("mpv reader: response req={} err={}", req_id, err);
        Err(anyhow::anyhow!("mpv error: {}", err))
    }
}

async fn fail_pending(pending: &PendingMap, reason: &str) {
    let mut map = pending.lock().await;
    for (_, tx) in map.drain() {
        let _ = tx.send(Err(anyhow::anyhow!("{}", reason)));
    }
}

// ── writer task ───────────────────────────────────────────────────────────────

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<PendingRequest>, pending: PendingMap)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some(req) = rx.recv().await {
        // Register reply channel before writing so reader can match it
        pending.lock().await.insert(req.req_id, req.reply);
        debug!(
            "mpv writer: send req={} payload={}",
            req.req_id,
            req.payload.trim()
        );
        if let Err(e) = writer.write_all(req.payload.as_bytes()).await {
            warn!("mpv writer: write error: {}", e);
            if let Some(tx) = pending.lock().await.remove(&req.req_id) {
                let _ = tx.send(Err(anyhow::anyhow!("mpv write error: {}", e)));
            }
            break;
        }
    }
    debug!("mpv writer: task exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[test]
    fn property_change_is_recognised() {
        let evt = MpvEvent {
            raw: json!({"event": "property-change", "id": OBS_PAUSE, "name": "pause", "data": true}),
        };
        let (id, data) = evt.as_property_change().unwrap();
        assert_eq!(id, OBS_PAUSE);
        assert_eq!(data.as_bool(), Some(true));
        assert_eq!(evt.event_name(), Some("property-change"));
    }

    #[test]
    fn named_event_is_not_a_property_change() {
        let evt = MpvEvent {
            raw: json!({"event": "end-file", "reason": "eof"}),
        };
        assert!(evt.as_property_change().is_none());
        assert_eq!(evt.event_name(), Some("end-file"));
    }

    /// Drive the IO tasks over an in-memory pipe standing in for the socket.
    #[tokio::test]
    async fn replies_are_matched_and_events_fan_out() {
        let (client, server) = duplex(4096);
        let (client_read, client_write) = tokio::io::split(client);
        let (events_tx, mut events_rx) = broadcast::channel(16);
        let handle = start_io_tasks(client_read, client_write, events_tx);

        let fake_mpv = tokio::spawn(async move {
            let (server_read, mut server_write) = tokio::io::split(server);
            let mut lines = BufReader::new(server_read).lines();
            let line = lines.next_line().await.unwrap().unwrap();
            let req: Value = serde_json::from_str(&line).unwrap();
            assert_eq!(req["command"], json!(["set_property", "pause", false]));
            let req_id = req["request_id"].as_u64().unwrap();

            let event = json!({"event": "property-change", "id": OBS_PAUSE, "data": false});
            let reply = json!({"request_id": req_id, "error": "success", "data": null});
            server_write
                .write_all(format!("{}\n{}\n", event, reply).as_bytes())
                .await
                .unwrap();
        });

        handle.set_pause(false).await.unwrap();
        let evt = events_rx.recv().await.unwrap();
        assert_eq!(evt.as_property_change().map(|(id, _)| id), Some(OBS_PAUSE));
        fake_mpv.await.unwrap();
    }

    #[tokio::test]
    async fn mpv_error_reply_is_an_error() {
        let (client, server) = duplex(4096);
        let (client_read, client_write) = tokio::io::split(client);
        let (events_tx, _events_rx) = broadcast::channel(16);
        let handle = start_io_tasks(client_read, client_write, events_tx);

        tokio::spawn(async move {
            let (server_read, mut server_write) = tokio::io::split(server);
            let mut lines = BufReader::new(server_read).lines();
            let line = lines.next_line().await.unwrap().unwrap();
            let req: Value = serde_json::from_str(&line).unwrap();
            let reply = json!({"request_id": req["request_id"], "error": "property unavailable"});
            server_write
                .write_all(format!("{}\n", reply).as_bytes())
                .await
                .unwrap();
        });

        let err = handle.seek_to_start().await.unwrap_err();
        assert!(err.to_string().contains("property unavailable"));
    }

    #[tokio::test]
    async fn closed_connection_fails_pending_requests() {
        let (client, server) = duplex(4096);
        let (client_read, client_write) = tokio::io::split(client);
        let (events_tx, _events_rx) = broadcast::channel(16);
        let handle = start_io_tasks(client_read, client_write, events_tx);

        tokio::spawn(async move {
            let (server_read, _server_write) = tokio::io::split(server);
            let mut lines = BufReader::new(server_read).lines();
            let _ = lines.next_line().await;
            // dropping both halves closes the pipe without replying
        });

        assert!(handle.ping().await.is_err());
    }
}
