//! Volatile storage backed by a per-user daemon.
//!
//! A CLI invocation has no "tab" of its own, so values that must not outlive
//! the app instance live in a small daemon process holding them in memory.
//! The daemon speaks a one-line request / one-line response protocol over a
//! Unix socket:
//!
//! | Request | Response |
//! |---|---|
//! | `PING` | `PONG` |
//! | `GET <key>` | `VALUE <base64>` or `NOT_FOUND` |
//! | `SET <key> <base64>` | `OK` |
//! | `DEL <key>` | `OK` |
//! | `CLEAR` | `OK` |
//! | `SHUTDOWN` | `OK`, then the daemon exits |
//!
//! Keys are namespaced per diary file so several diaries share one daemon.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::Shutdown;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use diary_core::session::VolatileStore;
use diary_core::{DiaryError, Result as DiaryResult};
use tracing::debug;
use zeroize::Zeroizing;

/// An empty daemon exits after this much inactivity.
const EMPTY_IDLE_EXIT: Duration = Duration::from_secs(60);

/// Handle to the daemon for one diary file.
pub struct DaemonVolatileStore {
    socket_path: PathBuf,
    namespace: String,
    idle_seconds: u64,
}

impl DaemonVolatileStore {
    pub fn new(diary_path: &Path, idle_seconds: u64) -> anyhow::Result<Self> {
        Ok(Self {
            socket_path: socket_path()?,
            namespace: diary_hash(diary_path),
            idle_seconds,
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

impl VolatileStore for DaemonVolatileStore {
    fn get_item(&self, key: &str) -> DiaryResult<Option<Zeroizing<String>>> {
        let Some(response) = request(&self.socket_path, &format!("GET {}", self.key(key)))
            .map_err(storage_error)?
        else {
            return Ok(None);
        };
        match response.strip_prefix("VALUE ") {
            Some(encoded) => {
                let decoded = Zeroizing::new(STANDARD.decode(encoded.trim()).map_err(|e| {
                    DiaryError::Storage(format!("Volatile value decode failed: {}", e))
                })?);
                let value = std::str::from_utf8(&decoded).map_err(|_| {
                    DiaryError::Storage("Volatile value is not valid UTF-8".to_string())
                })?;
                Ok(Some(Zeroizing::new(value.to_string())))
            }
            None => Ok(None),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> DiaryResult<()> {
        ensure_daemon_running(&self.socket_path, self.idle_seconds).map_err(storage_error)?;
        let line = Zeroizing::new(format!(
            "SET {} {}",
            self.key(key),
            STANDARD.encode(value.as_bytes())
        ));
        match request(&self.socket_path, &line).map_err(storage_error)? {
            Some(response) if response == "OK" => Ok(()),
            Some(response) => Err(DiaryError::Storage(format!(
                "Volatile store rejected write: {}",
                response
            ))),
            None => Err(DiaryError::Storage(
                "Volatile store daemon went away".to_string(),
            )),
        }
    }

    fn remove_item(&self, key: &str) -> DiaryResult<()> {
        request(&self.socket_path, &format!("DEL {}", self.key(key))).map_err(storage_error)?;
        Ok(())
    }
}

fn storage_error(err: anyhow::Error) -> DiaryError {
    DiaryError::Storage(err.to_string())
}

/// Ask the daemon to exit, dropping every value it holds.
pub fn shutdown_daemon(socket_path: &Path) -> anyhow::Result<bool> {
    Ok(request(socket_path, "SHUTDOWN")?.is_some())
}

pub fn daemon_running(socket_path: &Path) -> anyhow::Result<bool> {
    Ok(request(socket_path, "PING")?.as_deref() == Some("PONG"))
}

/// Serve volatile values until idle.
///
/// Exits when nothing is stored and the socket has been quiet for a minute,
/// or after `idle` without any request at all.
pub fn run_volatile_daemon(idle: Duration, socket_path: &Path) -> anyhow::Result<()> {
    let parent = socket_path.parent().ok_or_else(|| {
        anyhow::anyhow!(
            "Volatile socket path has no parent directory: {}",
            socket_path.display()
        )
    })?;
    std::fs::create_dir_all(parent).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create volatile socket directory {}: {}",
            parent.display(),
            e
        )
    })?;
    set_permissions(parent, 0o700)?;
    if socket_path.exists() {
        let _ = std::fs::remove_file(socket_path);
    }

    let listener = UnixListener::bind(socket_path)
        .map_err(|e| anyhow::anyhow!("Volatile socket bind failed: {}", e))?;
    set_permissions(socket_path, 0o600)?;
    listener.set_nonblocking(true)?;
    debug!("volatile daemon listening on {}", socket_path.display());

    let mut values: HashMap<String, Zeroizing<Vec<u8>>> = HashMap::new();
    let mut last_activity = Instant::now();

    loop {
        match listener.accept() {
            Ok((stream, _addr)) => {
                last_activity = Instant::now();
                if serve(stream, &mut values)? == Flow::Shutdown {
                    break;
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(err) => return Err(anyhow::anyhow!("Volatile socket accept failed: {}", err)),
        }

        let quiet = last_activity.elapsed();
        if (values.is_empty() && quiet >= EMPTY_IDLE_EXIT) || quiet >= idle {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    let _ = std::fs::remove_file(socket_path);
    debug!("volatile daemon stopped");
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Shutdown,
}

fn serve(
    mut stream: UnixStream,
    values: &mut HashMap<String, Zeroizing<Vec<u8>>>,
) -> anyhow::Result<Flow> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    let mut buffer = Zeroizing::new(String::new());
    if stream.read_to_string(&mut buffer).is_err() {
        return Ok(Flow::Continue);
    }
    let (response, flow) = handle_request(buffer.trim(), values);
    let _ = stream.write_all(response.as_bytes());
    Ok(flow)
}

fn handle_request(
    request: &str,
    values: &mut HashMap<String, Zeroizing<Vec<u8>>>,
) -> (Zeroizing<String>, Flow) {
    let mut parts = request.splitn(3, ' ');
    let command = parts.next().unwrap_or("");
    let reply = |text: &str| Zeroizing::new(format!("{}\n", text));
    match command {
        "PING" => (reply("PONG"), Flow::Continue),
        "CLEAR" => {
            values.clear();
            (reply("OK"), Flow::Continue)
        }
        "SHUTDOWN" => {
            values.clear();
            (reply("OK"), Flow::Shutdown)
        }
        "GET" => {
            let key = parts.next().unwrap_or("");
            match values.get(key) {
                Some(value) => (
                    Zeroizing::new(format!("VALUE {}\n", STANDARD.encode(value.as_slice()))),
                    Flow::Continue,
                ),
                None => (reply("NOT_FOUND"), Flow::Continue),
            }
        }
        "SET" => {
            let key = parts.next().unwrap_or("");
            let encoded = parts.next().unwrap_or("");
            if key.is_empty() {
                return (reply("ERROR"), Flow::Continue);
            }
            match STANDARD.decode(encoded.as_bytes()) {
                Ok(decoded) => {
                    values.insert(key.to_string(), Zeroizing::new(decoded));
                    (reply("OK"), Flow::Continue)
                }
                Err(_) => (reply("ERROR"), Flow::Continue),
            }
        }
        "DEL" => {
            let key = parts.next().unwrap_or("");
            values.remove(key);
            (reply("OK"), Flow::Continue)
        }
        _ => (reply("ERROR"), Flow::Continue),
    }
}

/// Send one request line. `None` when no daemon is listening.
fn request(socket_path: &Path, line: &str) -> anyhow::Result<Option<String>> {
    let mut stream = match UnixStream::connect(socket_path) {
        Ok(stream) => stream,
        Err(err)
            if matches!(
                err.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused
            ) =>
        {
            return Ok(None)
        }
        Err(err) => return Err(anyhow::anyhow!("Volatile socket connect failed: {}", err)),
    };
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    stream
        .write_all(format!("{}\n", line).as_bytes())
        .map_err(|e| anyhow::anyhow!("Volatile socket write failed: {}", e))?;
    stream
        .shutdown(Shutdown::Write)
        .map_err(|e| anyhow::anyhow!("Volatile socket shutdown failed: {}", e))?;
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .map_err(|e| anyhow::anyhow!("Volatile socket read failed: {}", e))?;
    Ok(Some(response.trim().to_string()))
}

fn ensure_daemon_running(socket_path: &Path, idle_seconds: u64) -> anyhow::Result<()> {
    if daemon_running(socket_path)? {
        return Ok(());
    }

    let exe = std::env::current_exe().map_err(|e| anyhow::anyhow!("{}", e))?;
    debug!("starting volatile daemon");
    std::process::Command::new(exe)
        .arg("internal-volatile-daemon")
        .arg("--idle")
        .arg(idle_seconds.to_string())
        .arg("--socket")
        .arg(socket_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| anyhow::anyhow!("Failed to spawn volatile daemon: {}", e))?;

    for _ in 0..50 {
        if daemon_running(socket_path)? {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    Err(anyhow::anyhow!("Volatile daemon did not become ready in time"))
}

pub fn socket_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        let base = std::env::var("TMPDIR").unwrap_or_else(|_| "/tmp".to_string());
        Ok(PathBuf::from(base).join("diary").join("volatile.sock"))
    }

    #[cfg(not(target_os = "macos"))]
    {
        if let Ok(value) = std::env::var("XDG_RUNTIME_DIR") {
            if !value.trim().is_empty() {
                return Ok(PathBuf::from(value).join("diary").join("volatile.sock"));
            }
        }
        // SAFETY: geteuid has no preconditions and cannot fail.
        let uid = unsafe { libc::geteuid() };
        Ok(PathBuf::from(format!("/tmp/diary-{}", uid)).join("volatile.sock"))
    }
}

/// Stable per-diary namespace: hash of the canonical path.
pub fn diary_hash(path: &Path) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let hash = blake3::hash(canonical.to_string_lossy().as_bytes());
    hash.to_hex()[..16].to_string()
}

fn set_permissions(path: &Path, mode: u32) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(mode);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}
