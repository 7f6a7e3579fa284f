use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::address::ChannelAddress;
use crate::error::{Result, TransportError};
use crate::traits::{IpcStream, Transport};

/// Maximum socket path length.
/// Unix `sockaddr_un.sun_path` is typically 108 bytes on Linux, 104 on macOS.
#[cfg(target_os = "linux")]
const MAX_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
const MAX_PATH_LEN: usize = 104;

/// A bound Unix domain socket listener.
///
/// The socket file is removed on `Drop` as long as it is still the one this
/// listener created.
pub struct UnixDomainSocket {
    listener: UnixListener,
    path: PathBuf,
    created_inode: (u64, u64),
}

impl UnixDomainSocket {
    /// Default permission mode for created socket paths.
    pub const DEFAULT_SOCKET_MODE: u32 = 0o600;

    /// Bind and listen on a filesystem-path Unix domain socket.
    ///
    /// A stale socket file at `path` is removed first. Any other kind of file
    /// is left alone and the bind fails.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        Self::bind_with_mode(path, Self::DEFAULT_SOCKET_MODE)
    }

    /// Bind and listen with an explicit permission mode.
    pub fn bind_with_mode(path: impl AsRef<Path>, mode: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        check_path_len(&path)?;

        let bind_err = |source| TransportError::Bind {
            path: path.clone(),
            source,
        };

        if path.exists() {
            let metadata = std::fs::symlink_metadata(&path).map_err(bind_err)?;
            if !metadata.file_type().is_socket() {
                return Err(bind_err(std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "existing path is not a unix socket",
                )));
            }
            debug!(?path, "removing stale socket");
            std::fs::remove_file(&path).map_err(bind_err)?;
        }

        let listener = UnixListener::bind(&path).map_err(bind_err)?;
        let created = match std::fs::symlink_metadata(&path) {
            Ok(created) => created,
            Err(source) => {
                let _ = std::fs::remove_file(&path);
                return Err(bind_err(source));
            }
        };
        // From here on, Drop removes the socket file on every error path.
        let socket = Self {
            listener,
            path: path.clone(),
            created_inode: (created.dev(), created.ino()),
        };
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode))
            .map_err(bind_err)?;

        info!(?path, "listening on unix domain socket");
        Ok(socket)
    }

    /// Accept one incoming connection (blocking).
    pub fn accept(&self) -> std::io::Result<IpcStream> {
        let (stream, _addr) = self.listener.accept()?;
        debug!(path = ?self.path, "accepted connection");
        Ok(IpcStream::from_unix(stream))
    }

    /// Connect to a listening socket (blocking, single attempt).
    pub fn connect(path: impl AsRef<Path>) -> std::io::Result<IpcStream> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path)?;
        debug!(?path, "connected to unix domain socket");
        Ok(IpcStream::from_unix(stream))
    }

    /// The path this socket is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UnixDomainSocket {
    fn drop(&mut self) {
        let Ok(metadata) = std::fs::symlink_metadata(&self.path) else {
            return;
        };
        let (dev, ino) = self.created_inode;
        if metadata.file_type().is_socket() && metadata.dev() == dev && metadata.ino() == ino {
            debug!(path = ?self.path, "cleaning up socket file");
            let _ = std::fs::remove_file(&self.path);
        } else {
            debug!(path = ?self.path, "socket path identity changed; skipping cleanup");
        }
    }
}

fn check_path_len(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= MAX_PATH_LEN {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: MAX_PATH_LEN,
        });
    }
    Ok(())
}

/// Point-to-point transport over Unix domain sockets.
///
/// A channel address maps to `<socket_dir>/<address>`. The server side binds,
/// accepts one peer, and drops the listener again, so each accept owns the
/// socket file only for as long as it waits.
#[derive(Debug, Clone)]
pub struct UnixTransport {
    socket_dir: PathBuf,
    socket_mode: u32,
}

impl UnixTransport {
    pub fn new(socket_dir: impl Into<PathBuf>) -> Self {
        Self {
            socket_dir: socket_dir.into(),
            socket_mode: UnixDomainSocket::DEFAULT_SOCKET_MODE,
        }
    }

    /// Override the permission mode applied to bound sockets.
    pub fn with_socket_mode(mut self, mode: u32) -> Self {
        self.socket_mode = mode;
        self
    }

    pub fn socket_dir(&self) -> &Path {
        &self.socket_dir
    }

    pub fn socket_mode(&self) -> u32 {
        self.socket_mode
    }

    /// Filesystem path for a channel address.
    pub fn socket_path(&self, address: &ChannelAddress) -> PathBuf {
        self.socket_dir.join(address.as_str())
    }
}

impl Default for UnixTransport {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl Transport for UnixTransport {
    type Stream = IpcStream;

    fn connect(&self, address: &ChannelAddress) -> Result<IpcStream> {
        let path = self.socket_path(address);
        check_path_len(&path)?;
        UnixDomainSocket::connect(&path).map_err(|source| TransportError::Connect {
            address: address.clone(),
            source,
        })
    }

    fn accept(&self, address: &ChannelAddress) -> Result<IpcStream> {
        let listener =
            UnixDomainSocket::bind_with_mode(self.socket_path(address), self.socket_mode)?;
        listener.accept().map_err(|source| TransportError::Accept {
            address: address.clone(),
            source,
        })
    }

    fn name(&self) -> &'static str {
        "unix-domain-socket"
    }
}
