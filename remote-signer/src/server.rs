//! Remote signer server implementation.
//!
//! Listens on a Unix socket and handles signing requests. The socket is
//! restricted to its owner, which is the only authentication callers get.

use crate::protocol::{
    read_frame, write_frame, FrameError, ListPublicKeysResponse, Request, Response, SignRequest,
    SignResponse, Status,
};
use crate::service::SigningService;
use eth2_signer_keyvault::KeyStore;
use std::fs::{self, DirBuilder, Permissions};
use std::io;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Read and write timeout applied to every accepted connection.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Server configuration.
pub struct ServerConfig {
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Keyvault holding the validator keys
    pub keyvault: Arc<dyn KeyStore>,
    /// Read and write timeout for each connection
    pub io_timeout: Duration,
}

/// Errors from the signer server and client.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Rejected: {0}")]
    Rejected(Status),
}

/// Remote signer server.
pub struct SignerServer {
    listener: UnixListener,
    service: Arc<SigningService>,
    io_timeout: Duration,
}

impl SignerServer {
    /// Create a new signer server.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        // Remove existing socket file if it exists
        if config.socket_path.exists() {
            fs::remove_file(&config.socket_path)?;
        }

        // Ensure parent directory exists
        let parent = match config.socket_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let listener = bind_owner_only(&config.socket_path, parent)?;
        info!("Signer server listening on {:?}", config.socket_path);

        Ok(Self {
            listener,
            service: Arc::new(SigningService::new(config.keyvault)),
            io_timeout: config.io_timeout,
        })
    }

    /// Run the server (blocking). Each connection is served on its own thread.
    pub fn run(&self) -> Result<(), ServerError> {
        info!("Signer server starting...");
        match self.service.list_validating_public_keys() {
            Ok(list) => info!(
                num_keys = list.validating_public_keys.len(),
                "Serving validating public keys"
            ),
            Err(e) => error!("Could not list public keys: {}", e),
        }

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    debug!("New connection");
                    let service = Arc::clone(&self.service);
                    let io_timeout = self.io_timeout;
                    thread::spawn(move || {
                        if let Err(e) = handle_connection(&service, stream, io_timeout) {
                            error!("Error handling connection: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }

        Ok(())
    }
}

/// Bind `socket_path` so that it is never reachable by other users.
///
/// The socket is created inside a fresh `0700` directory next to its final
/// path, restricted to `0600`, and only then renamed into place.
fn bind_owner_only(socket_path: &Path, parent: &Path) -> io::Result<UnixListener> {
    let file_name = socket_path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "socket path has no file name")
    })?;
    let mut staging_name = std::ffi::OsString::from(".");
    staging_name.push(file_name);
    staging_name.push(format!(".{}.staging", std::process::id()));
    let staging_dir = parent.join(staging_name);

    if staging_dir.exists() {
        warn!("Removing leftover staging directory {:?}", staging_dir);
        fs::remove_dir_all(&staging_dir)?;
    }
    DirBuilder::new().mode(0o700).create(&staging_dir)?;

    let staged = staging_dir.join("signer.sock");
    let result = UnixListener::bind(&staged).and_then(|listener| {
        fs::set_permissions(&staged, Permissions::from_mode(0o600))?;
        fs::rename(&staged, socket_path)?;
        Ok(listener)
    });
    let _ = fs::remove_file(&staged);
    fs::remove_dir(&staging_dir)?;
    result
}

/// Handle a single request on a connection.
fn handle_connection(
    service: &SigningService,
    mut stream: UnixStream,
    io_timeout: Duration,
) -> Result<(), ServerError> {
    stream.set_read_timeout(Some(io_timeout))?;
    stream.set_write_timeout(Some(io_timeout))?;

    let request: Request = read_frame(&mut stream)?;
    let response = service.handle(request);
    write_frame(&mut stream, &response)?;
    Ok(())
}

/// Client for connecting to the remote signer.
pub struct SignerClient {
    socket_path: PathBuf,
}

impl SignerClient {
    /// Create a new client.
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
        }
    }

    /// Connect to the server and send a request.
    fn send_request(&self, request: &Request) -> Result<Response, ServerError> {
        let mut stream = UnixStream::connect(&self.socket_path)?;
        write_frame(&mut stream, request)?;
        Ok(read_frame(&mut stream)?)
    }

    /// Sign a signing root. A failed sign comes back as [`ServerError::Rejected`].
    pub fn sign(&self, req: SignRequest) -> Result<SignResponse, ServerError> {
        match self.send_request(&Request::Sign(req))? {
            Response::Sign {
                response,
                error: None,
            } => Ok(response),
            Response::Sign {
                error: Some(status),
                ..
            } => Err(ServerError::Rejected(status)),
            _ => Err(ServerError::Protocol("Unexpected response".to_string())),
        }
    }

    /// List the public keys available for signing.
    pub fn list_validating_public_keys(&self) -> Result<ListPublicKeysResponse, ServerError> {
        match self.send_request(&Request::ListValidatingPublicKeys)? {
            Response::PublicKeys(list) => Ok(list),
            Response::Error(status) => Err(ServerError::Rejected(status)),
            _ => Err(ServerError::Protocol("Unexpected response".to_string())),
        }
    }

    /// Ping the server.
    pub fn ping(&self) -> Result<(), ServerError> {
        match self.send_request(&Request::Ping)? {
            Response::Pong => Ok(()),
            _ => Err(ServerError::Protocol("Unexpected response".to_string())),
        }
    }
}
