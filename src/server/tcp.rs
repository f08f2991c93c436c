//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Implementación del servidor TCP que maneja múltiples conexiones
//! simultáneas usando threads. Cada conexión se procesa en su propio thread
//! y atiende exactamente un request antes de cerrarse.
//!
//! ## Ciclo de vida
//!
//! ```text
//! Server::bind → start() → RunningServer → close()
//!             ↘ run() (bloquea el thread actual)
//! ```

use super::handler::{Handler, HandlerError};
use crate::config::Config;
use crate::error::{HttpError, Result};
use crate::http::{Request, ResponseWriter, StatusCode, WriterState};
use std::io::{self, Read, Write};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Servidor HTTP/1.1 ligado a un puerto pero todavía sin aceptar conexiones
pub struct Server {
    listener: TcpListener,
    handler: Arc<dyn Handler>,
    read_timeout: Option<Duration>,
    closed: Arc<AtomicBool>,
}

impl Server {
    /// Abre el listener en `config.address()`
    pub fn bind<H: Handler>(config: &Config, handler: H) -> io::Result<Self> {
        let listener = TcpListener::bind(config.address())?;
        info!(address = %listener.local_addr()?, "listener bound");

        Ok(Self {
            listener,
            handler: Arc::new(handler),
            read_timeout: config.read_timeout(),
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Lanza el loop de accept en un thread propio
    pub fn start(self) -> io::Result<RunningServer> {
        let addr = self.listener.local_addr()?;
        let closed = Arc::clone(&self.closed);

        let accept_thread = thread::Builder::new()
            .name("raw-http-accept".to_string())
            .spawn(move || self.run())?;

        Ok(RunningServer {
            addr,
            closed,
            accept_thread,
        })
    }

    /// Acepta conexiones en el thread actual hasta que se cierre el servidor
    pub fn run(self) {
        info!("modo concurrente: un thread por conexion");

        for stream in self.listener.incoming() {
            if self.closed.load(Ordering::Acquire) {
                break;
            }

            match stream {
                Ok(stream) => {
                    let handler = Arc::clone(&self.handler);
                    let read_timeout = self.read_timeout;

                    thread::spawn(move || handle_connection(stream, handler.as_ref(), read_timeout));
                }
                Err(e) => {
                    warn!(error = %e, "failed to accept connection");
                }
            }
        }

        info!("accept loop stopped");
    }
}

/// Servidor con el loop de accept corriendo en segundo plano
pub struct RunningServer {
    addr: SocketAddr,
    closed: Arc<AtomicBool>,
    accept_thread: JoinHandle<()>,
}

impl RunningServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Marca el servidor como cerrado y espera al thread de accept
    ///
    /// Las conexiones que ya estaban en curso terminan por su cuenta.
    pub fn close(self) -> io::Result<()> {
        self.closed.store(true, Ordering::Release);

        // El accept está bloqueado: una conexión propia lo despierta
        TcpStream::connect(wake_address(self.addr))?;

        self.accept_thread
            .join()
            .map_err(|_| io::Error::other("accept thread panicked"))?;

        info!(address = %self.addr, "server closed");
        Ok(())
    }
}

/// Dirección conectable para un listener ligado a 0.0.0.0 o [::]
fn wake_address(addr: SocketAddr) -> SocketAddr {
    let mut wake = addr;
    if addr.ip().is_unspecified() {
        match addr {
            SocketAddr::V4(_) => wake.set_ip(Ipv4Addr::LOCALHOST.into()),
            SocketAddr::V6(_) => wake.set_ip(Ipv6Addr::LOCALHOST.into()),
        }
    }
    wake
}

fn handle_connection(mut stream: TcpStream, handler: &dyn Handler, read_timeout: Option<Duration>) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    if let Err(e) = stream.set_read_timeout(read_timeout) {
        warn!(peer = %peer, error = %e, "failed to set read timeout");
    }

    match serve(&mut stream, handler, &peer) {
        Ok(()) => debug!(peer = %peer, "connection closed"),
        Err(e) => warn!(peer = %peer, error = %e, "connection aborted"),
    }
}

/// Atiende un único request sobre `stream`
///
/// Un error de parsing se responde con `400 Bad Request`, incluido un request
/// cortado a medias; un error de I/O aborta la conexión sin responder. Si el
/// peer cierra sin mandar ningún byte no se responde nada.
fn serve<S: Read + Write>(stream: &mut S, handler: &dyn Handler, peer: &str) -> Result<()> {
    let request = match Request::from_reader(&mut *stream) {
        Ok(request) => request,
        Err(HttpError::IncompleteRequest { received: 0, .. }) => {
            debug!(peer, "peer closed before sending a request");
            return Ok(());
        }
        Err(e) if e.is_io() => return Err(e),
        Err(e) => {
            warn!(peer, error = %e, "rejecting malformed request");

            let rejection =
                HandlerError::new(StatusCode::BadRequest, format!("Error parsing request: {}", e));
            let sink: &mut dyn Write = &mut *stream;
            rejection.write_to(&mut ResponseWriter::new(sink))?;
            stream.flush()?;
            return Ok(());
        }
    };

    info!(
        peer,
        method = %request.method(),
        target = request.target(),
        "request received"
    );

    {
        let sink: &mut dyn Write = &mut *stream;
        let mut writer = ResponseWriter::new(sink);

        if let Err(err) = handler.handle(&mut writer, &request) {
            if writer.state() == WriterState::StatusLine {
                warn!(peer, status = %err.status, error = %err.message, "handler failed");
                err.write_to(&mut writer)?;
            } else {
                error!(
                    peer,
                    status = %err.status,
                    error = %err.message,
                    state = writer.state().as_str(),
                    "handler failed after the response started"
                );
            }
        }
    }

    stream.flush()?;
    Ok(())
}
