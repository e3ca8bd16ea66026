use std::io::{BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::path::Path;
use std::time::Duration;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

use crate::error::{Error, Result, CR_CONN_HOST_ERROR};
use crate::opts::SslOpts;

#[cfg(feature = "tls")]
use native_tls::TlsStream;

/// The owned bidirectional byte transport underneath the framer.
///
/// `Closed` stands in after `close()` or a failed TLS upgrade; any I/O on it
/// reports the transport as gone.
pub enum Stream {
    Tcp(BufReader<TcpStream>),
    #[cfg(feature = "tls")]
    Tls(BufReader<TlsStream<TcpStream>>),
    #[cfg(unix)]
    Unix(BufReader<UnixStream>),
    Closed,
}

fn gone() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::NotConnected, "connection closed")
}

impl Stream {
    /// Open a TCP transport with the configured deadline and socket options.
    pub fn connect_tcp(
        host: &str,
        port: u16,
        timeout: Option<Duration>,
        nodelay: bool,
    ) -> Result<Self> {
        let mut last_err: Option<std::io::Error> = None;
        let addrs = (host, port).to_socket_addrs().map_err(|e| cannot_connect(host, &e))?;
        for addr in addrs {
            let attempt = match timeout {
                Some(t) => TcpStream::connect_timeout(&addr, t),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_nodelay(nodelay)?;
                    socket2::SockRef::from(&stream).set_keepalive(true)?;
                    return Ok(Self::Tcp(BufReader::new(stream)));
                }
                Err(e) => last_err = Some(e),
            }
        }
        let err = last_err.unwrap_or_else(gone);
        Err(cannot_connect(host, &err))
    }

    /// Open a UNIX-domain transport.
    #[cfg(unix)]
    pub fn connect_unix(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path)
            .map_err(|e| cannot_connect(&path.display().to_string(), &e))?;
        Ok(Self::Unix(BufReader::new(stream)))
    }

    pub fn tcp(stream: TcpStream) -> Self {
        Self::Tcp(BufReader::new(stream))
    }

    /// Whether the transport is safe for cleartext credentials (TLS or a
    /// local UNIX socket).
    pub fn is_secure(&self) -> bool {
        match self {
            #[cfg(feature = "tls")]
            Self::Tls(_) => true,
            #[cfg(unix)]
            Self::Unix(_) => true,
            _ => false,
        }
    }

    /// Replace the TCP transport with a TLS session over the same socket.
    #[cfg(feature = "tls")]
    pub fn upgrade_to_tls(self, host: &str, ssl: &SslOpts) -> Result<Self> {
        let tcp = match self {
            Self::Tcp(reader) => reader.into_inner(),
            Self::Tls(_) => {
                return Err(Error::Interface("transport already uses TLS".to_string()));
            }
            #[cfg(unix)]
            Self::Unix(_) => {
                return Err(Error::Interface(
                    "TLS is not supported over UNIX sockets".to_string(),
                ));
            }
            Self::Closed => return Err(gone().into()),
        };

        let mut builder = native_tls::TlsConnector::builder();
        // Hostname verification is skipped; the server is identified by the
        // configured CA when one is given, matching classic client behavior.
        builder.danger_accept_invalid_hostnames(true);
        match &ssl.ca {
            Some(ca) => {
                let pem = std::fs::read(ca)?;
                let cert = native_tls::Certificate::from_pem(&pem).map_err(tls_error)?;
                builder.add_root_certificate(cert);
            }
            None => {
                builder.danger_accept_invalid_certs(true);
            }
        }
        if let (Some(cert), Some(key)) = (&ssl.cert, &ssl.key) {
            let cert_pem = std::fs::read(cert)?;
            let key_pem = std::fs::read(key)?;
            let identity =
                native_tls::Identity::from_pkcs8(&cert_pem, &key_pem).map_err(tls_error)?;
            builder.identity(identity);
        }
        let connector = builder.build().map_err(tls_error)?;

        let tls = connector.connect(host, tcp).map_err(|e| Error::Operational {
            code: CR_CONN_HOST_ERROR,
            message: format!("TLS handshake failed: {e}"),
        })?;
        Ok(Self::Tls(BufReader::new(tls)))
    }

    #[cfg(not(feature = "tls"))]
    pub fn upgrade_to_tls(self, _host: &str, _ssl: &SslOpts) -> Result<Self> {
        Err(Error::NotSupported(
            "TLS requested but the tls feature is not enabled".to_string(),
        ))
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        match self {
            Self::Tcp(r) => r.read_exact(buf),
            #[cfg(feature = "tls")]
            Self::Tls(r) => r.read_exact(buf),
            #[cfg(unix)]
            Self::Unix(r) => r.read_exact(buf),
            Self::Closed => Err(gone()),
        }
    }

    pub fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            Self::Tcp(r) => r.get_mut().write_all(buf),
            #[cfg(feature = "tls")]
            Self::Tls(r) => r.get_mut().write_all(buf),
            #[cfg(unix)]
            Self::Unix(r) => r.get_mut().write_all(buf),
            Self::Closed => Err(gone()),
        }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Tcp(r) => r.get_mut().flush(),
            #[cfg(feature = "tls")]
            Self::Tls(r) => r.get_mut().flush(),
            #[cfg(unix)]
            Self::Unix(r) => r.get_mut().flush(),
            Self::Closed => Err(gone()),
        }
    }

    /// Tear down the transport. Further I/O fails fast.
    pub fn shutdown(&mut self) {
        match std::mem::replace(self, Self::Closed) {
            Self::Tcp(r) => {
                let _ = r.get_ref().shutdown(std::net::Shutdown::Both);
            }
            #[cfg(feature = "tls")]
            Self::Tls(mut r) => {
                let _ = r.get_mut().shutdown();
            }
            #[cfg(unix)]
            Self::Unix(r) => {
                let _ = r.get_ref().shutdown(std::net::Shutdown::Both);
            }
            Self::Closed => {}
        }
    }
}

fn cannot_connect(target: &str, err: &std::io::Error) -> Error {
    Error::Operational {
        code: CR_CONN_HOST_ERROR,
        message: format!("Can't connect to MySQL server on {target:?} ({err})"),
    }
}

#[cfg(feature = "tls")]
fn tls_error(err: native_tls::Error) -> Error {
    Error::Operational {
        code: CR_CONN_HOST_ERROR,
        message: format!("TLS setup failed: {err}"),
    }
}
