use openssl::ssl::{SslConnector, SslMethod, SslStream, SslVerifyMode};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use crate::errors::*;
use crate::options::Options;

/// A byte stream a POP3 session can run over.
///
/// `close` releases the underlying connection; the default does nothing,
/// which suits in-memory streams.
pub trait Pop3Stream: Read + Write {
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug)]
pub enum TCPStreamType {
    Plain(TcpStream),
    SSL(SslStream<TcpStream>),
}

impl Write for TCPStreamType {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match *self {
            TCPStreamType::Plain(ref mut stream) => stream.write(buf),
            TCPStreamType::SSL(ref mut stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match *self {
            TCPStreamType::Plain(ref mut stream) => stream.flush(),
            TCPStreamType::SSL(ref mut stream) => stream.flush(),
        }
    }
}

impl Read for TCPStreamType {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match *self {
            TCPStreamType::Plain(ref mut stream) => stream.read(buf),
            TCPStreamType::SSL(ref mut stream) => stream.read(buf),
        }
    }
}

impl Pop3Stream for TCPStreamType {
    fn close(&mut self) -> io::Result<()> {
        let tcp = match *self {
            TCPStreamType::Plain(ref mut stream) => stream,
            TCPStreamType::SSL(ref mut stream) => {
                // close_notify is a courtesy; the peer may already be gone.
                if let Err(e) = stream.shutdown() {
                    debug!("TLS shutdown failed: {}", e);
                }
                stream.get_mut()
            }
        };
        match tcp.shutdown(Shutdown::Both) {
            Err(ref e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

/// Opens a connection to `addr` (`host:port`) as configured by `opt`.
///
/// With TLS enabled the server certificate is verified against the host part
/// of `addr` unless `tls_skip_verify` is set. A failed handshake is an error;
/// there is no fallback to plaintext.
pub fn dial(addr: &str, opt: &Options) -> Result<TCPStreamType> {
    let host = split_host(addr)?;
    let timeout = opt.effective_dial_timeout();
    trace!("Dialing {} (timeout {:?})", addr, timeout);

    let mut last_err = None;
    let mut tcp_stream = None;
    for sock_addr in addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&sock_addr, timeout) {
            Ok(stream) => {
                tcp_stream = Some(stream);
                break;
            }
            Err(e) => {
                debug!("Connection to {} failed: {}", sock_addr, e);
                last_err = Some(e);
            }
        }
    }
    let tcp_stream = match tcp_stream {
        Some(stream) => stream,
        None => {
            return Err(last_err
                .unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, "address resolved to nothing")
                })
                .into())
        }
    };
    tcp_stream.set_read_timeout(opt.read_timeout)?;
    tcp_stream.set_write_timeout(opt.write_timeout)?;

    if !opt.tls_enabled {
        debug!("Creating a Plain TCP Connection");
        return Ok(TCPStreamType::Plain(tcp_stream));
    }

    debug!("Creating a SSL Connection");
    let connector = SslConnector::builder(SslMethod::tls())?.build();
    let mut config = connector.configure()?;
    if opt.tls_skip_verify {
        warn!("TLS certificate verification disabled for {}", host);
        config.set_verify_hostname(false);
        config.set_verify(SslVerifyMode::NONE);
    }
    let stream = config.connect(host, tcp_stream)?;
    Ok(TCPStreamType::SSL(stream))
}

/// Host part of `host:port`, with IPv6 brackets removed.
fn split_host(addr: &str) -> Result<&str> {
    let (host, port) = match addr.rfind(':') {
        Some(idx) => (&addr[..idx], &addr[idx + 1..]),
        None => return Err(ErrorKind::InvalidAddress(addr.to_string()).into()),
    };
    if host.is_empty() || port.parse::<u16>().is_err() {
        return Err(ErrorKind::InvalidAddress(addr.to_string()).into());
    }
    Ok(host.trim_start_matches('[').trim_end_matches(']'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_of_address() {
        assert_eq!(split_host("pop.example.org:995").unwrap(), "pop.example.org");
        assert_eq!(split_host("[::1]:110").unwrap(), "::1");
    }

    #[test]
    fn address_without_port() {
        match split_host("pop.example.org") {
            Err(Error(ErrorKind::InvalidAddress(_), _)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(split_host(":110").is_err());
        assert!(split_host("host:pop3").is_err());
    }

    #[test]
    fn dial_refused() {
        // Bind then drop to obtain a port nobody listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let opt = Options::default().with_tls(false);
        let err = dial(&format!("127.0.0.1:{}", port), &opt).unwrap_err();
        assert!(err.is_fatal());
    }
}
