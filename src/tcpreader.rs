use std::io::{self, BufRead, BufReader};

use crate::errors::*;
use crate::tcpstream::Pop3Stream;

const LF: u8 = 0x0a;
const CR: u8 = 0x0d;

/// Buffered line-oriented access to a POP3 connection.
///
/// Reads go through a `BufReader`; writes bypass it and are flushed at once,
/// so a request is on the wire before its response is awaited.
#[derive(Debug)]
pub struct LineTransport<S: Pop3Stream> {
    reader: BufReader<S>,
    buff: Vec<u8>,
}

impl<S: Pop3Stream> LineTransport<S> {
    pub fn new(stream: S) -> LineTransport<S> {
        LineTransport {
            reader: BufReader::new(stream),
            buff: Vec::with_capacity(512),
        }
    }

    /// Reads one line without its CRLF (a bare LF is accepted too).
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected, so
    /// one odd message cannot desynchronise the line framing.
    pub fn read_line(&mut self) -> Result<String> {
        self.buff.clear();
        let n = match self.reader.read_until(LF, &mut self.buff) {
            Ok(n) => n,
            Err(e) => return Err(map_io_error(e)),
        };
        if n == 0 || self.buff.last() != Some(&LF) {
            // EOF, possibly in the middle of a line.
            return Err(ErrorKind::ConnectionClosed.into());
        }
        self.buff.pop();
        if self.buff.last() == Some(&CR) {
            self.buff.pop();
        }
        let line = String::from_utf8_lossy(&self.buff).into_owned();
        Ok(line)
    }

    /// Writes `line` exactly as given and flushes.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(line.as_bytes()).map_err(map_io_error)?;
        stream.flush().map_err(map_io_error)?;
        Ok(())
    }

    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    pub fn get_mut(&mut self) -> &mut S {
        self.reader.get_mut()
    }

    /// Shuts the connection down and drops it.
    pub fn close(mut self) -> Result<()> {
        self.reader.get_mut().close()?;
        Ok(())
    }
}

/// Deadline expiry and peer resets count as a closed connection.
fn map_io_error(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::WouldBlock
        | io::ErrorKind::TimedOut
        | io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => {
            debug!("Connection lost: {}", e);
            ErrorKind::ConnectionClosed.into()
        }
        _ => e.into(),
    }
}
