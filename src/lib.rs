//! A synchronous client for the POP3 mailbox retrieval protocol (RFC 1939).
//!
//! The protocol is strictly one command at a time: every request is written
//! and flushed, then its response (including a multi-line body up to the
//! terminating `.` line) is read in full before the next request may go out.
//!
//! ```rust,no_run
//! use pop3_client::{Client, Options};
//!
//! # fn main() -> pop3_client::errors::Result<()> {
//! let mut client = Client::connect("pop.example.org:995", &Options::default())?;
//! client.auth("alice", "secret")?;
//!
//! let stat = client.stat()?;
//! println!("{} messages, {} octets", stat.num_mails, stat.mbox_size);
//!
//! for info in client.list_all()? {
//!     let raw = client.retr_raw(info.id)?;
//!     println!("message {}: {} bytes", info.id, raw.len());
//! }
//!
//! client.close()?;
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate lazy_static;
extern crate mailparse;
extern crate openssl;
extern crate regex;

pub mod errors {
    use crate::state::POP3State;

    error_chain! {
        foreign_links {
            Io(::std::io::Error);
            SslStack(::openssl::error::ErrorStack);
            SslHandshake(::openssl::ssl::HandshakeError<::std::net::TcpStream>);
            MailParse(::mailparse::MailParseError);
        }

        errors {
            ConnectionClosed {
                description("connection closed")
                display("pop3: connection closed by server")
            }
            UnknownStatusCode(line: String) {
                description("unknown response status code")
                display("pop3: unknown response code in {:?}", line)
            }
            TruncatedResponse {
                description("multi-line response ended before its terminator")
                display("pop3: termination octet in multiline response is missing")
            }
            ServerRejection(text: String) {
                description("negative server response")
                display("pop3: {}", text)
            }
            MalformedReply(line: String) {
                description("reply does not carry the expected fields")
                display("pop3: malformed reply {:?}", line)
            }
            LineOutOfRange(index: usize, len: usize) {
                description("response line index out of range")
                display("pop3: line {} requested from a response of {} lines", index, len)
            }
            InvalidState(command: &'static str, state: POP3State) {
                description("command not allowed in the current session state")
                display("pop3: {} is not allowed in state {:?}", command, state)
            }
            InvalidArgument(reason: String) {
                description("invalid command argument")
                display("pop3: invalid argument: {}", reason)
            }
            InvalidAddress(addr: String) {
                description("address is not of the form host:port")
                display("pop3: invalid address {:?}", addr)
            }
        }
    }

    impl Error {
        /// Returns true when the connection can no longer be used.
        ///
        /// Transport failures and broken framing are fatal; server rejections,
        /// unparseable fields in a fully read reply and local contract
        /// violations leave the connection in sync.
        pub fn is_fatal(&self) -> bool {
            match *self.kind() {
                ErrorKind::ConnectionClosed
                | ErrorKind::UnknownStatusCode(_)
                | ErrorKind::TruncatedResponse
                | ErrorKind::Io(_)
                | ErrorKind::SslStack(_)
                | ErrorKind::SslHandshake(_) => true,
                _ => false,
            }
        }
    }
}

mod client;
pub mod message;
mod options;
pub mod pop3result;
mod pop3resultimpl;
pub mod request;
pub mod response;
mod state;
mod tcpreader;
mod tcpstream;

#[cfg(test)]
mod mock_stream;

pub use client::Client;
pub use message::{BodyPart, Message};
pub use options::Options;
pub use pop3result::{MessageAttr, MessageInfo, POP3Stat};
pub use request::{Command, Request};
pub use response::{BodyLines, Response, Status};
pub use state::POP3State;
pub use tcpreader::LineTransport;
pub use tcpstream::{dial, Pop3Stream, TCPStreamType};

/// Line terminator used on the wire, both for requests and replies.
pub const CRLF: &str = "\r\n";
