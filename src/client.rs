use crate::errors::*;
use crate::message::Message;
use crate::options::Options;
use crate::pop3result::{MessageInfo, POP3Stat};
use crate::request::{Command, Request};
use crate::response::{BodyLines, Response};
use crate::state::POP3State;
use crate::tcpreader::LineTransport;
use crate::tcpstream::{dial, Pop3Stream, TCPStreamType};

/// A POP3 session over one connection.
///
/// The client owns its connection and keeps no mailbox state of its own.
/// Commands are checked against the session state before anything is sent:
/// mailbox commands require a successful USER/PASS exchange first, and after
/// QUIT or a connection/framing failure every command is refused locally.
///
/// A client is not meant to be shared between threads; use one per thread.
#[derive(Debug)]
pub struct Client<S: Pop3Stream = TCPStreamType> {
    transport: LineTransport<S>,
    state: POP3State,
    greeting: String,
}

impl Client<TCPStreamType> {
    /// Connects to `addr` (`host:port`) and reads the server greeting.
    ///
    /// No client is returned unless the greeting is positive.
    pub fn connect(addr: &str, opt: &Options) -> Result<Client<TCPStreamType>> {
        trace!("Initiate POP3 Connection");
        let stream = dial(addr, opt)?;
        trace!("Connection Established");
        Client::new(stream)
    }
}

impl<S: Pop3Stream> Client<S> {
    /// Starts a session over an already connected stream by reading the
    /// server greeting. Useful for custom tunnels and for tests.
    pub fn new(stream: S) -> Result<Client<S>> {
        let mut transport = LineTransport::new(stream);
        trace!("Reading Greeting from Server");
        let greeting = Response::read(&mut transport, false)?.into_result()?;
        let client = Client {
            transport,
            state: POP3State::Authorization,
            greeting: greeting.text()[0].clone(),
        };
        debug!("POP3State::{:?}", client.state);
        Ok(client)
    }

    /// Text of the server greeting, status token removed.
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    pub fn state(&self) -> POP3State {
        self.state
    }

    pub fn get_ref(&self) -> &S {
        self.transport.get_ref()
    }

    /// Sends USER then PASS; the first rejection is returned.
    pub fn auth(&mut self, user: &str, pass: &str) -> Result<()> {
        trace!("Attempting to Login");
        self.user(user)?;
        self.pass(pass)
    }

    pub fn user(&mut self, user: &str) -> Result<()> {
        let user = token("user name", user)?;
        self.command(Request::new(Command::User).arg(user), false)?;
        Ok(())
    }

    pub fn pass(&mut self, pass: &str) -> Result<()> {
        let pass = token("password", pass)?;
        self.command(Request::new(Command::Pass).arg(pass), false)?;
        Ok(())
    }

    /// Number of messages and total mailbox size in octets.
    pub fn stat(&mut self) -> Result<POP3Stat> {
        let res = self.command(Request::new(Command::Stat), false)?;
        POP3Stat::parse(&res)
    }

    /// Id and size of every message not marked as deleted.
    pub fn list_all(&mut self) -> Result<Vec<MessageInfo>> {
        let res = self.command(Request::new(Command::List), true)?;
        MessageInfo::parse_size_listing(&res)
    }

    pub fn list(&mut self, id: u32) -> Result<MessageInfo> {
        let res = self.command(Request::new(Command::List).arg(message_id(id)?), false)?;
        MessageInfo::parse_size(&res, 1)
    }

    /// Id and unique id of every message not marked as deleted.
    pub fn uidl_all(&mut self) -> Result<Vec<MessageInfo>> {
        let res = self.command(Request::new(Command::Uidl), true)?;
        MessageInfo::parse_uidl_listing(&res)
    }

    pub fn uidl(&mut self, id: u32) -> Result<MessageInfo> {
        let res = self.command(Request::new(Command::Uidl).arg(message_id(id)?), false)?;
        MessageInfo::parse_uidl(&res, 1)
    }

    /// Downloads message `id` and parses it.
    pub fn retr(&mut self, id: u32) -> Result<Message> {
        let raw = self.retr_raw(id)?;
        Message::parse(&raw)
    }

    /// Downloads message `id` as raw text, lines joined by CRLF.
    pub fn retr_raw(&mut self, id: u32) -> Result<String> {
        let res = self.command(Request::new(Command::Retr).arg(message_id(id)?), true)?;
        res.join_from(2)
    }

    /// Downloads message `id` one line at a time.
    ///
    /// The returned iterator borrows the client; dropping it before the end
    /// reads and discards the rest of the message.
    pub fn retr_lines(&mut self, id: u32) -> Result<BodyLines<'_, S>> {
        let req = Request::new(Command::Retr).arg(message_id(id)?);
        self.send(&req)?;
        let res = Response::read(&mut self.transport, false);
        self.finish(req.command, res)?;
        Ok(BodyLines::new(&mut self.transport).with_session(&mut self.state))
    }

    /// Headers and the first `lines` body lines of message `id`, parsed.
    pub fn top(&mut self, id: u32, lines: u32) -> Result<Message> {
        let raw = self.top_raw(id, lines)?.join(crate::CRLF);
        Message::parse(&raw)
    }

    /// Headers and the first `lines` body lines of message `id`.
    pub fn top_raw(&mut self, id: u32, lines: u32) -> Result<Vec<String>> {
        let req = Request::new(Command::Top).arg(message_id(id)?).arg(lines);
        let res = self.command(req, true)?;
        Ok(res.lines_from(2)?.to_vec())
    }

    /// Marks message `id` for deletion when the session ends.
    pub fn dele(&mut self, id: u32) -> Result<()> {
        self.command(Request::new(Command::Dele).arg(message_id(id)?), false)?;
        Ok(())
    }

    /// Unmarks all messages marked for deletion.
    pub fn rset(&mut self) -> Result<()> {
        self.command(Request::new(Command::Rset), false)?;
        Ok(())
    }

    /// Does nothing on the server; a liveness check.
    pub fn noop(&mut self) -> Result<()> {
        self.command(Request::new(Command::Noop), false)?;
        Ok(())
    }

    /// Sends QUIT, ignoring the outcome. The session ends either way.
    pub fn quit(&mut self) {
        if self.state == POP3State::End {
            return;
        }
        if let Err(e) = self.command(Request::new(Command::Quit), false) {
            debug!("QUIT failed: {}", e);
        }
        self.state = POP3State::End;
    }

    /// Sends QUIT and closes the connection, which is closed even when QUIT
    /// could not be completed.
    pub fn close(mut self) -> Result<()> {
        self.quit();
        trace!("Closing connection");
        self.transport.close()
    }

    fn command(&mut self, request: Request, multiline: bool) -> Result<Response> {
        self.send(&request)?;
        let res = Response::read(&mut self.transport, multiline);
        self.finish(request.command, res)
    }

    fn send(&mut self, request: &Request) -> Result<()> {
        trace!("Cmd: {}", request.command);
        if !self.state.permits(request.command) {
            return Err(ErrorKind::InvalidState(request.command.as_str(), self.state).into());
        }
        info!("C: {}", request);
        self.transport
            .write_line(&request.encode())
            .map_err(|e| self.broken(e))
    }

    fn finish(&mut self, command: Command, res: Result<Response>) -> Result<Response> {
        let res = res.map_err(|e| self.broken(e))?;
        let next = self.state.after(command, res.is_positive());
        if next != self.state {
            self.state = next;
            debug!("POP3State::{:?}", self.state);
        }
        res.into_result()
    }

    fn broken(&mut self, e: Error) -> Error {
        if e.is_fatal() && self.state != POP3State::End {
            self.state = POP3State::End;
            debug!("POP3State::{:?} after {}", self.state, e);
        }
        e
    }
}

fn message_id(id: u32) -> Result<u32> {
    if id == 0 {
        return Err(ErrorKind::InvalidArgument("message numbers start at 1".to_string()).into());
    }
    Ok(id)
}

/// Checks an opaque argument can be sent as a single token.
fn token<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(ErrorKind::InvalidArgument(format!("empty {}", what)).into());
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ErrorKind::InvalidArgument(format!("{} contains whitespace or control characters", what)).into());
    }
    Ok(value)
}
