//! Request framing: a command token and its arguments, terminated by CRLF.

use std::fmt;

use crate::CRLF;

/// The POP3 verbs this client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Stat,
    List,
    Retr,
    Dele,
    Noop,
    Rset,
    Top,
    Uidl,
    User,
    Pass,
    Quit,
}

impl Command {
    /// The command token as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Stat => "STAT",
            Command::List => "LIST",
            Command::Retr => "RETR",
            Command::Dele => "DELE",
            Command::Noop => "NOOP",
            Command::Rset => "RSET",
            Command::Top => "TOP",
            Command::Uidl => "UIDL",
            Command::User => "USER",
            Command::Pass => "PASS",
            Command::Quit => "QUIT",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single client request.
///
/// Arguments are written verbatim, separated by single spaces. The protocol
/// has no escaping, so arguments must not contain whitespace or control
/// characters; the encoder does not check this, nor the argument count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: Command,
    pub args: Vec<String>,
}

impl Request {
    pub fn new(command: Command) -> Request {
        Request {
            command,
            args: Vec::new(),
        }
    }

    /// Appends an argument; integers render as decimal.
    pub fn arg<T: ToString>(mut self, arg: T) -> Request {
        self.args.push(arg.to_string());
        self
    }

    /// The exact wire line, CRLF included.
    pub fn encode(&self) -> String {
        let mut line = String::from(self.command.as_str());
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line.push_str(CRLF);
        line
    }
}

/// Renders the request for logs: no terminator, PASS argument masked.
impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.command.as_str())?;
        for arg in &self.args {
            if self.command == Command::Pass {
                f.write_str(" ****")?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
