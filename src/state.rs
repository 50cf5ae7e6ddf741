use crate::request::Command;

/// Session states of a POP3 client.
///
/// The server's UPDATE state is entered after QUIT and is never observable
/// from the client side, so it has no variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum POP3State {
    /// Greeting received, no USER accepted yet.
    Authorization,
    /// USER accepted, PASS expected.
    AwaitingPass,
    /// Authenticated; mailbox commands are allowed.
    Transaction,
    /// QUIT was sent or the connection broke.
    End,
}

impl POP3State {
    /// Whether `command` may be issued in this state.
    pub fn permits(self, command: Command) -> bool {
        use crate::request::Command::*;

        match self {
            POP3State::Authorization => match command {
                User | Quit => true,
                _ => false,
            },
            POP3State::AwaitingPass => match command {
                User | Pass | Quit => true,
                _ => false,
            },
            POP3State::Transaction => match command {
                Stat | List | Uidl | Retr | Top | Dele | Rset | Noop | Quit => true,
                User | Pass => false,
            },
            POP3State::End => false,
        }
    }

    /// State reached after `command` got a reply with the given status.
    pub fn after(self, command: Command, positive: bool) -> POP3State {
        match (command, positive) {
            (Command::Quit, _) => POP3State::End,
            (Command::User, true) => POP3State::AwaitingPass,
            (Command::Pass, true) => POP3State::Transaction,
            (Command::User, false) | (Command::Pass, false) => POP3State::Authorization,
            _ => self,
        }
    }
}
