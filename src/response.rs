//! Response parsing: status detection and multi-line body framing.
//!
//! Every reply starts with a status line, `+OK[ text]` or `-ERR[ text]`.
//! Replies to multi-line commands continue, after a positive status line,
//! with body lines up to a line holding a single `.`. Body lines that start
//! with `.` arrive with an extra `.` prepended, which is removed here.

use regex::Regex;

use crate::errors::*;
use crate::state::POP3State;
use crate::tcpreader::LineTransport;
use crate::tcpstream::Pop3Stream;
use crate::CRLF;

const TERMINATOR: &str = ".";

lazy_static! {
    static ref STATUS_LINE: Regex = Regex::new(r"^(?P<status>[^ ]*)(?: (?P<text>.*))?$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// `+OK`
    Ok,
    /// `-ERR`
    Err,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "+OK",
            Status::Err => "-ERR",
        }
    }

    fn from_token(token: &str) -> Option<Status> {
        match token {
            "+OK" => Some(Status::Ok),
            "-ERR" => Some(Status::Err),
            _ => None,
        }
    }
}

/// A complete server reply.
///
/// Line 1 of the text is the status line with its status token removed
/// (empty if the server sent none); lines 2 and up are the body of a
/// multi-line reply, terminator excluded. A negative reply always has
/// exactly one line.
///
/// Bodies are assumed to be byte-stuffed by the server as RFC 1939 requires:
/// one leading `.` is stripped from body lines starting with `..`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    text: Vec<String>,
    multiline: bool,
}

impl Response {
    /// Splits a status line into its status and remaining text.
    ///
    /// Anything other than `+OK` or `-ERR` before the first space means the
    /// client has lost track of the framing; the error is fatal.
    pub fn parse_status_line(line: &str) -> Result<(Status, String)> {
        let caps = match STATUS_LINE.captures(line) {
            Some(caps) => caps,
            None => return Err(ErrorKind::UnknownStatusCode(line.to_string()).into()),
        };
        let status = caps
            .name("status")
            .and_then(|m| Status::from_token(m.as_str()))
            .ok_or_else(|| Error::from(ErrorKind::UnknownStatusCode(line.to_string())))?;
        let text = caps.name("text").map_or("", |m| m.as_str());
        Ok((status, text.to_string()))
    }

    /// Reads one reply from `transport`.
    ///
    /// With `multiline` set, a positive reply is read up to its terminator;
    /// a negative reply never is, since the server sends no body for it.
    pub fn read<S: Pop3Stream>(transport: &mut LineTransport<S>, multiline: bool) -> Result<Response> {
        let first = transport.read_line()?;
        info!("S: {}", first);
        let (status, text) = Response::parse_status_line(&first)?;

        let mut response = Response {
            status,
            text: vec![text],
            multiline,
        };
        if status == Status::Err || !multiline {
            return Ok(response);
        }

        for line in BodyLines::new(transport) {
            response.text.push(line?);
        }
        debug!("Read {} body lines", response.text.len() - 1);
        Ok(response)
    }

    /// Builds a reply from lines already read off the wire, terminator
    /// included for multi-line replies.
    pub fn parse<T: AsRef<str>>(lines: &[T], multiline: bool) -> Result<Response> {
        let first = match lines.first() {
            Some(line) => line.as_ref(),
            None => return Err(ErrorKind::ConnectionClosed.into()),
        };
        let (status, text) = Response::parse_status_line(first)?;
        let mut response = Response {
            status,
            text: vec![text],
            multiline,
        };
        if status == Status::Err || !multiline {
            return Ok(response);
        }

        let body = &lines[1..];
        match body.last() {
            Some(last) if last.as_ref() == TERMINATOR => {}
            _ => return Err(ErrorKind::TruncatedResponse.into()),
        }
        response
            .text
            .extend(body[..body.len() - 1].iter().map(|l| unstuff(l.as_ref()).to_string()));
        Ok(response)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_positive(&self) -> bool {
        self.status == Status::Ok
    }

    /// Whether the reply was read as a multi-line reply. Always true when
    /// there is more than one line of text.
    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    pub fn text(&self) -> &[String] {
        &self.text
    }

    /// Turns a negative reply into a `ServerRejection` carrying its text.
    pub fn into_result(self) -> Result<Response> {
        match self.status {
            Status::Ok => Ok(self),
            Status::Err => Err(ErrorKind::ServerRejection(self.text[0].clone()).into()),
        }
    }

    /// Whitespace-separated fields of line `n` (1-based).
    pub fn args(&self, n: usize) -> Result<Vec<&str>> {
        if n == 0 || n > self.text.len() {
            return Err(ErrorKind::LineOutOfRange(n, self.text.len()).into());
        }
        Ok(self.text[n - 1].split_whitespace().collect())
    }

    /// Lines `n` (1-based) through the end. `n` may be one past the last
    /// line, giving an empty slice.
    pub fn lines_from(&self, n: usize) -> Result<&[String]> {
        if n == 0 || n > self.text.len() + 1 {
            return Err(ErrorKind::LineOutOfRange(n, self.text.len()).into());
        }
        Ok(&self.text[n - 1..])
    }

    /// Lines `n` through the end joined by CRLF, e.g. the raw message text
    /// of a RETR reply when `n` is 2.
    pub fn join_from(&self, n: usize) -> Result<String> {
        Ok(self.lines_from(n)?.join(CRLF))
    }
}

/// Body lines of a multi-line reply, produced as they are read.
///
/// The iterator ends at the terminator line. A connection that closes first
/// yields `TruncatedResponse`. Dropping the iterator early reads and discards
/// the remaining lines so the next reply starts on a fresh status line.
pub struct BodyLines<'a, S: Pop3Stream> {
    transport: &'a mut LineTransport<S>,
    session: Option<&'a mut POP3State>,
    done: bool,
}

impl<'a, S: Pop3Stream> BodyLines<'a, S> {
    /// Starts reading after a positive status line has been consumed.
    pub fn new(transport: &'a mut LineTransport<S>) -> BodyLines<'a, S> {
        BodyLines {
            transport,
            session: None,
            done: false,
        }
    }

    /// Ends `state` on a fatal error, including one hit while draining on drop.
    pub(crate) fn with_session(mut self, state: &'a mut POP3State) -> BodyLines<'a, S> {
        self.session = Some(state);
        self
    }

    fn fail(&mut self, e: Error) -> Error {
        self.done = true;
        if e.is_fatal() {
            if let Some(ref mut state) = self.session {
                **state = POP3State::End;
            }
        }
        e
    }
}

impl<'a, S: Pop3Stream> Iterator for BodyLines<'a, S> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Result<String>> {
        if self.done {
            return None;
        }
        match self.transport.read_line() {
            Ok(ref line) if line == TERMINATOR => {
                self.done = true;
                None
            }
            Ok(line) => Some(Ok(unstuff(&line).to_string())),
            Err(Error(ErrorKind::ConnectionClosed, _)) => {
                Some(Err(self.fail(ErrorKind::TruncatedResponse.into())))
            }
            Err(e) => Some(Err(self.fail(e))),
        }
    }
}

impl<'a, S: Pop3Stream> Drop for BodyLines<'a, S> {
    fn drop(&mut self) {
        let mut skipped = 0;
        while let Some(line) = self.next() {
            if line.is_err() {
                break;
            }
            skipped += 1;
        }
        if skipped > 0 {
            debug!("Discarded {} unread body lines", skipped);
        }
    }
}

/// Removes the byte-stuffing dot from a body line.
fn unstuff(line: &str) -> &str {
    if line.starts_with("..") {
        &line[1..]
    } else {
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_stream::MockStream;

    fn transport(data: &str) -> LineTransport<MockStream> {
        LineTransport::new(MockStream::new(data.as_bytes().to_vec()))
    }

    #[test]
    fn status_line() {
        let (status, text) = Response::parse_status_line("+OK 2 320").unwrap();
        assert_eq!(status, Status::Ok);
        assert_eq!(text, "2 320");

        let (status, text) = Response::parse_status_line("-ERR").unwrap();
        assert_eq!(status, Status::Err);
        assert_eq!(text, "");
    }

    #[test]
    fn unknown_status_code() {
        for line in &["OK 2 320", "+OKAY", "", " +OK", "* OK ready"] {
            match Response::parse_status_line(line) {
                Err(Error(ErrorKind::UnknownStatusCode(_), _)) => {}
                other => panic!("{:?} parsed as {:?}", line, other),
            }
        }
    }

    #[test]
    fn single_line() {
        let mut t = transport("+OK 1 120\r\n+OK next\r\n");
        let res = Response::read(&mut t, false).unwrap();
        assert!(res.is_positive());
        assert!(!res.is_multiline());
        assert_eq!(res.text(), &["1 120".to_string()]);
        assert_eq!(res.args(1).unwrap(), vec!["1", "120"]);
        // The following reply is left untouched.
        assert_eq!(t.read_line().unwrap(), "+OK next");
    }

    #[test]
    fn multi_line() {
        let mut t = transport("+OK 2 messages\r\n1 120\r\n2 200\r\n.\r\n");
        let res = Response::read(&mut t, true).unwrap();
        assert!(res.is_multiline());
        assert_eq!(res.text().len(), 3);
        assert_eq!(res.text().last().unwrap(), "2 200");
        assert_eq!(res.args(3).unwrap(), vec!["2", "200"]);
        assert_eq!(res.lines_from(2).unwrap().len(), 2);
    }

    #[test]
    fn empty_multi_line_body() {
        let mut t = transport("+OK\r\n.\r\n");
        let res = Response::read(&mut t, true).unwrap();
        assert!(res.is_positive());
        assert!(res.lines_from(2).unwrap().is_empty());
        assert_eq!(res.join_from(2).unwrap(), "");
    }

    #[test]
    fn negative_reply_skips_body() {
        // No terminator follows; reading one would hit EOF.
        let mut t = transport("-ERR no such mailbox\r\n");
        let res = Response::read(&mut t, true).unwrap();
        assert_eq!(res.status(), Status::Err);
        assert_eq!(res.text(), &["no such mailbox".to_string()]);
        match res.into_result() {
            Err(Error(ErrorKind::ServerRejection(ref text), _)) => assert_eq!(text, "no such mailbox"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn truncated_body() {
        let mut t = transport("+OK\r\nFrom: a@example.com\r\n");
        match Response::read(&mut t, true) {
            Err(Error(ErrorKind::TruncatedResponse, _)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn dot_stuffed_lines() {
        let mut t = transport("+OK\r\n..\r\n...hidden\r\n.x\r\n.\r\n");
        let res = Response::read(&mut t, true).unwrap();
        assert_eq!(res.join_from(2).unwrap(), ".\r\n..hidden\r\n.x");
    }

    #[test]
    fn retrieved_text_round_trips() {
        let message = "Subject: hi\r\n\r\nline one\r\nline two";
        let wire = format!("+OK 31 octets\r\n{}\r\n.\r\n", message);
        let mut t = transport(&wire);
        let res = Response::read(&mut t, true).unwrap();
        assert_eq!(res.join_from(2).unwrap(), message);
    }

    #[test]
    fn line_index_out_of_range() {
        let res = Response::parse(&["+OK 1 2"], false).unwrap();
        assert!(res.args(1).is_ok());
        for n in &[0, 2] {
            match res.args(*n) {
                Err(Error(ErrorKind::LineOutOfRange(_, 1), _)) => {}
                other => panic!("args({}) gave {:?}", n, other),
            }
        }
        assert!(res.lines_from(2).unwrap().is_empty());
        assert!(res.lines_from(3).is_err());
        assert!(res.join_from(0).is_err());
    }

    #[test]
    fn parse_collected_lines() {
        let res = Response::parse(&["+OK", "a", "..b", "."], true).unwrap();
        assert_eq!(res.lines_from(2).unwrap(), &["a".to_string(), ".b".to_string()]);

        match Response::parse(&["+OK", "a"], true) {
            Err(Error(ErrorKind::TruncatedResponse, _)) => {}
            other => panic!("unexpected result: {:?}", other),
        }

        let res = Response::parse(&["-ERR gone"], true).unwrap();
        assert_eq!(res.text().len(), 1);
    }

    #[test]
    fn body_lines_drain_on_drop() {
        let mut t = transport("line 1\r\nline 2\r\nline 3\r\n.\r\n+OK after\r\n");
        {
            let mut lines = BodyLines::new(&mut t);
            assert_eq!(lines.next().unwrap().unwrap(), "line 1");
        }
        assert_eq!(t.read_line().unwrap(), "+OK after");
    }

    #[test]
    fn body_lines_truncation_ends_session() {
        let mut t = transport("line 1\r\n");
        let mut state = POP3State::Transaction;
        {
            let lines = BodyLines::new(&mut t).with_session(&mut state);
            let collected: Vec<Result<String>> = lines.collect();
            assert_eq!(collected.len(), 2);
            assert!(collected[1].is_err());
        }
        assert_eq!(state, POP3State::End);
    }
}
