use crate::errors::*;
use crate::pop3result::{MessageAttr, MessageInfo, POP3Stat};
use crate::response::Response;

fn malformed(response: &Response, line: usize) -> Error {
    let text = response
        .lines_from(line)
        .ok()
        .and_then(|lines| lines.first().cloned())
        .unwrap_or_default();
    ErrorKind::MalformedReply(text).into()
}

/// First two fields of `line`, both required.
fn two_fields(response: &Response, line: usize) -> Result<(&str, &str)> {
    let args = response.args(line)?;
    if args.len() < 2 {
        return Err(malformed(response, line));
    }
    Ok((args[0], args[1]))
}

impl POP3Stat {
    /// Parses `+OK <count> <octets>`.
    pub fn parse(response: &Response) -> Result<POP3Stat> {
        let (nmsg, size) = two_fields(response, 1)?;
        match (nmsg.parse::<u32>(), size.parse::<u64>()) {
            (Ok(num_mails), Ok(mbox_size)) => Ok(POP3Stat {
                num_mails,
                mbox_size,
            }),
            _ => Err(malformed(response, 1)),
        }
    }
}

impl MessageInfo {
    /// Parses the `<id> <octets>` pair on `line` of a LIST reply.
    pub fn parse_size(response: &Response, line: usize) -> Result<MessageInfo> {
        let (id, size) = two_fields(response, line)?;
        match (id.parse::<u32>(), size.parse::<u64>()) {
            (Ok(id), Ok(size)) => Ok(MessageInfo {
                id,
                attr: MessageAttr::Size(size),
            }),
            _ => Err(malformed(response, line)),
        }
    }

    /// Parses the `<id> <unique-id>` pair on `line` of a UIDL reply.
    ///
    /// The unique id is opaque: any whitespace-free token is kept verbatim.
    pub fn parse_uidl(response: &Response, line: usize) -> Result<MessageInfo> {
        let (id, uidl) = two_fields(response, line)?;
        match id.parse::<u32>() {
            Ok(id) => Ok(MessageInfo {
                id,
                attr: MessageAttr::Uidl(uidl.to_string()),
            }),
            _ => Err(malformed(response, line)),
        }
    }

    /// Parses every body line (line 2 onwards) of a LIST reply.
    pub fn parse_size_listing(response: &Response) -> Result<Vec<MessageInfo>> {
        let count = response.lines_from(2)?.len();
        (2..count + 2)
            .map(|line| MessageInfo::parse_size(response, line))
            .collect()
    }

    /// Parses every body line (line 2 onwards) of a UIDL reply.
    pub fn parse_uidl_listing(response: &Response) -> Result<Vec<MessageInfo>> {
        let count = response.lines_from(2)?.len();
        (2..count + 2)
            .map(|line| MessageInfo::parse_uidl(response, line))
            .collect()
    }
}
