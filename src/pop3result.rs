/// Per-message detail carried by a listing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageAttr {
    Size(u64),
    Uidl(String),
}

/// One entry of a LIST or UIDL reply; `id` is only valid for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageInfo {
    pub id: u32,
    pub attr: MessageAttr,
}

impl MessageInfo {
    pub fn size(&self) -> Option<u64> {
        match self.attr {
            MessageAttr::Size(size) => Some(size),
            MessageAttr::Uidl(_) => None,
        }
    }

    pub fn uidl(&self) -> Option<&str> {
        match self.attr {
            MessageAttr::Uidl(ref uidl) => Some(uidl.as_str()),
            MessageAttr::Size(_) => None,
        }
    }
}

/// Reply to STAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct POP3Stat {
    pub num_mails: u32,
    pub mbox_size: u64,
}
