//! Structured view of retrieved message text, built with `mailparse`.

use mailparse::{parse_mail, ParsedMail};

use crate::errors::*;

/// A leaf MIME part with its decoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    /// MIME type, e.g. `text/plain`.
    pub content_type: String,
    pub body: String,
}

/// A parsed message: its top-level headers and its leaf body parts in
/// document order. A non-multipart message has a single part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    headers: Vec<(String, String)>,
    parts: Vec<BodyPart>,
}

impl Message {
    /// Parses raw message text as returned by RETR or TOP.
    pub fn parse(raw: &str) -> Result<Message> {
        let mail = parse_mail(raw.as_bytes())?;
        let headers = mail
            .headers
            .iter()
            .map(|h| (h.get_key(), h.get_value()))
            .collect();
        let mut parts = Vec::new();
        collect_parts(&mail, &mut parts)?;
        Ok(Message { headers, parts })
    }

    /// Header fields in the order they appear.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|&&(ref key, _)| key.eq_ignore_ascii_case(name))
            .map(|&(_, ref value)| value.as_str())
    }

    pub fn subject(&self) -> Option<&str> {
        self.header("Subject")
    }

    pub fn parts(&self) -> &[BodyPart] {
        &self.parts
    }
}

fn collect_parts(mail: &ParsedMail, parts: &mut Vec<BodyPart>) -> Result<()> {
    if mail.subparts.is_empty() {
        parts.push(BodyPart {
            content_type: mail.ctype.mimetype.clone(),
            body: mail.get_body()?,
        });
        return Ok(());
    }
    for sub in &mail.subparts {
        collect_parts(sub, parts)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message() {
        let raw = "From: unknown@example.com\r\n\
                   To: recipient@example.com\r\n\
                   Subject: POP3 test mail(0)\r\n\
                   Content-Type: text/plain; charset=\"UTF-8\"\r\n\
                   \r\n\
                   POP3 test message\r\n\
                   second line of the message";
        let msg = Message::parse(raw).unwrap();
        assert_eq!(msg.subject(), Some("POP3 test mail(0)"));
        assert_eq!(msg.header("to"), Some("recipient@example.com"));
        assert_eq!(msg.headers().len(), 4);
        assert_eq!(msg.parts().len(), 1);
        assert_eq!(msg.parts()[0].content_type, "text/plain");
        assert_eq!(msg.parts()[0].body, "POP3 test message\r\nsecond line of the message");
    }

    #[test]
    fn multipart_message() {
        let raw = "Subject: parts\r\n\
                   MIME-Version: 1.0\r\n\
                   Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
                   \r\n\
                   --b1\r\n\
                   Content-Type: text/plain\r\n\
                   \r\n\
                   plain body\r\n\
                   --b1\r\n\
                   Content-Type: text/html\r\n\
                   \r\n\
                   <p>html body</p>\r\n\
                   --b1--\r\n";
        let msg = Message::parse(raw).unwrap();
        let types: Vec<&str> = msg.parts().iter().map(|p| p.content_type.as_str()).collect();
        assert_eq!(types, vec!["text/plain", "text/html"]);
        assert!(msg.parts()[0].body.starts_with("plain body"));
    }

    #[test]
    fn headers_only() {
        let msg = Message::parse("Subject: top 0\r\n\r\n").unwrap();
        assert_eq!(msg.subject(), Some("top 0"));
        assert_eq!(msg.parts()[0].body, "");
    }
}
