use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(3);
const MIN_DIAL_TIMEOUT: Duration = Duration::from_secs(1);

/// Connection settings, passed to [`Client::connect`](crate::Client::connect).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Options {
    /// Raised to one second when shorter.
    pub dial_timeout: Duration,
    pub tls_enabled: bool,
    /// Insecure: accepts any certificate for any host name.
    pub tls_skip_verify: bool,
    /// Expiry is reported as a closed connection.
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            tls_enabled: true,
            tls_skip_verify: false,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl Options {
    pub fn with_dial_timeout(mut self, timeout: Duration) -> Options {
        self.dial_timeout = timeout;
        self
    }

    pub fn with_tls(mut self, enabled: bool) -> Options {
        self.tls_enabled = enabled;
        self
    }

    pub fn with_tls_skip_verify(mut self, skip: bool) -> Options {
        self.tls_skip_verify = skip;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Options {
        self.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Options {
        self.write_timeout = timeout;
        self
    }

    pub(crate) fn effective_dial_timeout(&self) -> Duration {
        if self.dial_timeout < MIN_DIAL_TIMEOUT {
            MIN_DIAL_TIMEOUT
        } else {
            self.dial_timeout
        }
    }
}
