//! Record type delivered to subscribers

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// One unit of output: a raw input line or its normalized JSON form.
///
/// Cloning is a reference-count bump, so fan-out to many subscribers shares
/// a single allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record(Arc<str>);

impl Record {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Record {
    fn from(text: String) -> Self {
        Self(Arc::from(text))
    }
}

impl From<&str> for Record {
    fn from(text: &str) -> Self {
        Self(Arc::from(text))
    }
}

impl Deref for Record {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Record {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
