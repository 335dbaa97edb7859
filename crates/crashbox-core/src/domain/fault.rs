//! Unhandled fault description
//!
//! A [`Fault`] is the textual form of whatever brought a thread down: a
//! panic caught by the process panic hook, or a fatal error the host hands
//! over explicitly. When it originates from a panic hook it also keeps a
//! borrow of the original [`PanicHookInfo`] so the previously installed hook
//! can be called with exactly the argument it would have received.

use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::panic::PanicHookInfo;

/// Identity of the thread a fault happened on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    /// Thread name, `None` for unnamed threads
    pub name: Option<String>,
    /// Debug form of the runtime thread id, e.g. `ThreadId(3)`
    pub id: String,
}

impl ThreadInfo {
    /// Describe the calling thread.
    pub fn current() -> Self {
        let thread = std::thread::current();
        Self {
            name: thread.name().map(String::from),
            id: format!("{:?}", thread.id()),
        }
    }

    pub fn new(name: Option<&str>, id: impl Into<String>) -> Self {
        Self {
            name: name.map(String::from),
            id: id.into(),
        }
    }
}

impl Display for ThreadInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(ref name) => write!(f, "'{}' ({})", name, self.id),
            None => write!(f, "<unnamed> ({})", self.id),
        }
    }
}

/// One unhandled fault
#[derive(Debug)]
pub struct Fault<'a> {
    kind: String,
    message: String,
    location: Option<String>,
    causes: Vec<String>,
    backtrace: String,
    panic: Option<&'a PanicHookInfo<'a>>,
}

impl<'a> Fault<'a> {
    /// Create a fault from a type name and message.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            location: None,
            causes: Vec::new(),
            backtrace: String::new(),
            panic: None,
        }
    }

    /// Build a fault from panic hook information.
    ///
    /// Captures a backtrace of the panicking thread unconditionally.
    pub fn from_panic(info: &'a PanicHookInfo<'a>) -> Self {
        let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };

        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));

        Self {
            kind: "panic".to_string(),
            message,
            location,
            causes: Vec::new(),
            backtrace: Backtrace::force_capture().to_string(),
            panic: Some(info),
        }
    }

    /// Build a fault from an error value, walking its `source()` chain.
    pub fn from_error<E: Error + 'static>(err: &E) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        Self {
            kind: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            location: None,
            causes,
            backtrace: Backtrace::capture().to_string(),
            panic: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    pub fn with_backtrace(mut self, backtrace: impl Into<String>) -> Self {
        self.backtrace = backtrace.into();
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    /// The panic hook argument this fault was built from, if any.
    pub fn panic_info(&self) -> Option<&'a PanicHookInfo<'a>> {
        self.panic
    }

    /// Full textual form: headline, location, cause chain, backtrace.
    ///
    /// Always ends with a newline.
    pub fn trace_text(&self, thread: &ThreadInfo) -> String {
        let mut out = format!("{} in thread {}: {}\n", self.kind, thread, self.message);

        if let Some(ref location) = self.location {
            out.push_str(&format!("    at {location}\n"));
        }

        for cause in &self.causes {
            out.push_str(&format!("Caused by: {cause}\n"));
        }

        let backtrace = self.backtrace.trim_end();
        if !backtrace.is_empty() && backtrace != "disabled backtrace" {
            out.push_str("stack backtrace:\n");
            out.push_str(backtrace);
            out.push('\n');
        }

        out
    }
}
