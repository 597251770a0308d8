//! Per-test capture context and operating mode.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use http::Extensions;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::InterceptError;
use crate::ports::ContextResolver;
use crate::record::{Dependency, DependencyRecord};

/// How intercepted calls are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Calls pass straight through to the real transport.
    #[default]
    Off,
    /// Calls hit the real transport and their outcome is captured.
    Record,
    /// Calls are answered from previously captured outcomes.
    Test,
}

impl Mode {
    /// Lowercase name of the mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Record => "record",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = InterceptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "off" => Ok(Self::Off),
            "record" => Ok(Self::Record),
            "test" => Ok(Self::Test),
            _ => Err(InterceptError::InvalidMode(s.to_string())),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    mode: Mode,
    file_export: bool,
    mocks: Vec<DependencyRecord>,
    deps: Vec<Dependency>,
    replay_cursor: usize,
}

#[derive(Debug)]
struct Inner {
    test_id: String,
    state: Mutex<State>,
}

/// State shared by every call made during one test execution.
///
/// Cloning is cheap and yields a handle to the same state. Record lists are
/// append-only; appends and mode reads go through one internal lock.
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Creates a context for the given mode and test identifier.
    pub fn new(mode: Mode, test_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                test_id: test_id.into(),
                state: Mutex::new(State {
                    mode,
                    ..State::default()
                }),
            }),
        }
    }

    /// An `Off` context with no test identifier.
    #[must_use]
    pub fn off() -> Self {
        Self::new(Mode::Off, "")
    }

    /// Sets whether records are streamed to an external sink.
    #[must_use]
    pub fn with_file_export(self, file_export: bool) -> Self {
        self.inner.state.lock().file_export = file_export;
        self
    }

    /// Seeds the byte-level dependencies replayed in test mode.
    #[must_use]
    pub fn with_dependencies(self, deps: Vec<Dependency>) -> Self {
        {
            let mut state = self.inner.state.lock();
            state.deps = deps;
            state.replay_cursor = 0;
        }
        self
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.inner.state.lock().mode
    }

    /// Switches the mode for subsequent calls.
    pub fn set_mode(&self, mode: Mode) {
        self.inner.state.lock().mode = mode;
    }

    /// Test identifier.
    #[must_use]
    pub fn test_id(&self) -> &str {
        &self.inner.test_id
    }

    /// Whether records go to an external sink instead of memory.
    #[must_use]
    pub fn file_export(&self) -> bool {
        self.inner.state.lock().file_export
    }

    /// Appends one call's record and its byte-level form.
    pub fn push(&self, record: DependencyRecord, dependency: Dependency) {
        let mut state = self.inner.state.lock();
        state.mocks.push(record);
        state.deps.push(dependency);
    }

    /// Snapshot of the records accumulated so far.
    #[must_use]
    pub fn mocks(&self) -> Vec<DependencyRecord> {
        self.inner.state.lock().mocks.clone()
    }

    /// Snapshot of the byte-level dependencies accumulated or seeded so far.
    #[must_use]
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.inner.state.lock().deps.clone()
    }

    /// Next byte-level dependency to replay, advancing the replay cursor.
    #[must_use]
    pub fn next_dependency(&self) -> Option<Dependency> {
        let mut state = self.inner.state.lock();
        let dep = state.deps.get(state.replay_cursor).cloned()?;
        state.replay_cursor += 1;
        Some(dep)
    }

    /// Attaches this context to a call's extensions.
    pub fn attach(&self, extensions: &mut Extensions) {
        extensions.insert(self.clone());
    }

    /// The context attached to a call's extensions, if any.
    #[must_use]
    pub fn from_extensions(extensions: &Extensions) -> Option<Self> {
        extensions.get::<Self>().cloned()
    }

    /// Whether two handles point at the same context.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::off()
    }
}

/// Resolves the context from the request's extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestScope;

impl ContextResolver for RequestScope {
    fn resolve(&self, extensions: &Extensions) -> Option<Context> {
        Context::from_extensions(extensions)
    }
}
