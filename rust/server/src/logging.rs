//! Log setup for binaries and a capture layer for tests.
//!
//! Every runtime log line carries `session_id`; player-scoped lines add
//! `player_id`, turn-scoped lines `turn_number`. Tests install a
//! [`SessionLogCapture`] layer and query entries by those fields.

use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::field::{Field, Visit};
use tracing::Level;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, Registry};

/// One captured log event. String fields are stored without quotes.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn session_id(&self) -> Option<&str> {
        self.field("session_id")
    }
}

/// Shared buffer of captured entries; clones see the same buffer.
#[derive(Debug, Clone, Default)]
pub struct TestLogSubscriber {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Entries whose `field` equals `value` exactly.
    pub fn with_field(&self, field: &str, value: &str) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|e| e.field(field) == Some(value))
            .cloned()
            .collect()
    }

    pub fn for_session(&self, session_id: &str) -> Vec<LogEntry> {
        self.with_field("session_id", session_id)
    }

    /// Messages logged for `session_id` at `level`, oldest first.
    pub fn session_messages(&self, session_id: &str, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|e| e.level == level && e.session_id() == Some(session_id))
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn into_layer<S>(self) -> SessionLogCapture<S>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        SessionLogCapture {
            sink: self,
            _subscriber: PhantomData,
        }
    }
}

pub struct SessionLogCapture<S> {
    sink: TestLogSubscriber,
    _subscriber: PhantomData<S>,
}

impl<S> Layer<S> for SessionLogCapture<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = Fields::default();
        event.record(&mut fields);
        let metadata = event.metadata();
        self.sink.lock().push(LogEntry {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: fields.message.unwrap_or_default(),
            fields: fields.values,
        });
    }
}

#[derive(Default)]
struct Fields {
    message: Option<String>,
    values: Vec<(String, String)>,
}

impl Fields {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.values.push((field.name().to_string(), value));
        }
    }
}

impl Visit for Fields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }
}

/// Output format of [`init_logging`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// Installs the global subscriber on stderr. `RUST_LOG` overrides the default
/// filter.
pub fn init_logging(format: LogFormat) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tactica_server=debug"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => tracing::subscriber::set_global_default(
            builder.with_thread_ids(true).with_line_number(true).finish(),
        ),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    }
}

/// Process-wide capture for tests that cannot scope a subscriber with
/// `tracing::subscriber::with_default` (spawned timer tasks log on runtime
/// threads). Each call clears what earlier tests captured.
pub fn init_test_logging() -> TestLogSubscriber {
    static CAPTURE: OnceLock<TestLogSubscriber> = OnceLock::new();

    let capture = CAPTURE.get_or_init(|| {
        let capture = TestLogSubscriber::new();
        let registry = Registry::default().with(capture.clone().into_layer::<Registry>());
        if tracing::subscriber::set_global_default(registry).is_err() {
            tracing::warn!("a global subscriber is already installed; test logs are not captured");
        }
        capture
    });
    capture.clear();
    capture.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SessionError;
    use crate::events::{EventBus, GameEvent};
    use tactica_engine::errors::GameError;

    fn capture<F: FnOnce()>(f: F) -> TestLogSubscriber {
        let sink = TestLogSubscriber::new();
        let registry = Registry::default().with(sink.clone().into_layer::<Registry>());
        tracing::subscriber::with_default(registry, f);
        sink
    }

    #[test]
    fn string_fields_are_stored_unquoted() {
        let sink = capture(|| {
            tracing::info!(session_id = "4242", player_id = %"ana", turn_number = 3u32, "player moved");
        });

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "player moved");
        assert_eq!(entries[0].session_id(), Some("4242"));
        assert_eq!(entries[0].field("player_id"), Some("ana"));
        assert_eq!(entries[0].field("turn_number"), Some("3"));
        assert!(sink.with_field("player_id", "an").is_empty());
    }

    #[test]
    fn rejected_operations_log_at_info_and_faults_at_error() {
        let sink = capture(|| {
            SessionError::from(GameError::NoActionsRemaining).log("attack", "4242");
            SessionError::StoragePoisoned.log("move_player", "4242");
            SessionError::from(GameError::GameOver).log("end_turn", "9999");
        });

        assert_eq!(sink.for_session("4242").len(), 2);
        assert_eq!(sink.session_messages("4242", Level::INFO), ["operation rejected"]);
        assert_eq!(sink.session_messages("4242", Level::ERROR), ["critical failure"]);
        let rejected = sink.with_field("operation", "attack");
        assert_eq!(rejected.len(), 1);
        assert!(rejected[0].field("error_code").is_some());
    }

    #[test]
    fn broadcasts_are_logged_with_their_event_type() {
        let bus = EventBus::new();
        let sink = capture(|| {
            bus.broadcast(
                "4242",
                GameEvent::TurnStarted {
                    session_id: "4242".into(),
                    turn_number: 1,
                    player_id: "ana".into(),
                },
            );
        });

        let logged = sink.with_field("event_type", "turn.started");
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].level, Level::DEBUG);

        sink.clear();
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
