//! Driver command logging.
//!
//! Replaces a process-wide driver debug switch with a logger that is handed to
//! the pool builder and installed on the client options of the session it dials.
//! Derived sessions share the client, so they inherit the same handler.

use mongodb::event::command::CommandEvent;
use mongodb::event::EventHandler;
use mongodb::options::ClientOptions;

use crate::config::DRIVER_LOG_TARGET;

/// Re-emits driver command events through tracing at debug level
#[derive(Debug, Clone, Copy)]
pub struct DriverLogger {
    enabled: bool,
}

impl DriverLogger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Attach the command event handler to `options` if logging is enabled
    pub fn install(&self, options: &mut ClientOptions) {
        if self.enabled {
            options.command_event_handler = Some(EventHandler::callback(log_command_event));
        }
    }
}

fn log_command_event(event: CommandEvent) {
    if let Some(record) = CommandRecord::from_event(&event) {
        record.emit();
    }
}

/// Fields logged for one command event
#[derive(Debug, Clone, PartialEq)]
enum CommandRecord {
    Started {
        request_id: i32,
        command: String,
        database: String,
        address: String,
    },
    Succeeded {
        request_id: i32,
        command: String,
        duration_ms: u64,
    },
    Failed {
        request_id: i32,
        command: String,
        duration_ms: u64,
        error: String,
    },
}

impl CommandRecord {
    fn from_event(event: &CommandEvent) -> Option<Self> {
        match event {
            CommandEvent::Started(ev) => Some(Self::Started {
                request_id: ev.request_id,
                command: ev.command_name.clone(),
                database: ev.db.clone(),
                address: ev.connection.address.to_string(),
            }),
            CommandEvent::Succeeded(ev) => Some(Self::Succeeded {
                request_id: ev.request_id,
                command: ev.command_name.clone(),
                duration_ms: ev.duration.as_millis() as u64,
            }),
            CommandEvent::Failed(ev) => Some(Self::Failed {
                request_id: ev.request_id,
                command: ev.command_name.clone(),
                duration_ms: ev.duration.as_millis() as u64,
                error: ev.failure.to_string(),
            }),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    fn emit(&self) {
        match self {
            Self::Started {
                request_id,
                command,
                database,
                address,
            } => tracing::debug!(
                target: DRIVER_LOG_TARGET,
                request_id,
                %command,
                %database,
                %address,
                "Command started"
            ),
            Self::Succeeded {
                request_id,
                command,
                duration_ms,
            } => tracing::debug!(
                target: DRIVER_LOG_TARGET,
                request_id,
                %command,
                duration_ms,
                "Command succeeded"
            ),
            Self::Failed {
                request_id,
                command,
                duration_ms,
                error,
            } => tracing::debug!(
                target: DRIVER_LOG_TARGET,
                request_id,
                %command,
                duration_ms,
                %error,
                "Command failed"
            ),
        }
    }
}
