//! Signals understood by the SIGNAL command

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Control action delivered with `SIGNAL <KEYWORD>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Reload configuration
    Reload,
    /// Controlled shutdown
    Shutdown,
    /// Dump stats to the log
    Dump,
    /// Switch all open logs to debug level
    Debug,
    /// Immediate shutdown
    Halt,
    /// Switch to clean circuits for new requests
    NewCircuit,
    /// Forget cached DNS results
    ClearCircuit,
    /// Emit a heartbeat log message
    Heartbeat,
    /// Stop building circuits until activity resumes
    Dormant,
    /// Leave dormant mode
    Active,
}

impl Signal {
    /// Every signal, in wire-table order
    pub const ALL: [Signal; 10] = [
        Signal::Reload,
        Signal::Shutdown,
        Signal::Dump,
        Signal::Debug,
        Signal::Halt,
        Signal::NewCircuit,
        Signal::ClearCircuit,
        Signal::Heartbeat,
        Signal::Dormant,
        Signal::Active,
    ];

    /// Protocol keyword sent after `SIGNAL`
    pub fn keyword(self) -> &'static str {
        match self {
            Signal::Reload => "RELOAD",
            Signal::Shutdown => "SHUTDOWN",
            Signal::Dump => "DUMP",
            Signal::Debug => "DEBUG",
            Signal::Halt => "HALT",
            Signal::NewCircuit => "NEWNYM",
            Signal::ClearCircuit => "CLEARDNSCACHE",
            Signal::Heartbeat => "HEARTBEAT",
            Signal::Dormant => "DORMANT",
            Signal::Active => "ACTIVE",
        }
    }

    fn variant_name(self) -> &'static str {
        match self {
            Signal::Reload => "reload",
            Signal::Shutdown => "shutdown",
            Signal::Dump => "dump",
            Signal::Debug => "debug",
            Signal::Halt => "halt",
            Signal::NewCircuit => "new-circuit",
            Signal::ClearCircuit => "clear-circuit",
            Signal::Heartbeat => "heartbeat",
            Signal::Dormant => "dormant",
            Signal::Active => "active",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Error)]
#[error("Unknown signal: {0}")]
pub struct UnknownSignal(pub String);

impl FromStr for Signal {
    type Err = UnknownSignal;

    /// Accepts the wire keyword (`NEWNYM`) or the variant name
    /// (`new-circuit`, `new_circuit`, `newcircuit`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Signal::ALL
            .into_iter()
            .find(|sig| {
                sig.keyword().eq_ignore_ascii_case(&wanted)
                    || sig.variant_name() == wanted
                    || sig.variant_name().replace('-', "") == wanted
            })
            .ok_or_else(|| UnknownSignal(s.to_string()))
    }
}
