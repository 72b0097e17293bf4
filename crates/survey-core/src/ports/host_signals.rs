//! Live host signals consulted by the eligibility gate.

/// Signals owned by the host application.
///
/// Read on the background task at evaluation time, never cached.
pub trait HostSignals: Send + Sync {
    /// Whether the user permits telemetry / crash upload.
    fn telemetry_consent(&self) -> bool;

    /// Whether the install is still in its first run.
    fn is_first_run(&self) -> bool;
}

/// Fixed signal values, for tests and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticHostSignals {
    pub consent: bool,
    pub first_run: bool,
}

impl StaticHostSignals {
    /// A consenting, established install.
    pub const fn eligible() -> Self {
        Self {
            consent: true,
            first_run: false,
        }
    }
}

impl HostSignals for StaticHostSignals {
    fn telemetry_consent(&self) -> bool {
        self.consent
    }

    fn is_first_run(&self) -> bool {
        self.first_run
    }
}
