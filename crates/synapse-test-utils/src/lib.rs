//! Test helpers shared across Synapse crates.

pub mod backends;
pub mod notify;
pub mod sources;

pub use backends::{AuthFailingBackend, FailingBackend, FixedBackend, RecordingBackend};
pub use notify::RecordingNotifier;
pub use sources::{
    StubGeneSource, StubLedgerSource, StubProfileSource, StubTelemetrySource, stub_sources,
};
