pub mod gate;

pub use gate::{AccessGate, AuthOutcome, ConfirmPolicy, HostCapability, KeyPortal, KeyStore};
