pub mod airports;
pub mod change;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod memory;

pub use airports::resolve_airport_code;
pub use change::ChangeDetector;
pub use config::TripmateConfig;
pub use error::{Result, TripmateError};
pub use fingerprint::{fingerprint, Fingerprint, ParamValue, SearchParams};
pub use memory::{MemoryPatch, TravelMemory};
