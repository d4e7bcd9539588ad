pub mod cancel;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod poller;
pub mod reconciler;
pub mod resources;
pub mod state;
pub mod transport;

pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use config::{Auth, ClientConfig};
pub use engine::{Engine, Readiness, Request, Resource};
pub use error::{Error, Result, TransportError};
pub use outcome::{Applied, Diagnostic, Outcome, Phase, Severity};
pub use poller::{PollConfig, PollOutcome, Poller, StatusSource, TerminalStates};
pub use state::{StateEntry, StateFile};
pub use transport::{HttpTransport, Method, Transport};
