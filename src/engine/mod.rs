//! Transport-agnostic quiz session engine.
//!
//! [`SessionEngine`] is the only way to mutate a running quiz. It composes the
//! phase state machine, the per-question [`countdown`], the answer
//! [`ledger`] and the pure [`scoring`] function.

pub mod countdown;
pub mod error;
pub mod ledger;
pub mod scoring;
pub mod session;
pub mod snapshot;
pub mod standings;

pub use countdown::{Clock, ManualClock, SystemClock};
pub use error::{EngineError, ErrorKind};
pub use session::{EngineOptions, SessionEngine, TickEffect};
pub use snapshot::{PlayerView, QuestionView, RevealSummary, SessionSnapshot};
pub use standings::Standing;
