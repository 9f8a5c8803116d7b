//! The Iteration worker loop and the Migrator that owns its connection
//! pools, tracking store, and shared shutdown flag.

mod iteration;
mod migrator;
mod state;

pub use iteration::{run_iteration, ErrorCallback, IterationConfig};
pub use migrator::{MigrationSpec, Migrator};
pub use state::{IterationState, IterationStateHandle};
