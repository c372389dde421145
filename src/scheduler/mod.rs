//! Slot-aligned polling schedule
//!
//! Many independent instances poll the same endpoint on a shared period.
//! Each picks a slot, an offset in whole seconds inside the period, and fires
//! only on absolute epoch seconds congruent to that slot. With `period`
//! instances on distinct slots the fleet issues one request per second in
//! aggregate, with no coordinator.
//!
//! ```text
//!  epoch s:  ...  1000  1001  1002  1003  1004  1005  1006  1007 ...
//!  slot 0:         X                       X
//!  slot 1:               X                       X
//!  slot 2:                     X                       X
//!  slot 3:                           X                       X
//! ```
//!
//! Slot collisions between instances are possible and are not detected.
//!
//! # Modules
//!
//! - [`clock`] - Wall-clock abstraction with a real and a simulated clock
//! - [`tick`] - Slot selection, first-tick alignment, and per-tick advance
//! - [`error`] - Scheduler errors

pub mod clock;
pub mod error;
pub mod tick;

pub use clock::{epoch_to_utc, Clock, ManualClock, SystemClock};
pub use error::{SchedulerError, SchedulerResult};
pub use tick::{first_fire_after, initialize_slot, SchedulerState, TickScheduler};
