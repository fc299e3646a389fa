pub mod merge;
pub mod prefetch;
pub mod single_flight;
pub mod synchronizer;

pub use merge::{InboxEntry, Origin, merge};
pub use prefetch::{BodyCache, prefetch_bodies};
pub use single_flight::SingleFlight;
pub use synchronizer::{DualWrite, InboxView, OpenedMessage, SyncOptions, SyncScope, Synchronizer};
