//! Book isolation and venue health tracking.
//!
//! `BookRegistry` is the generalized form of the teacher's
//! `EngineId`/`EngineIsolation`/`EngineStore<T>` (MAIN vs EXP engine
//! scoping) applied to this domain's `Book` type (HEDGE/PROP/MEME), with
//! the one invariant that actually matters here enforced at the API
//! boundary: a MEME book's exposure and drawdown can never leak into an
//! aggregate computed for any other book.

mod registry;
mod venue;

pub use registry::BookRegistry;
pub use venue::VenueRegistry;
