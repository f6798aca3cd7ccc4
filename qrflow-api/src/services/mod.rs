//! Service Layer
//!
//! The resolution pipeline and its stages. Handlers only translate HTTP to
//! and from these types.

mod accounting;
mod lookup_chain;
mod pipeline;
mod preview;
mod redirect;

pub use accounting::*;
pub use lookup_chain::*;
pub use pipeline::*;
pub use preview::*;
pub use redirect::*;
