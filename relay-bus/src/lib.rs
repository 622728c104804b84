#![deny(rust_2018_compatibility)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs)]
//! A type-erased, key-addressed event bus supporting multicast and unicast
//! delivery, with re-entrant dispatch: a handler may publish back into the
//! bus it is itself being called from.

mod bus;
mod handle;
mod result;
mod signature;
mod sink;

pub use bus::EventBus;
pub use handle::Handle;
pub use result::{Mode, PublishResult};
pub use signature::Signature;
