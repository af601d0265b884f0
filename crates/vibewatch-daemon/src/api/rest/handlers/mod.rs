//! API request handlers

mod events;
mod health;
mod realtime;
mod simulate;
mod ws;

pub use events::*;
pub use health::*;
pub use realtime::*;
pub use simulate::*;
pub use ws::*;
