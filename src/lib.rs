//! Client for the server's administrative console.
//!
//! [`console::Console`] keeps the command history and transcript and relays
//! commands to the console endpoint; [`keys`] maps key presses onto it;
//! [`nav`] and [`version`] cover the rest of the admin pages. The [`repl`]
//! module drives all of it from a terminal.

pub mod builtins;
pub mod completion;
pub mod config;
pub mod console;
pub mod error;
pub mod form;
pub mod history;
pub mod keys;
pub mod nav;
pub mod parser;
pub mod repl;
pub mod testing;
pub mod transcript;
pub mod transport;
pub mod util;
pub mod version;

pub use console::Console;
pub use error::{ConsoleError, TransportError};
