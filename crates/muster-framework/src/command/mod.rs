//! Text command parsing.
//!
//! A text command is resolved by its key (see
//! [`TriggerRegistry::resolve_command`](crate::TriggerRegistry::resolve_command)).
//! The text after the key is then split into tokens and bound to the
//! handler's declared parameters:
//!
//! ```text
//! "!giveaway start 30 A shiny mount"
//!  └── key ──────┘ └── remainder ──┘
//!   tokens: ["30", "A", "shiny", "mount"]
//!   params: minutes, prize@1  →  minutes = 30, prize = "A shiny mount"
//! ```

pub mod bind;
pub mod split;

pub use bind::bind_tokens;
pub use split::tokenize;
