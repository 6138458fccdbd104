//! Capabilities: narrow interfaces to the platform (window query/focus, text injection).
//!
//! Adapters here only talk to external tools and translate their output into
//! WindowRecord values or ReportError. Scheduling, antiflood and retry policy
//! live in the dispatcher and the timer loop, never here.

mod availability;
mod command;
mod dry_run;
mod hyprctl;
mod r#trait;
mod wtype;

pub use self::availability::{Tool, ToolAvailability};
pub use self::r#trait::{
    create_capabilities, Capabilities, FocusTarget, TextInjector, WindowFocus, WindowQuery,
};
