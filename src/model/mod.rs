pub mod dispatch;
pub mod window;

pub use dispatch::{DispatchOptions, DispatchOutcome, DispatchRequest, DispatchSource, SkipReason};
pub use window::{TargetMatcher, WindowRecord};
