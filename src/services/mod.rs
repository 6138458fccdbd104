pub mod antiflood;
pub mod capabilities;
pub mod dispatcher;
pub mod launcher;
pub mod message_store;
pub mod scheduler;
pub mod session;
pub mod timer_loop;

pub use antiflood::AntifloodGuard;
pub use dispatcher::Dispatcher;
pub use launcher::DispatchLauncher;
pub use message_store::MessageStore;
pub use session::{Session, SessionHandle};
pub use timer_loop::TimerLoop;
