pub mod backend;
pub mod sessions;
pub mod tracker;

pub use backend::{build_queue_service, build_store};
pub use sessions::{Session, SessionManager};
pub use tracker::TrackerLinks;
