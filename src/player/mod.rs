pub mod cache;
pub mod controller;
pub mod feedback;
pub mod load_more;
pub mod registry;
pub mod session;

pub use cache::{InMemorySessionCache, RedisSessionCache, SessionCache};
pub use controller::PlayerController;
pub use feedback::ProfileFeedbackTrigger;
pub use load_more::{LoadMoreController, LoadMoreOutcome};
pub use session::{PlayerSession, SessionKey};
