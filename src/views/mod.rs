pub mod chat;
pub mod sidebar;
pub mod welcome;

pub use chat::ChatView;
pub use sidebar::Sidebar;
pub use welcome::Welcome;
