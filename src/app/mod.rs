pub mod event;
pub mod mode;
pub mod navigation;
pub mod state;

pub use mode::Mode;
pub use navigation::NavigationController;
pub use state::AppState;
