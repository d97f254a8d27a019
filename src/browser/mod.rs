pub mod launcher;
pub mod scripts;
pub mod session;
pub mod surface;

pub use launcher::ChromeLauncher;
pub use session::BrowserSession;
pub use surface::{PageLauncher, ScrollSurface};
