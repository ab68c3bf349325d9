mod notification;
mod profile;
mod progress;

pub use notification::*;
pub use profile::*;
pub use progress::*;
