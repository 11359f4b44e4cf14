pub mod location;
pub mod ride;
pub mod rider;
pub mod session;
pub mod status;
pub mod vehicle;

pub use location::*;
pub use ride::*;
pub use rider::*;
pub use session::*;
pub use status::*;
pub use vehicle::*;
