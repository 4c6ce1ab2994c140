pub mod endpoint;
pub mod mock;
pub mod user;

pub use endpoint::{Endpoint, EndpointInput, EndpointRoute, OwnedEndpoint};
pub use mock::{Mock, MockWithCount};
pub use user::User;
