pub mod endpoints;
pub mod mocks;
pub mod users;
