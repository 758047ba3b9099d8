pub mod finance;
pub mod resource;
pub mod routes;
pub mod session;
pub mod validation;

pub use validation::ValidationErrors;
