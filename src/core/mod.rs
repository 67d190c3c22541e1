// Core modules implementing dynamic loading, invocation, and error modeling.
pub mod error;
pub mod invoke;
pub mod loader;
pub mod native;
pub mod request;
