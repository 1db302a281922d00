pub mod fetch;
pub mod transport;
