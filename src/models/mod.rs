pub mod request;
pub mod token;
