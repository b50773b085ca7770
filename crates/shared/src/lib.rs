pub mod domain;
pub mod email;
pub mod error;
pub mod protocol;
