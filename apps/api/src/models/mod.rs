pub mod consultation;
pub mod user;
