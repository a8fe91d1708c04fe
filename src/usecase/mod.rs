pub mod age;
pub mod classify;
pub mod filter;
pub mod notification;
