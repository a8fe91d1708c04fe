pub mod pull_request;
pub mod review;
