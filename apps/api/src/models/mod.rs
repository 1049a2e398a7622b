pub mod activity;
pub mod grade;
pub mod user;
