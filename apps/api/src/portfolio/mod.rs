//! Grades, achievement records, accounts, and evidence files.

pub mod evidence;
pub mod grades;
pub mod handlers;
pub mod records;
pub mod upload;
pub mod users;
