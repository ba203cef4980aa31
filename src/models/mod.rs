pub mod question;
pub mod submission;
