pub mod check_in;
pub mod emotion;
pub mod reminder;
pub mod survey;
pub mod user;
