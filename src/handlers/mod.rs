pub mod check_ins;
pub mod emotions;
pub mod health;
pub mod reminders;
pub mod surveys;
pub mod ws;
