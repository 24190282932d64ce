pub mod records;
pub mod reminders;

pub use records::RecordBuilder;
pub use reminders::ReminderScheduler;
