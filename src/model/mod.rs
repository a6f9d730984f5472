pub mod eod_report;
pub mod leave_request;
pub mod role;
pub mod time_log;
pub mod user;
