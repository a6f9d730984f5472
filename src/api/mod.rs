pub mod eod_report;
pub mod leave_request;
pub mod time_log;
pub mod user;
