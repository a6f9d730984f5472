pub mod db_utils;
pub mod query_filter;
pub mod tabular;
pub mod username_index;
