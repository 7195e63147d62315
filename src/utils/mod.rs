pub mod db_utils;
pub mod email_registry;
pub mod spreadsheet;
pub mod time;
