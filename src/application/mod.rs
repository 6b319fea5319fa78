pub mod app_error;
pub mod cursor;
pub mod use_cases;
pub mod validators;
