pub mod deletion;
pub mod file_record;
pub mod sheet;
