pub mod company;
pub mod employee;
pub mod identity;
pub mod time_record;
