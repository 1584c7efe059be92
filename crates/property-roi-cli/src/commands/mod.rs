pub mod loan;
pub mod projection;
pub mod rental;
pub mod scoring;
pub mod time_value;
