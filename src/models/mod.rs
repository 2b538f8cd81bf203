pub mod request;
pub mod roll;

pub use request::{GenerateRequest, GenerateResponse, ValidatedRequest};
pub use roll::{compose, split_roll, RollRange, ROLL_DIGITS};
