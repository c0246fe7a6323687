pub mod proposal;
pub mod role;
