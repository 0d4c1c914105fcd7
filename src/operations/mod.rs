pub mod creation;
pub mod grow;
pub mod loops;
pub mod transform;
