pub mod pick;
pub mod validate;
