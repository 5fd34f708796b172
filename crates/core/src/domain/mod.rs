pub mod add_on;
pub mod order;
pub mod product;
pub mod quiz;
