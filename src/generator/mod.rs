pub mod database;
pub mod expression;
pub mod insert;
pub mod mutator;
pub mod table;

pub use database::{add_rows_to_all_tables, populate};
pub use expression::ExpressionGenerator;
