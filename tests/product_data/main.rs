//! product_data integration tests.

mod support;
mod insert;
mod retrieve;
mod lookups;
