pub mod parsing;
pub mod query;
pub mod raw;
pub mod schema;
pub mod timeline;
pub mod trends;
pub mod user;

#[cfg(test)]
mod parsing_test;
