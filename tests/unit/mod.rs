//! Aggregated integration test suite.

mod book_invariant_tests;
mod market_data_tests;
mod persistence_tests;
mod routing_tests;
mod support;
