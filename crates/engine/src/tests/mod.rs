mod helpers;

mod concurrency_tests;
mod handle_tests;
