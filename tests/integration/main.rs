//! Integration tests driven by wiremock servers

mod crawl_tests;
mod job_tests;
