//! Integration tests for crashbox-http
//!
//! Uses wiremock to stand in for the collector and verifies the request
//! shape of `CollectorClient` and a full drain cycle over HTTP.

mod common;

mod test_drain;
mod test_submit;
