//! Test Helper Utilities
//!
//! Shared utilities for testing hsa-assist

#![allow(dead_code, unused_imports)]

pub mod db_utils;
pub mod stub_service;

pub use db_utils::{create_test_db, fast_client, fast_client_config, unused_local_url};
pub use stub_service::{
    approval_response, receipt_a_response, receipt_b_response, start_stalled_body_server,
    StubMode, StubService,
};
