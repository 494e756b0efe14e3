//! Integration tests for Stride
//!
//! These tests verify that multiple components work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod pipeline_flow;
pub mod publish_flow;
