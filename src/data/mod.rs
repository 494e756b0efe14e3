//! Data persistence layer for Stride
//!
//! This module provides SQLite-based storage for goals and check-ins.

mod database;
mod migrations;
mod models;
mod store;

pub use database::{Database, DatabaseError};
pub use models::{
    CheckIn, CommitReceipt, Goal, MeasureKind, Mutation, NewCheckIn, NewGoal, RecordState,
};
pub use store::{RecordStore, StoreError, ValidationError};
