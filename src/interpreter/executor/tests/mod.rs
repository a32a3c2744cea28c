//! Tests for the executor
//!
//! Organized by statement kind and feature area

mod helpers;

mod assign_tests;
