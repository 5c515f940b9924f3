//! docverify - document extraction and cross-verification.
//!
//! Extracts structured records from salary slips, bank statements, tax
//! returns and identity documents, then reconciles them against each other.

pub mod config;
pub mod models;
pub mod ocr;
pub mod parsers;
pub mod services;
