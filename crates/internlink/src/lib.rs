//! Domain library for the InternLink internship marketplace: accounts,
//! postings, applications, wishlists, documents, notifications, the CSV
//! posting importer, and the standalone job board.

pub mod board;
pub mod config;
pub mod error;
pub mod imports;
pub mod marketplace;
pub mod telemetry;
