//! E2E tests for the XLSX reader and writer: hand-built packages are read
//! back, and workbooks written by `XlsxWriter` survive a round trip.

mod common;
mod reading;
mod roundtrip;

pub use common::*;
