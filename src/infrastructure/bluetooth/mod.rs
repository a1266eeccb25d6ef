//! Bluetooth Module
//!
//! Serves the motor GATT application over BlueZ.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                   PeripheralService                      │
//! │   (adapter setup, registration, shutdown sequence)       │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼─────────────┐
//!         │             │             │
//!         ▼             ▼             ▼
//! ┌─────────────┐  ┌──────────┐  ┌──────────────┐
//! │Advertisement│  │   GATT   │  │ domain::     │
//! │             │  │          │  │ protocol     │
//! │ - Local name│  │ - Reads  │  │ - UUIDs      │
//! │ - Mfr data  │  │ - Writes │  │              │
//! │ - TX power  │  │ - Notify │  │              │
//! └─────────────┘  └──────────┘  └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`advertisement`] - LE advertisement contents
//! - [`gatt`] - GATT application built from the motor attribute table
//! - [`service`] - Main service coordinator

pub mod advertisement;
pub mod gatt;
pub mod service;

// Re-export main service for convenience
pub use service::PeripheralService;
