//! # ehub-core: Energy Hub Input Model
//!
//! Data structures consumed by the energy hub model-construction engine.
//!
//! ## Design Philosophy
//!
//! A case is a declarative bundle ([`HubData`]) of:
//! - **Topology**: nodes, energy carriers, the ordered time horizon and the
//!   technologies installed or candidate at each node
//! - **Node data**: per-carrier demand series and climate series
//! - **Technology data**: an archetype-tagged performance block
//!   ([`Performance`]), economics and size bounds
//! - **Networks**: per carrier, named directed connection matrices with a
//!   capacity and a loss fraction
//!
//! Everything here is plain, serialisable data. Validation never stops at
//! the first finding; it collects [`Diagnostics`] so a single run reports
//! every problem in the bundle.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ehub_core::HubData;
//!
//! let data = HubData::load("case.json").unwrap();
//! let diag = data.validate();
//! if diag.has_errors() {
//!     eprintln!("{diag}");
//! }
//! ```

pub mod diagnostics;
pub mod error;
pub mod network;
pub mod technology;
pub mod topology;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{HubError, HubResult};
pub use network::{ConnectionMatrix, NetworkData, NetworkStats};
pub use technology::{
    Archetype, Breakpoint, CapexModel, ConversionPerformance, Economics, Performance,
    RenewablePerformance, SizeBound, StorageCycle, StoragePerformance, TechnologyData,
};
pub use topology::{HubData, NodeData, Topology};
pub use units::{Euros, Megawatts};
