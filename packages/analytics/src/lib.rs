#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory query engine for the arrest dashboard.
//!
//! Every update cycle runs the same pipeline over the loaded records:
//! [`resolve`] narrows them by the active filters, [`aggregate`] groups the
//! survivors into ranked category counts, and [`join`] attaches region
//! counts to reference geometry for the map. [`cache`] memoizes the
//! resolution step per filter combination.

pub mod aggregate;
pub mod cache;
pub mod join;
pub mod resolve;

pub use aggregate::{aggregate, aggregate_regions, crime_type_view};
pub use cache::{FilterCache, FilterKey};
pub use join::join;
pub use resolve::{FilteredRecords, resolve, resolve_cached};
