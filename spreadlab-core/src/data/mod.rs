//! Price data: providers, resampling, and pair alignment.

pub mod align;
pub mod csv_store;
pub mod provider;
pub mod resample;
pub mod symbols;
pub mod synthetic;

pub use align::{align_pair, AlignError, AlignMode, AlignedPair};
pub use csv_store::CsvStore;
pub use provider::{DataError, DataSource, InMemoryProvider, PriceProvider, RawBar};
pub use resample::resample;
pub use symbols::{SymbolMap, SymbolSource};
pub use synthetic::SyntheticProvider;
