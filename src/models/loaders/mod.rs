pub mod indication_loader;

pub use indication_loader::{load_indication_catalog, parse_indication_catalog};
