pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nMR90 gauge import, monthly HDF5 store, heavy rainfall and erosivity analysis"
);
