/// Missing value used in every table
pub const NODATAVAL: f32 = f32::NAN;

/// Earth radius used by the RADOLAN stereographic projection [km]
pub const EARTH_RADIUS_KM: f64 = 6370.04;
/// Latitude where the projection plane intersects the sphere [°N]
pub const RADOLAN_PHI0: f64 = 60.0;
/// Meridian the cartesian grid is aligned to [°E]
pub const RADOLAN_LAMBDA0: f64 = 10.0;

/// Default deflate level of the HDF5 store
pub const DEFAULT_COMPLEVEL: u8 = 9;
