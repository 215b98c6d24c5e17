pub mod dov;
pub mod geopunt;
pub mod wms;
