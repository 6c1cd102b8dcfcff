pub mod compositor;
pub mod layout;
pub mod raster;
pub mod template;
