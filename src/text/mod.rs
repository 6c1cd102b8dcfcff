pub mod fit;
pub mod fonts;
pub mod wrap;
