pub mod svg;

pub use svg::render_fit;
