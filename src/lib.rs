pub mod blur;
pub mod mask;
pub mod math;
pub mod params;
pub mod processor;
pub mod reconstruct;
pub mod runtime;
pub mod solver;
pub mod spline;
pub mod tonemap;

pub use math::WorkProfile;
pub use params::{migrate, ColorScience, CurveType, FilmicParams, FilmicParamsV1, PreserveColor};
pub use processor::{process, process_image, FilmicError, PipelinePiece, Roi};
pub use runtime::{commit, FilmicRuntime};
pub use spline::{compute_spline, FilmicSpline};
