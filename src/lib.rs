pub mod eof;
pub mod error;
pub mod grid;
pub mod north;
pub mod preprocess;
pub mod reconstruct;
pub mod svd;

pub use eof::{perform_eof_analysis, Eof, EofBuilder, EofResult};
pub use error::EofError;
pub use grid::Grid;
pub use north::NorthCriterion;
pub use preprocess::AnalysisMode;
pub use svd::{Decomposition, NalgebraSVD, SVDImplementation};
