//! Scalar interpolation helpers shared by curve sampling and the blend stages.

pub mod functions;
