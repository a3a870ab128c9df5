mod maths_utils;

pub use maths_utils::mean_and_stddev;
