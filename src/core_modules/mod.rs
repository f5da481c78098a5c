pub mod block;
pub mod candidate;
pub mod change_detector;
pub mod frame;
pub mod pixel;
pub mod rectangle;
pub mod seed_growth;
pub mod seeds;
