pub mod complexity;
pub mod divergence;
pub mod error;
pub mod gap;
pub mod matrix;
pub mod nt;
pub mod record;
pub mod rescore;
