pub mod ask;
pub mod consult;
pub mod search;
pub mod serve;
