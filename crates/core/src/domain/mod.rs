pub mod contract;
pub mod hotel;
pub mod pricing;
pub mod recommendation;
