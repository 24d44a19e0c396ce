pub mod alerts;
pub mod audit;
pub mod campaigns;
pub mod stats;
pub mod workflows;
