pub mod climatology;
pub mod counts;
pub mod functions;
pub mod heat_index;
pub mod wbgt;
