pub mod blueprint;
pub mod context;
pub mod hv_info;
pub mod scan_row;
pub mod term_point;
