pub mod origin_check;
pub mod session_gate;
