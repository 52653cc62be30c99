pub mod config_cmd;
pub mod lookup;
pub mod run;
