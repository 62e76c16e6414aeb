pub mod db;
pub mod hosted_source;
pub mod local_source;
pub mod source;
