pub mod db;
pub mod delivery;
pub mod email;
pub mod push;
