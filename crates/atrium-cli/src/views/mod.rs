pub mod table;
pub mod warnings;
