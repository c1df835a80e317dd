pub mod details;
pub mod providers;
pub mod rate_limit;
pub mod recommendations;
pub mod title_search;
pub mod upstream;
