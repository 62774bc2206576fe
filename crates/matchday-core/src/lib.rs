// Fantasy football league core: scoring, lineup rules, teams and standings.

pub mod config;
pub mod import;
pub mod lineup;
pub mod player;
pub mod scoring;
pub mod standings;
pub mod team;
