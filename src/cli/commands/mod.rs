pub mod config;
pub mod db;
pub mod projects;
pub mod tasks;
pub mod token;
pub mod workspaces;
