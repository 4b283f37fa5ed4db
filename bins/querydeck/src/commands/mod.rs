//! CLI command implementations

pub mod activity;
pub mod add;
pub mod ask;
pub mod dashboard;
pub mod edit;
pub mod health;
pub mod init;
pub mod link;
pub mod list;
pub mod mapping;
pub mod remove;
pub mod run;
pub mod search;
pub mod show;
pub mod use_query;
