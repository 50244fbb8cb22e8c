pub mod audit;
pub mod backup;
pub mod catalog;
pub mod config;
pub mod hasher;
pub mod ingest;
pub mod metadata;
pub mod paths;
pub mod placer;
pub mod query;
pub mod stats;
pub mod titler;
pub mod util;
pub mod viewer;
pub mod warn;
pub mod watcher;
