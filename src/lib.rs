#![forbid(unsafe_code)]

pub mod auth;
pub mod config;
pub mod datamodel;
pub mod exporters;
pub mod grouping;
pub mod http;
pub mod importers;
pub mod storage;
