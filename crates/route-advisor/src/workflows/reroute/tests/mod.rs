mod approval;
mod cache;
mod common;
