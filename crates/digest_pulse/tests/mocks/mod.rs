#![allow(dead_code)]

pub mod datastore;
pub mod summarizer;
pub mod transcript_fetcher;
pub mod video_source;
