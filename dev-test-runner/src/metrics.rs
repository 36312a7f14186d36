//! Fields whose declared types differ from the canonical type of their
//! storage kind, so every value goes through a checked conversion.
use std::collections::BTreeMap;

use chrono::NaiveDateTime;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    #[cfg_attr(rqlgen, rethink = "label", rqlgen = "string")]
    pub label: String,
    #[cfg_attr(rqlgen, rethink = "count", rqlgen = "number")]
    pub count: i32,
    #[cfg_attr(rqlgen, rethink = "ratio", rqlgen = "number")]
    pub ratio: f32,
    #[cfg_attr(rqlgen, rethink = "codes", rqlgen = "array_number")]
    pub codes: Vec<String>,
    #[cfg_attr(rqlgen, rethink = "limits,omitempty", rqlgen = "map_number")]
    pub limits: BTreeMap<String, i64>,
    #[cfg_attr(rqlgen, rethink = "taken", rqlgen = "time")]
    pub taken: NaiveDateTime,
    #[cfg_attr(rqlgen, rethink = "stamps,omitempty", rqlgen = "array_time")]
    pub stamps: Vec<i64>,
    #[cfg_attr(rqlgen, rethink = "healthy", rqlgen = "string")]
    pub healthy: bool,
}

include!(concat!(env!("OUT_DIR"), "/sample_rqlgen.rs"));

/// Samples nested through every codec container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    #[cfg_attr(rqlgen, rethink = "headline", rqlgen = "rql")]
    pub headline: Sample,
    #[cfg_attr(rqlgen, rethink = "history", rqlgen = "array_rql")]
    pub history: Vec<Sample>,
    #[cfg_attr(rqlgen, rethink = "by_host", rqlgen = "map_rql")]
    pub by_host: BTreeMap<String, Sample>,
}

include!(concat!(env!("OUT_DIR"), "/report_rqlgen.rs"));
