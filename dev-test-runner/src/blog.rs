use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Post {
    #[cfg_attr(rqlgen, rethink = "name", rqlgen = "string")]
    pub name: String,
    #[cfg_attr(rqlgen, rethink = "tags", rqlgen = "array_string")]
    pub tags: Vec<String>,
}

include!(concat!(env!("OUT_DIR"), "/post_rqlgen.rs"));

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Author {
    #[cfg_attr(rqlgen, rethink = "id", rqlgen = "string")]
    pub id: String,
    #[cfg_attr(rqlgen, rethink = "karma", rqlgen = "number")]
    pub karma: i32,
    #[cfg_attr(rqlgen, rethink = "verified,omitempty", rqlgen = "bool")]
    pub verified: bool,
    #[cfg_attr(rqlgen, rethink = "joined", rqlgen = "time")]
    pub joined: DateTime<Utc>,
}

include!(concat!(env!("OUT_DIR"), "/author_rqlgen.rs"));

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comment {
    #[cfg_attr(rqlgen, rethink = "body", rqlgen = "string")]
    pub body: String,
    #[cfg_attr(rqlgen, rethink = "likes,omitempty", rqlgen = "number")]
    pub likes: u32,
}

include!(concat!(env!("OUT_DIR"), "/comment_rqlgen.rs"));

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Article {
    #[cfg_attr(rqlgen, rethink = "post", rqlgen = "rql")]
    pub post: Post,
    #[cfg_attr(rqlgen, rethink = "editor,omitempty", rqlgen = "rql")]
    pub editor: Option<Box<Author>>,
    #[cfg_attr(rqlgen, rethink = "comments", rqlgen = "array_rql")]
    pub comments: Vec<Comment>,
    #[cfg_attr(rqlgen, rethink = "views,omitempty", rqlgen = "map_number")]
    pub views: HashMap<String, u32>,
    #[cfg_attr(rqlgen, rethink = "flags,omitempty", rqlgen = "map_bool")]
    pub flags: BTreeMap<String, bool>,
    #[cfg_attr(rqlgen, rethink = "revisions,omitempty", rqlgen = "array_time")]
    pub revisions: Vec<DateTime<Utc>>,
    #[cfg_attr(rqlgen, rethink = "reviewers,omitempty", rqlgen = "map_rql")]
    pub reviewers: HashMap<String, Author>,
}

include!(concat!(env!("OUT_DIR"), "/article_rqlgen.rs"));
