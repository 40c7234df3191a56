pub mod bigram;
pub mod model;
pub mod tagger;
