// Ranking pipeline: TF-IDF match scoring and the rerank coordinator.

pub mod rerank;
pub mod scorer;
pub mod stopwords;
