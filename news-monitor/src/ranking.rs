use crate::types::{Category, ScoredArticle};

/// Sort by 0.6 * importance + 0.4 * relevance, highest first. The sort is
/// stable, so equal scores keep feed order.
pub fn rank(mut articles: Vec<ScoredArticle>) -> Vec<ScoredArticle> {
    articles.sort_by(|a, b| b.score.weighted().cmp(&a.score.weighted()));
    articles
}

#[derive(Debug, Clone)]
pub struct CategoryGroup {
    pub category: Category,
    pub max_importance: u8,
    pub articles: Vec<ScoredArticle>,
}

/// Group ranked articles by category. Groups are ordered by their highest
/// importance, then by first appearance; articles keep their ranked order.
pub fn group_by_category(ranked: &[ScoredArticle]) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();

    for scored in ranked {
        match groups.iter_mut().find(|g| g.category == scored.score.category) {
            Some(group) => {
                group.max_importance = group.max_importance.max(scored.score.importance);
                group.articles.push(scored.clone());
            }
            None => groups.push(CategoryGroup {
                category: scored.score.category,
                max_importance: scored.score.importance,
                articles: vec![scored.clone()],
            }),
        }
    }

    groups.sort_by(|a, b| b.max_importance.cmp(&a.max_importance));
    groups
}
