mod article;
mod article_query;

pub use self::{
    article::{parse_timestamp, Article, ArticleError, ArticlePatch, NewArticle},
    article_query::{
        parse_leading_integer, trending_limit, ArticleOrdering, ArticlePagination, ArticleQuery,
        ArticleQueryResults, ListParameters, SortColumn,
    },
};
