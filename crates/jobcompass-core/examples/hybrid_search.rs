//! Scores a handful of synthetic web search hits against a company mapping
//! and prints the ranked results, without touching any network or LLM.

use jobcompass_core::company::mapping::{CompanyEntry, CompanyMapping};
use jobcompass_core::websearch::{score_result, ScoreMode, SearchResult};
use jobcompass_core::Registry;

fn main() {
    let mut mapping = CompanyMapping::empty();
    mapping.entries.insert(
        "サンプル商事".to_string(),
        CompanyEntry { domains: vec!["sample-trading".to_string()], parent: None, allow_parent_domains_for: vec![] },
    );
    let registry = Registry::from_mapping(mapping);

    let results = [
        SearchResult {
            url: "https://www.sample-trading.co.jp/recruit/2027".into(),
            title: "サンプル商事 新卒採用情報".into(),
            snippet: "2027年卒向けの新卒採用情報です".into(),
        },
        SearchResult {
            url: "https://www.indeed.com/jobs?q=sample-trading".into(),
            title: "サンプル商事 求人一覧".into(),
            snippet: "".into(),
        },
        SearchResult {
            url: "https://unrelated-blog.example.com/post".into(),
            title: "何かの記事".into(),
            snippet: "関係のない内容です".into(),
        },
    ];

    let mode = ScoreMode::default();
    for result in &results {
        match score_result(&registry, result, "サンプル商事", "new_grad_recruitment", None, Some(2027), &mode) {
            Some(scored) => println!("{:>6.2}  {:?}  {}", scored.total, scored.confidence, result.url),
            None => println!("  excl  ----     {}", result.url),
        }
    }
}
