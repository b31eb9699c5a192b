//! Literal denylist tables shared by company identity resolution (C1) and
//! the web search scorer (C7): blog platforms, personal-site URL shapes,
//! and generic aggregator domains. Carried from the original implementation
//! per §10.7 — the spec names the categories but not the membership.

/// Third-party blog/CMS hosting platforms. A match means the URL is *not*
/// the company's own domain even if the company runs an official blog
/// there (see `is_blog_platform` / the company-owned-blog exception in C7).
pub const BLOG_PLATFORMS: &[&str] = &[
    "note.com",
    "hatenablog.com",
    "hatenablog.jp",
    "hatena.ne.jp",
    "ameblo.jp",
    "wordpress.com",
    "blogspot.com",
    "blogger.com",
    "wixsite.com",
    "jimdofree.com",
    "jimdo.com",
    "medium.com",
    "qiita.com",
    "zenn.dev",
    "fc2.com",
    "livedoor.jp",
    "livedoor.blog",
    "seesaa.net",
    "goo.ne.jp",
    "exblog.jp",
    "so-net.ne.jp",
    "yahoo.co.jp/blog",
    "tumblr.com",
    "ssl-lolipop.jp",
    "webnode.jp",
    "weebly.com",
    "strikingly.com",
    "peraichi.com",
    "studio.site",
    "notion.site",
];

/// URL-shape patterns indicating a personal site rather than an official
/// corporate domain (checked against the path/subdomain, not the full URL).
pub const PERSONAL_SITE_PATTERNS: &[&str] =
    &["~", "/user/", "/users/", "/home/", "personal", "individual", "myprofile"];

/// Third-party aggregators: job boards, news syndicators, reference sites.
/// Matching one of these marks a result as an aggregator for C7 scoring and
/// excludes it from C1 conflict analysis as "the company itself".
pub const AGGREGATOR_DOMAINS: &[&str] = &[
    "wikipedia.org",
    "indeed.com",
    "rikunabi.com",
    "mynavi.jp",
    "en-japan.com",
    "doda.jp",
    "type.jp",
    "green-japan.com",
    "wantedly.com",
    "openwork.jp",
    "vorkers.com",
    "glassdoor.com",
    "linkedin.com",
    "twitter.com",
    "x.com",
    "facebook.com",
    "instagram.com",
    "youtube.com",
    "prtimes.jp",
    "atpress.ne.jp",
    "kabutan.jp",
    "irbank.net",
];

pub fn is_blog_platform(domain: &str) -> bool {
    let domain = domain.to_lowercase();
    BLOG_PLATFORMS.iter().any(|p| domain == *p || domain.ends_with(&format!(".{p}")))
}

pub fn has_personal_site_pattern(url: &str) -> bool {
    let lower = url.to_lowercase();
    PERSONAL_SITE_PATTERNS.iter().any(|p| lower.contains(p))
}

pub fn is_aggregator(domain: &str) -> bool {
    let domain = domain.to_lowercase();
    AGGREGATOR_DOMAINS.iter().any(|p| domain == *p || domain.ends_with(&format!(".{p}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_subdomain_is_blog_platform() {
        assert!(is_blog_platform("company-name.note.com"));
    }

    #[test]
    fn own_domain_is_not_blog_platform() {
        assert!(!is_blog_platform("www.example.co.jp"));
    }

    #[test]
    fn wikipedia_is_aggregator() {
        assert!(is_aggregator("ja.wikipedia.org"));
    }
}
