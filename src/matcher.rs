// src/matcher.rs
//
// path-to-regexp 形式のパスパターン (":id", ":id?", "*") のコンパイルとマッチング

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// マッチで束縛されたパラメータ (名前順)
pub type Params = BTreeMap<String, String>;

/// "*" が束縛されるパラメータ名
pub const CATCH_ALL_PARAM: &str = "pathMatch";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern {pattern:?} has a parameter without a name")]
    EmptyParam { pattern: String },

    #[error("pattern {pattern:?} binds parameter {param:?} twice")]
    DuplicateParam { pattern: String, param: String },

    #[error("pattern {pattern:?} has segments after '*'")]
    CatchAllNotLast { pattern: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    Optional(String),
    CatchAll,
}

/// コンパイル済みのパスパターン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        let mut seen: Vec<&str> = Vec::new();

        for part in pattern.split('/').filter(|p| !p.is_empty()) {
            if matches!(segments.last(), Some(Segment::CatchAll)) {
                return Err(PatternError::CatchAllNotLast {
                    pattern: pattern.to_string(),
                });
            }

            let segment = if part == "*" {
                Segment::CatchAll
            } else if let Some(name) = part.strip_prefix(':') {
                let (name, optional) = match name.strip_suffix('?') {
                    Some(n) => (n, true),
                    None => (name, false),
                };
                if name.is_empty() {
                    return Err(PatternError::EmptyParam {
                        pattern: pattern.to_string(),
                    });
                }
                if seen.contains(&name) {
                    return Err(PatternError::DuplicateParam {
                        pattern: pattern.to_string(),
                        param: name.to_string(),
                    });
                }
                seen.push(name);
                if optional {
                    Segment::Optional(name.to_string())
                } else {
                    Segment::Param(name.to_string())
                }
            } else {
                Segment::Static(part.to_string())
            };
            segments.push(segment);
        }

        Ok(PathPattern {
            raw: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// パラメータを含まないパターンか
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Static(_)))
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(n) | Segment::Optional(n) => Some(n.as_str()),
                Segment::CatchAll => Some(CATCH_ALL_PARAM),
                Segment::Static(_) => None,
            })
            .collect()
    }

    /// URL (クエリ・ハッシュ付きでもよい) をマッチさせ、束縛したパラメータを返す
    ///
    /// 静的セグメントは大文字小文字を区別せず、末尾スラッシュ 1 つは無視する。
    /// 空のセグメント ("//") を含む URL はマッチしない。
    pub fn match_path(&self, url: &str) -> Option<Params> {
        let path = strip_query(url);
        let path = path.strip_suffix('/').unwrap_or(path);
        let path = path.strip_prefix('/').unwrap_or(path);
        let parts: Vec<&str> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('/').collect()
        };
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        let mut params = Params::new();
        if match_segments(&self.segments, &parts, &mut params) {
            Some(params)
        } else {
            None
        }
    }

    /// パラメータを埋めて具体的なパスを組み立てる。必須パラメータが欠けていれば None
    pub fn fill(&self, params: &Params) -> Option<String> {
        let mut out = String::new();
        for segment in &self.segments {
            let value = match segment {
                Segment::Static(s) => Some(s.as_str()),
                Segment::Param(n) => Some(params.get(n)?.as_str()),
                Segment::Optional(n) => params.get(n).map(String::as_str),
                Segment::CatchAll => params.get(CATCH_ALL_PARAM).map(String::as_str),
            };
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                out.push('/');
                out.push_str(v.trim_matches('/'));
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        Some(out)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// 子ルートのパスを親のパスに結合する。'/' で始まる子は絶対パス扱い
pub fn join_path(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        child.to_string()
    } else if child.is_empty() {
        parent.to_string()
    } else if parent.ends_with('/') {
        format!("{parent}{child}")
    } else {
        format!("{parent}/{child}")
    }
}

/// "?query" と "#hash" を取り除いたパス部分
pub fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

fn match_segments(segments: &[Segment], parts: &[&str], params: &mut Params) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        return parts.is_empty();
    };

    match segment {
        Segment::Static(expected) => match parts.split_first() {
            Some((part, tail)) if part.to_lowercase() == expected.to_lowercase() => {
                match_segments(rest, tail, params)
            }
            _ => false,
        },
        Segment::Param(name) => match parts.split_first() {
            Some((part, tail)) => {
                params.insert(name.clone(), (*part).to_string());
                if match_segments(rest, tail, params) {
                    true
                } else {
                    params.remove(name);
                    false
                }
            }
            None => false,
        },
        Segment::Optional(name) => {
            if let Some((part, tail)) = parts.split_first() {
                params.insert(name.clone(), (*part).to_string());
                if match_segments(rest, tail, params) {
                    return true;
                }
                params.remove(name);
            }
            match_segments(rest, parts, params)
        }
        Segment::CatchAll => {
            params.insert(CATCH_ALL_PARAM.to_string(), parts.join("/"));
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_named_param() {
        let pattern = PathPattern::parse("/scripts/:id").unwrap();
        let params = pattern.match_path("/scripts/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));

        assert!(pattern.match_path("/scripts").is_none());
        assert!(pattern.match_path("/scripts/42/edit").is_none());
    }

    #[test]
    fn ignores_query_hash_and_trailing_slash() {
        let pattern = PathPattern::parse("/research/list").unwrap();
        assert!(pattern.match_path("/research/list/").is_some());
        assert!(pattern.match_path("/research/list?page=2").is_some());
        assert!(pattern.match_path("/Research/List#top").is_some());
        assert!(pattern.match_path("/research").is_none());
    }

    #[test]
    fn rejects_empty_segments() {
        let pattern = PathPattern::parse("/scripts/:id").unwrap();
        assert!(pattern.match_path("/scripts//42").is_none());
        assert!(pattern.match_path("//scripts/42").is_none());

        let pattern = PathPattern::parse("/home").unwrap();
        assert!(pattern.match_path("/home/").is_some());
        assert!(pattern.match_path("/home//").is_none());
        assert!(pattern.match_path("/home///").is_none());

        let root = PathPattern::parse("/").unwrap();
        assert!(root.match_path("/").is_some());
        assert!(root.match_path("/?tab=1").is_some());
    }

    #[test]
    fn optional_param_and_catch_all() {
        let pattern = PathPattern::parse("/scripts/:id?").unwrap();
        assert_eq!(pattern.match_path("/scripts").unwrap().len(), 0);
        assert_eq!(pattern.match_path("/scripts/7").unwrap()["id"], "7");

        let pattern = PathPattern::parse("/docs/*").unwrap();
        assert_eq!(pattern.match_path("/docs/a/b").unwrap()[CATCH_ALL_PARAM], "a/b");
    }

    #[test]
    fn rejects_malformed_patterns() {
        assert!(matches!(
            PathPattern::parse("/a/:"),
            Err(PatternError::EmptyParam { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/a/:id/b/:id"),
            Err(PatternError::DuplicateParam { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/a/*/b"),
            Err(PatternError::CatchAllNotLast { .. })
        ));
    }

    #[test]
    fn fill_builds_concrete_path() {
        let pattern = PathPattern::parse("/scripts/:id").unwrap();
        let mut params = Params::new();
        assert_eq!(pattern.fill(&params), None);

        params.insert("id".into(), "42".into());
        assert_eq!(pattern.fill(&params).as_deref(), Some("/scripts/42"));
        assert_eq!(
            PathPattern::parse("/").unwrap().fill(&Params::new()).as_deref(),
            Some("/")
        );
    }

    #[test]
    fn join_handles_absolute_and_relative_children() {
        assert_eq!(join_path("/", "/home"), "/home");
        assert_eq!(join_path("/", "home"), "/home");
        assert_eq!(join_path("/research", "chat"), "/research/chat");
        assert_eq!(join_path("/research", ""), "/research");
    }
}
