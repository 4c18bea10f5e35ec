use crate::authz::errors::AuthzError;

/// One segment of a compiled route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches only the identical path segment.
    Literal(String),
    /// Named parameter (`:id`): matches exactly one non-empty segment.
    Param(String),
}

/// Compiled form of a route path template, built once at table construction.
/// Matching is segment-by-segment with no backtracking, so worst-case cost
/// is linear in the path length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Literal path; matched via hash lookup in the route table.
    Exact(String),
    /// Parameterized and/or wildcard template. A trailing wildcard swallows
    /// one or more remaining segments.
    Segments {
        segments: Vec<Segment>,
        trailing_wildcard: bool,
    },
}

impl Pattern {
    /// Compile a path template. Accepted grammar:
    /// - must start with `/`
    /// - literal segments: `/api/orders`
    /// - named parameters: `/api/orders/:id`
    /// - a single `*` as the final segment: `/api/ai/*`
    pub fn compile(template: &str) -> Result<Pattern, AuthzError> {
        let invalid = |reason: &str| AuthzError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        if !template.starts_with('/') {
            return Err(invalid("must start with `/`"));
        }
        if template == "/" {
            return Ok(Pattern::Exact("/".to_string()));
        }

        let raw: Vec<&str> = template[1..].split('/').collect();
        let mut segments = Vec::with_capacity(raw.len());
        let mut trailing_wildcard = false;

        for part in &raw {
            if trailing_wildcard {
                return Err(invalid("wildcard `*` must be the final segment"));
            }
            match *part {
                "" => return Err(invalid("empty path segment")),
                "*" => trailing_wildcard = true,
                p if p.starts_with(':') => {
                    let name = &p[1..];
                    if name.is_empty() {
                        return Err(invalid("parameter segment is missing a name"));
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                p => {
                    if p.contains('*') || p.contains(':') {
                        return Err(invalid(
                            "`*` and `:` are only valid at the start of a segment",
                        ));
                    }
                    segments.push(Segment::Literal(p.to_string()));
                }
            }
        }

        if !trailing_wildcard && segments.iter().all(|s| matches!(s, Segment::Literal(_))) {
            return Ok(Pattern::Exact(template.to_string()));
        }

        Ok(Pattern::Segments {
            segments,
            trailing_wildcard,
        })
    }

    /// Test a request path against the compiled pattern.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Pattern::Exact(literal) => literal == path,
            Pattern::Segments {
                segments,
                trailing_wildcard,
            } => {
                if !path.starts_with('/') {
                    return false;
                }
                let parts: Vec<&str> = if path == "/" {
                    Vec::new()
                } else {
                    path[1..].split('/').collect()
                };

                if *trailing_wildcard {
                    // The wildcard covers one or more remaining segments:
                    // `/api/ai/*` matches `/api/ai/x` but not `/api/ai`.
                    if parts.len() <= segments.len() {
                        return false;
                    }
                } else if parts.len() != segments.len() {
                    return false;
                }

                segments.iter().zip(parts.iter()).all(|(seg, part)| match seg {
                    Segment::Literal(lit) => lit == part,
                    Segment::Param(_) => !part.is_empty(),
                })
            }
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Pattern::Exact(_))
    }

    pub fn has_wildcard(&self) -> bool {
        matches!(
            self,
            Pattern::Segments {
                trailing_wildcard: true,
                ..
            }
        )
    }

    /// Number of literal segments; the primary input to specificity ordering.
    pub fn literal_segments(&self) -> usize {
        match self {
            Pattern::Exact(literal) => {
                literal.split('/').filter(|p| !p.is_empty()).count()
            }
            Pattern::Segments { segments, .. } => segments
                .iter()
                .filter(|s| matches!(s, Segment::Literal(_)))
                .count(),
        }
    }

    pub fn segment_count(&self) -> usize {
        match self {
            Pattern::Exact(literal) => {
                literal.split('/').filter(|p| !p.is_empty()).count()
            }
            Pattern::Segments { segments, .. } => segments.len(),
        }
    }
}
