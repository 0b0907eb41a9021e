//! Request path parsing
//!
//! `resource/arg1/arg2/` → (`resource`, [`arg1`, `arg2`]).

/// Split a raw request path into its resource and ordered arguments
///
/// Trailing slashes are stripped before splitting. Segment contents are not
/// validated.
///
/// ```
/// use restapi::request::parse_request_path;
/// let (resource, args) = parse_request_path("hotspot/latlon=37.3,-53.5/");
/// assert_eq!(resource, "hotspot");
/// assert_eq!(args, vec!["latlon=37.3,-53.5".to_string()]);
/// ```
pub fn parse_request_path(raw: &str) -> (String, Vec<String>) {
    let mut segments = raw.trim_end_matches('/').split('/').map(ToString::to_string);
    let resource = segments.next().unwrap_or_default();
    (resource, segments.collect())
}

/// Only the resource segment of a raw request path
pub fn resource_name(raw: &str) -> &str {
    raw.trim_end_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_only() {
        let (resource, args) = parse_request_path("widgets");
        assert_eq!(resource, "widgets");
        assert!(args.is_empty());
    }

    #[test]
    fn test_args_keep_order() {
        let (resource, args) = parse_request_path("widgets/7/parts/3");
        assert_eq!(resource, "widgets");
        assert_eq!(args, vec!["7", "parts", "3"]);
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        for raw in ["widgets", "widgets/7", "widgets/a/b/c", "x/y=1,2;z=3"] {
            assert_eq!(parse_request_path(raw), parse_request_path(&format!("{raw}/")));
            assert_eq!(parse_request_path(raw), parse_request_path(&format!("{raw}///")));
        }
    }

    #[test]
    fn test_empty_inner_segments_pass_through() {
        let (resource, args) = parse_request_path("widgets//7");
        assert_eq!(resource, "widgets");
        assert_eq!(args, vec!["", "7"]);
    }

    #[test]
    fn test_resource_name() {
        assert_eq!(resource_name("widgets/7/"), "widgets");
        assert_eq!(resource_name("ghost"), "ghost");
        assert_eq!(resource_name(""), "");
    }
}
