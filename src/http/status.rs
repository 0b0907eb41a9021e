//! HTTP status reason phrases
//!
//! Complete code → phrase table used to build status lines and fallback bodies.

/// Marker returned for codes outside the table
pub const UNKNOWN_STATUS: &str = "Unknown Status";

/// Get the reason phrase for a status code
///
/// # Examples
/// ```
/// use restapi::http::status::status_meaning;
/// assert_eq!(status_meaning(200), "OK");
/// assert_eq!(status_meaning(418), "I'm a teapot");
/// assert_eq!(status_meaning(299), "Unknown Status");
/// ```
pub const fn status_meaning(code: u16) -> &'static str {
    match code {
        // Informational
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",

        // Success
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",

        // Redirection
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        306 => "Switch Proxy",
        307 => "Temporary Redirect",

        // Client errors
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        414 => "Request-URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Requested Range Not Satisfiable",
        417 => "Expectation Failed",
        418 => "I'm a teapot",
        422 => "Unprocessable Entity",
        423 => "Locked",
        424 => "Failed Dependency",
        425 => "Unordered Collection",
        426 => "Upgrade Required",
        449 => "Retry With",
        450 => "Blocked by Windows Parental Controls",

        // Server errors
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        506 => "Variant Also Negotiates",
        507 => "Insufficient Storage",
        509 => "Bandwidth Limit Exceeded",
        510 => "Not Extended",

        _ => UNKNOWN_STATUS,
    }
}

/// Build an HTTP/1.1 status line, e.g. `HTTP/1.1 404 Not Found`
pub fn status_line(code: u16) -> String {
    format!("HTTP/1.1 {code} {}", status_meaning(code))
}
