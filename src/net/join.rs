/// Joins `base` and the path elements with exactly one slash at the boundary.
///
/// The elements are joined with `/` and cleaned like a slash-separated path
/// (empty and `.` segments dropped, `..` resolved). Without elements `base` is
/// returned unchanged.
///
/// ```
/// use gosub_request::join_url;
///
/// assert_eq!(join_url("http://host/", ["a", "b"]), "http://host/a/b");
/// assert_eq!(join_url("http://host", ["/a"]), "http://host/a");
/// ```
pub fn join_url<I, S>(base: &str, elems: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let elems: Vec<S> = elems.into_iter().collect();
    if elems.is_empty() {
        return base.to_string();
    }

    let joined = elems
        .iter()
        .map(|e| e.as_ref())
        .filter(|e| !e.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    let path = if joined.is_empty() {
        joined
    } else {
        clean_path(&joined)
    };

    let base = base.strip_suffix('/').unwrap_or(base);
    let path = path.strip_prefix('/').unwrap_or(&path);
    format!("{}/{}", base, path)
}

fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            s => segments.push(s),
        }
    }

    let cleaned = segments.join("/");
    if rooted {
        format!("/{}", cleaned)
    } else if cleaned.is_empty() {
        ".".to_string()
    } else {
        cleaned
    }
}
